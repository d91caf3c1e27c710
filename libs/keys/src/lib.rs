//! Canonical comparison keys for rent-transaction enrichment.
//!
//! Transaction rows carry loosely formatted lot numbers, floors and areas. The
//! reference tables they are joined against store the same facts in several
//! different shapes (unpadded text, zero-padded text, integer-castable text,
//! floor-class markers). Every function in this crate is pure so the key a
//! query condition is built from and the key a reference row is mapped back to
//! are produced by the same code.
//!
//! Normalization never fails with an error: a row that cannot be keyed yields
//! a [`SkipReason`] and is left out of the batch.

pub mod area;
pub mod floor;
pub mod key;
pub mod lot;
pub mod money;
pub mod summary;
pub mod unit;
pub mod valuation;

mod outcome;

pub use area::{parse_area, round_area, AreaKey};
pub use floor::{parse_floor, FloorClass};
pub use key::{apartment_reference_key, officetel_reference_key, CanonicalKey, PriceRowKey};
pub use lot::{split_lot, LotNumber};
pub use money::format_money;
pub use outcome::{Normalized, SkipReason};
pub use summary::{unit_label, UnitSummary, UNIT_DISPLAY_LIMIT};
pub use unit::{float_text, pad_lot_part, UnitKey};
pub use valuation::{threshold_126, ApartmentValuation, OfficetelValuation};
