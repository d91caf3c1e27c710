//! The `(lot, floor, area)` key shared by the two price batches.

use crate::area::{parse_area, AreaKey};
use crate::floor::{parse_floor, FloorClass};
use crate::lot::LotNumber;
use crate::outcome::{Normalized, SkipReason};

/// Key a transaction row and a reference row must agree on for an enrichment to attach.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalKey {
    /// `"main"` or `"main-sub"` without padding.
    pub lot: String,
    pub floor: i32,
    pub area: AreaKey,
}

impl CanonicalKey {
    pub fn new(lot: LotNumber, floor: i32, area: AreaKey) -> Self {
        Self {
            lot: lot.to_string(),
            floor,
            area,
        }
    }
}

/// A transaction row normalized for a price lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PriceRowKey {
    pub lot: LotNumber,
    pub floor: i32,
    pub area: AreaKey,
}

impl PriceRowKey {
    /// Lot is validated first, then floor, then area; the first failure wins.
    pub fn parse(lot: &str, floor: &str, area: &str) -> Normalized<Self> {
        Ok(Self {
            lot: LotNumber::parse(lot)?,
            floor: parse_floor(floor)?,
            area: parse_area(area)?,
        })
    }

    pub fn canonical(&self) -> CanonicalKey {
        CanonicalKey::new(self.lot, self.floor, self.area)
    }
}

/// Key of a `bldg_apartment_price` row: unpadded main/sub text, floor text, float area.
pub fn apartment_reference_key(
    main: &str,
    sub: &str,
    floor: &str,
    area: f64,
) -> Normalized<CanonicalKey> {
    let lot = LotNumber::from_parts(main, Some(sub))?;
    let floor = parse_floor(floor)?;
    let area = AreaKey::from_f64(area).ok_or(SkipReason::UnparsableArea)?;
    Ok(CanonicalKey::new(lot, floor, area))
}

/// Key of an `officetel_standard_price` row: integer-castable lot parts, a floor
/// class marker plus a magnitude, float area.
pub fn officetel_reference_key(
    bunji: &str,
    ho: &str,
    floor_marker: &str,
    floor_address: &str,
    area: f64,
) -> Normalized<CanonicalKey> {
    let lot = LotNumber::from_parts(bunji, Some(ho))?;
    let magnitude = floor_address
        .trim()
        .parse::<i32>()
        .map_err(|_| SkipReason::UnparsableFloor)?;
    let floor = FloorClass::from_officetel_marker(floor_marker).signed(magnitude);
    let area = AreaKey::from_f64(area).ok_or(SkipReason::UnparsableArea)?;
    Ok(CanonicalKey::new(lot, floor, area))
}
