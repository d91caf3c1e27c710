//! Exact-match keys for the unit-identity (dong/ho) table.

use crate::floor::{parse_floor, FloorClass};
use crate::lot::split_lot;
use crate::outcome::{Normalized, SkipReason};

const LOT_WIDTH: usize = 4;

/// Left-pad a lot part with zeros to four characters. Longer input is kept as-is.
pub fn pad_lot_part(part: &str) -> String {
    format!("{:0>width$}", part, width = LOT_WIDTH)
}

/// Canonical text of a float: shortest round-trip digits, with `.0` kept on
/// integral values (`85` -> `"85.0"`, `84.970` -> `"84.97"`).
pub fn float_text(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

/// Key of a `bldg_exclusive_area` row.
///
/// Area is matched verbatim on its canonical text and is never rounded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitKey {
    pub main: String,
    pub sub: String,
    pub floor_class: FloorClass,
    pub floor_no: String,
    pub area: String,
}

impl UnitKey {
    pub fn parse(lot: &str, floor: &str, area: &str) -> Normalized<Self> {
        if lot.trim().is_empty() {
            return Err(SkipReason::EmptyLot);
        }
        let (main, sub) = split_lot(lot);
        let (floor_class, magnitude) = FloorClass::split(parse_floor(floor)?);
        let area = area
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|a| a.is_finite())
            .ok_or(SkipReason::UnparsableArea)?;

        Ok(Self {
            main: pad_lot_part(main),
            sub: sub.map(pad_lot_part).unwrap_or_else(|| pad_lot_part("0")),
            floor_class,
            floor_no: magnitude.to_string(),
            area: float_text(area),
        })
    }

    /// Rebuild from the columns a matching reference row returned.
    pub fn from_reference(
        main: &str,
        sub: &str,
        floor_code: &str,
        floor_no: &str,
        area: &str,
    ) -> Option<Self> {
        Some(Self {
            main: main.to_string(),
            sub: sub.to_string(),
            floor_class: FloorClass::from_unit_code(floor_code)?,
            floor_no: floor_no.to_string(),
            area: area.to_string(),
        })
    }
}
