//! Signed floor numbers (negative = below ground).

use crate::outcome::{Normalized, SkipReason};

/// Parse a floor value.
///
/// Integer text is taken as-is; decimal text such as `"5.0"` is truncated toward
/// zero. Anything else, including non-finite values, is skipped.
pub fn parse_floor(raw: &str) -> Normalized<i32> {
    let raw = raw.trim();
    if let Ok(floor) = raw.parse::<i32>() {
        return Ok(floor);
    }
    let value = raw.parse::<f64>().map_err(|_| SkipReason::UnparsableFloor)?;
    if !value.is_finite() {
        return Err(SkipReason::UnparsableFloor);
    }
    let truncated = value.trunc();
    if truncated < i32::MIN as f64 || truncated > i32::MAX as f64 {
        return Err(SkipReason::UnparsableFloor);
    }
    Ok(truncated as i32)
}

/// Below- or above-ground, as stored by the reference tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FloorClass {
    BelowGround,
    AboveGround,
}

impl FloorClass {
    /// Split a signed floor into its class and magnitude. Floor `0` counts as above ground.
    pub fn split(floor: i32) -> (Self, u32) {
        if floor < 0 {
            (FloorClass::BelowGround, floor.unsigned_abs())
        } else {
            (FloorClass::AboveGround, floor.unsigned_abs())
        }
    }

    /// Recombine a class and magnitude into a signed floor.
    pub fn signed(self, magnitude: i32) -> i32 {
        match self {
            FloorClass::BelowGround => -magnitude,
            FloorClass::AboveGround => magnitude,
        }
    }

    /// `층_구분_코드` value in the unit-identity table.
    pub fn unit_code(self) -> &'static str {
        match self {
            FloorClass::BelowGround => "10",
            FloorClass::AboveGround => "20",
        }
    }

    pub fn from_unit_code(code: &str) -> Option<Self> {
        match code.trim() {
            "10" => Some(FloorClass::BelowGround),
            "20" => Some(FloorClass::AboveGround),
            _ => None,
        }
    }

    /// `건물층구분코드` value in the officetel standard-price table.
    pub fn officetel_marker(self) -> &'static str {
        match self {
            FloorClass::BelowGround => "지하층",
            FloorClass::AboveGround => "지상층",
        }
    }

    /// Any marker other than the below-ground one is read as above ground.
    pub fn from_officetel_marker(marker: &str) -> Self {
        if marker.trim() == "지하층" {
            FloorClass::BelowGround
        } else {
            FloorClass::AboveGround
        }
    }
}
