//! Floor areas rounded to hundredths of a square metre.

use crate::outcome::{Normalized, SkipReason};
use rust_decimal::prelude::*;
use rust_decimal::RoundingStrategy;
use std::fmt;

/// Half-way values round away from zero everywhere in this crate.
pub(crate) const ROUNDING: RoundingStrategy = RoundingStrategy::MidpointAwayFromZero;

/// An area rounded to 2 decimal places, stored as integer hundredths so it can be
/// hashed and compared exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AreaKey(i64);

impl AreaKey {
    pub fn from_hundredths(hundredths: i64) -> Self {
        Self(hundredths)
    }

    /// `None` for non-finite or unrepresentably large values.
    pub fn from_f64(value: f64) -> Option<Self> {
        let rounded = decimal_from_f64(value)?.round_dp_with_strategy(2, ROUNDING);
        let hundredths = rounded.checked_mul(Decimal::ONE_HUNDRED)?;
        hundredths.trunc().to_i64().map(Self)
    }

    pub fn hundredths(self) -> i64 {
        self.0
    }

    /// The value bound into `::FLOAT` equality predicates.
    pub fn as_f64(self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl fmt::Display for AreaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

/// Round an area to 2 decimal places.
pub fn round_area(value: f64) -> Option<f64> {
    AreaKey::from_f64(value).map(AreaKey::as_f64)
}

/// Parse and round an area given as text.
pub fn parse_area(raw: &str) -> Normalized<AreaKey> {
    let value = raw
        .trim()
        .parse::<f64>()
        .map_err(|_| SkipReason::UnparsableArea)?;
    AreaKey::from_f64(value).ok_or(SkipReason::UnparsableArea)
}

/// Exact decimal of the shortest text that round-trips `value`.
pub(crate) fn decimal_from_f64(value: f64) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }
    Decimal::from_str(&value.to_string()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_hundredths() {
        assert_eq!(AreaKey::from_f64(84.97).map(AreaKey::hundredths), Some(8497));
        assert_eq!(AreaKey::from_f64(84.974).map(AreaKey::hundredths), Some(8497));
        assert_eq!(AreaKey::from_f64(84.975).map(AreaKey::hundredths), Some(8498));
        assert_eq!(AreaKey::from_f64(59.0).map(AreaKey::hundredths), Some(5900));
    }

    #[test]
    fn bound_value_matches_parsed_literal() {
        let key = parse_area("84.97").unwrap();
        assert_eq!(key.as_f64(), 84.97_f64);
        assert_eq!(key.to_string(), "84.97");
        assert_eq!(parse_area("32.5").unwrap().to_string(), "32.50");
    }

    #[test]
    fn rejects_unparsable() {
        assert_eq!(parse_area(""), Err(SkipReason::UnparsableArea));
        assert_eq!(parse_area("84,97"), Err(SkipReason::UnparsableArea));
        assert_eq!(parse_area("NaN"), Err(SkipReason::UnparsableArea));
        assert_eq!(AreaKey::from_f64(f64::INFINITY), None);
    }

    #[test]
    fn negative_display() {
        assert_eq!(AreaKey::from_hundredths(-105).to_string(), "-1.05");
    }
}
