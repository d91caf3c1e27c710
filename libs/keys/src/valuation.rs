//! Official price arithmetic.

use crate::area::{decimal_from_f64, ROUNDING};
use rust_decimal::prelude::*;
use serde::Serialize;

/// `round(price * 1.26)`; `None` on overflow.
pub fn threshold_126(price: i64) -> Option<i64> {
    Decimal::from(price)
        .checked_mul(Decimal::new(126, 2))?
        .round_dp_with_strategy(0, ROUNDING)
        .to_i64()
}

/// Appraisal price of an apartment/villa unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ApartmentValuation {
    pub price: i64,
    pub threshold_126: i64,
}

impl ApartmentValuation {
    pub fn new(price: i64) -> Option<Self> {
        Some(Self {
            price,
            threshold_126: threshold_126(price)?,
        })
    }

    /// Reference prices come back as floats; they are rounded to whole won first.
    pub fn from_reference(price: f64) -> Option<Self> {
        let price = decimal_from_f64(price)?
            .round_dp_with_strategy(0, ROUNDING)
            .to_i64()?;
        Self::new(price)
    }
}

/// Standard price of an officetel unit, derived from its per-area price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OfficetelValuation {
    pub unit_price: f64,
    pub exclusive_area: f64,
    pub shared_area: f64,
    pub total_area: f64,
    pub standard_price: i64,
    pub threshold_126: i64,
}

impl OfficetelValuation {
    /// `total_area = exclusive + shared`, `standard_price = round(unit_price * total_area)`.
    pub fn compute(unit_price: f64, exclusive_area: f64, shared_area: f64) -> Option<Self> {
        let total = decimal_from_f64(exclusive_area)?.checked_add(decimal_from_f64(shared_area)?)?;
        let standard_price = decimal_from_f64(unit_price)?
            .checked_mul(total)?
            .round_dp_with_strategy(0, ROUNDING)
            .to_i64()?;

        Some(Self {
            unit_price,
            exclusive_area,
            shared_area,
            total_area: total.to_f64()?,
            standard_price,
            threshold_126: threshold_126(standard_price)?,
        })
    }
}
