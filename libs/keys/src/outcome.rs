use serde::Serialize;
use std::fmt;

/// Why a row was left out of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    EmptyLot,
    NonDigitMainLot,
    NonDigitSubLot,
    LotOutOfRange,
    UnparsableFloor,
    UnparsableArea,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::EmptyLot => "empty_lot",
            SkipReason::NonDigitMainLot => "non_digit_main_lot",
            SkipReason::NonDigitSubLot => "non_digit_sub_lot",
            SkipReason::LotOutOfRange => "lot_out_of_range",
            SkipReason::UnparsableFloor => "unparsable_floor",
            SkipReason::UnparsableArea => "unparsable_area",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Either the normalized value or the reason the row was skipped.
pub type Normalized<T> = std::result::Result<T, SkipReason>;
