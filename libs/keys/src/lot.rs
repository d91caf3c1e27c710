//! Cadastral lot numbers ("main" or "main-sub").

use crate::outcome::{Normalized, SkipReason};
use std::fmt;

/// Split a raw lot string on its first `-`, trimming both halves.
///
/// No validation happens here; the unit-identity path pads whatever it gets.
pub fn split_lot(raw: &str) -> (&str, Option<&str>) {
    match raw.split_once('-') {
        Some((main, sub)) => (main.trim(), Some(sub.trim())),
        None => (raw.trim(), None),
    }
}

/// A digit-validated lot number with padding stripped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LotNumber {
    pub main: u32,
    /// `0` means "no sub-lot".
    pub sub: u32,
}

impl LotNumber {
    pub fn new(main: u32, sub: u32) -> Self {
        Self { main, sub }
    }

    /// Parse a transaction lot string such as `"17"`, `"17-3"` or `" 017 - 03 "`.
    pub fn parse(raw: &str) -> Normalized<Self> {
        if raw.trim().is_empty() {
            return Err(SkipReason::EmptyLot);
        }
        let (main, sub) = split_lot(raw);
        Self::from_parts(main, sub)
    }

    /// Build from separately stored main/sub parts (reference tables keep them in
    /// two columns, possibly zero padded).
    pub fn from_parts(main: &str, sub: Option<&str>) -> Normalized<Self> {
        let main = parse_part(main.trim()).ok_or(SkipReason::NonDigitMainLot)??;
        let sub = match sub {
            Some(sub) => parse_part(sub.trim()).ok_or(SkipReason::NonDigitSubLot)??,
            None => 0,
        };
        Ok(Self { main, sub })
    }

    pub fn has_sub(&self) -> bool {
        self.sub != 0
    }

    pub fn main_text(&self) -> String {
        self.main.to_string()
    }

    pub fn sub_text(&self) -> String {
        self.sub.to_string()
    }
}

/// `None` when the part is not purely ASCII digits.
fn parse_part(part: &str) -> Option<Normalized<u32>> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(part.parse::<u32>().map_err(|_| SkipReason::LotOutOfRange))
}

impl fmt::Display for LotNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_sub() {
            write!(f, "{}-{}", self.main, self.sub)
        } else {
            write!(f, "{}", self.main)
        }
    }
}
