//! Building-unit label summaries ("101동 502호, ... 외 N개").

use serde::Serialize;
use std::collections::BTreeSet;

pub const UNIT_DISPLAY_LIMIT: usize = 10;

/// Label for one `(동_명, 호_명)` pair. A block name without a unit name yields nothing.
pub fn unit_label(dong: Option<&str>, ho: Option<&str>) -> Option<String> {
    let dong = dong.map(str::trim).unwrap_or_default();
    let ho = ho.map(str::trim).unwrap_or_default();
    match (dong.is_empty(), ho.is_empty()) {
        (_, true) => None,
        (true, false) => Some(ho.to_string()),
        (false, false) => Some(format!("{} {}", dong, ho)),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitSummary {
    pub display: String,
    /// Distinct labels in ascending order.
    pub all_units: Vec<String>,
    pub has_more: bool,
}

impl UnitSummary {
    pub fn empty() -> Self {
        Self {
            display: "-".to_string(),
            all_units: Vec::new(),
            has_more: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.all_units.is_empty()
    }

    pub fn from_labels<I>(labels: I, limit: usize) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let all_units: Vec<String> = labels
            .into_iter()
            .filter(|l| !l.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if all_units.is_empty() {
            return Self::empty();
        }

        let mut display = all_units
            .iter()
            .take(limit)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        let has_more = all_units.len() > limit;
        if has_more {
            display.push_str(&format!(" 외 {}개", all_units.len() - limit));
        }

        Self {
            display,
            all_units,
            has_more,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels() {
        assert_eq!(unit_label(Some("101동"), Some("502호")), Some("101동 502호".into()));
        assert_eq!(unit_label(None, Some(" 502호 ")), Some("502호".into()));
        assert_eq!(unit_label(Some(" "), Some("502호")), Some("502호".into()));
        assert_eq!(unit_label(Some("101동"), None), None);
        assert_eq!(unit_label(None, None), None);
    }

    #[test]
    fn empty_form() {
        let s = UnitSummary::from_labels(Vec::new(), UNIT_DISPLAY_LIMIT);
        assert_eq!(s, UnitSummary::empty());
        assert_eq!(s.display, "-");
    }

    #[test]
    fn dedupes_and_sorts() {
        let s = UnitSummary::from_labels(
            ["102동 301호", "101동 301호", "102동 301호"].map(String::from),
            UNIT_DISPLAY_LIMIT,
        );
        assert_eq!(s.all_units, vec!["101동 301호", "102동 301호"]);
        assert_eq!(s.display, "101동 301호, 102동 301호");
        assert!(!s.has_more);
    }

    #[test]
    fn truncates_after_limit() {
        let labels = (1..=15).map(|i| format!("{:03}호", i));
        let s = UnitSummary::from_labels(labels, UNIT_DISPLAY_LIMIT);
        assert_eq!(s.all_units.len(), 15);
        assert!(s.has_more);
        assert!(s.display.ends_with("010호 외 5개"));
        assert!(s.display.starts_with("001호, 002호"));
    }

    #[test]
    fn exactly_limit_has_no_suffix() {
        let labels = (1..=10).map(|i| format!("{:02}호", i));
        let s = UnitSummary::from_labels(labels, UNIT_DISPLAY_LIMIT);
        assert!(!s.has_more);
        assert!(!s.display.contains('외'));
    }
}
