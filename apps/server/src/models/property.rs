use serde::{Deserialize, Serialize};

/// The four rent transaction tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PropertyType {
    #[serde(rename = "아파트")]
    Apartment,
    #[serde(rename = "연립다세대")]
    Villa,
    #[serde(rename = "오피스텔")]
    Officetel,
    #[serde(rename = "단독다가구")]
    SingleFamily,
}

impl PropertyType {
    pub const ALL: [PropertyType; 4] = [
        PropertyType::Apartment,
        PropertyType::Villa,
        PropertyType::Officetel,
        PropertyType::SingleFamily,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PropertyType::Apartment => "아파트",
            PropertyType::Villa => "연립다세대",
            PropertyType::Officetel => "오피스텔",
            PropertyType::SingleFamily => "단독다가구",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.label() == label.trim())
    }

    pub fn table(self) -> &'static str {
        match self {
            PropertyType::Apartment => "apt_rent_transactions",
            PropertyType::Villa => "villa_rent_transactions",
            PropertyType::Officetel => "officetel_rent_transactions",
            PropertyType::SingleFamily => "dagagu_rent_transactions",
        }
    }

    /// Building-name column; single-family rows use a positional road-name column instead.
    pub fn name_column(self) -> Option<&'static str> {
        match self {
            PropertyType::Apartment => Some("aptnm"),
            PropertyType::Villa => Some("mhousename"),
            PropertyType::Officetel => Some("offinm"),
            PropertyType::SingleFamily => None,
        }
    }

    /// Apartment and villa rows are priced from the appraisal table.
    pub fn uses_appraisal_price(self) -> bool {
        matches!(self, PropertyType::Apartment | PropertyType::Villa)
    }

    pub fn uses_officetel_price(self) -> bool {
        self == PropertyType::Officetel
    }

    /// Single-family houses have no dong/ho units.
    pub fn has_units(self) -> bool {
        self != PropertyType::SingleFamily
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_round_trip() {
        for p in PropertyType::ALL {
            assert_eq!(PropertyType::from_label(p.label()), Some(p));
        }
        assert_eq!(PropertyType::from_label("상가"), None);
    }

    #[test]
    fn serde_uses_korean_labels() {
        let json = serde_json::to_string(&PropertyType::Officetel).unwrap();
        assert_eq!(json, "\"오피스텔\"");
        let back: PropertyType = serde_json::from_str("\"연립다세대\"").unwrap();
        assert_eq!(back, PropertyType::Villa);
    }

    #[test]
    fn enrichment_routing() {
        assert!(PropertyType::Villa.uses_appraisal_price());
        assert!(!PropertyType::Officetel.uses_appraisal_price());
        assert!(PropertyType::Officetel.uses_officetel_price());
        assert!(!PropertyType::SingleFamily.has_units());
    }
}
