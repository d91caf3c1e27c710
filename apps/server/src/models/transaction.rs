//! Transaction rows as read from the rent tables, and the enriched record returned to clients.

use jeonse_keys::{ApartmentValuation, OfficetelValuation, UnitSummary};
use serde::Serialize;

use super::PropertyType;

/// One row of a rent table. Every column is selected as text so the four
/// tables share one shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, sqlx::FromRow)]
pub struct TransactionRow {
    #[serde(rename = "구분")]
    pub category: String,
    #[serde(rename = "시군구코드")]
    pub district_code: Option<String>,
    #[serde(rename = "읍면동리")]
    pub neighborhood: Option<String>,
    #[serde(rename = "지번")]
    pub lot: Option<String>,
    #[serde(rename = "단지명")]
    pub building_name: Option<String>,
    #[serde(rename = "면적")]
    pub area: Option<String>,
    #[serde(rename = "계약년월")]
    pub contract_month: Option<String>,
    #[serde(rename = "계약일")]
    pub contract_day: Option<String>,
    #[serde(rename = "보증금")]
    pub deposit: Option<String>,
    #[serde(rename = "월세")]
    pub monthly_rent: Option<String>,
    #[serde(rename = "층")]
    pub floor: Option<String>,
    #[serde(rename = "건축년도")]
    pub build_year: Option<String>,
    #[serde(rename = "계약구분")]
    pub contract_type: Option<String>,
    #[serde(rename = "계약기간")]
    pub contract_term: Option<String>,
    #[serde(rename = "종전계약보증금")]
    pub previous_deposit: Option<String>,
    #[serde(rename = "종전계약월세")]
    pub previous_monthly_rent: Option<String>,
    #[serde(rename = "갱신요구권사용")]
    pub renewal_right_used: Option<String>,
}

impl TransactionRow {
    pub fn property_type(&self) -> Option<PropertyType> {
        PropertyType::from_label(&self.category)
    }

    pub fn district_code(&self) -> &str {
        self.district_code.as_deref().unwrap_or_default().trim()
    }

    pub fn neighborhood(&self) -> &str {
        self.neighborhood.as_deref().unwrap_or_default().trim()
    }

    pub fn lot(&self) -> &str {
        self.lot.as_deref().unwrap_or_default()
    }

    pub fn floor(&self) -> &str {
        self.floor.as_deref().unwrap_or_default()
    }

    pub fn area(&self) -> &str {
        self.area.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AppraisalFields {
    #[serde(rename = "공동주택가격")]
    pub price: i64,
    #[serde(rename = "공동주택가격_126퍼센트")]
    pub threshold_126: i64,
}

impl From<ApartmentValuation> for AppraisalFields {
    fn from(v: ApartmentValuation) -> Self {
        Self {
            price: v.price,
            threshold_126: v.threshold_126,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OfficetelPriceFields {
    #[serde(rename = "기준시가_면적당가격")]
    pub unit_price: f64,
    #[serde(rename = "기준시가_전용면적")]
    pub exclusive_area: f64,
    #[serde(rename = "기준시가_공유면적")]
    pub shared_area: f64,
    #[serde(rename = "기준시가_면적계")]
    pub total_area: f64,
    #[serde(rename = "기준시가_총액")]
    pub standard_price: i64,
    #[serde(rename = "기준시가_126퍼센트")]
    pub threshold_126: i64,
}

impl From<OfficetelValuation> for OfficetelPriceFields {
    fn from(v: OfficetelValuation) -> Self {
        Self {
            unit_price: v.unit_price,
            exclusive_area: v.exclusive_area,
            shared_area: v.shared_area,
            total_area: v.total_area,
            standard_price: v.standard_price,
            threshold_126: v.threshold_126,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitFields {
    #[serde(rename = "동호명")]
    pub display: String,
    #[serde(rename = "동호명_전체목록")]
    pub all_units: Vec<String>,
    #[serde(rename = "동호명_더보기")]
    pub has_more: bool,
}

impl From<UnitSummary> for UnitFields {
    fn from(s: UnitSummary) -> Self {
        Self {
            display: s.display,
            all_units: s.all_units,
            has_more: s.has_more,
        }
    }
}

/// A transaction row with region names and whatever enrichment matched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRecord {
    #[serde(flatten)]
    pub row: TransactionRow,
    #[serde(rename = "시도")]
    pub province: String,
    #[serde(rename = "시군구")]
    pub district: String,
    #[serde(flatten)]
    pub appraisal: Option<AppraisalFields>,
    #[serde(flatten)]
    pub officetel_price: Option<OfficetelPriceFields>,
    #[serde(flatten)]
    pub units: Option<UnitFields>,
}

impl TransactionRecord {
    pub fn new(row: TransactionRow) -> Self {
        Self {
            row,
            province: String::new(),
            district: String::new(),
            appraisal: None,
            officetel_price: None,
            units: None,
        }
    }
}
