//! Request bodies and query strings accepted by the API

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::str::FromStr;

fn default_true() -> bool {
    true
}

/// Accept a number, a numeric string, blank, or null. Anything unparsable is `None`.
///
/// Clients send filter values straight from text inputs, so `""`, `"5000"` and
/// `5000` all occur.
pub fn lenient_number<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.to_string().parse().ok().or_else(|| {
            // 5000.0 for an integer field
            n.as_f64()
                .filter(|f| f.is_finite())
                .and_then(|f| format!("{}", f.trunc()).parse().ok())
        }),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn trimmed(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// `POST /api/search`: region by names.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchRequest {
    #[serde(default = "default_true")]
    pub include_apt: bool,
    #[serde(default = "default_true")]
    pub include_villa: bool,
    #[serde(default = "default_true")]
    pub include_officetel: bool,
    #[serde(default = "default_true")]
    pub include_dagagu: bool,
    #[serde(default)]
    pub contract_end: Option<String>,
    #[serde(default)]
    pub sido: Option<String>,
    #[serde(default)]
    pub sigungu: Vec<String>,
    #[serde(default)]
    pub umd: Vec<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub area_min: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub area_max: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub deposit_min: Option<i64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub deposit_max: Option<i64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub rent_min: Option<i64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub rent_max: Option<i64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub build_year_min: Option<i32>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub build_year_max: Option<i32>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub page: Option<u32>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub page_size: Option<u32>,
}

impl SearchRequest {
    pub fn contract_end(&self) -> Option<&str> {
        trimmed(&self.contract_end)
    }

    pub fn sido(&self) -> Option<&str> {
        trimmed(&self.sido)
    }
}

/// `POST /api/transactions`: region by administrative codes.
#[derive(Debug, Clone, Deserialize)]
pub struct LegacySearchRequest {
    #[serde(default = "default_true")]
    pub include_apt: bool,
    #[serde(default = "default_true")]
    pub include_villa: bool,
    #[serde(default = "default_true")]
    pub include_officetel: bool,
    #[serde(default = "default_true")]
    pub include_dagagu: bool,
    #[serde(default)]
    pub contract_end: Option<String>,
    #[serde(default)]
    pub sido_code: Option<String>,
    #[serde(default)]
    pub sgg_codes: Vec<String>,
    #[serde(default)]
    pub umd_codes: Vec<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub deposit_min: Option<i64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub deposit_max: Option<i64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub rent_min: Option<i64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub rent_max: Option<i64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub build_year_min: Option<i32>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub build_year_max: Option<i32>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub page: Option<u32>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub page_size: Option<u32>,
}

impl LegacySearchRequest {
    pub fn contract_end(&self) -> Option<&str> {
        trimmed(&self.contract_end)
    }

    pub fn sido_code(&self) -> Option<&str> {
        trimmed(&self.sido_code)
    }

    pub fn included_types(&self) -> usize {
        [
            self.include_apt,
            self.include_villa,
            self.include_officetel,
            self.include_dagagu,
        ]
        .into_iter()
        .filter(|included| *included)
        .count()
    }
}

/// `GET|POST /api/building-transactions`. The query string names the district
/// `sgg_code`, JSON bodies use `sigungu_code`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuildingTransactionsRequest {
    #[serde(default)]
    pub building_name: Option<String>,
    #[serde(default)]
    pub property_type: Option<String>,
    #[serde(default, alias = "sgg_code")]
    pub sigungu_code: Option<String>,
    #[serde(default)]
    pub umd_name: Option<String>,
    #[serde(default)]
    pub jibun: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub page: Option<u32>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub page_size: Option<u32>,
}

impl BuildingTransactionsRequest {
    pub fn building_name(&self) -> Option<&str> {
        trimmed(&self.building_name)
    }

    pub fn property_type(&self) -> Option<&str> {
        trimmed(&self.property_type)
    }

    pub fn sigungu_code(&self) -> Option<&str> {
        trimmed(&self.sigungu_code)
    }

    pub fn umd_name(&self) -> Option<&str> {
        trimmed(&self.umd_name)
    }

    pub fn jibun(&self) -> Option<&str> {
        trimmed(&self.jibun)
    }
}

/// `POST /api/unit-info`. Floor and area arrive as numbers or strings.
#[derive(Debug, Clone, Deserialize)]
pub struct UnitInfoRequest {
    #[serde(default)]
    pub sggcd: Option<String>,
    #[serde(default)]
    pub umdnm: Option<String>,
    #[serde(default)]
    pub jibun: Option<String>,
    #[serde(default)]
    pub floor: Option<Value>,
    #[serde(default)]
    pub excluusear: Option<Value>,
}

/// Scalar JSON as text: `5` and `"5"` both become `"5"`.
pub fn scalar_text(value: &Option<Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

impl UnitInfoRequest {
    pub fn sggcd(&self) -> Option<&str> {
        trimmed(&self.sggcd)
    }

    pub fn umdnm(&self) -> Option<&str> {
        trimmed(&self.umdnm)
    }

    pub fn jibun(&self) -> Option<&str> {
        trimmed(&self.jibun)
    }
}

/// `POST /api/owner-info`.
#[derive(Debug, Clone, Deserialize)]
pub struct OwnerInfoRequest {
    #[serde(default)]
    pub sgg_code: Option<String>,
    #[serde(default)]
    pub umd_name: Option<String>,
    #[serde(default)]
    pub jibun: Option<String>,
}

impl OwnerInfoRequest {
    pub fn sgg_code(&self) -> Option<&str> {
        trimmed(&self.sgg_code)
    }

    pub fn umd_name(&self) -> Option<&str> {
        trimmed(&self.umd_name)
    }

    pub fn jibun(&self) -> Option<&str> {
        trimmed(&self.jibun)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SigunguQuery {
    pub sido: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BuildingSearchQuery {
    #[serde(default)]
    pub q: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_filters_are_lenient() {
        let req: SearchRequest = serde_json::from_value(json!({
            "contract_end": "202512",
            "sigungu": ["강남구"],
            "deposit_min": "5000",
            "deposit_max": "",
            "rent_max": 50,
            "area_min": "abc",
            "build_year_min": 1999.0,
            "page": "2"
        }))
        .unwrap();

        assert_eq!(req.deposit_min, Some(5000));
        assert_eq!(req.deposit_max, None);
        assert_eq!(req.rent_max, Some(50));
        assert_eq!(req.area_min, None);
        assert_eq!(req.build_year_min, Some(1999));
        assert_eq!(req.page, Some(2));
        assert!(req.include_apt && req.include_dagagu);
    }

    #[test]
    fn building_request_accepts_both_district_keys() {
        let get: BuildingTransactionsRequest =
            serde_json::from_value(json!({"sgg_code": "11680"})).unwrap();
        let post: BuildingTransactionsRequest =
            serde_json::from_value(json!({"sigungu_code": " 11680 "})).unwrap();
        assert_eq!(get.sigungu_code(), Some("11680"));
        assert_eq!(post.sigungu_code(), Some("11680"));
    }

    #[test]
    fn unit_request_scalars() {
        let req: UnitInfoRequest = serde_json::from_value(json!({
            "sggcd": "11680", "umdnm": "도곡동", "jibun": "17-3",
            "floor": 5, "excluusear": "84.97"
        }))
        .unwrap();
        assert_eq!(scalar_text(&req.floor).as_deref(), Some("5"));
        assert_eq!(scalar_text(&req.excluusear).as_deref(), Some("84.97"));
        assert_eq!(scalar_text(&None), None);
    }

    #[test]
    fn counts_included_types() {
        let req: LegacySearchRequest =
            serde_json::from_value(json!({"include_dagagu": false})).unwrap();
        assert_eq!(req.included_types(), 3);
    }
}
