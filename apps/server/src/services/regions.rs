//! Region pickers
//!
//! `/api/locations/*` lists names straight from the region index. `/api/regions/*`
//! lists only codes and neighborhoods that actually occur in the rent tables.

use jeonse_region::RegionIndex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::{db::TransactionSource, Error, Result};

pub const MISSING_SIDO: &str = "시도가 선택되지 않았습니다.";
pub const MISSING_SIDO_OR_SIGUNGU: &str = "시도 또는 시군구가 선택되지 않았습니다.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionOption {
    pub code: String,
    pub name: String,
}

pub struct RegionService {
    regions: Arc<RegionIndex>,
    source: Arc<dyn TransactionSource>,
}

impl RegionService {
    pub fn new(regions: Arc<RegionIndex>, source: Arc<dyn TransactionSource>) -> Self {
        Self { regions, source }
    }

    pub fn province_names(&self) -> Vec<String> {
        self.regions
            .province_names()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub fn district_names(&self, province: Option<&str>) -> Result<Vec<String>> {
        let province = province
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| Error::Validation(MISSING_SIDO.into()))?;
        Ok(self
            .regions
            .district_names(province)
            .into_iter()
            .map(str::to_string)
            .collect())
    }

    /// Neighborhood names per selected district name. Districts without any
    /// neighborhood are left out of the map.
    pub fn neighborhoods_by_district(
        &self,
        province: Option<&str>,
        districts: &[String],
    ) -> Result<BTreeMap<String, Vec<String>>> {
        let province = province.map(str::trim).filter(|p| !p.is_empty());
        let districts: Vec<&str> = districts
            .iter()
            .map(|d| d.trim())
            .filter(|d| !d.is_empty())
            .collect();
        let Some(province) = province.filter(|_| !districts.is_empty()) else {
            return Err(Error::Validation(MISSING_SIDO_OR_SIGUNGU.into()));
        };

        let mut result = BTreeMap::new();
        for name in districts {
            let neighborhoods: BTreeSet<&str> = self
                .regions
                .district_codes_by_name(name, Some(province))
                .into_iter()
                .flat_map(|code| self.regions.neighborhood_names(code))
                .collect();
            if !neighborhoods.is_empty() {
                result.insert(
                    name.to_string(),
                    neighborhoods.into_iter().map(str::to_string).collect(),
                );
            }
        }
        Ok(result)
    }

    pub fn provinces(&self) -> Vec<RegionOption> {
        self.regions
            .provinces()
            .map(|(code, name)| RegionOption {
                code: code.to_string(),
                name: name.to_string(),
            })
            .collect()
    }

    /// Districts with transactions under a province code. Unknown codes are
    /// listed under their own code.
    pub async fn districts_with_transactions(&self, province_code: &str) -> Result<Vec<RegionOption>> {
        let codes: BTreeSet<String> = self
            .source
            .district_codes(province_code.trim())
            .await?
            .into_iter()
            .collect();
        Ok(codes
            .into_iter()
            .map(|code| {
                let name = self
                    .regions
                    .district(&code)
                    .map(|d| d.name.clone())
                    .unwrap_or_else(|| code.clone());
                RegionOption { code, name }
            })
            .collect())
    }

    /// Neighborhood names with transactions in one district. The name doubles as the code.
    pub async fn neighborhoods_with_transactions(&self, district_code: &str) -> Result<Vec<RegionOption>> {
        let names: BTreeSet<String> = self
            .source
            .neighborhood_names(district_code.trim())
            .await?
            .into_iter()
            .filter(|n| !n.trim().is_empty())
            .collect();
        Ok(names
            .into_iter()
            .map(|name| RegionOption {
                code: name.clone(),
                name,
            })
            .collect())
    }
}
