//! Rent transaction searches
//!
//! Each search runs one page query per included property type and hands the
//! combined rows to the enrichment service in a single pass.

use jeonse_keys::format_money;
use jeonse_region::{abbreviate_province, AdminCode};
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::{Arc, OnceLock};

use crate::{
    config::SearchConfig,
    db::TransactionSource,
    models::{
        Bounds, BuildingTransactionsRequest, ContractEnd, LegacySearchRequest, PropertyType,
        RegionScope, SearchRequest, TransactionFilter, TransactionRecord, TransactionRow,
    },
    services::EnrichmentService,
    Error, Result,
};

pub const MISSING_CONTRACT_END: &str = "계약만기시기를 선택해주세요.";
pub const MISSING_SIGUNGU: &str = "최소 1개 이상의 시군구를 선택해주세요.";
pub const MISSING_REGION: &str = "지역을 선택해주세요.";
pub const MISSING_ADDRESS: &str = "주택유형, 시군구코드, 읍면동은 필수입니다.";
pub const INVALID_PROPERTY_TYPE: &str = "잘못된 주택 유형입니다.";
pub const QUERY_TOO_SHORT: &str = "검색어는 최소 2글자 이상 입력해주세요.";
pub const QUERY_NEEDS_LOT: &str = "읍면동명과 지번을 함께 입력해주세요.";

/// `"역삼동 123"`, `"역삼동123-4"`: a neighborhood name then a lot prefix.
fn address_query() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^([^\d\s]+)\s*(.+)$").expect("static pattern"))
}

/// Split an autocomplete query into `(neighborhood, lot prefix)`.
pub fn parse_address_query(query: &str) -> Result<(&str, &str)> {
    let query = query.trim();
    if query.chars().count() < 2 {
        return Err(Error::Validation(QUERY_TOO_SHORT.into()));
    }
    let caps = address_query()
        .captures(query)
        .ok_or_else(|| Error::Validation(QUERY_NEEDS_LOT.into()))?;
    match (caps.get(1), caps.get(2)) {
        (Some(neighborhood), Some(lot)) => Ok((neighborhood.as_str(), lot.as_str().trim())),
        _ => Err(Error::Validation(QUERY_NEEDS_LOT.into())),
    }
}

const LEGACY_PAGE_SIZE: u32 = 20;

#[derive(Debug, Clone, Serialize)]
pub struct SearchPage {
    pub data: Vec<TransactionRecord>,
    pub count: usize,
    pub has_more: bool,
}

impl SearchPage {
    fn new(data: Vec<TransactionRecord>, has_more: bool) -> Self {
        Self {
            count: data.len(),
            data,
            has_more,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LegacyPage {
    pub data: Vec<TransactionRecord>,
    pub count: usize,
    pub page: u32,
    pub page_size: u32,
    pub has_more: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildingSuggestion {
    pub sgg_code: String,
    pub umd_name: String,
    pub jibun: String,
    pub building_name: String,
    pub property_type: &'static str,
    pub sido: String,
    pub sigungu: String,
    pub full_address: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildingPage {
    pub data: Vec<TransactionRecord>,
    pub count: usize,
    pub has_more: bool,
    pub building_name: String,
    pub address: String,
}

fn included(apt: bool, villa: bool, officetel: bool, dagagu: bool) -> Vec<PropertyType> {
    [
        (apt, PropertyType::Apartment),
        (villa, PropertyType::Villa),
        (officetel, PropertyType::Officetel),
        (dagagu, PropertyType::SingleFamily),
    ]
    .into_iter()
    .filter_map(|(on, p)| on.then_some(p))
    .collect()
}

fn format_row_money(row: &mut TransactionRow) {
    for field in [
        &mut row.deposit,
        &mut row.monthly_rent,
        &mut row.previous_deposit,
        &mut row.previous_monthly_rent,
    ] {
        if let Some(value) = field.as_mut().filter(|v| !v.trim().is_empty()) {
            *value = format_money(value);
        }
    }
}

/// `(contract month, contract day)` for newest-first sorting.
fn recency(record: &TransactionRecord) -> (String, u32) {
    let month = record.row.contract_month.clone().unwrap_or_default();
    let day = record
        .row
        .contract_day
        .as_deref()
        .and_then(|d| d.trim().parse().ok())
        .unwrap_or(0);
    (month, day)
}

pub struct SearchService {
    source: Arc<dyn TransactionSource>,
    enrichment: Arc<EnrichmentService>,
    config: SearchConfig,
}

impl SearchService {
    pub fn new(
        source: Arc<dyn TransactionSource>,
        enrichment: Arc<EnrichmentService>,
        config: SearchConfig,
    ) -> Self {
        Self {
            source,
            enrichment,
            config,
        }
    }

    fn page_size(&self, requested: Option<u32>, default: u32) -> u32 {
        requested
            .unwrap_or(default)
            .clamp(1, self.config.max_page_size.max(1))
    }

    /// Pages of each type in order; a failing single-family query is logged and left out.
    async fn fetch_types(
        &self,
        types: &[PropertyType],
        filter: &TransactionFilter,
    ) -> Result<(Vec<TransactionRow>, Vec<usize>)> {
        let mut rows = Vec::new();
        let mut counts = Vec::new();
        for &property_type in types {
            match self.source.fetch(property_type, filter).await {
                Ok(page) => {
                    tracing::debug!(property_type = property_type.label(), rows = page.len(), "Fetched page");
                    counts.push(page.len());
                    rows.extend(page);
                }
                Err(e) if property_type == PropertyType::SingleFamily => {
                    tracing::warn!(error = %e, "Single-family query failed, continuing without it");
                }
                Err(e) => return Err(e),
            }
        }
        Ok((rows, counts))
    }

    /// Search by region names and contract end month.
    pub async fn search(&self, req: SearchRequest) -> Result<SearchPage> {
        let contract_end = req
            .contract_end()
            .ok_or_else(|| Error::Validation(MISSING_CONTRACT_END.into()))?
            .to_string();
        if req.sigungu.iter().all(|s| s.trim().is_empty()) {
            return Err(Error::Validation(MISSING_SIGUNGU.into()));
        }

        let regions = self.enrichment.regions();
        let mut districts: Vec<String> = Vec::new();
        for name in &req.sigungu {
            for code in regions.district_codes_by_name(name.trim(), req.sido()) {
                if !districts.iter().any(|d| d == code) {
                    districts.push(code.to_string());
                }
            }
        }
        if districts.is_empty() {
            tracing::debug!(sigungu = ?req.sigungu, sido = ?req.sido(), "No district matches the selected names");
            return Ok(SearchPage::new(Vec::new(), false));
        }

        let page_size = self.page_size(req.page_size, self.config.default_page_size);
        let neighborhoods = req
            .umd
            .iter()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .collect();
        let mut filter = TransactionFilter::new(
            RegionScope::Districts {
                districts,
                neighborhoods,
            },
            req.page.unwrap_or(1),
            page_size,
        );
        filter.contract_end = Some(ContractEnd::EndsOn(contract_end));
        filter.area = Bounds::new(req.area_min, req.area_max);
        filter.deposit = Bounds::new(req.deposit_min, req.deposit_max);
        filter.monthly_rent = Bounds::new(req.rent_min, req.rent_max);
        filter.build_year = Bounds::new(req.build_year_min, req.build_year_max);

        let types = included(
            req.include_apt,
            req.include_villa,
            req.include_officetel,
            req.include_dagagu,
        );
        let (rows, counts) = self.fetch_types(&types, &filter).await?;
        let has_more = counts.iter().any(|&c| c == page_size as usize);
        let data = self.enrichment.enrich(rows).await?;

        tracing::info!(results = data.len(), has_more, "Search completed");
        Ok(SearchPage::new(data, has_more))
    }

    /// Search by administrative codes. Money fields come back formatted for display.
    pub async fn legacy_search(&self, req: LegacySearchRequest) -> Result<LegacyPage> {
        let regions = self.enrichment.regions();
        let umd_codes: Vec<&str> = req
            .umd_codes
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .collect();
        let sgg_codes: Vec<String> = req
            .sgg_codes
            .iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();

        let region = if !umd_codes.is_empty() {
            let pairs: Vec<(String, String)> = umd_codes
                .iter()
                .filter_map(|c| AdminCode::parse(c))
                .filter_map(|c| regions.neighborhood(&c))
                .map(|n| (n.district_code.clone(), n.name.clone()))
                .collect();
            if pairs.is_empty() {
                tracing::debug!(umd_codes = ?umd_codes, "No neighborhood matches the selected codes");
                return Err(Error::Validation(MISSING_REGION.into()));
            }
            RegionScope::NeighborhoodPrefixes(pairs)
        } else if !sgg_codes.is_empty() {
            RegionScope::Districts {
                districts: sgg_codes,
                neighborhoods: Vec::new(),
            }
        } else if let Some(sido_code) = req.sido_code() {
            RegionScope::Districts {
                districts: regions
                    .district_codes_in_province(sido_code)
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
                neighborhoods: Vec::new(),
            }
        } else {
            return Err(Error::Validation(MISSING_REGION.into()));
        };

        let page = req.page.unwrap_or(1).max(1);
        let page_size = self.page_size(req.page_size, LEGACY_PAGE_SIZE);
        let mut filter = TransactionFilter::new(region, page, page_size);
        filter.contract_end = req
            .contract_end()
            .map(|c| ContractEnd::Suffix(c.to_string()));
        filter.deposit = Bounds::new(req.deposit_min, req.deposit_max);
        filter.monthly_rent = Bounds::new(req.rent_min, req.rent_max);
        filter.build_year = Bounds::new(req.build_year_min, req.build_year_max);

        let types = included(
            req.include_apt,
            req.include_villa,
            req.include_officetel,
            req.include_dagagu,
        );
        let (rows, _) = self.fetch_types(&types, &filter).await?;

        let mut data: Vec<TransactionRecord> = rows
            .into_iter()
            .map(|mut row| {
                format_row_money(&mut row);
                self.enrichment.with_region_names(row)
            })
            .collect();
        data.sort_by(|a, b| recency(b).cmp(&recency(a)));

        let has_more = data.len() == page_size as usize * req.included_types();
        Ok(LegacyPage {
            count: data.len(),
            data,
            page,
            page_size,
            has_more,
        })
    }

    /// Every transaction at one address, newest first.
    pub async fn building_transactions(
        &self,
        req: BuildingTransactionsRequest,
    ) -> Result<BuildingPage> {
        let (Some(label), Some(district), Some(neighborhood)) =
            (req.property_type(), req.sigungu_code(), req.umd_name())
        else {
            return Err(Error::Validation(MISSING_ADDRESS.into()));
        };
        let property_type = PropertyType::from_label(label)
            .ok_or_else(|| Error::Validation(INVALID_PROPERTY_TYPE.into()))?;

        let page_size = self.page_size(req.page_size, self.config.building_page_size);
        let filter = TransactionFilter::new(
            RegionScope::Address {
                district: district.to_string(),
                neighborhood: neighborhood.to_string(),
                lot: req.jibun().map(str::to_string),
                building_name: req.building_name().map(str::to_string),
            },
            req.page.unwrap_or(1),
            page_size,
        );

        let rows = self.source.fetch(property_type, &filter).await?;
        let has_more = rows.len() == page_size as usize;
        let data = self.enrichment.enrich(rows).await?;

        let address = match req.jibun() {
            Some(lot) => format!("{} {}", neighborhood, lot),
            None => neighborhood.to_string(),
        };
        Ok(BuildingPage {
            count: data.len(),
            data,
            has_more,
            building_name: req.building_name().unwrap_or_default().to_string(),
            address,
        })
    }

    /// Address autocomplete over all four tables, in table order, deduplicated.
    pub async fn search_buildings(&self, query: &str) -> Result<Vec<BuildingSuggestion>> {
        let (neighborhood, lot_prefix) = parse_address_query(query)?;
        let limit = self.config.building_search_max_results.max(1) as usize;
        let regions = self.enrichment.regions();

        let mut seen = HashSet::new();
        let mut buildings = Vec::new();
        for property_type in PropertyType::ALL {
            if buildings.len() >= limit {
                break;
            }
            let candidates = self
                .source
                .building_candidates(property_type, neighborhood, lot_prefix, limit as i64)
                .await?;
            for candidate in candidates {
                if buildings.len() >= limit {
                    break;
                }
                let sgg_code = candidate.sgg_code.unwrap_or_default();
                let umd_name = candidate.umd_name.unwrap_or_default();
                let jibun = candidate.jibun.unwrap_or_default();
                let building_name = candidate.building_name.unwrap_or_default();
                let key = (
                    sgg_code.clone(),
                    umd_name.clone(),
                    jibun.clone(),
                    building_name.clone(),
                );
                if !seen.insert(key) {
                    continue;
                }
                let (sido, sigungu) = regions
                    .district(&sgg_code)
                    .map(|d| (abbreviate_province(&d.province), d.name.clone()))
                    .unwrap_or_default();
                let full_address = format!("{} {} {}", umd_name, jibun, building_name)
                    .trim()
                    .to_string();
                buildings.push(BuildingSuggestion {
                    sgg_code,
                    umd_name,
                    jibun,
                    building_name,
                    property_type: property_type.label(),
                    sido,
                    sigungu,
                    full_address,
                });
            }
        }
        tracing::debug!(query, results = buildings.len(), "Building search completed");
        Ok(buildings)
    }
}
