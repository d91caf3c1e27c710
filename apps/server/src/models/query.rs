//! Query inputs for the rent tables

use serde::Serialize;

/// Which rows of a rent table a query covers.
#[derive(Debug, Clone, PartialEq)]
pub enum RegionScope {
    /// `sggcd IN (..)`, optionally narrowed by `umdnm IN (..)`.
    Districts {
        districts: Vec<String>,
        neighborhoods: Vec<String>,
    },
    /// `(sggcd = x AND umdnm LIKE 'name%')` per pair; a 읍/면 prefix also covers its 리.
    NeighborhoodPrefixes(Vec<(String, String)>),
    /// One address, optionally down to the lot and building name.
    Address {
        district: String,
        neighborhood: String,
        lot: Option<String>,
        building_name: Option<String>,
    },
}

impl RegionScope {
    /// A scope that can only match nothing. Callers short-circuit on it.
    pub fn is_empty(&self) -> bool {
        match self {
            RegionScope::Districts { districts, .. } => districts.is_empty(),
            RegionScope::NeighborhoodPrefixes(pairs) => pairs.is_empty(),
            RegionScope::Address { .. } => false,
        }
    }
}

/// Contract-end filter on the `start~end` term column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractEnd {
    /// The end part equals the month exactly.
    EndsOn(String),
    /// The whole term ends with the month (`LIKE '%..'`).
    Suffix(String),
}

impl ContractEnd {
    pub fn raw(&self) -> &str {
        match self {
            ContractEnd::EndsOn(v) | ContractEnd::Suffix(v) => v,
        }
    }
}

/// Inclusive numeric bounds; `None` leaves that side open.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds<T> {
    pub min: Option<T>,
    pub max: Option<T>,
}

impl<T> Bounds<T> {
    pub fn new(min: Option<T>, max: Option<T>) -> Self {
        Self { min, max }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransactionFilter {
    pub region: RegionScope,
    pub contract_end: Option<ContractEnd>,
    pub area: Bounds<f64>,
    pub deposit: Bounds<i64>,
    pub monthly_rent: Bounds<i64>,
    pub build_year: Bounds<i32>,
    pub page: u32,
    pub page_size: u32,
}

impl TransactionFilter {
    pub fn new(region: RegionScope, page: u32, page_size: u32) -> Self {
        Self {
            region,
            contract_end: None,
            area: Bounds::default(),
            deposit: Bounds::default(),
            monthly_rent: Bounds::default(),
            build_year: Bounds::default(),
            page: page.max(1),
            page_size,
        }
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.page_size)
    }
}

/// One `(sggcd, umdnm, jibun, name)` combination found by the building autocomplete.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, sqlx::FromRow)]
pub struct BuildingCandidate {
    pub sgg_code: Option<String>,
    pub umd_name: Option<String>,
    pub jibun: Option<String>,
    pub building_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_starts_at_zero() {
        let scope = RegionScope::Districts {
            districts: vec!["11680".into()],
            neighborhoods: vec![],
        };
        assert_eq!(TransactionFilter::new(scope.clone(), 1, 10).offset(), 0);
        assert_eq!(TransactionFilter::new(scope.clone(), 3, 10).offset(), 20);
        assert_eq!(TransactionFilter::new(scope, 0, 10).offset(), 0);
    }

    #[test]
    fn empty_scopes() {
        assert!(RegionScope::Districts {
            districts: vec![],
            neighborhoods: vec!["도곡동".into()],
        }
        .is_empty());
        assert!(RegionScope::NeighborhoodPrefixes(vec![]).is_empty());
    }
}
