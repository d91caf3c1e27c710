//! Storage seams for the rent tables and the reference tables

use async_trait::async_trait;
use jeonse_keys::{PriceRowKey, UnitKey};
use std::time::Duration;

use crate::{
    models::{BuildingCandidate, PropertyType, TransactionFilter, TransactionRow},
    Result,
};

/// Read access to the four rent tables.
#[async_trait]
pub trait TransactionSource: Send + Sync {
    /// One page of one table, newest contract first.
    async fn fetch(
        &self,
        property_type: PropertyType,
        filter: &TransactionFilter,
    ) -> Result<Vec<TransactionRow>>;

    /// Distinct district codes starting with `prefix` across all tables.
    async fn district_codes(&self, prefix: &str) -> Result<Vec<String>>;

    /// Distinct non-empty neighborhood names of one district across all tables.
    async fn neighborhood_names(&self, district_code: &str) -> Result<Vec<String>>;

    /// Distinct addresses in one table whose lot starts with `lot_prefix`.
    async fn building_candidates(
        &self,
        property_type: PropertyType,
        neighborhood: &str,
        lot_prefix: &str,
        limit: i64,
    ) -> Result<Vec<BuildingCandidate>>;

    async fn ping(&self) -> Result<()>;
}

/// A `bldg_apartment_price` row that matched one of the batch conditions.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct ApartmentPriceRow {
    pub main: Option<String>,
    pub sub: Option<String>,
    pub floor: Option<String>,
    pub area: Option<f64>,
    pub price: Option<f64>,
}

/// An `officetel_standard_price` row that matched one of the batch conditions.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct OfficetelPriceRow {
    pub bunji: Option<String>,
    pub ho: Option<String>,
    pub floor_marker: Option<String>,
    pub floor_address: Option<String>,
    pub exclusive_area: Option<f64>,
    pub shared_area: Option<f64>,
    pub unit_price: Option<f64>,
}

/// A `bldg_exclusive_area` row: the key columns it matched on plus its dong/ho names.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct UnitIdentityRow {
    pub main: Option<String>,
    pub sub: Option<String>,
    pub floor_code: Option<String>,
    pub floor_no: Option<String>,
    pub area: Option<String>,
    pub dong: Option<String>,
    pub ho: Option<String>,
}

/// Scope of one unit-identity batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitScope {
    /// 5-digit 시군구 code.
    pub district_code: String,
    /// Last five digits of the 10-digit legal-dong code.
    pub neighborhood_part: String,
}

/// One round trip per call: every method receives the full, deduplicated
/// condition list of a scope group and never an empty one.
#[async_trait]
pub trait ReferenceStore: Send + Sync {
    async fn apartment_prices(
        &self,
        admin_code: &str,
        keys: &[PriceRowKey],
    ) -> Result<Vec<ApartmentPriceRow>>;

    async fn officetel_prices(
        &self,
        district_code: &str,
        keys: &[PriceRowKey],
    ) -> Result<Vec<OfficetelPriceRow>>;

    /// At most `rows_per_key` rows for each key, whatever the other keys match.
    /// Must give up after `timeout` with [`crate::Error::QueryTimeout`].
    async fn unit_identities(
        &self,
        scope: &UnitScope,
        keys: &[UnitKey],
        rows_per_key: i64,
        timeout: Duration,
    ) -> Result<Vec<UnitIdentityRow>>;
}
