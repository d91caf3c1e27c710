//! In-memory storage and a router harness for integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use jeonse::{
    api::create_router,
    config::Config,
    db::{
        ApartmentPriceRow, OfficetelPriceRow, ReferenceStore, TransactionSource, UnitIdentityRow,
        UnitScope,
    },
    models::{BuildingCandidate, PropertyType, TransactionFilter, TransactionRow},
    services::EnrichmentService,
    state::AppState,
    Error, Result,
};
use jeonse_keys::{PriceRowKey, UnitKey};
use jeonse_region::RegionIndex;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

pub const REGION_CSV: &str = "\u{feff}법정동코드,시도명,시군구명,읍면동명,리명,삭제일자
1100000000,서울특별시,,,,
1168000000,서울특별시,강남구,,,
1168010300,서울특별시,강남구,개포동,,
1168011800,서울특별시,강남구,도곡동,,
1114000000,서울특별시,중구,,,
1114010100,서울특별시,중구,무교동,,
2600000000,부산광역시,,,,
2611000000,부산광역시,중구,,,
2611010100,부산광역시,중구,영주동,,
";

pub fn regions() -> RegionIndex {
    RegionIndex::from_reader(REGION_CSV.as_bytes()).expect("fixture CSV loads")
}

pub fn row(category: PropertyType, district: &str, neighborhood: &str, lot: &str, floor: &str, area: &str) -> TransactionRow {
    TransactionRow {
        category: category.label().to_string(),
        district_code: Some(district.to_string()),
        neighborhood: Some(neighborhood.to_string()),
        lot: Some(lot.to_string()),
        floor: Some(floor.to_string()),
        area: Some(area.to_string()),
        contract_month: Some("202401".to_string()),
        contract_day: Some("15".to_string()),
        deposit: Some("35,000".to_string()),
        monthly_rent: Some("0".to_string()),
        ..Default::default()
    }
}

pub fn apartment_price(main: &str, sub: &str, floor: &str, area: f64, price: f64) -> ApartmentPriceRow {
    ApartmentPriceRow {
        main: Some(main.into()),
        sub: Some(sub.into()),
        floor: Some(floor.into()),
        area: Some(area),
        price: Some(price),
    }
}

pub fn unit_row(main: &str, sub: &str, floor_code: &str, floor_no: &str, area: &str, dong: Option<&str>, ho: Option<&str>) -> UnitIdentityRow {
    UnitIdentityRow {
        main: Some(main.into()),
        sub: Some(sub.into()),
        floor_code: Some(floor_code.into()),
        floor_no: Some(floor_no.into()),
        area: Some(area.into()),
        dong: dong.map(str::to_string),
        ho: ho.map(str::to_string),
    }
}

/// One recorded reference round trip.
#[derive(Debug, Clone, PartialEq)]
pub enum ReferenceCall {
    Apartment { admin_code: String, keys: Vec<PriceRowKey> },
    Officetel { district_code: String, keys: Vec<PriceRowKey> },
    Units { scope: UnitScope, keys: Vec<UnitKey>, rows_per_key: i64 },
}

/// Price queries return every configured row, the way a table holding only
/// matching rows would. Unit queries filter by key and keep at most
/// `rows_per_key` distinct rows per key in dong/ho order.
#[derive(Default)]
pub struct FakeReferenceStore {
    pub apartment: Vec<ApartmentPriceRow>,
    pub officetel: Vec<OfficetelPriceRow>,
    pub units: Vec<UnitIdentityRow>,
    /// Sleep this long before answering a unit query.
    pub unit_delay: Option<Duration>,
    /// Answer unit queries as if Postgres cancelled the statement.
    pub unit_statement_timeout: bool,
    pub calls: Mutex<Vec<ReferenceCall>>,
}

impl FakeReferenceStore {
    pub fn calls(&self) -> Vec<ReferenceCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReferenceStore for FakeReferenceStore {
    async fn apartment_prices(&self, admin_code: &str, keys: &[PriceRowKey]) -> Result<Vec<ApartmentPriceRow>> {
        self.calls.lock().unwrap().push(ReferenceCall::Apartment {
            admin_code: admin_code.to_string(),
            keys: keys.to_vec(),
        });
        Ok(self.apartment.clone())
    }

    async fn officetel_prices(&self, district_code: &str, keys: &[PriceRowKey]) -> Result<Vec<OfficetelPriceRow>> {
        self.calls.lock().unwrap().push(ReferenceCall::Officetel {
            district_code: district_code.to_string(),
            keys: keys.to_vec(),
        });
        Ok(self.officetel.clone())
    }

    async fn unit_identities(
        &self,
        scope: &UnitScope,
        keys: &[UnitKey],
        rows_per_key: i64,
        _timeout: Duration,
    ) -> Result<Vec<UnitIdentityRow>> {
        self.calls.lock().unwrap().push(ReferenceCall::Units {
            scope: scope.clone(),
            keys: keys.to_vec(),
            rows_per_key,
        });
        if self.unit_statement_timeout {
            return Err(Error::QueryTimeout("unit identity lookup".into()));
        }
        if let Some(delay) = self.unit_delay {
            tokio::time::sleep(delay).await;
        }

        let mut ranked: BTreeMap<UnitKey, BTreeSet<(Option<String>, Option<String>)>> = BTreeMap::new();
        for r in &self.units {
            let (Some(main), Some(sub), Some(floor_code), Some(floor_no), Some(area)) =
                (&r.main, &r.sub, &r.floor_code, &r.floor_no, &r.area)
            else {
                continue;
            };
            let Some(key) = UnitKey::from_reference(main, sub, floor_code, floor_no, area) else {
                continue;
            };
            if keys.contains(&key) {
                ranked.entry(key).or_default().insert((r.dong.clone(), r.ho.clone()));
            }
        }

        let cap = usize::try_from(rows_per_key).unwrap_or(usize::MAX);
        Ok(ranked
            .into_iter()
            .flat_map(|(key, units)| {
                units.into_iter().take(cap).map(move |(dong, ho)| UnitIdentityRow {
                    main: Some(key.main.clone()),
                    sub: Some(key.sub.clone()),
                    floor_code: Some(key.floor_class.unit_code().to_string()),
                    floor_no: Some(key.floor_no.clone()),
                    area: Some(key.area.clone()),
                    dong,
                    ho,
                })
            })
            .collect())
    }
}

#[derive(Default)]
pub struct FakeTransactionSource {
    pub pages: Vec<(PropertyType, Vec<TransactionRow>)>,
    pub failing: Vec<PropertyType>,
    pub candidates: Vec<(PropertyType, Vec<BuildingCandidate>)>,
    pub district_codes: Vec<String>,
    pub neighborhoods: Vec<String>,
    pub database_down: bool,
    pub filters: Mutex<Vec<(PropertyType, TransactionFilter)>>,
}

impl FakeTransactionSource {
    pub fn filters(&self) -> Vec<(PropertyType, TransactionFilter)> {
        self.filters.lock().unwrap().clone()
    }
}

#[async_trait]
impl TransactionSource for FakeTransactionSource {
    async fn fetch(&self, property_type: PropertyType, filter: &TransactionFilter) -> Result<Vec<TransactionRow>> {
        self.filters
            .lock()
            .unwrap()
            .push((property_type, filter.clone()));
        if self.failing.contains(&property_type) {
            return Err(Error::Internal("table unavailable".into()));
        }
        Ok(self
            .pages
            .iter()
            .find(|(p, _)| *p == property_type)
            .map(|(_, rows)| rows.clone())
            .unwrap_or_default())
    }

    async fn district_codes(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .district_codes
            .iter()
            .filter(|c| c.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn neighborhood_names(&self, _district_code: &str) -> Result<Vec<String>> {
        Ok(self.neighborhoods.clone())
    }

    async fn building_candidates(
        &self,
        property_type: PropertyType,
        _neighborhood: &str,
        _lot_prefix: &str,
        limit: i64,
    ) -> Result<Vec<BuildingCandidate>> {
        Ok(self
            .candidates
            .iter()
            .find(|(p, _)| *p == property_type)
            .map(|(_, c)| c.iter().take(limit as usize).cloned().collect())
            .unwrap_or_default())
    }

    async fn ping(&self) -> Result<()> {
        if self.database_down {
            return Err(Error::Internal("connection refused".into()));
        }
        Ok(())
    }
}

pub fn enrichment(store: Arc<FakeReferenceStore>, config: &Config) -> EnrichmentService {
    EnrichmentService::new(store, Arc::new(regions()), config.enrichment.clone())
}

pub struct TestApp {
    pub router: Router,
    pub transactions: Arc<FakeTransactionSource>,
    pub reference: Arc<FakeReferenceStore>,
}

impl TestApp {
    pub fn new(config: Config, transactions: FakeTransactionSource, reference: FakeReferenceStore) -> Self {
        let transactions = Arc::new(transactions);
        let reference = Arc::new(reference);
        let state = AppState::from_parts(config, regions(), transactions.clone(), reference.clone())
            .expect("state builds");
        Self {
            router: create_router(state),
            transactions,
            reference,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(
            Config::default(),
            FakeTransactionSource::default(),
            FakeReferenceStore::default(),
        )
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> anyhow::Result<(StatusCode, HeaderMap, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(serde_json::to_vec(&json)?)
            }
            None => Body::empty(),
        };
        let response = self.router.clone().oneshot(builder.body(body)?).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await?.to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };
        Ok((status, headers, json))
    }
}

pub fn assert_status(actual: StatusCode, expected: StatusCode, context: &str) {
    assert_eq!(actual, expected, "unexpected status for {}", context);
}

/// Percent-encode a query value; URIs in requests must stay ASCII.
pub fn query_escape(value: &str) -> String {
    value
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                (b as char).to_string()
            }
            _ => format!("%{:02X}", b),
        })
        .collect()
}
