//! PostgreSQL-backed `ReferenceStore`: one OR-batched statement per scope group

use async_trait::async_trait;
use jeonse_keys::{FloorClass, PriceRowKey, UnitKey};
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::time::Duration;

use crate::{
    db::traits::{
        ApartmentPriceRow, OfficetelPriceRow, ReferenceStore, UnitIdentityRow, UnitScope,
    },
    Error, Result,
};

/// Matches digit-only text that still fits a BIGINT.
const INTEGER_TEXT: &str = "'^[0-9]{1,18}$'";

/// PostgreSQL-backed ReferenceStore implementation
#[derive(Clone)]
pub struct PostgresReferenceStore {
    pub(crate) pool: PgPool,
}

impl PostgresReferenceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// `CASE WHEN col ~ '^[0-9]{1,18}$' THEN col::BIGINT END`: non-numeric text becomes
/// NULL instead of failing the whole statement, so it simply never matches.
fn integer_or_null(column: &str) -> String {
    format!(
        "CASE WHEN {col} ~ {re} THEN {col}::BIGINT END",
        col = column,
        re = INTEGER_TEXT
    )
}

pub fn apartment_price_query<'a>(
    admin_code: &'a str,
    keys: &'a [PriceRowKey],
) -> QueryBuilder<'a, Postgres> {
    debug_assert!(!keys.is_empty());
    let mut qb = QueryBuilder::new(
        r#"SELECT DISTINCT "본번"::TEXT AS main, "부번"::TEXT AS sub, "층번호"::TEXT AS floor, "공동주택전유면적"::FLOAT8 AS area, "공시가격"::FLOAT8 AS price FROM bldg_apartment_price WHERE "법정동코드" = "#,
    );
    qb.push_bind(admin_code);
    qb.push(" AND (");
    for (i, key) in keys.iter().enumerate() {
        if i > 0 {
            qb.push(" OR ");
        }
        qb.push(r#"("본번" = "#)
            .push_bind(key.lot.main_text())
            .push(r#" AND "부번" = "#)
            .push_bind(key.lot.sub_text())
            .push(r#" AND "층번호" = "#)
            .push_bind(key.floor.to_string())
            .push(r#" AND "공동주택전유면적"::FLOAT8 = "#)
            .push_bind(key.area.as_f64())
            .push(")");
    }
    // Fixed order makes "first row per key" reproducible.
    qb.push(") ORDER BY main, sub, floor, area, price");
    qb
}

pub fn officetel_price_query<'a>(
    district_code: &'a str,
    keys: &'a [PriceRowKey],
) -> QueryBuilder<'a, Postgres> {
    debug_assert!(!keys.is_empty());
    let bunji = integer_or_null(r#""번지""#);
    let ho = integer_or_null(r#""호""#);
    let floor_address = integer_or_null(r#""상가건물층주소""#);

    let mut qb = QueryBuilder::new(
        r#"SELECT DISTINCT "번지"::TEXT AS bunji, "호"::TEXT AS ho, "건물층구분코드"::TEXT AS floor_marker, "상가건물층주소"::TEXT AS floor_address, "전용면적"::FLOAT8 AS exclusive_area, "공유면적"::FLOAT8 AS shared_area, "고시가격"::FLOAT8 AS unit_price FROM officetel_standard_price WHERE LEFT("법정동코드", 5) = "#,
    );
    qb.push_bind(district_code);
    qb.push(" AND (");
    for (i, key) in keys.iter().enumerate() {
        if i > 0 {
            qb.push(" OR ");
        }
        let (class, magnitude) = FloorClass::split(key.floor);
        qb.push(format!("({} = ", bunji))
            .push_bind(i64::from(key.lot.main))
            .push(format!(" AND {} = ", ho))
            .push_bind(i64::from(key.lot.sub))
            .push(r#" AND "건물층구분코드" = "#)
            .push_bind(class.officetel_marker())
            .push(format!(" AND {} = ", floor_address))
            .push_bind(i64::from(magnitude))
            .push(r#" AND "전용면적"::FLOAT8 = "#)
            .push_bind(key.area.as_f64())
            .push(")");
    }
    qb.push(
        ") ORDER BY bunji, ho, floor_marker, floor_address, exclusive_area, shared_area, unit_price",
    );
    qb
}

/// At most `rows_per_key` distinct units for each key, taken in dong/ho order.
pub fn unit_identity_query<'a>(
    scope: &'a UnitScope,
    keys: &'a [UnitKey],
    rows_per_key: i64,
) -> QueryBuilder<'a, Postgres> {
    debug_assert!(!keys.is_empty());
    let mut qb = QueryBuilder::new(
        r#"SELECT main, sub, floor_code, floor_no, area, dong, ho FROM (SELECT matched.*, ROW_NUMBER() OVER (PARTITION BY main, sub, floor_code, floor_no, area ORDER BY dong NULLS FIRST, ho NULLS FIRST) AS unit_rank FROM (SELECT DISTINCT "번"::TEXT AS main, "지"::TEXT AS sub, "층_구분_코드"::TEXT AS floor_code, "층_번호"::TEXT AS floor_no, "면적(㎡)"::TEXT AS area, "동_명"::TEXT AS dong, "호_명"::TEXT AS ho FROM bldg_exclusive_area WHERE "전유_공용_구분_코드" = '1' AND "시군구_코드" = "#,
    );
    qb.push_bind(scope.district_code.as_str());
    qb.push(r#" AND "법정동_코드" = "#);
    qb.push_bind(scope.neighborhood_part.as_str());
    qb.push(" AND (");
    for (i, key) in keys.iter().enumerate() {
        if i > 0 {
            qb.push(" OR ");
        }
        qb.push(r#"("번" = "#)
            .push_bind(key.main.as_str())
            .push(r#" AND "지" = "#)
            .push_bind(key.sub.as_str())
            .push(r#" AND "층_구분_코드" = "#)
            .push_bind(key.floor_class.unit_code())
            .push(r#" AND "층_번호" = "#)
            .push_bind(key.floor_no.as_str())
            .push(r#" AND "면적(㎡)" = "#)
            .push_bind(key.area.as_str())
            .push(")");
    }
    qb.push(")) matched) ranked WHERE unit_rank <= ");
    qb.push_bind(rows_per_key);
    qb.push(" ORDER BY main, sub, floor_code, floor_no, area, unit_rank");
    qb
}

#[async_trait]
impl ReferenceStore for PostgresReferenceStore {
    async fn apartment_prices(
        &self,
        admin_code: &str,
        keys: &[PriceRowKey],
    ) -> Result<Vec<ApartmentPriceRow>> {
        let mut qb = apartment_price_query(admin_code, keys);
        qb.build_query_as::<ApartmentPriceRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::from_query(e, "apartment price lookup"))
    }

    async fn officetel_prices(
        &self,
        district_code: &str,
        keys: &[PriceRowKey],
    ) -> Result<Vec<OfficetelPriceRow>> {
        let mut qb = officetel_price_query(district_code, keys);
        qb.build_query_as::<OfficetelPriceRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::from_query(e, "officetel price lookup"))
    }

    async fn unit_identities(
        &self,
        scope: &UnitScope,
        keys: &[UnitKey],
        rows_per_key: i64,
        timeout: Duration,
    ) -> Result<Vec<UnitIdentityRow>> {
        // SET LOCAL keeps the tighter timeout from leaking back into the pool.
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        sqlx::query("SET TRANSACTION READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;
        sqlx::query(&format!(
            "SET LOCAL statement_timeout = '{}ms'",
            timeout.as_millis()
        ))
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        let mut qb = unit_identity_query(scope, keys, rows_per_key);
        let rows = qb
            .build_query_as::<UnitIdentityRow>()
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| Error::from_query(e, "unit identity lookup"))?;

        tx.commit().await.map_err(Error::Database)?;
        Ok(rows)
    }
}
