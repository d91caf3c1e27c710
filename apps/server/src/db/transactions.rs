//! Rent-table queries
//!
//! The apartment, villa and officetel tables share named columns. The
//! single-family table is only addressable by ordinal position, so its column
//! names are read from `information_schema` once and cached.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::{
    db::traits::TransactionSource,
    models::{
        BuildingCandidate, ContractEnd, PropertyType, RegionScope, TransactionFilter,
        TransactionRow,
    },
    Error, Result,
};

/// Positions in the single-family table, 0-based.
mod single_family {
    pub const AREA: usize = 8;
    pub const CONTRACT_MONTH: usize = 10;
    pub const CONTRACT_DAY: usize = 11;
    pub const DEPOSIT: usize = 12;
    pub const MONTHLY_RENT: usize = 13;
    pub const BUILD_YEAR: usize = 14;
    pub const BUILDING_NAME: usize = 15;
    pub const CONTRACT_TERM: usize = 16;
    pub const CONTRACT_TYPE: usize = 17;
    pub const RENEWAL_RIGHT: usize = 18;
    pub const PREVIOUS_DEPOSIT: usize = 19;
    pub const PREVIOUS_RENT: usize = 20;
    pub const MIN_COLUMNS: usize = 21;
}

pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Escape `LIKE` metacharacters; the default escape character is `\`.
pub fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn float_or_null(expr: &str) -> String {
    format!(
        "CASE WHEN TRIM({e}::TEXT) ~ '^[0-9]{{1,12}}(\\.[0-9]+)?$' THEN TRIM({e}::TEXT)::FLOAT8 END",
        e = expr
    )
}

/// Amounts are stored as text with thousands separators ("1,200").
fn money_or_null(expr: &str) -> String {
    format!(
        "CASE WHEN REPLACE(TRIM({e}::TEXT), ',', '') ~ '^[0-9]{{1,18}}$' THEN REPLACE(TRIM({e}::TEXT), ',', '')::BIGINT END",
        e = expr
    )
}

fn integer_or_null(expr: &str) -> String {
    format!(
        "CASE WHEN TRIM({e}::TEXT) ~ '^[0-9]{{1,9}}$' THEN TRIM({e}::TEXT)::INTEGER END",
        e = expr
    )
}

/// Single-family build years are sometimes stored as floats ("1998.0").
fn float_year_or_null(expr: &str) -> String {
    format!(
        "CASE WHEN TRIM({e}::TEXT) ~ '^[0-9]{{1,9}}(\\.[0-9]*)?$' THEN TRIM({e}::TEXT)::FLOAT8::INTEGER END",
        e = expr
    )
}

/// The month the contract term ends on, as stored in the term column:
/// `YY.MM` for the named tables, the raw value for single-family rows.
pub fn contract_end_value(property_type: PropertyType, raw: &str) -> String {
    let raw = raw.trim();
    let is_yyyymm = raw.len() == 6 && raw.bytes().all(|b| b.is_ascii_digit());
    if property_type != PropertyType::SingleFamily && is_yyyymm {
        format!("{}.{}", &raw[2..4], &raw[4..6])
    } else {
        raw.to_string()
    }
}

/// SQL expressions for the logical columns of one rent table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableColumns {
    pub property_type: PropertyType,
    district: String,
    neighborhood: String,
    lot: String,
    building_name: String,
    area: String,
    contract_month: String,
    contract_day: String,
    deposit: String,
    monthly_rent: String,
    floor: String,
    build_year: String,
    build_year_value: String,
    contract_type: String,
    contract_term: String,
    previous_deposit: String,
    previous_monthly_rent: String,
    renewal_right_used: String,
}

impl TableColumns {
    /// Columns of a table with the shared named schema.
    pub fn named(property_type: PropertyType) -> Option<Self> {
        let name_column = property_type.name_column()?;
        Some(Self {
            property_type,
            district: "sggcd".into(),
            neighborhood: "umdnm".into(),
            lot: "jibun".into(),
            building_name: name_column.into(),
            area: "excluusear".into(),
            contract_month: "(dealyear::TEXT || LPAD(dealmonth::TEXT, 2, '0'))".into(),
            contract_day: "dealday".into(),
            deposit: "deposit".into(),
            monthly_rent: "monthlyrent".into(),
            floor: "floor".into(),
            build_year: "buildyear".into(),
            build_year_value: integer_or_null("buildyear"),
            contract_type: "contracttype".into(),
            contract_term: "contractterm".into(),
            previous_deposit: "predeposit".into(),
            previous_monthly_rent: "premonthlyrent".into(),
            renewal_right_used: "userrright".into(),
        })
    }

    /// Columns of the single-family table from its ordered column names.
    pub fn single_family(columns: &[String]) -> Result<Self> {
        use single_family as pos;

        if columns.len() < pos::MIN_COLUMNS {
            return Err(Error::Internal(format!(
                "{} has {} columns, expected at least {}",
                PropertyType::SingleFamily.table(),
                columns.len(),
                pos::MIN_COLUMNS
            )));
        }
        let col = |i: usize| quote_ident(&columns[i]);
        let year = col(pos::BUILD_YEAR);

        Ok(Self {
            property_type: PropertyType::SingleFamily,
            district: "sggcd".into(),
            neighborhood: "umdnm".into(),
            lot: "jibun".into(),
            building_name: col(pos::BUILDING_NAME),
            area: col(pos::AREA),
            contract_month: col(pos::CONTRACT_MONTH),
            contract_day: col(pos::CONTRACT_DAY),
            deposit: col(pos::DEPOSIT),
            monthly_rent: col(pos::MONTHLY_RENT),
            floor: "'-'".into(),
            // Only plausible years are shown.
            build_year: format!(
                "CASE WHEN ({v}) BETWEEN 1800 AND 2200 THEN ({v}) END",
                v = float_year_or_null(&year)
            ),
            build_year_value: float_year_or_null(&year),
            contract_type: col(pos::CONTRACT_TYPE),
            contract_term: col(pos::CONTRACT_TERM),
            previous_deposit: col(pos::PREVIOUS_DEPOSIT),
            previous_monthly_rent: col(pos::PREVIOUS_RENT),
            renewal_right_used: col(pos::RENEWAL_RIGHT),
        })
    }

    fn select_list(&self) -> String {
        let fields: [(&str, &str); 16] = [
            (self.district.as_str(), "district_code"),
            (self.neighborhood.as_str(), "neighborhood"),
            (self.lot.as_str(), "lot"),
            (self.building_name.as_str(), "building_name"),
            (self.area.as_str(), "area"),
            (self.contract_month.as_str(), "contract_month"),
            (self.contract_day.as_str(), "contract_day"),
            (self.deposit.as_str(), "deposit"),
            (self.monthly_rent.as_str(), "monthly_rent"),
            (self.floor.as_str(), "floor"),
            (self.build_year.as_str(), "build_year"),
            (self.contract_type.as_str(), "contract_type"),
            (self.contract_term.as_str(), "contract_term"),
            (self.previous_deposit.as_str(), "previous_deposit"),
            (self.previous_monthly_rent.as_str(), "previous_monthly_rent"),
            (self.renewal_right_used.as_str(), "renewal_right_used"),
        ];
        let mut list = format!("'{}'::TEXT AS category", self.property_type.label());
        for (expr, alias) in fields {
            list.push_str(&format!(", ({})::TEXT AS {}", expr, alias));
        }
        list
    }

    fn day_order(&self) -> String {
        integer_or_null(&self.contract_day)
    }
}

fn push_region<'a>(qb: &mut QueryBuilder<'a, Postgres>, columns: &TableColumns, region: &'a RegionScope) {
    match region {
        RegionScope::Districts {
            districts,
            neighborhoods,
        } => {
            qb.push(format!(" AND {} IN (", columns.district));
            let mut list = qb.separated(", ");
            for code in districts {
                list.push_bind(code.as_str());
            }
            qb.push(")");

            if !neighborhoods.is_empty() {
                qb.push(format!(" AND {} IN (", columns.neighborhood));
                let mut list = qb.separated(", ");
                for name in neighborhoods {
                    list.push_bind(name.as_str());
                }
                qb.push(")");
            }
        }
        RegionScope::NeighborhoodPrefixes(pairs) => {
            qb.push(" AND (");
            for (i, (district, neighborhood)) in pairs.iter().enumerate() {
                if i > 0 {
                    qb.push(" OR ");
                }
                qb.push(format!("({} = ", columns.district))
                    .push_bind(district.as_str())
                    .push(format!(" AND {} LIKE ", columns.neighborhood))
                    .push_bind(format!("{}%", escape_like(neighborhood)))
                    .push(")");
            }
            qb.push(")");
        }
        RegionScope::Address {
            district,
            neighborhood,
            lot,
            building_name,
        } => {
            qb.push(format!(" AND {} = ", columns.district))
                .push_bind(district.as_str())
                .push(format!(" AND {} = ", columns.neighborhood))
                .push_bind(neighborhood.as_str());
            if let Some(lot) = lot {
                qb.push(format!(" AND {} = ", columns.lot))
                    .push_bind(lot.as_str());
            }
            if let Some(name) = building_name {
                qb.push(format!(" AND {} = ", columns.building_name))
                    .push_bind(name.as_str());
            }
        }
    }
}

fn push_bounds<'a, T>(qb: &mut QueryBuilder<'a, Postgres>, expr: &str, min: Option<T>, max: Option<T>)
where
    T: 'a + sqlx::Encode<'a, Postgres> + sqlx::Type<Postgres> + Send,
{
    if let Some(min) = min {
        qb.push(format!(" AND ({}) >= ", expr)).push_bind(min);
    }
    if let Some(max) = max {
        qb.push(format!(" AND ({}) <= ", expr)).push_bind(max);
    }
}

/// One page of one rent table for `filter`.
pub fn transaction_query<'a>(
    columns: &TableColumns,
    filter: &'a TransactionFilter,
) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::new(format!(
        "SELECT {} FROM {} WHERE TRUE",
        columns.select_list(),
        columns.property_type.table()
    ));

    push_region(&mut qb, columns, &filter.region);

    match &filter.contract_end {
        Some(ContractEnd::EndsOn(raw)) => {
            qb.push(format!(" AND SPLIT_PART({}, '~', 2) = ", columns.contract_term))
                .push_bind(contract_end_value(columns.property_type, raw));
        }
        Some(ContractEnd::Suffix(raw)) => {
            qb.push(format!(" AND {} LIKE ", columns.contract_term))
                .push_bind(format!(
                    "%{}",
                    escape_like(&contract_end_value(columns.property_type, raw))
                ));
        }
        None => {}
    }

    push_bounds(&mut qb, &float_or_null(&columns.area), filter.area.min, filter.area.max);
    push_bounds(
        &mut qb,
        &money_or_null(&columns.deposit),
        filter.deposit.min,
        filter.deposit.max,
    );
    push_bounds(
        &mut qb,
        &money_or_null(&columns.monthly_rent),
        filter.monthly_rent.min,
        filter.monthly_rent.max,
    );
    push_bounds(
        &mut qb,
        &columns.build_year_value,
        filter.build_year.min,
        filter.build_year.max,
    );

    qb.push(format!(
        " ORDER BY contract_month DESC, {} DESC NULLS LAST LIMIT ",
        columns.day_order()
    ));
    qb.push_bind(i64::from(filter.page_size));
    qb.push(" OFFSET ");
    qb.push_bind(filter.offset());
    qb
}

fn union_over_tables(select: impl Fn(PropertyType) -> String) -> String {
    PropertyType::ALL
        .into_iter()
        .map(select)
        .collect::<Vec<_>>()
        .join(" UNION ")
}

/// PostgreSQL-backed TransactionSource implementation
#[derive(Clone)]
pub struct PostgresTransactionSource {
    pub(crate) pool: PgPool,
    single_family: Arc<OnceCell<TableColumns>>,
}

impl PostgresTransactionSource {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            single_family: Arc::new(OnceCell::new()),
        }
    }

    async fn columns(&self, property_type: PropertyType) -> Result<TableColumns> {
        if let Some(columns) = TableColumns::named(property_type) {
            return Ok(columns);
        }
        let columns = self
            .single_family
            .get_or_try_init(|| async {
                let names: Vec<String> = sqlx::query_scalar(
                    "SELECT column_name::TEXT FROM information_schema.columns \
                     WHERE table_schema = current_schema() AND table_name = $1 \
                     ORDER BY ordinal_position",
                )
                .bind(property_type.table())
                .fetch_all(&self.pool)
                .await
                .map_err(Error::Database)?;
                tracing::debug!(
                    table = property_type.table(),
                    columns = names.len(),
                    "Discovered single-family column layout"
                );
                TableColumns::single_family(&names)
            })
            .await?;
        Ok(columns.clone())
    }
}

#[async_trait]
impl TransactionSource for PostgresTransactionSource {
    async fn fetch(
        &self,
        property_type: PropertyType,
        filter: &TransactionFilter,
    ) -> Result<Vec<TransactionRow>> {
        if filter.region.is_empty() {
            return Ok(Vec::new());
        }
        let columns = self.columns(property_type).await?;
        let mut qb = transaction_query(&columns, filter);
        qb.build_query_as::<TransactionRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::from_query(e, property_type.table()))
    }

    async fn district_codes(&self, prefix: &str) -> Result<Vec<String>> {
        let sql = format!(
            "SELECT code FROM ({}) t WHERE code IS NOT NULL ORDER BY code",
            union_over_tables(|p| format!(
                "SELECT sggcd::TEXT AS code FROM {} WHERE sggcd::TEXT LIKE $1",
                p.table()
            ))
        );
        sqlx::query_scalar(&sql)
            .bind(format!("{}%", escape_like(prefix.trim())))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::from_query(e, "district listing"))
    }

    async fn neighborhood_names(&self, district_code: &str) -> Result<Vec<String>> {
        let sql = format!(
            "SELECT name FROM ({}) t ORDER BY name",
            union_over_tables(|p| format!(
                "SELECT umdnm::TEXT AS name FROM {} WHERE sggcd::TEXT = $1 AND umdnm IS NOT NULL AND umdnm <> ''",
                p.table()
            ))
        );
        sqlx::query_scalar(&sql)
            .bind(district_code.trim())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::from_query(e, "neighborhood listing"))
    }

    async fn building_candidates(
        &self,
        property_type: PropertyType,
        neighborhood: &str,
        lot_prefix: &str,
        limit: i64,
    ) -> Result<Vec<BuildingCandidate>> {
        let name = property_type
            .name_column()
            .map(|c| format!("{}::TEXT", c))
            .unwrap_or_else(|| "NULL::TEXT".to_string());
        let sql = format!(
            "SELECT DISTINCT sggcd::TEXT AS sgg_code, umdnm::TEXT AS umd_name, jibun::TEXT AS jibun, \
             {} AS building_name FROM {} WHERE umdnm = $1 AND jibun LIKE $2 ORDER BY jibun LIMIT $3",
            name,
            property_type.table()
        );
        sqlx::query_as::<_, BuildingCandidate>(&sql)
            .bind(neighborhood)
            .bind(format!("{}%", escape_like(lot_prefix)))
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::from_query(e, "building search"))
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }
}
