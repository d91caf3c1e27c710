//! Lookup indexes for the rent and reference tables

use sqlx::PgPool;

use crate::{models::PropertyType, Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum IndexGroup {
    Transactions,
    Reference,
    All,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDefinition {
    pub table: String,
    pub name: String,
    /// Parenthesised column/expression list.
    pub columns: String,
    pub description: String,
}

impl IndexDefinition {
    fn new(table: &str, name: &str, columns: &str, description: &str) -> Self {
        Self {
            table: table.to_string(),
            name: name.to_string(),
            columns: columns.to_string(),
            description: description.to_string(),
        }
    }

    pub fn create_sql(&self) -> String {
        format!(
            "CREATE INDEX CONCURRENTLY IF NOT EXISTS {} ON {} {}",
            self.name, self.table, self.columns
        )
    }
}

/// Region, contract-term, lot and recency indexes on every rent table.
pub fn transaction_indexes() -> Vec<IndexDefinition> {
    PropertyType::ALL
        .into_iter()
        .flat_map(|p| {
            let table = p.table();
            let mut defs = vec![
                IndexDefinition::new(
                    table,
                    &format!("idx_{}_sggcd_umdnm", table),
                    "(sggcd, umdnm)",
                    "region filter",
                ),
                IndexDefinition::new(
                    table,
                    &format!("idx_{}_jibun", table),
                    "(jibun)",
                    "address lookup",
                ),
            ];
            // The single-family table has no named term/date columns.
            if p != PropertyType::SingleFamily {
                defs.push(IndexDefinition::new(
                    table,
                    &format!("idx_{}_contractterm", table),
                    "(contractterm)",
                    "contract end filter",
                ));
                defs.push(IndexDefinition::new(
                    table,
                    &format!("idx_{}_date", table),
                    "(dealyear DESC, dealmonth DESC, dealday DESC)",
                    "newest-first ordering",
                ));
            }
            defs
        })
        .collect()
}

/// Indexes matching the batched reference lookups' predicates.
pub fn reference_indexes() -> Vec<IndexDefinition> {
    vec![
        IndexDefinition::new(
            "bldg_exclusive_area",
            "idx_bldg_excl_unit_lookup",
            r#"("전유_공용_구분_코드", "시군구_코드", "법정동_코드", "번", "지", "층_구분_코드", "층_번호", "면적(㎡)")"#,
            "unit identity lookup",
        ),
        IndexDefinition::new(
            "bldg_apartment_price",
            "idx_bldg_apt_batch_lookup",
            r#"("법정동코드", "본번", "부번", "층번호", "공동주택전유면적")"#,
            "appraisal price batch",
        ),
        IndexDefinition::new(
            "officetel_standard_price",
            "idx_officetel_std_batch_lookup",
            r#"(LEFT("법정동코드", 5), "번지", "호", "건물층구분코드", "상가건물층주소", "전용면적")"#,
            "officetel price batch",
        ),
    ]
}

pub fn indexes_for(group: IndexGroup) -> Vec<IndexDefinition> {
    match group {
        IndexGroup::Transactions => transaction_indexes(),
        IndexGroup::Reference => reference_indexes(),
        IndexGroup::All => {
            let mut all = transaction_indexes();
            all.extend(reference_indexes());
            all
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexOutcome {
    AlreadyExists,
    Created { size: Option<String> },
    Failed(String),
}

pub struct IndexMaintainer {
    pool: PgPool,
}

impl IndexMaintainer {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn exists(&self, definition: &IndexDefinition) -> Result<bool> {
        let found: Option<String> = sqlx::query_scalar(
            "SELECT indexname::TEXT FROM pg_indexes WHERE tablename = $1 AND indexname = $2",
        )
        .bind(&definition.table)
        .bind(&definition.name)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(found.is_some())
    }

    /// `CONCURRENTLY` cannot run inside a transaction; each statement runs on its own.
    pub async fn ensure(&self, definition: &IndexDefinition) -> Result<IndexOutcome> {
        if self.exists(definition).await? {
            return Ok(IndexOutcome::AlreadyExists);
        }

        tracing::info!(index = %definition.name, table = %definition.table, "Creating index");
        if let Err(e) = sqlx::query(&definition.create_sql())
            .execute(&self.pool)
            .await
        {
            tracing::warn!(index = %definition.name, error = %e, "Index creation failed");
            return Ok(IndexOutcome::Failed(e.to_string()));
        }

        let size: Option<String> =
            sqlx::query_scalar("SELECT pg_size_pretty(pg_relation_size($1::regclass))")
                .bind(&definition.name)
                .fetch_optional(&self.pool)
                .await
                .map_err(Error::Database)?;
        Ok(IndexOutcome::Created { size })
    }

    pub async fn analyze(&self, table: &str) -> Result<()> {
        tracing::info!(table, "Analyzing table");
        sqlx::query(&format!("ANALYZE {}", table))
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }
}
