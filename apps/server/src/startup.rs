//! Startup tasks: database pool and region index

use jeonse_region::RegionIndex;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;

use crate::{config::Config, Result};

pub async fn create_db_pool(config: &Config) -> Result<PgPool> {
    tracing::info!("Creating database connection pool...");

    let statement_timeout = config.database.statement_timeout_seconds;

    let pool = PgPoolOptions::new()
        .min_connections(config.database.pool_min_size)
        .max_connections(config.database.pool_max_size)
        .acquire_timeout(Duration::from_secs(config.database.pool_timeout_seconds))
        .after_connect(move |conn, _meta| {
            Box::pin(async move {
                sqlx::query(&format!("SET statement_timeout = '{}s'", statement_timeout))
                    .execute(&mut *conn)
                    .await?;
                Ok(())
            })
        })
        .connect_lazy(&config.database.url)
        .map_err(crate::Error::Database)?;

    // Fail at startup rather than on the first request.
    let connect_timeout = Duration::from_secs(config.database.connect_timeout_seconds);
    match tokio::time::timeout(connect_timeout, pool.acquire()).await {
        Ok(Ok(_conn)) => {}
        Ok(Err(e)) => return Err(crate::Error::Database(e)),
        Err(_) => {
            return Err(crate::Error::Config(format!(
                "Database not reachable within {}s",
                config.database.connect_timeout_seconds
            )))
        }
    }

    tracing::info!(
        "Database pool created (min: {}, max: {})",
        config.database.pool_min_size,
        config.database.pool_max_size
    );

    Ok(pool)
}

/// Load the legal-dong code list once. A missing or malformed file stops startup.
pub fn load_regions(config: &Config) -> Result<RegionIndex> {
    let path = &config.regions.csv_path;
    tracing::info!(path = %path, "Loading region codes...");

    let regions = RegionIndex::from_csv_path(path)?;
    let stats = regions.stats();
    tracing::info!(
        provinces = stats.provinces,
        districts = stats.districts,
        neighborhoods = stats.neighborhoods,
        "Region index loaded"
    );
    Ok(regions)
}
