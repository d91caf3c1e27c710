//! Shared application state

use jeonse_region::RegionIndex;
use std::sync::Arc;

use crate::{
    config::Config,
    db::{PostgresReferenceStore, PostgresTransactionSource, ReferenceStore, TransactionSource},
    services::{EnrichmentService, OwnerInfoService, RegionService, SearchService},
    startup, Result,
};

/// Shared application state passed to all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub regions: Arc<RegionIndex>,
    pub transactions: Arc<dyn TransactionSource>,
    pub enrichment: Arc<EnrichmentService>,
    pub search_service: Arc<SearchService>,
    pub region_service: Arc<RegionService>,
    pub owner_service: Arc<OwnerInfoService>,
}

impl AppState {
    /// Connect to Postgres, load the region index and wire the services.
    pub async fn new(config: Config) -> Result<Self> {
        tracing::info!("Initializing application state...");

        let regions = startup::load_regions(&config)?;
        let db_pool = startup::create_db_pool(&config).await?;

        let transactions: Arc<dyn TransactionSource> =
            Arc::new(PostgresTransactionSource::new(db_pool.clone()));
        let reference: Arc<dyn ReferenceStore> = Arc::new(PostgresReferenceStore::new(db_pool));

        let state = Self::from_parts(config, regions, transactions, reference)?;
        tracing::info!("Application state initialized");
        Ok(state)
    }

    /// Build the state over any storage implementation.
    pub fn from_parts(
        config: Config,
        regions: RegionIndex,
        transactions: Arc<dyn TransactionSource>,
        reference: Arc<dyn ReferenceStore>,
    ) -> Result<Self> {
        let config = Arc::new(config);
        let regions = Arc::new(regions);

        let enrichment = Arc::new(EnrichmentService::new(
            reference,
            regions.clone(),
            config.enrichment.clone(),
        ));
        let search_service = Arc::new(SearchService::new(
            transactions.clone(),
            enrichment.clone(),
            config.search.clone(),
        ));
        let region_service = Arc::new(RegionService::new(regions.clone(), transactions.clone()));
        let owner_service = Arc::new(OwnerInfoService::new(
            regions.clone(),
            config.owner_info.clone(),
        )?);

        Ok(Self {
            config,
            regions,
            transactions,
            enrichment,
            search_service,
            region_service,
            owner_service,
        })
    }
}
