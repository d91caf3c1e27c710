//! Business logic layer
//!
//! Services sit between the HTTP handlers and the storage traits: they validate
//! requests, run the per-type queries and attach reference data.

pub mod enrichment;
pub mod owner;
pub mod regions;
pub mod search;

pub use enrichment::{BatchStatus, EnrichmentService, PriceBatch, UnitBatch, UnitLookup};
pub use owner::{OwnerInfo, OwnerInfoService};
pub use regions::{RegionOption, RegionService};
pub use search::{BuildingPage, BuildingSuggestion, LegacyPage, SearchPage, SearchService};
