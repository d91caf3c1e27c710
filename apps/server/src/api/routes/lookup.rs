use crate::api::handlers::{regions, search, units};
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};

/// Everything under `/api`.
pub fn lookup_routes() -> Router<AppState> {
    Router::new()
        // Region pickers backed by the code list
        .route("/locations/sido", get(regions::location_sidos))
        .route("/locations/sigungu", get(regions::location_sigungus))
        .route("/locations/umd", get(regions::location_umds))
        // Region pickers backed by the rent tables
        .route("/regions/sido", get(regions::sidos))
        .route("/regions/sigungu/:sido_code", get(regions::sigungus))
        .route("/regions/umd/:sgg_code", get(regions::umds))
        // Searches
        .route("/search", post(search::search))
        .route("/transactions", post(search::legacy_search))
        .route(
            "/building-transactions",
            get(search::building_transactions_query).post(search::building_transactions_body),
        )
        .route("/search-building", get(search::search_building))
        // Single lookups
        .route("/unit-info", post(units::unit_info))
        .route("/owner-info", post(units::owner_info))
}
