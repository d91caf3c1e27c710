//! Transaction search handlers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::{
    models::{BuildingSearchQuery, BuildingTransactionsRequest, LegacySearchRequest, SearchRequest},
    state::AppState,
    Result,
};

/// `POST /api/search`
pub async fn search(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Response> {
    let page = state.search_service.search(req).await?;
    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "data": page.data,
            "count": page.count,
            "has_more": page.has_more,
        })),
    )
        .into_response())
}

/// `POST /api/transactions`
pub async fn legacy_search(
    State(state): State<AppState>,
    Json(req): Json<LegacySearchRequest>,
) -> Result<Response> {
    let page = state.search_service.legacy_search(req).await?;
    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "data": page.data,
            "count": page.count,
            "page": page.page,
            "page_size": page.page_size,
            "has_more": page.has_more,
        })),
    )
        .into_response())
}

async fn building_transactions(
    state: AppState,
    req: BuildingTransactionsRequest,
) -> Result<Response> {
    let page = state.search_service.building_transactions(req).await?;
    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "data": page.data,
            "count": page.count,
            "has_more": page.has_more,
            "building_name": page.building_name,
            "address": page.address,
        })),
    )
        .into_response())
}

/// `GET /api/building-transactions`
pub async fn building_transactions_query(
    State(state): State<AppState>,
    Query(req): Query<BuildingTransactionsRequest>,
) -> Result<Response> {
    building_transactions(state, req).await
}

/// `POST /api/building-transactions`
pub async fn building_transactions_body(
    State(state): State<AppState>,
    Json(req): Json<BuildingTransactionsRequest>,
) -> Result<Response> {
    building_transactions(state, req).await
}

/// `GET /api/search-building?q=역삼동 123`
pub async fn search_building(
    State(state): State<AppState>,
    Query(q): Query<BuildingSearchQuery>,
) -> Result<Response> {
    let buildings = state.search_service.search_buildings(&q.q).await?;
    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "buildings": buildings,
        })),
    )
        .into_response())
}
