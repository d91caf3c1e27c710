//! Region picker handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::{models::SigunguQuery, state::AppState, Result};

/// `GET /api/locations/sido`
pub async fn location_sidos(State(state): State<AppState>) -> Result<Response> {
    let sidos = state.region_service.province_names();
    Ok((StatusCode::OK, Json(json!({ "success": true, "sidos": sidos }))).into_response())
}

/// `GET /api/locations/sigungu?sido=서울특별시`
pub async fn location_sigungus(
    State(state): State<AppState>,
    Query(q): Query<SigunguQuery>,
) -> Result<Response> {
    let sigungus = state.region_service.district_names(q.sido.as_deref())?;
    Ok((
        StatusCode::OK,
        Json(json!({ "success": true, "sigungus": sigungus })),
    )
        .into_response())
}

/// `GET /api/locations/umd?sido=..&sigungu=..&sigungu=..`
///
/// `sigungu` repeats, so the query is read as raw pairs.
pub async fn location_umds(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Response> {
    let sido = pairs
        .iter()
        .find(|(k, _)| k == "sido")
        .map(|(_, v)| v.as_str());
    let sigungus: Vec<String> = pairs
        .iter()
        .filter(|(k, _)| k == "sigungu")
        .map(|(_, v)| v.clone())
        .collect();

    let umds = state
        .region_service
        .neighborhoods_by_district(sido, &sigungus)?;
    Ok((StatusCode::OK, Json(json!({ "success": true, "umds": umds }))).into_response())
}

/// `GET /api/regions/sido`
pub async fn sidos(State(state): State<AppState>) -> Result<Response> {
    Ok((StatusCode::OK, Json(state.region_service.provinces())).into_response())
}

/// `GET /api/regions/sigungu/:sido_code`
pub async fn sigungus(
    State(state): State<AppState>,
    Path(sido_code): Path<String>,
) -> Result<Response> {
    let districts = state
        .region_service
        .districts_with_transactions(&sido_code)
        .await?;
    Ok((StatusCode::OK, Json(districts)).into_response())
}

/// `GET /api/regions/umd/:sgg_code`
pub async fn umds(
    State(state): State<AppState>,
    Path(sgg_code): Path<String>,
) -> Result<Response> {
    let neighborhoods = state
        .region_service
        .neighborhoods_with_transactions(&sgg_code)
        .await?;
    Ok((StatusCode::OK, Json(neighborhoods)).into_response())
}
