//! Single-row unit lookup and land ownership handlers

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use jeonse_keys::SkipReason;
use serde_json::json;

use crate::{
    models::{scalar_text, OwnerInfoRequest, UnitInfoRequest},
    services::{owner, UnitLookup},
    state::AppState,
    Error, Result,
};

fn lookup_error(lookup: &UnitLookup) -> Option<&'static str> {
    match lookup {
        UnitLookup::Found(_) | UnitLookup::NoMatch => None,
        UnitLookup::AdminCodeNotFound => Some("BJD code not found"),
        UnitLookup::TimedOut => Some("Query timeout"),
        UnitLookup::Skipped(SkipReason::UnparsableFloor) => Some("Invalid floor"),
        UnitLookup::Skipped(SkipReason::UnparsableArea) => Some("Invalid area"),
        UnitLookup::Skipped(_) => Some("Invalid lot"),
    }
}

/// `POST /api/unit-info`
///
/// Lookup problems are reported in an `error` field next to `"unit": "-"`; only
/// infrastructure failures produce an error status.
pub async fn unit_info(
    State(state): State<AppState>,
    Json(req): Json<UnitInfoRequest>,
) -> Result<Response> {
    let floor = scalar_text(&req.floor);
    let area = scalar_text(&req.excluusear);
    let (Some(district), Some(neighborhood), Some(lot), Some(floor), Some(area)) =
        (req.sggcd(), req.umdnm(), req.jibun(), floor, area)
    else {
        return Ok((
            StatusCode::OK,
            Json(json!({ "unit": "-", "error": "Missing parameters" })),
        )
            .into_response());
    };

    let lookup = state
        .enrichment
        .unit_identity(district, neighborhood, lot, &floor, &area)
        .await?;
    let summary = lookup.summary();

    let mut body = json!({
        "unit": summary.display,
        "all_units": summary.all_units,
        "has_more": summary.has_more,
    });
    if let Some(error) = lookup_error(&lookup) {
        body["error"] = json!(error);
    }
    Ok((StatusCode::OK, Json(body)).into_response())
}

/// `POST /api/owner-info`
pub async fn owner_info(
    State(state): State<AppState>,
    Json(req): Json<OwnerInfoRequest>,
) -> Result<Response> {
    match state
        .owner_service
        .lookup(req.sgg_code(), req.umd_name(), req.jibun())
        .await
    {
        Ok(info) => Ok((StatusCode::OK, Json(info)).into_response()),
        Err(Error::FeatureDisabled(error)) => Ok((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "error": error,
                "message": owner::DISABLED_MESSAGE,
            })),
        )
            .into_response()),
        Err(e) => Err(e),
    }
}
