//! Status and dataset endpoint handlers.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use super::super::AppState;
use super::types::{ApiError, LookupParams};
use crate::dataset::{lookup_in, LookupKey};
use crate::models::HOUSE_RANGE;

/// Root status payload.
pub async fn root_status() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "The Astrologai Engine is Live",
        "version": "1.0"
    }))
}

/// Health check endpoint for container orchestration.
pub async fn health() -> impl IntoResponse {
    StatusCode::OK
}

/// Look a house/planet pair up in the dataset without calling a model.
pub async fn api_lookup(
    State(state): State<AppState>,
    Query(params): Query<LookupParams>,
) -> Result<impl IntoResponse, ApiError> {
    if !HOUSE_RANGE.contains(&params.house) {
        return Err(ApiError::bad_request("House must be between 1 and 12."));
    }

    let key = LookupKey {
        house: params.house,
        planet: params.planet,
        mahadasha: params.mahadasha,
        antardasha: params.antardasha,
    };
    let outcome = lookup_in(state.dataset.as_deref(), &key);

    Ok(Json(serde_json::json!({
        "house": key.house,
        "planet": key.planet,
        "knowledge": outcome.knowledge(),
        "row": outcome.row(),
    })))
}
