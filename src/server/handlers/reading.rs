//! Reading endpoint.

use axum::{extract::State, Json};

use super::super::AppState;
use super::types::{ApiError, ReadingResponse};
use crate::models::ReadingRequest;

/// Run the oracle for a front-end request.
pub async fn generate_reading(
    State(state): State<AppState>,
    Json(req): Json<ReadingRequest>,
) -> Result<Json<ReadingResponse>, ApiError> {
    if !state.has_credentials {
        return Err(ApiError::missing_key());
    }

    let reading = state.oracle.generate_reading(&req).await.map_err(|e| {
        tracing::error!("Reading for {} failed: {}", req.name, e);
        ApiError::from(e.llm_error())
    })?;

    Ok(Json(ReadingResponse {
        status: "success",
        chart_facts: reading.chart_facts,
        reading: reading.reading,
        remedies: reading.remedies,
    }))
}
