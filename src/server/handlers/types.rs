//! Request/response types shared by handlers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::llm::LlmError;
use crate::models::ChartFacts;
use crate::services::ChatTurn;

/// Detail text when no API key is configured.
pub const MISSING_KEY_DETAIL: &str = "API Key missing on server.";

/// Error body in the `{"detail": ...}` shape front-ends expect.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    pub fn missing_key() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, MISSING_KEY_DETAIL)
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail)
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, detail)
    }
}

impl From<&LlmError> for ApiError {
    fn from(e: &LlmError) -> Self {
        match e {
            LlmError::MissingApiKey(_) => Self::missing_key(),
            LlmError::Setup(_) => Self::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            _ => Self::new(StatusCode::BAD_GATEWAY, e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "detail": self.detail })),
        )
            .into_response()
    }
}

/// Successful reading response.
#[derive(Debug, Serialize)]
pub struct ReadingResponse {
    pub status: &'static str,
    pub chart_facts: ChartFacts,
    pub reading: String,
    pub remedies: String,
}

/// Chat message request.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    pub message: String,
}

/// Chat reply.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub session_id: String,
    pub reply: String,
}

/// Chat history for a session.
#[derive(Debug, Serialize)]
pub struct ChatHistoryResponse {
    pub session_id: String,
    pub history: Vec<ChatTurn>,
}

/// Dataset lookup parameters.
#[derive(Debug, Deserialize)]
pub struct LookupParams {
    pub house: u8,
    pub planet: String,
    pub mahadasha: Option<String>,
    pub antardasha: Option<String>,
}
