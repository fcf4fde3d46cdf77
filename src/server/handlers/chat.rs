//! Chat endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::super::AppState;
use super::types::{ApiError, ChatHistoryResponse, ChatRequest, ChatResponse};

/// Send a message in a session, creating the session if needed.
pub async fn chat_message(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if !state.has_credentials {
        return Err(ApiError::missing_key());
    }

    let message = req.message.trim();
    if message.is_empty() {
        return Err(ApiError::bad_request("Message must not be empty."));
    }

    let (session_id, session) = state.sessions.checkout(req.session_id.as_deref());
    let mut session = session.lock().await;

    let reply = session
        .ask(state.generator.as_ref(), message)
        .await
        .map_err(|e| {
            tracing::error!("Chat session {} failed: {}", session_id, e);
            ApiError::from(&e)
        })?;

    Ok(Json(ChatResponse { session_id, reply }))
}

/// History of a live session.
pub async fn chat_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<ChatHistoryResponse>, ApiError> {
    let session = state
        .sessions
        .get(&session_id)
        .ok_or_else(|| ApiError::not_found("Session not found."))?;
    let history = session.lock().await.history().to_vec();

    Ok(Json(ChatHistoryResponse {
        session_id,
        history,
    }))
}

/// End a session.
pub async fn chat_end(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.sessions.remove(&session_id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("Session not found."))
    }
}
