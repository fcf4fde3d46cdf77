//! Router configuration for the web server.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use super::handlers;
use super::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root_status))
        .route("/health", get(handlers::health))
        // Oracle
        .route("/api/generate-reading", post(handlers::generate_reading))
        .route("/api/lookup", get(handlers::api_lookup))
        // Chat
        .route("/api/chat", post(handlers::chat_message))
        .route(
            "/api/chat/:session_id",
            get(handlers::chat_history).delete(handlers::chat_end),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}
