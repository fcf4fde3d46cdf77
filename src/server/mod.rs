//! Web server exposing the oracle over HTTP.
//!
//! Provides:
//! - A status root and health check
//! - The reading endpoint used by the React front-end
//! - Session-based astrologer chat
//! - Direct dataset lookup

mod handlers;
mod routes;
mod sessions;

pub use routes::create_router;
pub use sessions::SessionStore;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Settings;
use crate::dataset::Dataset;
use crate::llm::{LlmClient, LlmConfig, TextGenerator};
use crate::services::{OraclePrompts, OracleService};

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub oracle: Arc<OracleService>,
    pub generator: Arc<dyn TextGenerator>,
    pub dataset: Option<Arc<Dataset>>,
    pub sessions: Arc<SessionStore>,
    /// Whether the model can be called (API key present when required).
    pub has_credentials: bool,
}

impl AppState {
    /// Build state from settings: load the dataset and create the LLM client.
    ///
    /// A dataset that fails to load is logged and left out; lookups then
    /// report the lookup-error text instead of failing requests.
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        let dataset = load_dataset(settings);
        let client = LlmClient::new(settings.llm.clone())?;
        Ok(Self::with_generator(
            Arc::new(client),
            dataset,
            &settings.llm,
            settings.session_ttl,
        ))
    }

    /// Build state around any text generator.
    pub fn with_generator(
        generator: Arc<dyn TextGenerator>,
        dataset: Option<Arc<Dataset>>,
        llm: &LlmConfig,
        session_ttl: Duration,
    ) -> Self {
        let oracle = OracleService::new(
            generator.clone(),
            dataset.clone(),
            OraclePrompts::from_config(llm),
        );
        Self {
            oracle: Arc::new(oracle),
            generator,
            dataset,
            sessions: Arc::new(SessionStore::new(llm.get_persona(), session_ttl)),
            has_credentials: llm.has_credentials(),
        }
    }
}

/// Load the configured dataset, logging instead of failing.
pub fn load_dataset(settings: &Settings) -> Option<Arc<Dataset>> {
    let path = settings.dataset_path.as_ref()?;
    match Dataset::load(path) {
        Ok(dataset) => Some(Arc::new(dataset)),
        Err(e) => {
            tracing::warn!("Dataset unavailable, lookups will fall back: {}", e);
            None
        }
    }
}

/// Start the web server.
pub async fn serve(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
