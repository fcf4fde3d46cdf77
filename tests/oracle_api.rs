//! End-to-end tests for the reading pipeline.
//!
//! Settings are loaded from a config file on disk, the dataset from a CSV
//! next to it, and requests go through the public router with a scripted
//! model standing in for the real provider.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use astrologai::config::{load_settings_with_options, LoadOptions};
use astrologai::llm::{LlmError, TextGenerator};
use astrologai::server::{create_router, load_dataset, AppState};

const DATASET_CSV: &str = "\
House,Planet,Mahadasha,Antardasha,Effect,Remedies
7,Venus,Saturn,Mercury,Delayed but stable marriage,Donate white sweets on Friday
7,Venus,Jupiter,Moon,Early marriage,Wear a diamond
1,Sun,,,Strong vitality,Offer water to the Sun
";

/// Replies with a fixed chart to calculator prompts and records every prompt.
struct Scripted {
    chart: String,
    prompts: Mutex<Vec<String>>,
}

impl Scripted {
    fn new(chart: &str) -> Self {
        Self {
            chart: chart.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for Scripted {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if prompt.starts_with("Calculate chart") {
            Ok(self.chart.clone())
        } else {
            Ok("Venus steadies your partnerships.\n\nDonate white sweets.\n\nExtra".to_string())
        }
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

async fn app_with(generator: Arc<Scripted>) -> (axum::Router, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("astro.csv"), DATASET_CSV).unwrap();

    let config_path = dir.path().join("astrologai.toml");
    std::fs::write(
        &config_path,
        "dataset = \"astro.csv\"\nsession_ttl_secs = 30\n\n[llm]\napi_key = \"test-key\"\n",
    )
    .unwrap();

    let (settings, config) = load_settings_with_options(LoadOptions {
        config_path: Some(config_path.clone()),
        dataset: None,
    })
    .await
    .unwrap();
    assert_eq!(config.source_path.as_deref(), Some(config_path.as_path()));
    assert_eq!(settings.session_ttl, Duration::from_secs(30));

    let dataset = load_dataset(&settings);
    assert_eq!(dataset.as_ref().map(|d| d.len()), Some(3));

    let state = AppState::with_generator(generator, dataset, &settings.llm, settings.session_ttl);
    (create_router(state), dir)
}

async fn post_reading(app: axum::Router) -> (StatusCode, serde_json::Value) {
    let body = serde_json::json!({
        "name": "Meera",
        "dob": "1992-04-18",
        "tob": "06:40",
        "city": "Pune",
        "question": "When will I marry?"
    });
    let request = Request::builder()
        .method("POST")
        .uri("/api/generate-reading")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn reading_uses_matching_dasha_row() {
    let generator = Arc::new(Scripted::new(
        "```json\n{\"House\": \"7\", \"Planet\": \"Shukra\", \"Mahadasha\": \"Saturn\", \"Antardasha\": \"Mercury\", \"Pratyanerdasha\": \"Ketu\"}\n```",
    ));
    let (app, _dir) = app_with(generator.clone()).await;

    let (status, json) = post_reading(app).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "success");
    assert_eq!(json["chart_facts"]["House"], 7);
    assert_eq!(json["chart_facts"]["Planet"], "Venus");
    assert_eq!(json["reading"], "Venus steadies your partnerships.");
    assert_eq!(json["remedies"], "Donate white sweets.");

    let prompts = generator.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[0].contains("Date:1992-04-18"));
    assert!(prompts[0].contains("City:Pune"));
    assert!(prompts[1].contains("USER: Meera"));
    assert!(prompts[1]
        .contains("Effect: Delayed but stable marriage | Remedy: Donate white sweets on Friday"));
}

#[tokio::test]
async fn unreadable_chart_falls_back_to_default() {
    let generator = Arc::new(Scripted::new("The heavens are cloudy today."));
    let (app, _dir) = app_with(generator.clone()).await;

    let (status, json) = post_reading(app).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["chart_facts"]["House"], 1);
    assert_eq!(json["chart_facts"]["Planet"], "Sun");

    let prompts = generator.prompts();
    assert!(prompts[1].contains("Effect: Strong vitality | Remedy: Offer water to the Sun"));
}

#[tokio::test]
async fn unmatched_chart_uses_general_principles() {
    let generator = Arc::new(Scripted::new(
        r#"{"House": 4, "Planet": "Rahu", "Mahadasha": "Rahu", "Antardasha": "Ketu", "Pratyanerdasha": "Sun"}"#,
    ));
    let (app, _dir) = app_with(generator.clone()).await;

    let (status, json) = post_reading(app).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["chart_facts"]["House"], 4);

    let prompts = generator.prompts();
    assert!(prompts[1].contains("DATABASE: Use general Vedic principles."));
}
