//! Reading pipeline: calculator model, dataset lookup, writer model.
//!
//! Separated from UI concerns - emits events for progress tracking.

use std::sync::{Arc, OnceLock};

use regex::{Captures, Regex};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::dataset::{lookup_in, Dataset, LookupKey, LookupOutcome};
use crate::llm::{LlmConfig, LlmError, TextGenerator};
use crate::models::{ChartFacts, Reading, ReadingRequest};

/// Remedies text when the writer produced only one paragraph.
pub const DEFAULT_REMEDIES: &str = "Consult a priest for specific remedies.";

/// Events emitted while a reading is produced.
#[derive(Debug, Clone)]
pub enum OracleEvent {
    /// Calculator call started
    Calculating,
    /// Chart facts settled (`fallback` when the default chart was used)
    ChartReady { facts: ChartFacts, fallback: bool },
    /// Dataset consulted
    Looked { outcome: LookupOutcome },
    /// Writer call started
    Writing,
}

/// Errors that abort a reading.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("Writer model failed: {0}")]
    Writer(#[source] LlmError),
}

impl OracleError {
    pub fn llm_error(&self) -> &LlmError {
        match self {
            OracleError::Writer(e) => e,
        }
    }
}

/// Prompt templates used by the pipeline.
#[derive(Debug, Clone)]
pub struct OraclePrompts {
    pub calculator: String,
    pub writer: String,
}

impl OraclePrompts {
    pub fn from_config(config: &LlmConfig) -> Self {
        Self {
            calculator: config.get_calculator_prompt().to_string(),
            writer: config.get_writer_prompt().to_string(),
        }
    }

    pub fn calculator_prompt(&self, request: &ReadingRequest) -> String {
        fill_template(
            &self.calculator,
            &[
                ("dob", &request.dob),
                ("tob", &request.tob),
                ("city", &request.city),
            ],
        )
    }

    pub fn writer_prompt(
        &self,
        request: &ReadingRequest,
        facts: &ChartFacts,
        knowledge: &str,
    ) -> String {
        let facts = facts.to_json_string();
        fill_template(
            &self.writer,
            &[
                ("name", &request.name),
                ("question", &request.question),
                ("facts", &facts),
                ("knowledge", knowledge),
            ],
        )
    }
}

impl Default for OraclePrompts {
    fn default() -> Self {
        Self::from_config(&LlmConfig::default())
    }
}

/// Service producing readings.
pub struct OracleService {
    generator: Arc<dyn TextGenerator>,
    dataset: Option<Arc<Dataset>>,
    prompts: OraclePrompts,
}

impl OracleService {
    /// Create a new oracle service.
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        dataset: Option<Arc<Dataset>>,
        prompts: OraclePrompts,
    ) -> Self {
        Self {
            generator,
            dataset,
            prompts,
        }
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_deref()
    }

    /// Ask the calculator model for chart facts.
    ///
    /// Returns the facts and whether the default chart had to be used.
    pub async fn calculate_chart(&self, request: &ReadingRequest) -> (ChartFacts, bool) {
        let prompt = self.prompts.calculator_prompt(request);
        match self.generator.generate(&prompt).await {
            Ok(text) => match ChartFacts::from_model_output(&text) {
                Ok(facts) => (facts, false),
                Err(e) => {
                    warn!("Calculator output unusable ({}), using default chart", e);
                    (ChartFacts::default(), true)
                }
            },
            Err(e) => {
                warn!("Calculator call failed ({}), using default chart", e);
                (ChartFacts::default(), true)
            }
        }
    }

    /// Look chart facts up in the dataset.
    pub fn lookup(&self, facts: &ChartFacts) -> LookupOutcome {
        lookup_in(self.dataset.as_deref(), &LookupKey::from(facts))
    }

    /// Produce a reading.
    pub async fn generate_reading(&self, request: &ReadingRequest) -> Result<Reading, OracleError> {
        self.generate_reading_with_events(request, None).await
    }

    /// Produce a reading, reporting progress on `event_tx`.
    pub async fn generate_reading_with_events(
        &self,
        request: &ReadingRequest,
        event_tx: Option<mpsc::Sender<OracleEvent>>,
    ) -> Result<Reading, OracleError> {
        let emit = |event: OracleEvent| {
            let tx = event_tx.clone();
            async move {
                if let Some(tx) = tx {
                    let _ = tx.send(event).await;
                }
            }
        };

        emit(OracleEvent::Calculating).await;
        let (facts, fallback) = self.calculate_chart(request).await;
        emit(OracleEvent::ChartReady {
            facts: facts.clone(),
            fallback,
        })
        .await;

        let outcome = self.lookup(&facts);
        let knowledge = outcome.knowledge();
        emit(OracleEvent::Looked { outcome }).await;

        emit(OracleEvent::Writing).await;
        let prompt = self.prompts.writer_prompt(request, &facts, &knowledge);
        let text = self
            .generator
            .generate(&prompt)
            .await
            .map_err(OracleError::Writer)?;

        let (reading, remedies) = split_reading(&text);

        info!(
            "Reading for {} (house {}, {}) via {}",
            request.name,
            facts.house,
            facts.planet,
            self.generator.model_name()
        );

        Ok(Reading {
            chart_facts: facts,
            knowledge,
            reading,
            remedies,
        })
    }
}

/// Substitute `{key}` placeholders in one pass over the template.
///
/// Inserted values are never rescanned, so braces in user input stay literal.
/// Unknown placeholders are left as they are.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    let re = PLACEHOLDER.get_or_init(|| Regex::new(r"\{([a-z_]+)\}").expect("valid regex"));

    re.replace_all(template, |caps: &Captures| {
        let key = &caps[1];
        values
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| value.to_string())
            .unwrap_or_else(|| caps[0].to_string())
    })
    .into_owned()
}

/// Split writer output into reading and remedies at the first blank line.
///
/// Only the second paragraph becomes remedies; anything after it is
/// dropped. One paragraph means the default remedies text.
pub fn split_reading(text: &str) -> (String, String) {
    let normalized = text.replace("\r\n", "\n");
    let mut paragraphs = normalized
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty());

    let reading = paragraphs.next().unwrap_or("").to_string();
    let remedies = paragraphs
        .next()
        .map(str::to_string)
        .unwrap_or_else(|| DEFAULT_REMEDIES.to_string());

    (reading, remedies)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{DatasetRow, FALLBACK_KNOWLEDGE, UNAVAILABLE_KNOWLEDGE};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Replies with queued responses and records every prompt.
    struct Scripted {
        replies: Mutex<Vec<Result<String, LlmError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn new(replies: Vec<Result<String, LlmError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into_iter().rev().collect()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TextGenerator for Scripted {
        async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop()
                .unwrap_or(Err(LlmError::Empty))
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    fn request() -> ReadingRequest {
        ReadingRequest {
            name: "Asha".to_string(),
            dob: "1990-04-12".to_string(),
            tob: "06:30".to_string(),
            city: "Pune".to_string(),
            question: "Will I change jobs?".to_string(),
        }
    }

    fn dataset() -> Arc<Dataset> {
        Arc::new(Dataset::from_rows(vec![DatasetRow {
            house: 10,
            planet: "Saturn".to_string(),
            effect: "Slow but steady career rise".to_string(),
            remedies: "Serve the elderly on Saturdays".to_string(),
            mahadasha: None,
            antardasha: None,
        }]))
    }

    const READING: &str = "Line 1\nLine 2\nLine 3\nLine 4\nLine 5\nLine 6\nLine 7\nLine 8\n\nRemedy 1\nRemedy 2";

    #[tokio::test]
    async fn test_full_pipeline_uses_dataset_match() {
        let generator = Scripted::new(vec![
            Ok(r#"```json
{"House": 10, "Planet": "Saturn", "Mahadasha": "Jupiter", "Antardasha": "Venus", "Pratyanerdasha": "Mars"}
```"#
                .to_string()),
            Ok(READING.to_string()),
        ]);
        let oracle =
            OracleService::new(generator.clone(), Some(dataset()), OraclePrompts::default());

        let reading = oracle.generate_reading(&request()).await.unwrap();

        assert_eq!(reading.chart_facts.house, 10);
        assert_eq!(reading.chart_facts.planet, "Saturn");
        assert_eq!(
            reading.knowledge,
            "Effect: Slow but steady career rise | Remedy: Serve the elderly on Saturdays"
        );
        assert!(reading.reading.starts_with("Line 1"));
        assert!(reading.reading.ends_with("Line 8"));
        assert_eq!(reading.remedies, "Remedy 1\nRemedy 2");

        let prompts = generator.prompts();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].contains("Date:1990-04-12, Time:06:30, City:Pune"));
        assert!(prompts[1].contains("USER: Asha | QUESTION: Will I change jobs?"));
        assert!(prompts[1].contains("DATABASE: Effect: Slow but steady career rise"));
    }

    #[tokio::test]
    async fn test_calculator_failure_uses_default_chart() {
        let generator = Scripted::new(vec![
            Err(LlmError::Connection("refused".to_string())),
            Ok("Only one paragraph".to_string()),
        ]);
        let oracle =
            OracleService::new(generator.clone(), Some(dataset()), OraclePrompts::default());

        let reading = oracle.generate_reading(&request()).await.unwrap();

        assert_eq!(reading.chart_facts, ChartFacts::default());
        assert_eq!(reading.knowledge, FALLBACK_KNOWLEDGE);
        assert_eq!(reading.remedies, DEFAULT_REMEDIES);
    }

    #[tokio::test]
    async fn test_without_dataset_reports_lookup_error() {
        let generator = Scripted::new(vec![
            Ok(r#"{"House": 3, "Planet": "Mars"}"#.to_string()),
            Ok(READING.to_string()),
        ]);
        let oracle = OracleService::new(generator.clone(), None, OraclePrompts::default());

        let reading = oracle.generate_reading(&request()).await.unwrap();
        assert_eq!(reading.knowledge, UNAVAILABLE_KNOWLEDGE);
        assert!(generator.prompts()[1].contains("DATABASE: Database lookup error."));
    }

    #[tokio::test]
    async fn test_writer_failure_is_an_error() {
        let generator = Scripted::new(vec![
            Ok(r#"{"House": 3, "Planet": "Mars"}"#.to_string()),
            Err(LlmError::Api("HTTP 429".to_string())),
        ]);
        let oracle = OracleService::new(generator, None, OraclePrompts::default());

        let err = oracle.generate_reading(&request()).await.unwrap_err();
        assert!(matches!(err.llm_error(), LlmError::Api(_)));
    }

    #[tokio::test]
    async fn test_events_are_emitted_in_order() {
        let generator = Scripted::new(vec![
            Ok("not json".to_string()),
            Ok(READING.to_string()),
        ]);
        let oracle = OracleService::new(generator, Some(dataset()), OraclePrompts::default());
        let (tx, mut rx) = mpsc::channel(16);

        oracle
            .generate_reading_with_events(&request(), Some(tx))
            .await
            .unwrap();

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        assert_eq!(events.len(), 4);
        assert!(matches!(events[0], OracleEvent::Calculating));
        assert!(matches!(
            events[1],
            OracleEvent::ChartReady { fallback: true, .. }
        ));
        assert!(matches!(
            events[2],
            OracleEvent::Looked {
                outcome: LookupOutcome::NoMatch
            }
        ));
        assert!(matches!(events[3], OracleEvent::Writing));
    }

    #[test]
    fn test_split_reading() {
        let (reading, remedies) = split_reading("a\nb\n\nc\nd\n\ne");
        assert_eq!(reading, "a\nb");
        assert_eq!(remedies, "c\nd");

        let (reading, remedies) = split_reading("a\r\nb\r\n\r\nc");
        assert_eq!(reading, "a\nb");
        assert_eq!(remedies, "c");

        let (reading, remedies) = split_reading("just one");
        assert_eq!(reading, "just one");
        assert_eq!(remedies, DEFAULT_REMEDIES);
    }

    #[test]
    fn test_custom_prompts_fill_placeholders() {
        let prompts = OraclePrompts {
            calculator: "{city}|{dob}|{tob}".to_string(),
            writer: "{name}:{knowledge}".to_string(),
        };
        assert_eq!(
            prompts.calculator_prompt(&request()),
            "Pune|1990-04-12|06:30"
        );
        assert_eq!(
            prompts.writer_prompt(&request(), &ChartFacts::default(), "k"),
            "Asha:k"
        );
    }

    #[test]
    fn test_braces_in_user_input_stay_literal() {
        let mut req = request();
        req.dob = "{city}".to_string();
        req.name = "{knowledge}".to_string();
        req.question = "What about {facts}?".to_string();

        let prompts = OraclePrompts::default();
        let calc = prompts.calculator_prompt(&req);
        assert!(calc.starts_with("Calculate chart for Date:{city}, Time:06:30, City:Pune."));

        let writer = prompts.writer_prompt(&req, &ChartFacts::default(), "SECRET-KNOWLEDGE");
        assert!(writer.starts_with("USER: {knowledge} | QUESTION: What about {facts}?\n"));
        assert_eq!(writer.matches("SECRET-KNOWLEDGE").count(), 1);
    }

    #[test]
    fn test_unknown_placeholders_are_kept() {
        assert_eq!(
            fill_template("{name} {unknown}", &[("name", "Asha")]),
            "Asha {unknown}"
        );
    }
}
