//! One-shot reading command.

use std::sync::Arc;

use console::style;
use tokio::sync::mpsc;

use crate::cli::helpers::{spinner, value_or_prompt};
use crate::config::Settings;
use crate::dataset::LookupOutcome;
use crate::llm::LlmClient;
use crate::models::ReadingRequest;
use crate::server::load_dataset;
use crate::services::{OracleEvent, OraclePrompts, OracleService};

/// Birth details given on the command line; missing values are prompted for.
pub struct ReadInput {
    pub name: Option<String>,
    pub dob: Option<String>,
    pub tob: Option<String>,
    pub city: Option<String>,
    pub question: Option<String>,
}

impl ReadInput {
    fn into_request(self) -> std::io::Result<ReadingRequest> {
        Ok(ReadingRequest {
            name: value_or_prompt(self.name, "Name")?,
            dob: value_or_prompt(self.dob, "Date of birth")?,
            tob: value_or_prompt(self.tob, "Time of birth")?,
            city: value_or_prompt(self.city, "City of birth")?,
            question: value_or_prompt(self.question, "Question")?,
        })
    }
}

/// Generate a reading and print it.
pub async fn cmd_read(settings: &Settings, input: ReadInput, json: bool) -> anyhow::Result<()> {
    if !settings.llm.has_credentials() {
        anyhow::bail!(
            "No API key configured for {}. Set GOOGLE_API_KEY or llm.api_key.",
            settings.llm.provider.as_str()
        );
    }

    let request = input.into_request()?;

    let client = LlmClient::new(settings.llm.clone())?;
    let oracle = OracleService::new(
        Arc::new(client),
        load_dataset(settings),
        OraclePrompts::from_config(&settings.llm),
    );

    let (event_tx, mut event_rx) = mpsc::channel::<OracleEvent>(8);
    let pb = if json {
        None
    } else {
        Some(spinner("Reading the stars..."))
    };

    let progress = async {
        while let Some(event) = event_rx.recv().await {
            let Some(pb) = pb.as_ref() else { continue };
            match event {
                OracleEvent::Calculating => pb.set_message("Calculating chart..."),
                OracleEvent::ChartReady { facts, fallback } => {
                    let note = if fallback { " (default chart)" } else { "" };
                    pb.println(format!(
                        "  {} House {}, {}{}",
                        style("✓").green(),
                        facts.house,
                        facts.planet,
                        note
                    ));
                }
                OracleEvent::Looked { outcome } => {
                    let msg = match outcome {
                        LookupOutcome::Matched(_) => "Found dataset entry",
                        LookupOutcome::NoMatch => "No dataset entry, using general principles",
                        LookupOutcome::Unavailable => "Dataset unavailable",
                    };
                    pb.println(format!("  {} {}", style("✓").green(), msg));
                }
                OracleEvent::Writing => pb.set_message("Writing reading..."),
            }
        }
    };

    let (result, _) = tokio::join!(
        oracle.generate_reading_with_events(&request, Some(event_tx)),
        progress
    );

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    let reading = result?;

    if json {
        println!("{}", serde_json::to_string_pretty(&reading)?);
        return Ok(());
    }

    let facts = &reading.chart_facts;
    println!();
    println!("{}", style(format!("Reading for {}", request.name)).bold());
    println!(
        "  {} House {} | {} | Mahadasha {} | Antardasha {} | Pratyantardasha {}",
        style("→").dim(),
        facts.house,
        facts.planet,
        facts.mahadasha,
        facts.antardasha,
        facts.pratyantardasha
    );
    println!();
    println!("{}", reading.reading);
    println!();
    println!("{}", style("Remedies").bold().magenta());
    println!("{}", reading.remedies);

    Ok(())
}
