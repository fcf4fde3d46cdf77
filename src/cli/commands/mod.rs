//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod chat;
mod config_cmd;
mod lookup;
mod read;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{load_settings_with_options, LoadOptions};
use crate::models::HOUSE_RANGE;

#[derive(Parser)]
#[command(name = "astrologai")]
#[command(about = "Vedic astrology readings from birth details")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Astrology dataset (.csv or .zip), overrides config and environment
    #[arg(short, long, global = true)]
    dataset: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Address to bind: PORT, HOST, or HOST:PORT (default: 127.0.0.1:8000)
        bind: Option<String>,
    },

    /// Generate a reading from birth details
    Read {
        /// Name of the person
        #[arg(long)]
        name: Option<String>,
        /// Date of birth
        #[arg(long)]
        dob: Option<String>,
        /// Time of birth
        #[arg(long)]
        tob: Option<String>,
        /// City of birth
        #[arg(long)]
        city: Option<String>,
        /// Question for the astrologer
        #[arg(long, short)]
        question: Option<String>,
        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Talk with the astrologer persona
    Chat,

    /// Look up dataset knowledge for a house and planet
    Lookup {
        /// House number (1-12)
        #[arg(value_parser = parse_house)]
        house: u8,
        /// Planet name (English or Sanskrit)
        planet: String,
        /// Prefer rows for this Mahadasha
        #[arg(long)]
        mahadasha: Option<String>,
        /// Prefer rows for this Antardasha
        #[arg(long)]
        antardasha: Option<String>,
    },

    /// Show effective configuration
    Config,
}

fn parse_house(value: &str) -> Result<u8, String> {
    let house: u8 = value
        .parse()
        .map_err(|_| format!("'{}' is not a house number", value))?;
    if HOUSE_RANGE.contains(&house) {
        Ok(house)
    } else {
        Err(format!("house must be between 1 and 12, got {}", house))
    }
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
        dataset: cli.dataset,
    };
    let (settings, config) = load_settings_with_options(options).await?;

    match cli.command {
        Commands::Serve { bind } => serve::cmd_serve(&settings, bind.as_deref()).await,
        Commands::Read {
            name,
            dob,
            tob,
            city,
            question,
            json,
        } => {
            let input = read::ReadInput {
                name,
                dob,
                tob,
                city,
                question,
            };
            read::cmd_read(&settings, input, json).await
        }
        Commands::Chat => chat::cmd_chat(&settings).await,
        Commands::Lookup {
            house,
            planet,
            mahadasha,
            antardasha,
        } => lookup::cmd_lookup(&settings, house, &planet, mahadasha, antardasha),
        Commands::Config => config_cmd::cmd_config_show(&settings, &config),
    }
}
