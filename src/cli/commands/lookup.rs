//! Dataset lookup command.

use console::style;

use crate::config::Settings;
use crate::dataset::{lookup_in, LookupKey, LookupOutcome};
use crate::models::Planet;
use crate::server::load_dataset;

/// Print the dataset knowledge for a house and planet.
pub fn cmd_lookup(
    settings: &Settings,
    house: u8,
    planet: &str,
    mahadasha: Option<String>,
    antardasha: Option<String>,
) -> anyhow::Result<()> {
    let dataset = load_dataset(settings);

    let key = LookupKey {
        house,
        planet: Planet::normalize(planet),
        mahadasha,
        antardasha,
    };
    let outcome = lookup_in(dataset.as_deref(), &key);

    match &outcome {
        LookupOutcome::Matched(row) => {
            println!(
                "{} House {} | {}",
                style("✓").green(),
                row.house,
                row.planet
            );
            if let Some(md) = &row.mahadasha {
                println!("  {} Mahadasha: {}", style("→").dim(), md);
            }
            if let Some(ad) = &row.antardasha {
                println!("  {} Antardasha: {}", style("→").dim(), ad);
            }
            println!("  {} {}", style("Effect:").bold(), row.effect);
            println!("  {} {}", style("Remedy:").bold(), row.remedies);
        }
        LookupOutcome::NoMatch => {
            println!(
                "{} No entry for house {} and {}",
                style("!").yellow(),
                key.house,
                key.planet
            );
            println!("  {}", outcome.knowledge());
        }
        LookupOutcome::Unavailable => {
            anyhow::bail!("Dataset could not be loaded; check --dataset or ASTROLOGAI_DATASET");
        }
    }

    Ok(())
}
