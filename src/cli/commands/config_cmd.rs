//! Configuration display command.

use console::style;

use crate::config::{Config, Settings};

/// Print where settings came from and the effective values, secrets redacted.
pub fn cmd_config_show(settings: &Settings, config: &Config) -> anyhow::Result<()> {
    match &settings.config_path {
        Some(path) => println!("{} Config file: {}", style("→").cyan(), path.display()),
        None => println!("{} No config file found, using defaults", style("!").yellow()),
    }

    let dataset = settings
        .dataset_path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(none)".to_string());
    let dataset_state = match &settings.dataset_path {
        Some(p) if p.exists() => style("found").green(),
        Some(_) => style("missing").red(),
        None => style("-").dim(),
    };

    println!("  {} Dataset: {} [{}]", style("→").dim(), dataset, dataset_state);
    println!("  {} Bind: {}", style("→").dim(), settings.bind);
    println!(
        "  {} Session TTL: {}s",
        style("→").dim(),
        settings.session_ttl.as_secs()
    );

    let effective = Config {
        dataset: Some(dataset),
        bind: Some(settings.bind.clone()),
        session_ttl_secs: Some(settings.session_ttl.as_secs()),
        llm: settings.llm.redacted(),
        source_path: config.source_path.clone(),
    };

    println!();
    println!("{}", toml::to_string_pretty(&effective)?);

    Ok(())
}
