//! Web server command.

use console::style;

use crate::config::Settings;
use crate::server::AppState;

/// Default port when only a host is given.
const DEFAULT_PORT: u16 = 8000;

/// Start the web server.
pub async fn cmd_serve(settings: &Settings, bind: Option<&str>) -> anyhow::Result<()> {
    let bind = bind.unwrap_or(&settings.bind);
    let (host, port) = parse_bind_address(bind)?;

    println!("{} Loading dataset...", style("→").cyan());
    let state = AppState::new(settings)?;
    match &state.dataset {
        Some(dataset) => println!("  {} {} rows ready", style("✓").green(), dataset.len()),
        None => println!(
            "  {} No dataset loaded; readings will use general principles",
            style("!").yellow()
        ),
    }

    if !state.has_credentials {
        println!(
            "  {} No API key for {}; reading and chat requests will fail",
            style("!").yellow(),
            settings.llm.provider.as_str()
        );
    }

    println!(
        "{} Starting Astrologai server at http://{}:{}",
        style("→").cyan(),
        host,
        port
    );
    println!("  Press Ctrl+C to stop");

    crate::server::serve(state, &host, port).await
}

/// Parse a bind address that can be:
/// - Just a port: "8000" -> 127.0.0.1:8000
/// - Just a host: "0.0.0.0" -> 0.0.0.0:8000
/// - Host and port: "0.0.0.0:8000" -> 0.0.0.0:8000
fn parse_bind_address(bind: &str) -> anyhow::Result<(String, u16)> {
    // Try parsing as just a port number
    if let Ok(port) = bind.parse::<u16>() {
        return Ok(("127.0.0.1".to_string(), port));
    }

    // Try parsing as host:port
    if let Some((host, port_str)) = bind.rsplit_once(':') {
        if let Ok(port) = port_str.parse::<u16>() {
            return Ok((host.to_string(), port));
        }
    }

    if bind.is_empty() {
        anyhow::bail!("Empty bind address");
    }

    // Must be just a host, use default port
    Ok((bind.to_string(), DEFAULT_PORT))
}
