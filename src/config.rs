//! Configuration management for Astrologai.
//!
//! Sources, lowest to highest priority:
//! 1. Built-in defaults
//! 2. Config file (`--config`, then `./astrologai.{toml,json,yaml,yml}`,
//!    then `<config dir>/astrologai/config.{toml,json,yaml,yml}`)
//! 3. Environment variables (`.env` is loaded first by `main`)
//! 4. CLI flags

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::llm::LlmConfig;

/// Dataset file looked for when nothing is configured.
pub const DEFAULT_DATASET: &str = "Complete_Astrology_DataSet.zip";

/// Default server bind address.
pub const DEFAULT_BIND: &str = "127.0.0.1:8000";

/// Default idle lifetime of a chat session on the server.
pub const DEFAULT_SESSION_TTL_SECS: u64 = 3600;

const CONFIG_EXTENSIONS: [&str; 4] = ["toml", "json", "yaml", "yml"];

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse {format} config {path}: {message}")]
    Parse {
        format: &'static str,
        path: String,
        message: String,
    },
}

/// Configuration as written in a config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Path to the dataset (.csv or .zip), relative to the config file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset: Option<String>,
    /// Server bind address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
    /// Idle lifetime of server chat sessions, in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_ttl_secs: Option<u64>,
    /// LLM settings
    #[serde(default)]
    pub llm: LlmConfig,
    /// Where this config was loaded from
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| ConfigError::Read {
                    path: path.display().to_string(),
                    source,
                })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");
        let mut config = Self::parse(&contents, ext).map_err(|(format, message)| {
            ConfigError::Parse {
                format,
                path: path.display().to_string(),
                message,
            }
        })?;

        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    fn parse(contents: &str, ext: &str) -> Result<Self, (&'static str, String)> {
        match ext {
            "json" => serde_json::from_str(contents).map_err(|e| ("JSON", e.to_string())),
            "yaml" | "yml" => serde_yaml::from_str(contents).map_err(|e| ("YAML", e.to_string())),
            _ => toml::from_str(contents).map_err(|e| ("TOML", e.to_string())),
        }
    }

    /// Find a config file in the working directory or the user config dir.
    pub fn discover() -> Option<PathBuf> {
        let cwd = std::env::current_dir().ok();
        let local = cwd.into_iter().flat_map(|dir| {
            CONFIG_EXTENSIONS
                .iter()
                .map(move |ext| dir.join(format!("astrologai.{}", ext)))
        });
        let user = dirs::config_dir().into_iter().flat_map(|dir| {
            CONFIG_EXTENSIONS
                .iter()
                .map(move |ext| dir.join("astrologai").join(format!("config.{}", ext)))
        });

        local.chain(user).find(|p| p.is_file())
    }

    /// Get the base directory for resolving relative paths.
    /// Returns the config file's parent directory if available, otherwise None.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// - Absolute paths are returned as-is
    /// - Paths starting with ~ are expanded
    /// - Relative paths are resolved relative to `base_dir`
    pub fn resolve_path(path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref dataset) = self.dataset {
            settings.dataset_path = Some(Self::resolve_path(dataset, base_dir));
        }
        if let Some(ref bind) = self.bind {
            settings.bind = bind.clone();
        }
        if let Some(ttl) = self.session_ttl_secs {
            settings.session_ttl = Duration::from_secs(ttl);
        }
        settings.llm = self.llm.clone();
        settings.config_path = self.source_path.clone();
    }
}

/// Effective runtime settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Dataset to load; `None` runs without one
    pub dataset_path: Option<PathBuf>,
    /// Server bind address (PORT, HOST or HOST:PORT)
    pub bind: String,
    /// Idle lifetime of server chat sessions
    pub session_ttl: Duration,
    pub llm: LlmConfig,
    /// Config file the settings came from, if any
    pub config_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dataset_path: Some(PathBuf::from(DEFAULT_DATASET)),
            bind: DEFAULT_BIND.to_string(),
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
            llm: LlmConfig::default(),
            config_path: None,
        }
    }
}

impl Settings {
    /// Apply `ASTROLOGAI_*` and LLM environment variables.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable source.
    pub fn with_overrides_from<F>(mut self, var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dataset) = var("ASTROLOGAI_DATASET").filter(|s| !s.is_empty()) {
            tracing::debug!("Using ASTROLOGAI_DATASET from environment: {}", dataset);
            let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            self.dataset_path = Some(Config::resolve_path(&dataset, &cwd));
        }
        if let Some(bind) = var("ASTROLOGAI_BIND").filter(|s| !s.is_empty()) {
            self.bind = bind;
        }
        if let Some(ttl) = var("ASTROLOGAI_SESSION_TTL_SECS").and_then(|v| v.parse().ok()) {
            self.session_ttl = Duration::from_secs(ttl);
        }
        self.llm = self.llm.with_overrides_from(&var);
        self
    }
}

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file (skips discovery)
    pub config_path: Option<PathBuf>,
    /// Dataset override from the command line
    pub dataset: Option<PathBuf>,
}

/// Load settings with explicit options.
/// Returns (Settings, Config) tuple.
pub async fn load_settings_with_options(
    options: LoadOptions,
) -> Result<(Settings, Config), ConfigError> {
    let config = match options.config_path.or_else(Config::discover) {
        Some(path) => {
            tracing::debug!("Loading config from {}", path.display());
            Config::load_from_path(&path).await?
        }
        None => Config::default(),
    };

    let mut settings = Settings::default();

    let base_dir = config
        .base_dir()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    config.apply_to_settings(&mut settings, &base_dir);

    let mut settings = settings.with_env_overrides();

    // --dataset takes precedence over everything
    if let Some(dataset) = options.dataset {
        settings.dataset_path = Some(dataset);
    }

    Ok((settings, config))
}
