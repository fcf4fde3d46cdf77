//! LLM client configuration.

use serde::{Deserialize, Serialize};

use super::prompts::{
    DEFAULT_ASTROLOGER_PERSONA, DEFAULT_CALCULATOR_PROMPT, DEFAULT_WRITER_PROMPT,
};

/// LLM provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// Google Gemini generateContent API (default)
    #[default]
    Gemini,
    /// OpenAI-compatible API (OpenAI, Groq, Together.ai, etc.)
    OpenAI,
    /// Ollama API (local)
    Ollama,
}

impl LlmProvider {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "gemini" | "google" => Some(Self::Gemini),
            "openai" | "groq" | "together" => Some(Self::OpenAI),
            "ollama" => Some(Self::Ollama),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenAI => "openai",
            Self::Ollama => "ollama",
        }
    }

    /// Whether requests must carry an API key.
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, Self::Ollama)
    }
}

/// Configuration for the LLM client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    /// LLM provider (gemini, openai or ollama)
    #[serde(default)]
    pub provider: LlmProvider,
    /// API endpoint (provider-specific defaults apply)
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// API key; usually supplied through the environment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Model used for both the calculator and the writer
    #[serde(default = "default_model")]
    pub model: String,
    /// Maximum tokens in response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Temperature for generation (0.0 - 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Custom calculator prompt (uses {dob}, {tob} and {city} placeholders)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calculator_prompt: Option<String>,
    /// Custom writer prompt (uses {name}, {question}, {facts} and {knowledge} placeholders)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub writer_prompt: Option<String>,
    /// Custom chat persona
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona: Option<String>,
}

fn default_endpoint() -> String {
    LlmConfig::provider_endpoint(LlmProvider::Gemini).to_string()
}

fn default_model() -> String {
    LlmConfig::provider_model(LlmProvider::Gemini).to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_temperature() -> f32 {
    0.7
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            endpoint: default_endpoint(),
            api_key: None,
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
            calculator_prompt: None,
            writer_prompt: None,
            persona: None,
        }
    }
}

/// Groq's OpenAI-compatible endpoint.
const GROQ_ENDPOINT: &str = "https://api.groq.com/openai";

/// Default model when talking to Groq.
const GROQ_MODEL: &str = "llama-3.3-70b-versatile";

impl LlmConfig {
    /// Default endpoint for a provider.
    pub fn provider_endpoint(provider: LlmProvider) -> &'static str {
        match provider {
            LlmProvider::Gemini => "https://generativelanguage.googleapis.com",
            LlmProvider::OpenAI => "https://api.openai.com",
            LlmProvider::Ollama => "http://localhost:11434",
        }
    }

    /// Default model for a provider.
    pub fn provider_model(provider: LlmProvider) -> &'static str {
        match provider {
            LlmProvider::Gemini => "gemini-2.5-flash-lite",
            LlmProvider::OpenAI => "gpt-4o-mini",
            LlmProvider::Ollama => "llama3.2",
        }
    }

    /// Apply environment variable overrides.
    ///
    /// Supported env vars:
    /// - `LLM_PROVIDER`: "gemini" (default), "openai", "groq", "together" or "ollama"
    /// - `LLM_ENDPOINT`: API endpoint (defaults based on provider)
    /// - `LLM_API_KEY`: API key for any provider
    /// - `LLM_MODEL`: Model name
    /// - `LLM_MAX_TOKENS`: Maximum tokens in response
    /// - `LLM_TEMPERATURE`: Generation temperature (0.0-1.0)
    /// - `LLM_TIMEOUT_SECS`: Request timeout
    /// - `GOOGLE_API_KEY` / `GEMINI_API_KEY`: Gemini key
    /// - `OPENAI_API_KEY`, `GROQ_API_KEY`: OpenAI-compatible keys
    ///
    /// Priority: LLM_PROVIDER wins over auto-detection from API keys.
    /// Without it, a Gemini key keeps the default provider; otherwise
    /// GROQ_API_KEY or OPENAI_API_KEY switch to the OpenAI-compatible API.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable source.
    pub fn with_overrides_from<F>(mut self, var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| var(key).filter(|v| !v.is_empty());

        let explicit_provider = var("LLM_PROVIDER");
        let explicit_endpoint = var("LLM_ENDPOINT");
        let explicit_model = var("LLM_MODEL");

        if let Some(ref val) = explicit_provider {
            if let Some(provider) = LlmProvider::from_str(val) {
                self.provider = provider;
            }
        }

        if let Some(ref endpoint) = explicit_endpoint {
            self.endpoint = endpoint.clone();
        }

        if let Some(val) = var("LLM_API_KEY") {
            self.api_key = Some(val);
        }

        let gemini_key = || var("GOOGLE_API_KEY").or_else(|| var("GEMINI_API_KEY"));

        if let Some(ref provider_str) = explicit_provider {
            let provider_lower = provider_str.to_lowercase();

            if explicit_endpoint.is_none() {
                self.endpoint = match provider_lower.as_str() {
                    "groq" => GROQ_ENDPOINT.to_string(),
                    "together" => "https://api.together.xyz".to_string(),
                    _ => Self::provider_endpoint(self.provider).to_string(),
                };
            }

            if explicit_model.is_none() {
                self.model = match provider_lower.as_str() {
                    "groq" => GROQ_MODEL.to_string(),
                    _ => Self::provider_model(self.provider).to_string(),
                };
            }

            if self.api_key.is_none() {
                self.api_key = match provider_lower.as_str() {
                    "gemini" | "google" => gemini_key(),
                    "groq" => var("GROQ_API_KEY"),
                    "openai" => var("OPENAI_API_KEY"),
                    // together and ollama use LLM_API_KEY which we already checked
                    _ => None,
                };
            }
        } else if self.api_key.is_none() {
            // No explicit provider - auto-detect from available keys
            self.api_key = match self.provider {
                LlmProvider::Gemini => gemini_key(),
                LlmProvider::OpenAI => var("OPENAI_API_KEY").or_else(|| var("GROQ_API_KEY")),
                LlmProvider::Ollama => None,
            };
            if self.api_key.is_none() && self.provider == LlmProvider::Gemini {
                let detected = var("GROQ_API_KEY")
                    .map(|k| (k, GROQ_ENDPOINT, GROQ_MODEL))
                    .or_else(|| {
                        var("OPENAI_API_KEY").map(|k| {
                            (
                                k,
                                Self::provider_endpoint(LlmProvider::OpenAI),
                                Self::provider_model(LlmProvider::OpenAI),
                            )
                        })
                    });
                if let Some((key, endpoint, model)) = detected {
                    self.api_key = Some(key);
                    self.provider = LlmProvider::OpenAI;
                    // Only replace values still at the Gemini defaults
                    if explicit_endpoint.is_none() && self.endpoint == default_endpoint() {
                        self.endpoint = endpoint.to_string();
                    }
                    if explicit_model.is_none() && self.model == default_model() {
                        self.model = model.to_string();
                    }
                }
            }
        }

        if let Some(val) = explicit_model {
            self.model = val;
        }
        if let Some(n) = var("LLM_MAX_TOKENS").and_then(|v| v.parse().ok()) {
            self.max_tokens = n;
        }
        if let Some(t) = var("LLM_TEMPERATURE").and_then(|v| v.parse().ok()) {
            self.temperature = t;
        }
        if let Some(n) = var("LLM_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            self.timeout_secs = n;
        }
        self
    }

    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.api_key = Some(api_key.to_string());
        self
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    /// Whether the configured provider can be called at all.
    pub fn has_credentials(&self) -> bool {
        !self.provider.requires_api_key()
            || self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }

    /// Get the calculator prompt, using custom or default.
    pub fn get_calculator_prompt(&self) -> &str {
        self.calculator_prompt
            .as_deref()
            .unwrap_or(DEFAULT_CALCULATOR_PROMPT)
    }

    /// Get the writer prompt, using custom or default.
    pub fn get_writer_prompt(&self) -> &str {
        self.writer_prompt.as_deref().unwrap_or(DEFAULT_WRITER_PROMPT)
    }

    /// Get the chat persona, using custom or default.
    pub fn get_persona(&self) -> &str {
        self.persona.as_deref().unwrap_or(DEFAULT_ASTROLOGER_PERSONA)
    }

    /// Copy of this config safe to print (API key masked).
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        copy.api_key = copy.api_key.as_ref().map(|k| {
            let chars: Vec<char> = k.chars().collect();
            let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
            format!("****{}", tail)
        });
        copy
    }
}
