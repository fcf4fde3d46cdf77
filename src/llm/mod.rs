//! LLM integration: hosted model client and prompts.

mod client;

pub use client::{
    LlmClient, LlmConfig, LlmError, LlmProvider, TextGenerator, DEFAULT_ASTROLOGER_PERSONA,
    DEFAULT_CALCULATOR_PROMPT, DEFAULT_WRITER_PROMPT,
};
