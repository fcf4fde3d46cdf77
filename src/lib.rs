//! Astrologai - Vedic astrology readings driven by a language model.
//!
//! Birth details go through a calculator prompt that yields chart facts,
//! the facts are matched against a static effect/remedy dataset, and a
//! writer prompt turns both into a short reading with remedies.

pub mod cli;
pub mod config;
pub mod dataset;
pub mod llm;
pub mod models;
pub mod server;
pub mod services;
