//! Service layer for Astrologai.
//!
//! This module contains domain logic separated from UI concerns.
//! Services can be used by CLI, web server, or other interfaces.

pub mod chat;
pub mod oracle;

pub use chat::{ChatRole, ChatSession, ChatTurn};
pub use oracle::{
    split_reading, OracleError, OracleEvent, OraclePrompts, OracleService, DEFAULT_REMEDIES,
};
