//! Reading request and result types.

use serde::{Deserialize, Serialize};

use super::chart::ChartFacts;

/// Birth details and a question, as collected by a front-end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingRequest {
    pub name: String,
    /// Date of birth, free-form.
    pub dob: String,
    /// Time of birth, free-form.
    pub tob: String,
    pub city: String,
    pub question: String,
}

/// Outcome of one pass through the oracle pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reading {
    pub chart_facts: ChartFacts,
    /// Dataset knowledge handed to the writer prompt.
    pub knowledge: String,
    pub reading: String,
    pub remedies: String,
}
