//! Data models for Astrologai.

mod chart;
mod planet;
mod reading;

pub use chart::{ChartFacts, ChartParseError, HOUSE_RANGE};
pub use planet::{Planet, ALL_PLANETS};
pub use reading::{Reading, ReadingRequest};
