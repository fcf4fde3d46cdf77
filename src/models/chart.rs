//! Chart facts produced by the calculator model.
//!
//! The model is asked for strict JSON but routinely wraps it in markdown
//! fences, quotes numbers, or drops keys. Parsing is lenient about all of
//! that and only rejects output that is not a JSON object or whose house is
//! outside 1-12.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use super::planet::Planet;

/// Valid house numbers.
pub const HOUSE_RANGE: std::ops::RangeInclusive<u8> = 1..=12;

/// Astrological fact bundle used as the dataset lookup key.
///
/// Serialized with the capitalised keys the calculator prompt asks for, so
/// the same shape goes out over HTTP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartFacts {
    #[serde(rename = "House")]
    pub house: u8,
    #[serde(rename = "Planet")]
    pub planet: String,
    #[serde(rename = "Mahadasha")]
    pub mahadasha: String,
    #[serde(rename = "Antardasha")]
    pub antardasha: String,
    #[serde(rename = "Pratyanerdasha", alias = "Pratyantardasha")]
    pub pratyantardasha: String,
}

impl Default for ChartFacts {
    /// The fixed record substituted when the calculator output is unusable.
    fn default() -> Self {
        Self {
            house: 1,
            planet: Planet::Sun.name().to_string(),
            mahadasha: Planet::Sun.name().to_string(),
            antardasha: Planet::Sun.name().to_string(),
            pratyantardasha: Planet::Moon.name().to_string(),
        }
    }
}

/// Why calculator output could not be turned into chart facts.
#[derive(Debug, Error)]
pub enum ChartParseError {
    #[error("response is not JSON: {0}")]
    NotJson(String),

    #[error("response JSON is not an object")]
    NotAnObject,

    #[error("house out of range: {0}")]
    InvalidHouse(String),
}

impl ChartFacts {
    /// Parse the calculator model's raw text.
    ///
    /// Missing keys take their value from [`ChartFacts::default`]. Planet
    /// names are normalised to their English form when recognised.
    pub fn from_model_output(text: &str) -> Result<Self, ChartParseError> {
        let value = first_json_object(text)?;
        let obj = value.as_object().ok_or(ChartParseError::NotAnObject)?;

        let defaults = Self::default();

        let house = match field(obj, &["house"]) {
            None => defaults.house,
            Some(v) => parse_house(v)?,
        };

        let planet_field = |keys: &[&str], fallback: String| -> String {
            field(obj, keys)
                .and_then(value_as_text)
                .filter(|s| !s.trim().is_empty())
                .map(|s| Planet::normalize(&s))
                .unwrap_or(fallback)
        };

        Ok(Self {
            house,
            planet: planet_field(&["planet"], defaults.planet),
            mahadasha: planet_field(&["mahadasha"], defaults.mahadasha),
            antardasha: planet_field(&["antardasha"], defaults.antardasha),
            pratyantardasha: planet_field(
                &["pratyanerdasha", "pratyantardasha"],
                defaults.pratyantardasha,
            ),
        })
    }

    /// Parse calculator output, substituting the default record on failure.
    pub fn from_model_output_or_default(text: &str) -> Self {
        match Self::from_model_output(text) {
            Ok(facts) => facts,
            Err(e) => {
                tracing::warn!("Unusable chart from calculator ({}), using default chart", e);
                Self::default()
            }
        }
    }

    /// Chart planet as a known graha, if recognised.
    pub fn planet_kind(&self) -> Option<Planet> {
        Planet::from_name(&self.planet)
    }

    /// Compact JSON rendering for prompts and logs.
    pub fn to_json_string(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Strip markdown fences and decode the first JSON object in the text.
///
/// Each `{` is tried in turn and only the value starting there is read, so
/// trailing prose or a second object does not spoil the first one.
fn first_json_object(text: &str) -> Result<Value, ChartParseError> {
    let trimmed = text.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```JSON"))
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    let unfenced = unfenced.strip_suffix("```").unwrap_or(unfenced).trim();

    let mut first_error = None;
    for (start, _) in unfenced.match_indices('{') {
        let mut values =
            serde_json::Deserializer::from_str(&unfenced[start..]).into_iter::<Value>();
        match values.next() {
            Some(Ok(value)) if value.is_object() => return Ok(value),
            Some(Err(e)) => {
                first_error.get_or_insert_with(|| e.to_string());
            }
            _ => {}
        }
    }

    if let Some(e) = first_error {
        return Err(ChartParseError::NotJson(e));
    }

    // No object anywhere: report whether the text was JSON at all
    match serde_json::from_str::<Value>(unfenced) {
        Ok(_) => Err(ChartParseError::NotAnObject),
        Err(e) => Err(ChartParseError::NotJson(e.to_string())),
    }
}

/// Case-insensitive key lookup, trying each candidate key in turn.
fn field<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| {
        obj.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    })
}

fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_house(value: &Value) -> Result<u8, ChartParseError> {
    let n = match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s
            .trim()
            .trim_start_matches(|c: char| !c.is_ascii_digit())
            .split(|c: char| !c.is_ascii_digit())
            .next()
            .and_then(|digits| digits.parse::<u64>().ok()),
        _ => None,
    };

    n.and_then(|n| u8::try_from(n).ok())
        .filter(|h| HOUSE_RANGE.contains(h))
        .ok_or_else(|| ChartParseError::InvalidHouse(value.to_string()))
}
