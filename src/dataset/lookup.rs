//! Matching chart facts against dataset rows.

use serde::Serialize;

use super::{Dataset, DatasetRow};
use crate::models::{ChartFacts, Planet};

/// Knowledge text when no row matches.
pub const FALLBACK_KNOWLEDGE: &str = "Use general Vedic principles.";

/// Knowledge text when no dataset is loaded.
pub const UNAVAILABLE_KNOWLEDGE: &str = "Database lookup error.";

/// Fields a lookup matches on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupKey {
    pub house: u8,
    pub planet: String,
    pub mahadasha: Option<String>,
    pub antardasha: Option<String>,
}

impl LookupKey {
    pub fn new(house: u8, planet: impl Into<String>) -> Self {
        Self {
            house,
            planet: planet.into(),
            mahadasha: None,
            antardasha: None,
        }
    }
}

impl From<&ChartFacts> for LookupKey {
    fn from(facts: &ChartFacts) -> Self {
        Self {
            house: facts.house,
            planet: facts.planet.clone(),
            mahadasha: Some(facts.mahadasha.clone()),
            antardasha: Some(facts.antardasha.clone()),
        }
    }
}

/// Result of looking up a key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "row", rename_all = "snake_case")]
pub enum LookupOutcome {
    Matched(DatasetRow),
    NoMatch,
    Unavailable,
}

impl LookupOutcome {
    /// Text handed to the writer prompt.
    pub fn knowledge(&self) -> String {
        match self {
            Self::Matched(row) => format!("Effect: {} | Remedy: {}", row.effect, row.remedies),
            Self::NoMatch => FALLBACK_KNOWLEDGE.to_string(),
            Self::Unavailable => UNAVAILABLE_KNOWLEDGE.to_string(),
        }
    }

    pub fn row(&self) -> Option<&DatasetRow> {
        match self {
            Self::Matched(row) => Some(row),
            _ => None,
        }
    }
}

/// Look a key up in an optional dataset.
pub fn lookup_in(dataset: Option<&Dataset>, key: &LookupKey) -> LookupOutcome {
    match dataset {
        Some(dataset) => dataset.lookup(key),
        None => LookupOutcome::Unavailable,
    }
}

impl Dataset {
    /// Find the row for a key.
    ///
    /// A row matches when its house equals the key's house and its planet
    /// cell contains the key's planet (case-insensitive). A recognised
    /// planet also matches on its Sanskrit name. Among matching rows, those
    /// that agree on mahadasha and then antardasha win; ties go to the
    /// earliest row.
    pub fn lookup(&self, key: &LookupKey) -> LookupOutcome {
        let needles = planet_needles(&key.planet);

        let mut best: Option<(u8, &DatasetRow)> = None;
        for row in self.rows.iter().filter(|r| r.house == key.house) {
            let cell = row.planet.to_lowercase();
            if !needles.iter().any(|n| cell.contains(n.as_str())) {
                continue;
            }

            let score = dasha_score(row, key);
            if best.map_or(true, |(s, _)| score > s) {
                best = Some((score, row));
            }
        }

        match best {
            Some((score, row)) => {
                tracing::debug!(
                    "Dataset match for house {} / {} (dasha score {})",
                    key.house,
                    key.planet,
                    score
                );
                LookupOutcome::Matched(row.clone())
            }
            None => {
                tracing::debug!("No dataset row for house {} / {}", key.house, key.planet);
                LookupOutcome::NoMatch
            }
        }
    }
}

fn planet_needles(planet: &str) -> Vec<String> {
    let raw = planet.trim().to_lowercase();
    match Planet::from_name(&raw) {
        Some(p) => {
            let mut needles = vec![p.name().to_lowercase()];
            let sanskrit = p.sanskrit_name().to_lowercase();
            if !needles.contains(&sanskrit) {
                needles.push(sanskrit);
            }
            needles
        }
        None => vec![raw],
    }
}

fn same_planet(a: &str, b: &str) -> bool {
    match (Planet::from_name(a), Planet::from_name(b)) {
        (Some(x), Some(y)) => x == y,
        _ => a.trim().eq_ignore_ascii_case(b.trim()),
    }
}

fn dasha_score(row: &DatasetRow, key: &LookupKey) -> u8 {
    let hit = |cell: &Option<String>, wanted: &Option<String>| match (cell, wanted) {
        (Some(c), Some(w)) => same_planet(c, w),
        _ => false,
    };

    let mut score = 0;
    if hit(&row.mahadasha, &key.mahadasha) {
        score += 2;
    }
    if hit(&row.antardasha, &key.antardasha) {
        score += 1;
    }
    score
}
