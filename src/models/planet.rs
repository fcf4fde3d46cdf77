//! Planet (graha) names used in chart facts and dataset rows.
//!
//! The nine Vedic grahas, recognised by English or Sanskrit name. Names are
//! opaque lookup keys here; nothing is computed from them.

use serde::{Deserialize, Serialize};

/// The 9 Vedic grahas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Planet {
    Sun,
    Moon,
    Mars,
    Mercury,
    Jupiter,
    Venus,
    Saturn,
    Rahu,
    Ketu,
}

/// All 9 grahas in traditional order.
pub const ALL_PLANETS: [Planet; 9] = [
    Planet::Sun,
    Planet::Moon,
    Planet::Mars,
    Planet::Mercury,
    Planet::Jupiter,
    Planet::Venus,
    Planet::Saturn,
    Planet::Rahu,
    Planet::Ketu,
];

impl Planet {
    /// English name, as used in the dataset.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sun => "Sun",
            Self::Moon => "Moon",
            Self::Mars => "Mars",
            Self::Mercury => "Mercury",
            Self::Jupiter => "Jupiter",
            Self::Venus => "Venus",
            Self::Saturn => "Saturn",
            Self::Rahu => "Rahu",
            Self::Ketu => "Ketu",
        }
    }

    /// Sanskrit name of the graha.
    pub const fn sanskrit_name(self) -> &'static str {
        match self {
            Self::Sun => "Surya",
            Self::Moon => "Chandra",
            Self::Mars => "Mangal",
            Self::Mercury => "Buddh",
            Self::Jupiter => "Guru",
            Self::Venus => "Shukra",
            Self::Saturn => "Shani",
            Self::Rahu => "Rahu",
            Self::Ketu => "Ketu",
        }
    }

    /// Parse an English or Sanskrit name (case-insensitive, surrounding
    /// whitespace ignored). A few common spellings are accepted.
    pub fn from_name(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "sun" | "surya" | "ravi" => Some(Self::Sun),
            "moon" | "chandra" | "soma" => Some(Self::Moon),
            "mars" | "mangal" | "mangala" | "kuja" => Some(Self::Mars),
            "mercury" | "buddh" | "budh" | "budha" => Some(Self::Mercury),
            "jupiter" | "guru" | "brihaspati" => Some(Self::Jupiter),
            "venus" | "shukra" | "sukra" => Some(Self::Venus),
            "saturn" | "shani" | "sani" => Some(Self::Saturn),
            "rahu" => Some(Self::Rahu),
            "ketu" => Some(Self::Ketu),
            _ => None,
        }
    }

    /// Normalise a free-form planet name to its English form.
    ///
    /// Unrecognised names are returned trimmed but otherwise unchanged, so
    /// substring matching against the dataset still has a chance.
    pub fn normalize(s: &str) -> String {
        match Self::from_name(s) {
            Some(planet) => planet.name().to_string(),
            None => s.trim().to_string(),
        }
    }
}

impl std::fmt::Display for Planet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
