//! Static effect/remedy table keyed by house and planet.
//!
//! The table is a CSV file, optionally shipped inside a zip archive (the
//! first `.csv` entry is used). It is loaded once at startup and only read
//! afterwards.
//!
//! Required columns: `House`, `Planet`, `Effect`, `Remedies`.
//! Optional columns: `Mahadasha`, `Antardasha`.

mod lookup;

pub use lookup::{
    lookup_in, LookupKey, LookupOutcome, FALLBACK_KNOWLEDGE, UNAVAILABLE_KNOWLEDGE,
};

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};
use zip::ZipArchive;

/// Errors that can occur while loading the dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Failed to open dataset {path}: {source}")]
    Open {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("No .csv file found in archive {0}")]
    NoCsvInArchive(String),

    #[error("Dataset is missing required column: {0}")]
    MissingColumn(&'static str),

    #[error("Unsupported dataset format: {0}")]
    UnsupportedFormat(String),
}

/// One row of the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetRow {
    pub house: u8,
    pub planet: String,
    pub effect: String,
    pub remedies: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mahadasha: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub antardasha: Option<String>,
}

/// Column positions resolved from the header row.
struct Columns {
    house: usize,
    planet: usize,
    effect: usize,
    remedies: usize,
    mahadasha: Option<usize>,
    antardasha: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, DatasetError> {
        let find = |names: &[&str]| {
            headers
                .iter()
                .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
        };

        Ok(Self {
            house: find(&["house"]).ok_or(DatasetError::MissingColumn("House"))?,
            planet: find(&["planet"]).ok_or(DatasetError::MissingColumn("Planet"))?,
            effect: find(&["effect", "effects"]).ok_or(DatasetError::MissingColumn("Effect"))?,
            remedies: find(&["remedies", "remedy"])
                .ok_or(DatasetError::MissingColumn("Remedies"))?,
            mahadasha: find(&["mahadasha"]),
            antardasha: find(&["antardasha"]),
        })
    }
}

/// The loaded lookup table.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    rows: Vec<DatasetRow>,
}

impl Dataset {
    /// Load a dataset from a `.csv` file or a `.zip` archive containing one.
    pub fn load(path: &Path) -> Result<Self, DatasetError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        let file = File::open(path).map_err(|source| DatasetError::Open {
            path: path.display().to_string(),
            source,
        })?;

        let dataset = match ext.as_str() {
            "csv" => Self::from_reader(file)?,
            "zip" => Self::from_zip(file, path)?,
            other => return Err(DatasetError::UnsupportedFormat(other.to_string())),
        };

        info!(
            "Loaded dataset {} ({} rows)",
            path.display(),
            dataset.rows.len()
        );
        Ok(dataset)
    }

    fn from_zip(file: File, path: &Path) -> Result<Self, DatasetError> {
        let mut archive = ZipArchive::new(file)?;

        let mut csv_index = None;
        for i in 0..archive.len() {
            let entry = archive.by_index(i)?;
            let name = entry.name();
            // Skip directories and __MACOSX metadata
            if entry.is_dir() || name.starts_with("__MACOSX") {
                continue;
            }
            if name.to_lowercase().ends_with(".csv") {
                debug!("Using archive entry {}", name);
                csv_index = Some(i);
                break;
            }
        }

        let index =
            csv_index.ok_or_else(|| DatasetError::NoCsvInArchive(path.display().to_string()))?;
        let entry = archive.by_index(index)?;
        Self::from_reader(entry)
    }

    /// Parse CSV content from any reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DatasetError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let columns = Columns::from_headers(csv_reader.headers()?)?;

        let mut rows = Vec::new();
        let mut skipped = 0usize;

        for record in csv_reader.records() {
            let record = record?;
            let cell = |i: usize| record.get(i).unwrap_or("").to_string();
            let optional = |i: Option<usize>| {
                i.and_then(|i| record.get(i))
                    .map(str::to_string)
                    .filter(|s| !s.is_empty())
            };

            let Some(house) = parse_house_cell(record.get(columns.house).unwrap_or("")) else {
                skipped += 1;
                continue;
            };

            rows.push(DatasetRow {
                house,
                planet: cell(columns.planet),
                effect: cell(columns.effect),
                remedies: cell(columns.remedies),
                mahadasha: optional(columns.mahadasha),
                antardasha: optional(columns.antardasha),
            });
        }

        if skipped > 0 {
            warn!("Skipped {} dataset rows with unreadable house numbers", skipped);
        }

        Ok(Self { rows })
    }

    /// Build a dataset from rows already in memory.
    pub fn from_rows(rows: Vec<DatasetRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[DatasetRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether the table carries dasha columns.
    pub fn has_dasha_columns(&self) -> bool {
        self.rows
            .iter()
            .any(|r| r.mahadasha.is_some() || r.antardasha.is_some())
    }
}

/// House cells show up as `7`, `7.0`, or occasionally `House 7`.
fn parse_house_cell(cell: &str) -> Option<u8> {
    let digits: String = cell
        .trim()
        .trim_start_matches(|c: char| !c.is_ascii_digit())
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse::<u8>().ok().filter(|h| (1..=12).contains(h))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    const SAMPLE: &str = "\
House,Planet,Effect,Remedies
1,Sun,Strong vitality and leadership,Offer water to the Sun at dawn
7,Venus,Harmonious partnerships,Donate white sweets on Fridays
7,Saturn,Delayed marriage,Light a sesame oil lamp on Saturdays
x,Moon,Bad row,Ignored
";

    #[test]
    fn test_from_reader_parses_rows() {
        let dataset = Dataset::from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.rows()[1].planet, "Venus");
        assert_eq!(dataset.rows()[1].remedies, "Donate white sweets on Fridays");
        assert!(!dataset.has_dasha_columns());
    }

    #[test]
    fn test_missing_column_is_an_error() {
        let err = Dataset::from_reader("House,Planet,Effect\n1,Sun,x\n".as_bytes()).unwrap_err();
        assert!(matches!(err, DatasetError::MissingColumn("Remedies")));
    }

    #[test]
    fn test_headers_are_case_insensitive() {
        let csv = "house,PLANET,effect,Remedy,Mahadasha\n2,Moon,Calm,Wear pearl,Venus\n";
        let dataset = Dataset::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(dataset.rows()[0].remedies, "Wear pearl");
        assert_eq!(dataset.rows()[0].mahadasha.as_deref(), Some("Venus"));
        assert!(dataset.has_dasha_columns());
    }

    #[test]
    fn test_parse_house_cell() {
        assert_eq!(parse_house_cell("7"), Some(7));
        assert_eq!(parse_house_cell("7.0"), Some(7));
        assert_eq!(parse_house_cell("House 12"), Some(12));
        assert_eq!(parse_house_cell("13"), None);
        assert_eq!(parse_house_cell(""), None);
    }

    #[test]
    fn test_load_csv_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("astro.csv");
        std::fs::write(&path, SAMPLE).unwrap();

        let dataset = Dataset::load(&path).unwrap();
        assert_eq!(dataset.len(), 3);
    }

    #[test]
    fn test_load_zipped_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Complete_Astrology_DataSet.zip");

        let file = File::create(&path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        writer.start_file("__MACOSX/._astro.csv", options).unwrap();
        writer.write_all(b"junk").unwrap();
        writer.start_file("astro.csv", options).unwrap();
        writer.write_all(SAMPLE.as_bytes()).unwrap();
        writer.finish().unwrap();

        let dataset = Dataset::load(&path).unwrap();
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.rows()[0].effect, "Strong vitality and leadership");
    }

    #[test]
    fn test_zip_without_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.zip");

        let file = File::create(&path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        writer
            .start_file("readme.txt", zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"no data").unwrap();
        writer.finish().unwrap();

        assert!(matches!(
            Dataset::load(&path),
            Err(DatasetError::NoCsvInArchive(_))
        ));
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("astro.xlsx");
        std::fs::write(&path, b"").unwrap();

        assert!(matches!(
            Dataset::load(&path),
            Err(DatasetError::UnsupportedFormat(ext)) if ext == "xlsx"
        ));
    }
}
