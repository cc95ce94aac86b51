//! CSV ingest for wide-format time-series exports.
//!
//! Each export has the header
//! `Province/State, Country/Region, Lat, Long, <date1>, <date2>, ...`
//! with one cumulative count per date column. Date columns are appended over
//! time, so the last column is always the most recent day.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

const FIXED_COLUMNS: [&str; 4] = ["Province/State", "Country/Region", "Lat", "Long"];

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("unexpected header: expected {expected:?} as leading columns, got {found:?}")]
    UnexpectedHeader {
        expected: [&'static str; 4],
        found: Vec<String>,
    },
    #[error("header has no date columns")]
    NoDateColumns,
}

/// One source line, before normalisation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    /// 1-based line number in the source file.
    pub line: u64,
    pub state: Option<String>,
    pub country: String,
    pub lat: String,
    pub lng: String,
    /// `(date label, cell value)` pairs in header order.
    pub columns: Vec<(String, String)>,
}

impl RawRow {
    /// Cell value for a column name, including the four fixed columns.
    pub fn get(&self, column: &str) -> Option<&str> {
        match column {
            "Province/State" => Some(self.state.as_deref().unwrap_or("")),
            "Country/Region" => Some(&self.country),
            "Lat" => Some(&self.lat),
            "Long" => Some(&self.lng),
            _ => self
                .columns
                .iter()
                .find(|(label, _)| label == column)
                .map(|(_, value)| value.as_str()),
        }
    }
}

/// Read every row of a time-series export.
///
/// A row whose field count differs from the header is a structural error.
pub fn read_rows<R: Read>(reader: R) -> Result<Vec<RawRow>, SourceError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let leading: Vec<String> = headers.iter().take(4).map(str::to_string).collect();
    if leading.len() < 4 || leading.iter().zip(FIXED_COLUMNS).any(|(a, b)| a != b) {
        return Err(SourceError::UnexpectedHeader {
            expected: FIXED_COLUMNS,
            found: leading,
        });
    }
    let labels: Vec<String> = headers.iter().skip(4).map(str::to_string).collect();
    if labels.is_empty() {
        return Err(SourceError::NoDateColumns);
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let line = record.position().map_or(0, |p| p.line());
        let state = record.get(0).filter(|s| !s.is_empty()).map(str::to_string);
        rows.push(RawRow {
            line,
            state,
            country: record.get(1).unwrap_or_default().to_string(),
            lat: record.get(2).unwrap_or_default().to_string(),
            lng: record.get(3).unwrap_or_default().to_string(),
            columns: labels
                .iter()
                .cloned()
                .zip(record.iter().skip(4).map(str::to_string))
                .collect(),
        });
    }
    Ok(rows)
}

/// Open and read a time-series export from disk.
pub fn read_rows_from_path(path: &Path) -> Result<Vec<RawRow>, SourceError> {
    let file = File::open(path).map_err(|source| SourceError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let rows = read_rows(file)?;
    info!(path = %path.display(), rows = rows.len(), "read time series");
    Ok(rows)
}
