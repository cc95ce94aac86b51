//! Wide-to-long transform: one [`RawRow`] becomes one fragment per date column.

use chrono::NaiveDate;
use thiserror::Error;

use crate::model::{Coordinates, MetricKind, ObservationFragment, UNCATEGORIZED};
use crate::source::RawRow;

/// Date column label format, e.g. `1/22/20`.
pub const DATE_LABEL_FORMAT: &str = "%m/%d/%y";

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("line {line}: malformed count {value:?} in column {column}")]
    MalformedCount {
        line: u64,
        column: String,
        value: String,
    },
    #[error("line {line}: malformed coordinate {value:?}")]
    MalformedCoordinate { line: u64, value: String },
    #[error("malformed date column label {0:?}")]
    MalformedDate(String),
}

/// Parse a date column label in `M/d/yy` form.
pub fn parse_date_label(label: &str) -> Result<NaiveDate, NormalizeError> {
    NaiveDate::parse_from_str(label, DATE_LABEL_FORMAT)
        .map_err(|_| NormalizeError::MalformedDate(label.to_string()))
}

/// Parse the row's shared position, remapping the (0,0) placeholder.
///
/// Empty cells count as (0,0).
pub fn parse_coordinates(row: &RawRow) -> Result<Coordinates, NormalizeError> {
    let lat = parse_degrees(row.line, &row.lat)?;
    let lng = parse_degrees(row.line, &row.lng)?;
    let coordinates = Coordinates::new(lng, lat);
    if coordinates.is_origin() {
        return Ok(UNCATEGORIZED);
    }
    Ok(coordinates)
}

fn parse_degrees(line: u64, value: &str) -> Result<f64, NormalizeError> {
    if value.is_empty() {
        return Ok(0.0);
    }
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| NormalizeError::MalformedCoordinate {
            line,
            value: value.to_string(),
        })
}

/// A cumulative count: a non-negative integer no larger than `i64::MAX`, so
/// that every count also fits the signed metric arithmetic and the store.
fn parse_count(value: &str) -> Option<u64> {
    value.parse::<i64>().ok().and_then(|c| u64::try_from(c).ok())
}

/// Expand one row into per-date fragments, in column order.
pub fn normalize_row(
    row: &RawRow,
    kind: MetricKind,
) -> Result<Vec<ObservationFragment>, NormalizeError> {
    let coordinates = parse_coordinates(row)?;
    let last = row.columns.len().saturating_sub(1);

    row.columns
        .iter()
        .enumerate()
        .map(|(i, (label, value))| -> Result<_, NormalizeError> {
            let date = parse_date_label(label)?;
            let count = parse_count(value).ok_or_else(|| NormalizeError::MalformedCount {
                line: row.line,
                column: label.clone(),
                value: value.clone(),
            })?;
            Ok(ObservationFragment {
                country: row.country.clone(),
                state: row.state.clone(),
                coordinates,
                date,
                kind,
                count,
                is_latest: i == last,
            })
        })
        .collect()
}

/// Normalise every row of one export.
pub fn normalize_rows(
    rows: &[RawRow],
    kind: MetricKind,
) -> Result<Vec<ObservationFragment>, NormalizeError> {
    let mut fragments = Vec::new();
    for row in rows {
        fragments.extend(normalize_row(row, kind)?);
    }
    Ok(fragments)
}
