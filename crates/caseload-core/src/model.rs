//! Case record types shared across ingest, resolution, and storage.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::continent::Continent;

/// Position substituted for rows reported at exactly (0,0) or without coordinates.
///
/// Records carrying it are treated as an "uncategorized location".
pub const UNCATEGORIZED: Coordinates = Coordinates {
    lng: -106.3467712,
    lat: 56.1303673,
};

/// A longitude/latitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lng: f64,
    pub lat: f64,
}

impl Coordinates {
    /// Build a coordinate pair, folding negative zero into zero so that
    /// [`key`](Self::key) renders identically for both.
    pub fn new(lng: f64, lat: f64) -> Self {
        Self {
            lng: lng + 0.0,
            lat: lat + 0.0,
        }
    }

    /// True for the (0,0) placeholder some source rows carry.
    pub fn is_origin(&self) -> bool {
        self.lng == 0.0 && self.lat == 0.0
    }

    /// Cache key in `"<lng>|<lat>"` form.
    pub fn key(&self) -> String {
        format!("{}|{}", self.lng, self.lat)
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.lng, self.lat)
    }
}

/// Which time-series export a count came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Confirmed,
    Deaths,
    Recovered,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Confirmed => "confirmed",
            MetricKind::Deaths => "deaths",
            MetricKind::Recovered => "recovered",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One metric's cumulative count for one location on one date.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationFragment {
    pub country: String,
    pub state: Option<String>,
    pub coordinates: Coordinates,
    pub date: NaiveDate,
    pub kind: MetricKind,
    pub count: u64,
    /// Set only on the fragment taken from the last date column.
    pub is_latest: bool,
}

/// A merged, enriched observation: the unit handed to the store.
///
/// Serialises with camelCase keys and a GeoJSON `Point` location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    #[serde(with = "geojson_point")]
    pub location: Coordinates,
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count_confirmed: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count_deaths: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count_recovered: Option<u64>,
    pub count_sick: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    pub continent: Continent,
    pub is_current: bool,
}

impl Record {
    /// Base record built from the first fragment seen under a key.
    ///
    /// Counts, country code and continent are filled in by later stages.
    pub fn from_fragment(fragment: &ObservationFragment) -> Self {
        Self {
            location: fragment.coordinates,
            country: fragment.country.clone(),
            state: fragment.state.clone(),
            date: fragment.date,
            count_confirmed: None,
            count_deaths: None,
            count_recovered: None,
            count_sick: 0,
            country_code: None,
            continent: Continent::Others,
            is_current: fragment.is_latest,
        }
    }

    /// The count slot for `kind`.
    pub fn count_mut(&mut self, kind: MetricKind) -> &mut Option<u64> {
        match kind {
            MetricKind::Confirmed => &mut self.count_confirmed,
            MetricKind::Deaths => &mut self.count_deaths,
            MetricKind::Recovered => &mut self.count_recovered,
        }
    }
}

mod geojson_point {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::Coordinates;

    #[derive(Serialize, Deserialize)]
    struct Point {
        #[serde(rename = "type")]
        kind: String,
        coordinates: [f64; 2],
    }

    pub fn serialize<S: Serializer>(c: &Coordinates, serializer: S) -> Result<S::Ok, S::Error> {
        Point {
            kind: "Point".to_string(),
            coordinates: [c.lng, c.lat],
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Coordinates, D::Error> {
        let point = Point::deserialize(deserializer)?;
        if point.kind != "Point" {
            return Err(serde::de::Error::custom(format!(
                "expected GeoJSON Point, got {}",
                point.kind
            )));
        }
        Ok(Coordinates::new(point.coordinates[0], point.coordinates[1]))
    }
}
