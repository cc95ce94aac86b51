//! Country and continent resolution for merged records.
//!
//! Only coordinates missing from the [`LocationCache`] are sent to the
//! geocoder, one request at a time: each lookup is awaited before the next is
//! issued. A failed lookup is logged and skipped; the coordinate stays out of
//! the cache and is retried on the next run.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use caseload_core::{Coordinates, Record, continent_for};
use tracing::{info, warn};

use crate::{GeocodeError, LocationCache, ResolveError};

/// Reverse geocoding: coordinates → alpha-2 country code.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn country_code(&self, coordinates: Coordinates) -> Result<String, GeocodeError>;
}

/// Counts from one resolution pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveReport {
    /// Distinct coordinate pairs across all records.
    pub distinct: usize,
    /// Of those, already present in the cache.
    pub cached: usize,
    /// Lookups issued to the geocoder.
    pub queried: usize,
    pub resolved: usize,
    pub failed: usize,
}

/// Distinct coordinates absent from the cache, in first-seen record order.
pub fn pending_coordinates(records: &[Record], cache: &LocationCache) -> Vec<Coordinates> {
    let mut seen = HashSet::new();
    records
        .iter()
        .map(|r| r.location)
        .filter(|c| seen.insert(c.key()))
        .filter(|c| !cache.contains(c))
        .collect()
}

/// Look up every uncached coordinate and add the results to `cache`.
///
/// Fails only when lookups are needed and no geocoder is configured. Lookup
/// failures are counted in the report, never returned.
pub async fn resolve_locations(
    records: &[Record],
    cache: &mut LocationCache,
    geocoder: Option<&dyn Geocoder>,
) -> Result<ResolveReport, ResolveError> {
    let distinct = records
        .iter()
        .map(|r| r.location.key())
        .collect::<HashSet<_>>()
        .len();
    let pending = pending_coordinates(records, cache);
    let mut report = ResolveReport {
        distinct,
        cached: distinct - pending.len(),
        ..Default::default()
    };
    info!(
        distinct,
        cached = report.cached,
        pending = pending.len(),
        "resolving locations"
    );
    if pending.is_empty() {
        return Ok(report);
    }

    let geocoder = geocoder.ok_or(ResolveError::MissingCredential {
        pending: pending.len(),
    })?;

    let mut delta = BTreeMap::new();
    for coordinates in pending {
        report.queried += 1;
        match geocoder.country_code(coordinates).await {
            Ok(code) => {
                delta.insert(coordinates.key(), code);
                report.resolved += 1;
            }
            Err(e) => {
                warn!(%coordinates, error = %e, "could not geocode coordinate");
                report.failed += 1;
            }
        }
    }
    cache.merge(delta);

    info!(
        resolved = report.resolved,
        failed = report.failed,
        "location resolution complete"
    );
    Ok(report)
}

/// Set `country_code` and `continent` on every record from the cache.
/// Unresolved coordinates get no country code and continent `Others`.
pub fn annotate(records: &mut [Record], cache: &LocationCache) {
    for record in records {
        let code = cache.get(&record.location);
        record.continent = continent_for(code);
        record.country_code = code.map(str::to_string);
    }
}
