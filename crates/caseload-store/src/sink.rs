//! The sink contract and an in-process implementation.

use std::sync::Mutex;

use async_trait::async_trait;
use caseload_core::Record;
use tracing::info;

use crate::StoreError;

/// Destination for a run's records.
///
/// `replace_all` deletes every stored record, then inserts the new set. The
/// two steps are not atomic: a failure during insert can leave the store
/// empty or partially populated.
#[async_trait]
pub trait CaseSink: Send + Sync {
    /// Returns the number of records inserted.
    async fn replace_all(&self, records: &[Record]) -> Result<usize, StoreError>;
}

/// Holds records in memory. Used by tests and for inspecting a run.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<Record>>,
    fail_after: Option<usize>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose insert fails once `n` records have been written.
    pub fn failing_after(n: usize) -> Self {
        Self {
            records: Mutex::default(),
            fail_after: Some(n),
        }
    }

    /// Seed the sink with a previous run's records.
    pub fn with_records(records: Vec<Record>) -> Self {
        Self {
            records: Mutex::new(records),
            fail_after: None,
        }
    }

    pub fn records(&self) -> Vec<Record> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Record>> {
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl CaseSink for MemorySink {
    async fn replace_all(&self, records: &[Record]) -> Result<usize, StoreError> {
        let mut stored = self.lock();
        let deleted = stored.len();
        stored.clear();
        for (i, record) in records.iter().enumerate() {
            if self.fail_after == Some(i) {
                return Err(StoreError::Other(format!(
                    "insert failed after {i} of {} records",
                    records.len()
                )));
            }
            stored.push(record.clone());
        }
        info!(deleted, inserted = stored.len(), "replaced in-memory records");
        Ok(stored.len())
    }
}

#[cfg(test)]
mod tests {
    use caseload_core::{Coordinates, MetricKind, ObservationFragment};
    use chrono::NaiveDate;

    use super::*;

    fn record(day: u32) -> Record {
        Record::from_fragment(&ObservationFragment {
            country: "Country A".into(),
            state: None,
            coordinates: Coordinates::new(1.0, 2.0),
            date: NaiveDate::from_ymd_opt(2020, 1, day).unwrap(),
            kind: MetricKind::Confirmed,
            count: 1,
            is_latest: false,
        })
    }

    #[tokio::test]
    async fn replace_discards_previous_contents() {
        let sink = MemorySink::with_records(vec![record(1), record(2), record(3)]);
        let inserted = sink.replace_all(&[record(22)]).await.unwrap();
        assert_eq!(inserted, 1);
        assert_eq!(sink.records(), vec![record(22)]);
    }

    #[tokio::test]
    async fn failed_insert_leaves_partial_contents() {
        let sink = MemorySink::with_records(vec![record(1)]);
        let sink = MemorySink {
            fail_after: Some(1),
            ..sink
        };
        let result = sink.replace_all(&[record(22), record(23), record(24)]).await;
        assert!(matches!(result, Err(StoreError::Other(_))));
        assert_eq!(sink.records(), vec![record(22)]);
    }

    #[tokio::test]
    async fn failing_before_first_insert_empties_the_store() {
        let sink = MemorySink::failing_after(0);
        assert!(sink.replace_all(&[record(22)]).await.is_err());
        assert!(sink.records().is_empty());
    }
}
