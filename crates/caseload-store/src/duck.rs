//! DuckDB-backed case store.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use caseload_core::Record;
use duckdb::{Connection, params};
use tracing::info;

use crate::{CaseSink, StoreError};

const CASES_TABLE: &str = "cases";

const CREATE_CASES: &str = "CREATE TABLE IF NOT EXISTS cases (
    lng DOUBLE NOT NULL,
    lat DOUBLE NOT NULL,
    country VARCHAR NOT NULL,
    state VARCHAR,
    date DATE NOT NULL,
    count_confirmed BIGINT,
    count_deaths BIGINT,
    count_recovered BIGINT,
    count_sick BIGINT NOT NULL,
    country_code VARCHAR,
    continent VARCHAR NOT NULL,
    is_current BOOLEAN NOT NULL
)";

/// DuckDB store holding one `cases` table.
///
/// Supports both in-memory (ephemeral) and persistent (file-backed) modes.
/// [`from_url`](Self::from_url) picks one from a store URL.
pub struct DuckStore {
    conn: Mutex<Connection>,
}

impl DuckStore {
    /// Open an in-memory DuckDB database.
    pub fn open() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    /// Open or create a persistent DuckDB database at the given path.
    pub fn open_persistent(path: &Path) -> Result<Self, StoreError> {
        Self::init(Connection::open(path)?)
    }

    /// Open from a store URL: `duckdb://<path>`, `duckdb://:memory:`, or a bare path.
    ///
    /// Any other `scheme://` is rejected rather than read as a file name.
    pub fn from_url(url: &str) -> Result<Self, StoreError> {
        let target = match url.strip_prefix("duckdb://") {
            Some(rest) => rest,
            None if url.contains("://") => return Err(StoreError::InvalidUrl(url.to_string())),
            None => url,
        };
        if target.is_empty() {
            return Err(StoreError::InvalidUrl(url.to_string()));
        }
        if target == ":memory:" {
            return Self::open();
        }
        Self::open_persistent(Path::new(target))
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(CREATE_CASES)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Number of rows in the `cases` table.
    pub fn count(&self) -> Result<usize, StoreError> {
        let conn = self.conn();
        let n: i64 = conn.query_row("SELECT count(*) FROM cases", [], |row| row.get(0))?;
        Ok(n as usize)
    }

    /// Delete every stored case, then append `records`.
    ///
    /// Runs in autocommit mode: the delete is committed before the first
    /// insert, so an insert failure leaves the table empty or partial.
    pub fn replace_records(&self, records: &[Record]) -> Result<usize, StoreError> {
        let conn = self.conn();
        let deleted = conn.execute("DELETE FROM cases", [])?;

        let mut appender = conn.appender(CASES_TABLE)?;
        for r in records {
            let confirmed = as_bigint(r.count_confirmed)?;
            let deaths = as_bigint(r.count_deaths)?;
            let recovered = as_bigint(r.count_recovered)?;
            appender.append_row(params![
                r.location.lng,
                r.location.lat,
                r.country,
                r.state,
                r.date,
                confirmed,
                deaths,
                recovered,
                r.count_sick,
                r.country_code,
                r.continent.as_str(),
                r.is_current,
            ])?;
        }
        appender.flush()?;

        info!(deleted, inserted = records.len(), "replaced cases table");
        Ok(records.len())
    }
}

fn as_bigint(count: Option<u64>) -> Result<Option<i64>, StoreError> {
    count
        .map(|c| i64::try_from(c).map_err(|_| StoreError::CountOutOfRange(c)))
        .transpose()
}

#[async_trait]
impl CaseSink for DuckStore {
    async fn replace_all(&self, records: &[Record]) -> Result<usize, StoreError> {
        self.replace_records(records)
    }
}
