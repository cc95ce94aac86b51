use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid store URL: {0}")]
    InvalidUrl(String),

    #[cfg(feature = "duckdb")]
    #[error("duckdb error: {0}")]
    DuckDb(#[from] ::duckdb::Error),

    #[error("count {0} does not fit a BIGINT column")]
    CountOutOfRange(u64),

    #[error("{0}")]
    Other(String),
}
