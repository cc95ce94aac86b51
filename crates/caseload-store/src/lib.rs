//! Storage layer: full-replace sinks for enriched case records.

mod error;
pub use error::StoreError;

mod sink;
pub use sink::{CaseSink, MemorySink};

#[cfg(feature = "duckdb")]
mod duck;
#[cfg(feature = "duckdb")]
pub use duck::DuckStore;
