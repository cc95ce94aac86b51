use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("failed to read location cache {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write location cache {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("location cache is not a JSON object of strings: {0}")]
    Json(#[from] serde_json::Error),
}

/// A single failed lookup. Never fatal to a run.
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("geocoder returned {status}: {body}")]
    Server { status: u16, body: String },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no country in geocoder response (status {0})")]
    NoResult(String),
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("{pending} coordinates need geocoding but no API credential is configured")]
    MissingCredential { pending: usize },
}
