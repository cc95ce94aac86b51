//! Command-line and environment configuration.

use std::path::PathBuf;

use caseload_geo::DEFAULT_GEOCODE_URL;
use clap::Parser;

const DEFAULT_CONFIRMED: &str =
    "COVID-19/csse_covid_19_data/csse_covid_19_time_series/time_series_covid19_confirmed_global.csv";
const DEFAULT_DEATHS: &str =
    "COVID-19/csse_covid_19_data/csse_covid_19_time_series/time_series_covid19_deaths_global.csv";

/// Rebuild the case store from the daily time-series exports.
#[derive(Debug, Parser)]
#[command(name = "caseload", version, about)]
pub struct Cli {
    /// Confirmed-cases time series.
    #[arg(long, env = "CASELOAD_CONFIRMED", default_value = DEFAULT_CONFIRMED)]
    pub confirmed: PathBuf,

    /// Deaths time series.
    #[arg(long, env = "CASELOAD_DEATHS", default_value = DEFAULT_DEATHS)]
    pub deaths: PathBuf,

    /// Recovered time series. Only shipped with the older export schema.
    #[arg(long, env = "CASELOAD_RECOVERED")]
    pub recovered: Option<PathBuf>,

    /// Coordinate → country code cache file.
    #[arg(long, env = "CASELOAD_CACHE", default_value = "locationData.json")]
    pub cache: PathBuf,

    /// Store to replace, e.g. `duckdb://cases.duckdb`. Unset means dry run.
    #[arg(long, env = "CASELOAD_STORE_URL")]
    pub store_url: Option<String>,

    /// Geocoding API key. Needed only when uncached coordinates appear.
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    pub geocode_key: Option<String>,

    /// Geocoding JSON endpoint.
    #[arg(long, env = "CASELOAD_GEOCODE_URL", default_value = DEFAULT_GEOCODE_URL)]
    pub geocode_url: String,

    /// Skip the store even if a URL is configured.
    #[arg(long)]
    pub dry_run: bool,

    /// Also write the enriched records as JSON to this path.
    #[arg(long)]
    pub output_json: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct SourcePaths {
    pub confirmed: PathBuf,
    pub deaths: PathBuf,
    pub recovered: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct GeocoderConfig {
    pub base_url: String,
    pub api_key: String,
}

/// Everything a run needs, resolved up front and passed in explicitly.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub sources: SourcePaths,
    pub cache_path: PathBuf,
    /// `None` disables the sink.
    pub store_url: Option<String>,
    /// `None` when no API key is configured.
    pub geocoder: Option<GeocoderConfig>,
    pub output_json: Option<PathBuf>,
}

impl Cli {
    pub fn into_config(self) -> PipelineConfig {
        let base_url = self.geocode_url;
        PipelineConfig {
            sources: SourcePaths {
                confirmed: self.confirmed,
                deaths: self.deaths,
                recovered: self.recovered,
            },
            cache_path: self.cache,
            store_url: if self.dry_run {
                None
            } else {
                self.store_url.filter(|url| !url.is_empty())
            },
            geocoder: self
                .geocode_key
                .filter(|key| !key.is_empty())
                .map(|api_key| GeocoderConfig { base_url, api_key }),
            output_json: self.output_json,
        }
    }
}
