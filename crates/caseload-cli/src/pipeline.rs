//! Batch pipeline: read exports → normalise → merge → resolve → derive → replace store.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Instant;

use anyhow::Context;
use caseload_core::{
    MetricKind, RawRow, Record, apply_metrics, merge_fragments, normalize_rows,
    read_rows_from_path,
};
use caseload_geo::{
    GeocodeClient, Geocoder, LocationCache, ResolveReport, annotate, resolve_locations,
};
use caseload_store::{CaseSink, DuckStore};
use tracing::info;

use crate::config::PipelineConfig;

/// Raw rows of each export, already read.
pub struct SourceRows {
    pub confirmed: Vec<RawRow>,
    pub deaths: Vec<RawRow>,
    pub recovered: Option<Vec<RawRow>>,
}

/// Output of the in-memory stages.
pub struct Enriched {
    pub records: Vec<Record>,
    pub resolve: ResolveReport,
}

pub struct RunSummary {
    pub records: usize,
    pub resolve: ResolveReport,
    /// `None` on a dry run.
    pub stored: Option<usize>,
    pub elapsed_secs: f64,
}

/// Normalise, merge, resolve locations and derive metrics.
///
/// `cache` gains any coordinates resolved during the call.
pub async fn enrich(
    sources: &SourceRows,
    cache: &mut LocationCache,
    geocoder: Option<&dyn Geocoder>,
) -> anyhow::Result<Enriched> {
    let confirmed =
        normalize_rows(&sources.confirmed, MetricKind::Confirmed).context("normalising confirmed")?;
    let deaths = normalize_rows(&sources.deaths, MetricKind::Deaths).context("normalising deaths")?;
    let recovered = sources
        .recovered
        .as_deref()
        .map(|rows| normalize_rows(rows, MetricKind::Recovered))
        .transpose()
        .context("normalising recovered")?;
    info!(
        confirmed = confirmed.len(),
        deaths = deaths.len(),
        recovered = recovered.as_ref().map_or(0, Vec::len),
        "normalised fragments"
    );

    let mut records = merge_fragments(&confirmed, &deaths, recovered.as_deref());
    info!(records = records.len(), "merged records");

    let resolve = resolve_locations(&records, cache, geocoder).await?;
    annotate(&mut records, cache);
    apply_metrics(&mut records);

    Ok(Enriched { records, resolve })
}

/// Hand the records to the sink, or skip when there is none.
pub async fn store(records: &[Record], sink: Option<&dyn CaseSink>) -> anyhow::Result<Option<usize>> {
    let Some(sink) = sink else {
        info!(records = records.len(), "no store configured, dry run");
        return Ok(None);
    };
    let inserted = sink
        .replace_all(records)
        .await
        .context("replacing stored records")?;
    Ok(Some(inserted))
}

/// Run the whole job from the files and services named in `config`.
pub async fn run(config: &PipelineConfig) -> anyhow::Result<RunSummary> {
    let start = Instant::now();

    let sources = SourceRows {
        confirmed: read_rows_from_path(&config.sources.confirmed)
            .context("reading confirmed time series")?,
        deaths: read_rows_from_path(&config.sources.deaths).context("reading deaths time series")?,
        recovered: config
            .sources
            .recovered
            .as_deref()
            .map(read_rows_from_path)
            .transpose()
            .context("reading recovered time series")?,
    };

    let mut cache = LocationCache::load(&config.cache_path).context("loading location cache")?;
    let client = config
        .geocoder
        .as_ref()
        .map(|g| GeocodeClient::new(g.base_url.clone(), g.api_key.clone()));
    let geocoder = client.as_ref().map(|c| c as &dyn Geocoder);

    let enriched = enrich(&sources, &mut cache, geocoder).await?;
    cache
        .save(&config.cache_path)
        .context("saving location cache")?;

    if let Some(path) = &config.output_json {
        write_json(path, &enriched.records)?;
    }

    let duck = config
        .store_url
        .as_deref()
        .map(DuckStore::from_url)
        .transpose()
        .context("connecting to store")?;
    let stored = store(&enriched.records, duck.as_ref().map(|d| d as &dyn CaseSink)).await?;

    Ok(RunSummary {
        records: enriched.records.len(),
        resolve: enriched.resolve,
        stored,
        elapsed_secs: start.elapsed().as_secs_f64(),
    })
}

fn write_json(path: &Path, records: &[Record]) -> anyhow::Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, records).context("serialising records")?;
    writer.flush()?;
    info!(path = %path.display(), records = records.len(), "wrote records as JSON");
    Ok(())
}
