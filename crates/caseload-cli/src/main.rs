mod config;
mod pipeline;

use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    tracing::info!("caseload v{}", env!("CARGO_PKG_VERSION"));

    let config = config::Cli::parse().into_config();
    let summary = match pipeline::run(&config).await {
        Ok(summary) => summary,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "run failed");
            return Err(e);
        }
    };

    tracing::info!(
        records = summary.records,
        lookups = summary.resolve.queried,
        unresolved = summary.resolve.failed,
        stored = ?summary.stored,
        elapsed_secs = summary.elapsed_secs,
        "run complete"
    );
    Ok(())
}
