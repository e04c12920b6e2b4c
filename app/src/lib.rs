//! SalarySleuth binary support.
//!
//! Loads configuration, installs logging and drives a tracker run. All
//! scraping, enrichment and reconciliation logic lives in the `crates/`
//! directory.

pub mod pipeline;

use std::sync::Arc;

use anyhow::Context;
use sleuth_core::{SleuthConfig, SystemClock, TokioSleeper};
use sleuth_http::{Fetcher, RequestClient};
use tracing::info;

pub use pipeline::{Pipeline, RunSummary, RESULTS_FILE};

/// Build the log filter: `RUST_LOG` wins, then the debug flag.
fn log_filter(debug: bool) -> tracing_subscriber::EnvFilter {
    use tracing_subscriber::EnvFilter;

    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if debug {
            EnvFilter::new("info,salarysleuth=debug,sleuth_core=debug,sleuth_http=debug,sleuth_enrich=debug,sleuth_scraper=debug,sleuth_ledger=debug")
        } else {
            EnvFilter::new("info,salarysleuth=info")
        }
    })
}

/// Initialize tracing subscriber for logging
fn init_tracing(debug: bool) {
    use tracing_subscriber::{fmt, prelude::*};

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(log_filter(debug))
        .init();
}

/// Entry point for the `salarysleuth` binary.
///
/// `salarysleuth top-companies` prints the top-paying directory; any other
/// invocation runs the tracker with the configured search.
pub async fn run() -> anyhow::Result<()> {
    let config = SleuthConfig::load_with_env().context("failed to load configuration")?;
    init_tracing(config.general.debug);

    info!("Starting SalarySleuth v{}", env!("CARGO_PKG_VERSION"));

    let client: Arc<dyn Fetcher> = Arc::new(
        RequestClient::from_config(&config.network).context("invalid network configuration")?,
    );
    let (data_dir, cache_dir) = pipeline::resolve_dirs(&config)?;

    if std::env::args().nth(1).as_deref() == Some("top-companies") {
        let directory = pipeline::directory(&config, client, &cache_dir);
        directory.ensure_fresh().await;
        for (key, display) in directory.listing() {
            println!("{display:<32} {key}");
        }
        return Ok(());
    }

    let pipeline = Pipeline::new(
        config,
        client,
        Arc::new(SystemClock),
        Arc::new(TokioSleeper),
        data_dir,
        cache_dir,
    )?;

    let summary = pipeline.run().await?;
    if summary.persisted {
        println!(
            "{} jobs, {} new since the last run",
            summary.jobs.len(),
            summary.new_jobs.len()
        );
        for job in summary.ranked_by_level_salary() {
            let posting = &job.posting;
            println!(
                "{:<24} {:<14} {:<48} {:<10} {}",
                posting.company,
                job.level_salary,
                posting.title,
                posting.source.display_name(),
                posting.url
            );
        }
    }
    Ok(())
}
