//! One tracker run: scrape passes, merge, reconcile, persist.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use sleuth_core::{Clock, EnrichedJob, SleuthConfig, Sleeper, Source, SystemClock, TokioSleeper};
use sleuth_enrich::{
    numeric_value, CompanyDirectory, EnrichmentCache, LevelsFyiSource, DIRECTORY_CACHE_FILE,
    ENRICHMENT_CACHE_FILE,
};
use sleuth_http::Fetcher;
use sleuth_ledger::{merge_passes, write_json_atomic, Ledger, TrackedJob};
use sleuth_scraper::{RunReport, ScrapeOrchestrator};
use tracing::{info, warn};

/// File holding the latest merged job list.
pub const RESULTS_FILE: &str = "results.json";

/// What a tracker run produced.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Passes that returned usable results
    pub passes_used: u32,
    /// Merged jobs across all usable passes
    pub jobs: Vec<EnrichedJob>,
    /// Jobs not present in the previous ledger
    pub new_jobs: Vec<TrackedJob>,
    /// Whether the ledger and results files were rewritten
    pub persisted: bool,
}

impl RunSummary {
    /// Jobs with company compensation data, highest figure first.
    ///
    /// Jobs with equal figures keep their merged order.
    #[must_use]
    pub fn ranked_by_level_salary(&self) -> Vec<&EnrichedJob> {
        let mut ranked: Vec<&EnrichedJob> =
            self.jobs.iter().filter(|job| job.has_level_salary()).collect();
        ranked.sort_by_key(|job| std::cmp::Reverse(numeric_value(&job.level_salary)));
        ranked
    }
}

/// Wires configuration and collaborators into a run.
pub struct Pipeline {
    config: SleuthConfig,
    sources: Vec<Source>,
    fetcher: Arc<dyn Fetcher>,
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn Sleeper>,
    data_dir: PathBuf,
    cache_dir: PathBuf,
}

impl Pipeline {
    /// Validate `config` and prepare a run.
    ///
    /// Configuration errors surface here, before any request is made.
    pub fn new(
        config: SleuthConfig,
        fetcher: Arc<dyn Fetcher>,
        clock: Arc<dyn Clock>,
        sleeper: Arc<dyn Sleeper>,
        data_dir: PathBuf,
        cache_dir: PathBuf,
    ) -> anyhow::Result<Self> {
        let sources = config.validate().context("invalid search configuration")?;
        Ok(Self {
            config,
            sources,
            fetcher,
            clock,
            sleeper,
            data_dir,
            cache_dir,
        })
    }

    /// Sources selected for this run.
    #[must_use]
    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    /// Path of the ledger file.
    #[must_use]
    pub fn ledger_path(&self) -> PathBuf {
        self.data_dir.join(&self.config.ledger.file_name)
    }

    /// Path of the results file.
    #[must_use]
    pub fn results_path(&self) -> PathBuf {
        self.data_dir.join(RESULTS_FILE)
    }

    fn enrichment_cache_path(&self) -> PathBuf {
        self.cache_dir.join(ENRICHMENT_CACHE_FILE)
    }

    /// Top-paying company directory backed by the cache directory.
    #[must_use]
    pub fn directory(&self) -> CompanyDirectory {
        CompanyDirectory::new(self.fetcher.clone(), self.clock.clone(), self.sleeper.clone())
            .with_cache_file(self.cache_dir.join(DIRECTORY_CACHE_FILE))
            .with_ttl(self.config.enrichment.ttl())
    }

    fn enrichment(&self) -> Option<EnrichmentCache> {
        let enrichment = &self.config.enrichment;
        if !enrichment.enabled {
            return None;
        }
        let source = Arc::new(LevelsFyiSource::new(self.fetcher.clone()));
        let cache = EnrichmentCache::new(source, self.clock.clone(), self.sleeper.clone())
            .with_config(enrichment);
        if enrichment.persist_cache {
            cache.load_or_warn(&self.enrichment_cache_path());
        }
        Some(cache)
    }

    fn orchestrator(&self, enrichment: Option<EnrichmentCache>) -> ScrapeOrchestrator {
        let mut orchestrator =
            ScrapeOrchestrator::new(self.fetcher.clone(), self.clock.clone(), self.sleeper.clone())
                .with_network(&self.config.network)
                .with_directory(self.directory());
        if let Some(cache) = enrichment {
            orchestrator = orchestrator.with_enrichment(cache);
        }
        orchestrator
    }

    /// Run every configured pass, then reconcile and persist.
    pub async fn run(&self) -> anyhow::Result<RunSummary> {
        let query = self.config.query();
        let passes = self.config.ledger.passes.max(1);
        let delay = Duration::from_secs(self.config.ledger.pass_delay_secs);

        let enrichment = self.enrichment();
        let orchestrator = self.orchestrator(enrichment.clone());

        let mut results: Vec<Vec<EnrichedJob>> = Vec::with_capacity(passes as usize);
        for pass in 1..=passes {
            if pass > 1 {
                self.sleeper.sleep(delay).await;
            }
            let report = orchestrator.run(&query, &self.sources).await;
            if pass_failed(&report) {
                warn!(pass, run_id = %report.run_id, "every source was blocked, skipping pass");
                continue;
            }
            info!(pass, jobs = report.jobs.len(), "scrape pass complete");
            results.push(report.jobs);
        }

        if let Some(cache) = &enrichment {
            if self.config.enrichment.persist_cache {
                if let Err(e) = cache.save(&self.enrichment_cache_path()) {
                    warn!(error = %e, "failed to save enrichment cache");
                }
            }
        }

        let passes_used = u32::try_from(results.len()).unwrap_or(u32::MAX);
        if results.is_empty() {
            warn!("no usable scrape pass, leaving previous results in place");
            return Ok(RunSummary::default());
        }

        let jobs = merge_passes(results);
        write_json_atomic(&self.results_path(), &jobs)
            .with_context(|| format!("failed to write {}", self.results_path().display()))?;

        let new_jobs = if self.config.ledger.enabled {
            Ledger::new(self.ledger_path(), self.clock.clone())
                .record(&jobs)
                .context("failed to update job ledger")?
        } else {
            Vec::new()
        };

        log_new_jobs(&new_jobs);
        info!(
            passes = passes_used,
            jobs = jobs.len(),
            new = new_jobs.len(),
            results = %self.results_path().display(),
            "run complete"
        );

        Ok(RunSummary {
            passes_used,
            jobs,
            new_jobs,
            persisted: true,
        })
    }
}

/// A pass is unusable when it produced nothing because every source was blocked.
fn pass_failed(report: &RunReport) -> bool {
    report.jobs.is_empty()
        && !report.sources.is_empty()
        && report.sources.iter().all(|s| s.blocked.is_some())
}

fn log_new_jobs(new_jobs: &[TrackedJob]) {
    for job in new_jobs {
        info!(
            company = %job.company,
            title = %job.title,
            salary = %job.salary_range,
            url = %job.url,
            "new job"
        );
    }
}

/// Top-paying directory for the `top-companies` listing.
pub fn directory(config: &SleuthConfig, fetcher: Arc<dyn Fetcher>, cache_dir: &Path) -> CompanyDirectory {
    CompanyDirectory::new(fetcher, Arc::new(SystemClock), Arc::new(TokioSleeper))
        .with_cache_file(cache_dir.join(DIRECTORY_CACHE_FILE))
        .with_ttl(config.enrichment.ttl())
}

/// Resolve the data and cache directories for `config`.
pub fn resolve_dirs(config: &SleuthConfig) -> anyhow::Result<(PathBuf, PathBuf)> {
    let data_dir = config
        .resolved_data_dir()
        .context("could not determine data directory")?;
    let cache_dir = SleuthConfig::cache_dir().context("could not determine cache directory")?;
    Ok((data_dir, cache_dir))
}
