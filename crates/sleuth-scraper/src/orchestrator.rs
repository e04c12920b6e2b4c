//! Scrape orchestrator for coordinating a run across sources.
//!
//! This module provides the `ScrapeOrchestrator`, which runs every selected
//! source concurrently, merges their postings in selection order, applies the
//! job filter, deduplicates and finally enriches the survivors.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sleuth_core::{Clock, EnrichedJob, NetworkConfig, SearchQuery, Sleeper, Source};
use sleuth_enrich::{CompanyDirectory, EnrichmentCache};
use sleuth_http::Fetcher;
use tokio::task::JoinSet;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::dedup::dedup;
use crate::filter::JobFilter;
use crate::retry::{BackoffPolicy, RetryPolicy};
use crate::sources::{scrape, scraper_for, ScrapeContext, SourceOutcome};

/// Result of scraping a single source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReport {
    /// Source that was scraped
    pub source: Source,
    /// Postings collected before filtering
    pub collected: usize,
    /// Block signature if the source aborted
    pub blocked: Option<String>,
    /// Units skipped after retries
    pub skipped_units: Vec<String>,
}

impl From<&SourceOutcome> for SourceReport {
    fn from(outcome: &SourceOutcome) -> Self {
        Self {
            source: outcome.source,
            collected: outcome.postings.len(),
            blocked: outcome.blocked.clone(),
            skipped_units: outcome.skipped_units.clone(),
        }
    }
}

/// Summary of one orchestrated run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Unique run identifier
    pub run_id: Uuid,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When the run finished
    pub finished_at: DateTime<Utc>,
    /// Per-source results in selection order
    pub sources: Vec<SourceReport>,
    /// Filtered, deduplicated and enriched jobs
    pub jobs: Vec<EnrichedJob>,
}

impl RunReport {
    /// Sources that served challenge pages.
    #[must_use]
    pub fn blocked_sources(&self) -> Vec<Source> {
        self.sources
            .iter()
            .filter(|s| s.blocked.is_some())
            .map(|s| s.source)
            .collect()
    }

    /// Total units skipped across sources.
    #[must_use]
    pub fn skipped_units(&self) -> usize {
        self.sources.iter().map(|s| s.skipped_units.len()).sum()
    }
}

/// Orchestrates scraping across sources.
pub struct ScrapeOrchestrator {
    fetcher: Arc<dyn Fetcher>,
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn Sleeper>,
    network: NetworkConfig,
    directory: Option<CompanyDirectory>,
    enrichment: Option<EnrichmentCache>,
}

impl ScrapeOrchestrator {
    /// Create an orchestrator with default network settings and no enrichment.
    pub fn new(fetcher: Arc<dyn Fetcher>, clock: Arc<dyn Clock>, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            fetcher,
            clock,
            sleeper,
            network: NetworkConfig::default(),
            directory: None,
            enrichment: None,
        }
    }

    /// Use retry, penalty and pool settings from `network`.
    #[must_use]
    pub fn with_network(mut self, network: &NetworkConfig) -> Self {
        self.network = network.clone();
        self
    }

    /// Attach the top-paying directory used by the top-pay filter.
    #[must_use]
    pub fn with_directory(mut self, directory: CompanyDirectory) -> Self {
        self.directory = Some(directory);
        self
    }

    /// Attach the enrichment cache.
    #[must_use]
    pub fn with_enrichment(mut self, enrichment: EnrichmentCache) -> Self {
        self.enrichment = Some(enrichment);
        self
    }

    fn context_for(&self, source: Source) -> ScrapeContext {
        let (min, max) = scraper_for(source).delay_window();
        let backoff =
            BackoffPolicy::new(min, max).with_penalty(self.network.rate_limit_penalty());
        let retry = RetryPolicy::new(backoff, self.network.max_retries, self.sleeper.clone());
        ScrapeContext::new(self.fetcher.clone(), retry, self.network.worker_pool_size())
            .with_directory(self.directory.clone())
    }

    /// Run one scrape over `sources`.
    ///
    /// Blocked sources and skipped units are reported, never returned as
    /// errors.
    pub async fn run(&self, query: &SearchQuery, sources: &[Source]) -> RunReport {
        let run_id = Uuid::new_v4();
        let started_at = self.clock.now();

        let mut selected: Vec<Source> = Vec::with_capacity(sources.len());
        for source in sources {
            if !selected.contains(source) {
                selected.push(*source);
            }
        }

        info!(run_id = %run_id, sources = selected.len(), query = %query.description, "Starting scrape run");

        if query.filters.top_pay_only {
            match &self.directory {
                Some(directory) => directory.ensure_fresh().await,
                None => warn!("Top-pay filter requested without a company directory"),
            }
        }

        let mut tasks = JoinSet::new();
        for (position, source) in selected.iter().copied().enumerate() {
            let ctx = self.context_for(source);
            let query = query.clone();
            tasks.spawn(async move {
                let outcome = scrape(scraper_for(source), &ctx, &query).await;
                (position, outcome)
            });
        }

        let mut outcomes: Vec<(usize, SourceOutcome)> = Vec::with_capacity(selected.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => outcomes.push(result),
                Err(e) => error!(run_id = %run_id, error = %e, "Source task failed"),
            }
        }
        outcomes.sort_by_key(|(position, _)| *position);

        let reports: Vec<SourceReport> = outcomes.iter().map(|(_, o)| SourceReport::from(o)).collect();
        for report in &reports {
            info!(
                source = %report.source,
                collected = report.collected,
                skipped = report.skipped_units.len(),
                blocked = report.blocked.is_some(),
                "Source finished"
            );
        }

        let filter = JobFilter::new(query, self.directory.clone());
        let collected: Vec<_> = outcomes
            .into_iter()
            .flat_map(|(_, outcome)| outcome.postings)
            .filter(|posting| filter.matches(posting))
            .collect();
        let unique = dedup(collected);

        let jobs = match &self.enrichment {
            Some(cache) => cache.enrich_all(unique).await,
            None => unique.into_iter().map(EnrichedJob::without_enrichment).collect(),
        };

        let report = RunReport {
            run_id,
            started_at,
            finished_at: self.clock.now(),
            sources: reports,
            jobs,
        };

        let blocked = report.blocked_sources();
        if !blocked.is_empty() {
            warn!(run_id = %run_id, blocked = ?blocked, "Some sources blocked the run");
        }
        info!(
            run_id = %run_id,
            jobs = report.jobs.len(),
            skipped = report.skipped_units(),
            "Scrape run complete"
        );

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sleuth_core::clock::{ManualClock, RecordingSleeper};
    use sleuth_core::JobFilters;
    use sleuth_enrich::CacheData;
    use sleuth_http::ScriptedFetcher;

    fn orchestrator(fetcher: Arc<ScriptedFetcher>) -> ScrapeOrchestrator {
        ScrapeOrchestrator::new(
            fetcher,
            Arc::new(ManualClock::new(Utc::now())),
            Arc::new(RecordingSleeper::new()),
        )
    }

    #[test]
    fn test_run_report_helpers() {
        let report = RunReport {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: Utc::now(),
            sources: vec![
                SourceReport {
                    source: Source::Linkedin,
                    collected: 3,
                    blocked: Some("captcha".to_string()),
                    skipped_units: vec!["page 1".to_string()],
                },
                SourceReport {
                    source: Source::Lever,
                    collected: 10,
                    blocked: None,
                    skipped_units: vec!["okta".to_string(), "snyk".to_string()],
                },
            ],
            jobs: Vec::new(),
        };
        assert_eq!(report.blocked_sources(), vec![Source::Linkedin]);
        assert_eq!(report.skipped_units(), 3);
    }

    #[tokio::test]
    async fn test_top_pay_prunes_roster_before_fetching() {
        let fetcher = Arc::new(ScriptedFetcher::new().route(
            "https://api.lever.co/v0/postings/openai",
            200,
            r#"[{"text": "Research Engineer", "hostedUrl": "https://jobs.lever.co/openai/1"}]"#,
        ));
        let directory = CompanyDirectory::new(
            fetcher.clone(),
            Arc::new(ManualClock::new(Utc::now())),
            Arc::new(RecordingSleeper::new()),
        );
        directory.replace(CacheData {
            last_fetch_time: Some(Utc::now()),
            ..CacheData::from_names(["OpenAI"])
        });

        let query = SearchQuery::new("engineer").with_filters(JobFilters {
            top_pay_only: true,
            ..JobFilters::default()
        });
        let report = orchestrator(fetcher.clone())
            .with_directory(directory)
            .run(&query, &[Source::Lever])
            .await;

        assert_eq!(fetcher.requests(), vec!["https://api.lever.co/v0/postings/openai?mode=json"]);
        assert_eq!(report.jobs.len(), 1);
        assert_eq!(report.jobs[0].posting.company, "OpenAI");
        assert_eq!(report.jobs[0].level_salary, sleuth_core::NO_DATA);
    }
}
