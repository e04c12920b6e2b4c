//! Job sources and the shared unit driver.
//!
//! A source splits a query into units of work (a company board or a result
//! page). [`scrape`] fans the units out over a bounded worker pool, retries
//! each through the context's [`RetryPolicy`] and aborts the source as soon
//! as one of them detects a block: pending units never start, and units that
//! are waiting or fetching are dropped at their next await.

mod greenhouse;
mod indeed;
mod lever;
mod linkedin;
mod monster;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{FuturesUnordered, StreamExt};
use sleuth_core::{JobPosting, SearchQuery, Source};
use sleuth_enrich::CompanyDirectory;
use sleuth_http::{FetchedPage, Fetcher, PageRequest};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{Result, ScrapeError};
use crate::retry::{classify, RetryPolicy};
use crate::salary;
use crate::selectors::CardFields;

pub use greenhouse::{GreenhouseScraper, GREENHOUSE_BOARDS};
pub use indeed::IndeedScraper;
pub use lever::{LeverScraper, LEVER_BOARDS};
pub use linkedin::LinkedinScraper;
pub use monster::MonsterScraper;

/// A company board on an API-backed source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Board {
    /// Slug used in the board API URL
    pub slug: &'static str,
    /// Company display name attached to postings
    pub display: &'static str,
}

/// One unit of work within a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    /// A company board
    Company(Board),
    /// A zero-based result page
    Page(u32),
}

impl Unit {
    /// Label used in logs and skip reports.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Company(board) => board.slug.to_string(),
            Self::Page(page) => format!("page {page}"),
        }
    }
}

/// Everything a scraper needs to run its units.
#[derive(Clone)]
pub struct ScrapeContext {
    /// Transport
    pub fetcher: Arc<dyn Fetcher>,
    /// Retry and backoff for this source
    pub retry: RetryPolicy,
    /// Top-paying directory, already refreshed, used to prune rosters
    pub directory: Option<CompanyDirectory>,
    /// Concurrent units per source
    pub workers: usize,
    /// Cancelled when the source blocks
    pub cancel: CancellationToken,
}

impl ScrapeContext {
    /// Create a context with a fresh cancellation token.
    pub fn new(fetcher: Arc<dyn Fetcher>, retry: RetryPolicy, workers: usize) -> Self {
        Self {
            fetcher,
            retry,
            directory: None,
            workers: workers.max(1),
            cancel: CancellationToken::new(),
        }
    }

    /// Attach the top-paying directory.
    #[must_use]
    pub fn with_directory(mut self, directory: Option<CompanyDirectory>) -> Self {
        self.directory = directory;
        self
    }

    /// Fetch through the retry policy and return the body of a successful page.
    ///
    /// `request` is rebuilt for every attempt so headers are re-randomized.
    /// Returns [`ScrapeError::Cancelled`] once the source has been aborted.
    pub async fn fetch_body<F>(
        &self,
        source: Source,
        unit: &str,
        jitter_first: bool,
        signatures: &[&str],
        request: F,
    ) -> Result<String>
    where
        F: Fn() -> PageRequest + Send + Sync,
    {
        let request = &request;
        self.retry
            .attempt(unit, jitter_first, &self.cancel, move || async move {
                let page = self.fetch_once(&request(), unit).await?;
                classify(&page, unit, source, signatures)?;
                Ok(page.body)
            })
            .await
    }

    /// Single fetch with transport errors mapped to transient failures.
    pub async fn fetch_once(&self, request: &PageRequest, unit: &str) -> Result<FetchedPage> {
        self.fetcher
            .fetch(request)
            .await
            .map_err(|e| ScrapeError::transport(unit, &e))
    }
}

/// What one source produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceOutcome {
    /// Source scraped
    pub source: Source,
    /// Postings collected, in unit order
    pub postings: Vec<JobPosting>,
    /// Matched block signature when the source aborted
    pub blocked: Option<String>,
    /// Units skipped after exhausting retries or failing to parse
    pub skipped_units: Vec<String>,
}

impl SourceOutcome {
    fn empty(source: Source) -> Self {
        Self {
            source,
            postings: Vec::new(),
            blocked: None,
            skipped_units: Vec::new(),
        }
    }
}

/// The contract every source implements.
#[async_trait]
pub trait SourceScraper: Send + Sync {
    /// Which source this is.
    fn source(&self) -> Source;

    /// Jitter window between requests.
    fn delay_window(&self) -> (Duration, Duration);

    /// Case-insensitive body markers of a challenge page.
    fn block_signatures(&self) -> &'static [&'static str] {
        &[]
    }

    /// Split a query into units of work.
    fn units(&self, query: &SearchQuery, directory: Option<&CompanyDirectory>) -> Vec<Unit>;

    /// Scrape one unit.
    async fn scrape_unit(
        &self,
        ctx: &ScrapeContext,
        query: &SearchQuery,
        unit: Unit,
        jitter_first: bool,
    ) -> Result<Vec<JobPosting>>;
}

/// The scraper registered for `source`.
#[must_use]
pub fn scraper_for(source: Source) -> &'static dyn SourceScraper {
    match source {
        Source::Greenhouse => &GreenhouseScraper,
        Source::Lever => &LeverScraper,
        Source::Linkedin => &LinkedinScraper,
        Source::Monster => &MonsterScraper,
        Source::Indeed => &IndeedScraper,
    }
}

/// Board roster filtered to the top-paying directory when requested.
pub(crate) fn roster_units(
    boards: &[Board],
    query: &SearchQuery,
    directory: Option<&CompanyDirectory>,
) -> Vec<Unit> {
    boards
        .iter()
        .filter(|board| {
            !query.filters.top_pay_only
                || directory.is_some_and(|d| d.contains(board.display) || d.contains(board.slug))
        })
        .copied()
        .map(Unit::Company)
        .collect()
}

/// Turn raw card fields into a posting; cards without a title or company are dropped.
pub(crate) fn card_posting(
    card: &CardFields,
    company: &str,
    url: String,
    source: Source,
) -> Option<JobPosting> {
    let company = company.trim();
    let title = card.title.trim();
    if title.is_empty() || company.is_empty() {
        return None;
    }

    Some(JobPosting {
        company: company.to_string(),
        title: title.to_string(),
        location: card.location.trim().to_string(),
        url,
        salary_range: salary::extract(
            card.structured.as_ref(),
            [("salary", card.salary.as_str())],
            &card.free_text,
        ),
        source,
    })
}

/// Result page units for a page budget.
pub(crate) fn page_units(query: &SearchQuery) -> Vec<Unit> {
    (0..query.pages.max(1)).map(Unit::Page).collect()
}

enum UnitResult {
    Done(Vec<JobPosting>),
    Failed(ScrapeError),
    Cancelled,
}

/// Run every unit of `scraper` and gather the results in unit order.
///
/// A block cancels the remaining units; postings from units that already
/// finished are kept.
pub async fn scrape(
    scraper: &dyn SourceScraper,
    ctx: &ScrapeContext,
    query: &SearchQuery,
) -> SourceOutcome {
    let source = scraper.source();
    let units = scraper.units(query, ctx.directory.as_ref());
    let mut outcome = SourceOutcome::empty(source);

    if units.is_empty() {
        debug!(source = %source, "No units to scrape");
        return outcome;
    }

    info!(source = %source, units = units.len(), "Scraping source");

    let api = source.is_api_backed();
    let semaphore = Semaphore::new(ctx.workers);
    let permits = &semaphore;
    let mut pending: FuturesUnordered<_> = units
        .iter()
        .enumerate()
        .map(move |(index, unit)| {
            async move {
                let Ok(_permit) = permits.acquire().await else {
                    return (index, UnitResult::Cancelled);
                };
                if ctx.cancel.is_cancelled() {
                    return (index, UnitResult::Cancelled);
                }
                let jitter_first = !(api && index == 0);
                match scraper.scrape_unit(ctx, query, *unit, jitter_first).await {
                    Ok(postings) => (index, UnitResult::Done(postings)),
                    Err(ScrapeError::Cancelled { .. }) => (index, UnitResult::Cancelled),
                    Err(e) => {
                        if matches!(e, ScrapeError::Blocked { .. }) {
                            ctx.cancel.cancel();
                        }
                        (index, UnitResult::Failed(e))
                    }
                }
            }
        })
        .collect();

    let mut finished = Vec::with_capacity(units.len());
    while let Some(result) = pending.next().await {
        finished.push(result);
    }
    finished.sort_by_key(|(index, _)| *index);

    for (index, result) in finished {
        let label = units[index].label();
        match result {
            UnitResult::Done(postings) => {
                debug!(source = %source, unit = %label, count = postings.len(), "Unit complete");
                outcome.postings.extend(postings);
            }
            UnitResult::Failed(ScrapeError::Blocked { signature, .. }) => {
                outcome.blocked.get_or_insert(signature);
            }
            UnitResult::Failed(e) => {
                debug!(source = %source, unit = %label, error = %e, "Skipping unit");
                outcome.skipped_units.push(label);
            }
            UnitResult::Cancelled => {}
        }
    }

    if let Some(signature) = &outcome.blocked {
        warn!(
            source = %source,
            signature = %signature,
            kept = outcome.postings.len(),
            "Source is blocking requests, keeping partial results"
        );
    }

    outcome
}
