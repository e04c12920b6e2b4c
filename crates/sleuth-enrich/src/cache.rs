//! Per-company compensation cache with layered fallback.
//!
//! Lookup order: fresh cache entry, bundled dataset, live levels.fyi page,
//! then the "No Data" sentinel. Every outcome is written back to the cache so
//! a failing company is not fetched again until its entry expires.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{FuturesUnordered, StreamExt};
use rand::Rng;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use sleuth_core::{has_value, Clock, EnrichedJob, EnrichmentConfig, JobPosting, Sleeper, NO_DATA};
use sleuth_http::{random_headers, Fetcher, PageRequest};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::dataset;
use crate::error::{EnrichError, Result};
use crate::format::format_salary;
use crate::normalizer::{levels_slug, normalize};
use crate::persist::{read_json, write_json};

/// Cache file name inside the cache directory.
pub const ENRICHMENT_CACHE_FILE: &str = "enrichment_cache.json";

/// Upper bound of the pause after a live fetch.
const MAX_LIVE_JITTER_MS: u64 = 500;

/// Selectors tried on a compensation page after the table-row scan.
const SALARY_SELECTORS: [&str; 4] = [
    "[data-testid='median-total-comp']",
    "[class*='median']",
    ".salary",
    "h3",
];

/// Which layer answered a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Unexpired cache entry
    Cache,
    /// Bundled compensation dataset
    StaticDataset,
    /// Live compensation page
    Live,
    /// Nothing found
    NoData,
}

/// A cached compensation figure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Normalized company key
    pub key: String,
    /// Company name as first seen
    pub display: String,
    /// Formatted figure or the "No Data" sentinel
    pub salary: String,
    /// When the figure was obtained; never moves backwards for a key
    pub fetched_at: DateTime<Utc>,
}

/// Result of a single lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup {
    /// Figure or "No Data"
    pub salary: String,
    /// Layer that produced it
    pub tier: Tier,
}

/// Remote provider of per-company compensation figures.
#[async_trait]
pub trait CompensationSource: Send + Sync {
    /// Fetch the figure for `company`; `Ok(None)` when the page has none.
    async fn fetch_salary(&self, company: &str) -> Result<Option<String>>;
}

/// Scrapes `levels.fyi/companies/{slug}/salaries/`.
pub struct LevelsFyiSource {
    fetcher: Arc<dyn Fetcher>,
}

impl LevelsFyiSource {
    /// Create a source that fetches through `fetcher`.
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }

    /// Page URL for `company`.
    #[must_use]
    pub fn url_for(company: &str) -> String {
        format!("https://www.levels.fyi/companies/{}/salaries/", levels_slug(company))
    }
}

#[async_trait]
impl CompensationSource for LevelsFyiSource {
    async fn fetch_salary(&self, company: &str) -> Result<Option<String>> {
        let url = Self::url_for(company);
        debug!(company, url = %url, "fetching compensation page");

        let page = self.fetcher.fetch(&PageRequest::new(url, random_headers())).await?;
        if !page.is_success() {
            return Err(EnrichError::UnexpectedStatus {
                company: company.to_string(),
                status: page.status,
            });
        }

        Ok(parse_compensation_page(&page.body)?.map(|raw| format_salary(&raw)))
    }
}

/// Pull the software engineer figure out of a compensation page.
pub fn parse_compensation_page(html: &str) -> Result<Option<String>> {
    let document = Html::parse_document(html);

    let row_selector = parse_selector("tr")?;
    let cell_selector = parse_selector("td, th")?;
    for row in document.select(&row_selector) {
        let cells: Vec<ElementRef<'_>> = row.select(&cell_selector).collect();
        let label = cells
            .iter()
            .position(|cell| element_text(cell).contains("Software Engineer"));
        if let Some(value) = label.and_then(|i| cells.get(i + 1)).map(element_text) {
            if value.contains('$') {
                return Ok(Some(value));
            }
        }
    }

    for candidate in SALARY_SELECTORS {
        let selector = parse_selector(candidate)?;
        if let Some(text) = document
            .select(&selector)
            .map(|el| element_text(&el))
            .find(|text| text.contains('$'))
        {
            return Ok(Some(text));
        }
    }

    Ok(None)
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| EnrichError::InvalidSelector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

fn element_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Process-wide compensation cache. Cloning shares the entries.
#[derive(Clone)]
pub struct EnrichmentCache {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
    source: Arc<dyn CompensationSource>,
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn Sleeper>,
    ttl: chrono::Duration,
    max_workers: usize,
}

impl EnrichmentCache {
    /// Create an empty cache with a 24 hour TTL and 10 workers.
    pub fn new(
        source: Arc<dyn CompensationSource>,
        clock: Arc<dyn Clock>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            source,
            clock,
            sleeper,
            ttl: chrono::Duration::hours(24),
            max_workers: 10,
        }
    }

    /// Apply TTL and worker settings from the `[enrichment]` section.
    #[must_use]
    pub fn with_config(mut self, config: &EnrichmentConfig) -> Self {
        self.ttl = config.ttl();
        self.max_workers = config.max_workers.max(1);
        self
    }

    /// Resolve the compensation figure for `company`.
    pub async fn lookup(&self, company: &str) -> Lookup {
        let key = normalize(company);
        let now = self.clock.now();

        if let Some(entry) = self.fresh_entry(&key, now) {
            debug!(company, tier = ?Tier::Cache, "compensation cache hit");
            return Lookup {
                salary: entry.salary,
                tier: Tier::Cache,
            };
        }

        if let Some(salary) = dataset::lookup(company) {
            self.store(&key, company, salary, now);
            return Lookup {
                salary: salary.to_string(),
                tier: Tier::StaticDataset,
            };
        }

        let live = match self.source.fetch_salary(company).await {
            Ok(found) => found.filter(|s| has_value(s)),
            Err(e) => {
                debug!(company, error = %e, "live compensation lookup failed");
                None
            }
        };

        let now = self.clock.now();
        match live {
            Some(salary) => {
                self.store(&key, company, &salary, now);
                Lookup {
                    salary,
                    tier: Tier::Live,
                }
            }
            None => {
                self.store(&key, company, NO_DATA, now);
                Lookup {
                    salary: NO_DATA.to_string(),
                    tier: Tier::NoData,
                }
            }
        }
    }

    /// Enrich every posting, looking up each distinct company once.
    pub async fn enrich_all(&self, postings: Vec<JobPosting>) -> Vec<EnrichedJob> {
        let mut companies: BTreeMap<String, String> = BTreeMap::new();
        for posting in &postings {
            companies
                .entry(normalize(&posting.company))
                .or_insert_with(|| posting.company.clone());
        }

        let semaphore = Arc::new(Semaphore::new(self.max_workers));
        let mut pending: FuturesUnordered<_> = companies
            .into_iter()
            .map(|(key, display)| {
                let semaphore = Arc::clone(&semaphore);
                async move {
                    let Ok(_permit) = semaphore.acquire().await else {
                        return (key, NO_DATA.to_string());
                    };
                    let result = self.lookup(&display).await;
                    if result.tier == Tier::Live || result.tier == Tier::NoData {
                        let jitter = rand::thread_rng().gen_range(0..MAX_LIVE_JITTER_MS);
                        self.sleeper.sleep(Duration::from_millis(jitter)).await;
                    }
                    (key, result.salary)
                }
            })
            .collect();

        let mut salaries: HashMap<String, String> = HashMap::new();
        while let Some((key, salary)) = pending.next().await {
            salaries.insert(key, salary);
        }

        let enriched_count = salaries.values().filter(|s| has_value(s)).count();
        info!(
            companies = salaries.len(),
            enriched = enriched_count,
            "enrichment complete"
        );

        postings
            .into_iter()
            .map(|posting| {
                let level_salary = salaries
                    .get(&normalize(&posting.company))
                    .cloned()
                    .unwrap_or_else(|| NO_DATA.to_string());
                EnrichedJob {
                    posting,
                    level_salary,
                }
            })
            .collect()
    }

    /// Snapshot of one entry, expired or not.
    #[must_use]
    pub fn entry(&self, company: &str) -> Option<CacheEntry> {
        self.read_entries().get(&normalize(company)).cloned()
    }

    /// Number of cached entries, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read_entries().len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Merge entries from a cache file. Missing files are not an error.
    pub fn load(&self, path: &Path) -> Result<usize> {
        let Some(loaded) = read_json::<BTreeMap<String, CacheEntry>>(path)? else {
            return Ok(0);
        };
        let count = loaded.len();
        let mut entries = self.write_entries();
        for (key, entry) in loaded {
            match entries.get(&key) {
                Some(existing) if existing.fetched_at >= entry.fetched_at => {}
                _ => {
                    entries.insert(key, entry);
                }
            }
        }
        info!(count, path = %path.display(), "loaded enrichment cache");
        Ok(count)
    }

    /// Write every entry to a cache file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let snapshot: BTreeMap<String, CacheEntry> = self
            .read_entries()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        write_json(path, &snapshot)
    }

    /// Load from `path`, logging instead of failing on a corrupt file.
    pub fn load_or_warn(&self, path: &Path) {
        if let Err(e) = self.load(path) {
            warn!(path = %path.display(), error = %e, "ignoring unreadable enrichment cache");
        }
    }

    fn fresh_entry(&self, key: &str, now: DateTime<Utc>) -> Option<CacheEntry> {
        self.read_entries()
            .get(key)
            .filter(|entry| now.signed_duration_since(entry.fetched_at) < self.ttl)
            .cloned()
    }

    fn store(&self, key: &str, display: &str, salary: &str, now: DateTime<Utc>) {
        let mut entries = self.write_entries();
        let fetched_at = entries
            .get(key)
            .map_or(now, |existing| existing.fetched_at.max(now));
        let display = entries
            .get(key)
            .map_or_else(|| display.to_string(), |existing| existing.display.clone());
        entries.insert(
            key.to_string(),
            CacheEntry {
                key: key.to_string(),
                display,
                salary: salary.to_string(),
                fetched_at,
            },
        );
    }

    fn read_entries(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.read().expect("acquire read lock on enrichment cache")
    }

    fn write_entries(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.write().expect("acquire write lock on enrichment cache")
    }
}
