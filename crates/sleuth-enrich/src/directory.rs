//! Top-paying company directory backed by the levels.fyi leaderboards.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use sleuth_core::{Clock, Sleeper};
use sleuth_http::{random_headers, Fetcher, PageRequest};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{EnrichError, Result};
use crate::normalizer::normalize;
use crate::persist::{read_json, write_json};

/// Cache file name inside the cache directory.
pub const DIRECTORY_CACHE_FILE: &str = "top_companies_cache.json";

/// Leaderboards scraped for top-paying companies, one per engineering level.
pub const LEADERBOARD_URLS: [&str; 6] = [
    "https://www.levels.fyi/leaderboard/Software-Engineer/All-Levels/country/United-States/",
    "https://www.levels.fyi/leaderboard/Software-Engineer/Entry-Level-Engineer/country/United-States/",
    "https://www.levels.fyi/leaderboard/Software-Engineer/Software-Engineer/country/United-States/",
    "https://www.levels.fyi/leaderboard/Software-Engineer/Senior-Engineer/country/United-States/",
    "https://www.levels.fyi/leaderboard/Software-Engineer/Staff-Engineer/country/United-States/",
    "https://www.levels.fyi/leaderboard/Software-Engineer/Principal-Engineer/country/United-States/",
];

const LEADERBOARD_SELECTOR: &str = "a.nav-link.d-flex.align-items-center strong";

/// Pause between leaderboard requests.
const LEADERBOARD_DELAY: Duration = Duration::from_secs(1);

/// Served when the leaderboards yield nothing and no cache exists.
const FALLBACK_COMPANIES: &[&str] = &[
    "Adobe", "Affirm", "Airbnb", "Airtable", "Alibaba", "AMD", "Amazon", "Amplitude",
    "Anduril Industries", "AngelList", "AppLovin", "Apple", "Aquatic", "Block", "Bosch Global",
    "Brex", "Bridgewater Associates", "Broadcom", "ByteDance", "Calico Life Sciences",
    "Chai Research", "Character.AI", "Chronosphere", "Circle", "Citadel", "ClassDojo",
    "CloudKitchens", "Clubhouse", "Coinbase", "Coupang", "Cruise", "Databricks", "Discord",
    "DocuSign", "DoorDash", "Dropbox", "F5 Networks", "Faire", "Fidelity Investments", "Figma",
    "Five Rings", "Ford Motor", "Google", "Hudson River Trading", "IMC", "Instacart", "Intel",
    "Intuit", "Jane Street", "Latitude AI", "Leidos", "LinkedIn", "Lyft", "Meta", "Microsoft",
    "Millennium", "Mysten Labs", "Netflix", "Notion", "Nuro", "NVIDIA", "Old Mission", "OpenAI",
    "OpenSea", "Optiver", "Oracle", "PageBites", "Palantir", "PDT Partners", "Pinterest", "Plaid",
    "Proofpoint", "Radix Trading", "Reddit", "Remitly", "Rippling", "Robinhood", "Roblox", "Roku",
    "Salesforce", "Slack", "Snap", "Snowflake", "Stack AV", "Stripe", "StubHub",
    "TGS Management", "The Block", "The Shaw Group", "Thumbtack", "Toyota Research Institute",
    "Twitch", "Twitter", "Two Sigma", "Uber", "US Bank", "Vatic Investments", "Waymo",
    "Woven Planet Group",
];

/// On-disk layout of the directory cache.
///
/// Every field defaults so files written by older builds stay readable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheData {
    /// Normalized key -> membership
    pub companies: BTreeMap<String, bool>,
    /// Normalized key -> display name
    pub original_names: BTreeMap<String, String>,
    /// When the data was last refreshed
    pub last_fetch_time: Option<DateTime<Utc>>,
}

impl CacheData {
    /// Build a directory from display names.
    pub fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut data = Self::default();
        for name in names {
            data.insert(name);
        }
        data
    }

    /// The bundled fallback directory.
    #[must_use]
    pub fn fallback() -> Self {
        Self::from_names(FALLBACK_COMPANIES.iter().copied())
    }

    fn insert(&mut self, name: &str) {
        let key = normalize(name);
        if key.is_empty() {
            return;
        }
        self.companies.insert(key.clone(), true);
        self.original_names
            .entry(key)
            .or_insert_with(|| name.trim().to_string());
    }

    fn is_fresh(&self, now: DateTime<Utc>, ttl: chrono::Duration) -> bool {
        !self.companies.is_empty()
            && self
                .last_fetch_time
                .is_some_and(|fetched| now.signed_duration_since(fetched) < ttl)
    }
}

/// Directory of top-paying companies, refreshed at most once per TTL.
///
/// Cloning shares the underlying state.
#[derive(Clone)]
pub struct CompanyDirectory {
    state: Arc<RwLock<CacheData>>,
    refresh_guard: Arc<Mutex<()>>,
    fetcher: Arc<dyn Fetcher>,
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn Sleeper>,
    cache_path: Option<PathBuf>,
    ttl: chrono::Duration,
}

impl CompanyDirectory {
    /// Create an empty directory with a 24 hour TTL and no cache file.
    pub fn new(fetcher: Arc<dyn Fetcher>, clock: Arc<dyn Clock>, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            state: Arc::new(RwLock::new(CacheData::default())),
            refresh_guard: Arc::new(Mutex::new(())),
            fetcher,
            clock,
            sleeper,
            cache_path: None,
            ttl: chrono::Duration::hours(24),
        }
    }

    /// Persist the directory to `path`.
    #[must_use]
    pub fn with_cache_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = Some(path.into());
        self
    }

    /// Override the refresh interval.
    #[must_use]
    pub fn with_ttl(mut self, ttl: chrono::Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Make sure the directory holds data younger than the TTL.
    ///
    /// Order: in-memory state, cache file, leaderboards. When the leaderboards
    /// yield no companies the previous data (or the bundled fallback) is kept
    /// and stamped, so the next attempt waits a full TTL.
    pub async fn ensure_fresh(&self) {
        let _guard = self.refresh_guard.lock().await;
        let now = self.clock.now();

        if self.read_state().is_fresh(now, self.ttl) {
            debug!("using in-memory top companies directory");
            return;
        }

        if let Some(cached) = self.load_cache_file() {
            let fresh = cached.is_fresh(now, self.ttl);
            *self.write_state() = cached;
            if fresh {
                info!(count = self.len(), "loaded top companies from cache file");
                return;
            }
        }

        let scraped = self.fetch_leaderboards().await;
        let mut state = self.read_state().clone();

        if scraped.companies.is_empty() {
            if state.companies.is_empty() {
                warn!("leaderboards returned no companies, using bundled fallback list");
                state = CacheData::fallback();
            } else {
                warn!(
                    count = state.companies.len(),
                    "leaderboards returned no companies, keeping stale directory"
                );
            }
        } else {
            info!(count = scraped.companies.len(), "refreshed top companies from leaderboards");
            state = scraped;
        }

        state.last_fetch_time = Some(now);
        *self.write_state() = state;
        self.save_cache_file();
    }

    /// Membership test against the current state without refreshing.
    #[must_use]
    pub fn contains(&self, company: &str) -> bool {
        let key = normalize(company);
        self.read_state().companies.get(&key).copied().unwrap_or(false)
    }

    /// `(key, display name)` pairs sorted by display name.
    #[must_use]
    pub fn listing(&self) -> Vec<(String, String)> {
        let state = self.read_state();
        let mut entries: Vec<(String, String)> = state
            .companies
            .iter()
            .filter(|(_, member)| **member)
            .map(|(key, _)| {
                let display = state
                    .original_names
                    .get(key)
                    .cloned()
                    .unwrap_or_else(|| key.clone());
                (key.clone(), display)
            })
            .collect();
        entries.sort_by(|a, b| a.1.cmp(&b.1));
        entries
    }

    /// Number of companies in the directory.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read_state().companies.len()
    }

    /// Whether the directory holds no companies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replace the state wholesale.
    pub fn replace(&self, data: CacheData) {
        *self.write_state() = data;
    }

    async fn fetch_leaderboards(&self) -> CacheData {
        let mut data = CacheData::default();

        for (index, url) in LEADERBOARD_URLS.iter().enumerate() {
            if index > 0 {
                self.sleeper.sleep(LEADERBOARD_DELAY).await;
            }

            debug!(url, "fetching leaderboard");
            let page = match self.fetcher.fetch(&PageRequest::new(*url, random_headers())).await {
                Ok(page) => page,
                Err(e) => {
                    debug!(url, error = %e, "leaderboard request failed");
                    continue;
                }
            };

            if !page.is_success() {
                debug!(url, status = page.status, "leaderboard returned non-success status");
                continue;
            }

            match parse_leaderboard(&page.body) {
                Ok(names) => {
                    debug!(url, count = names.len(), "parsed leaderboard");
                    for name in &names {
                        data.insert(name);
                    }
                }
                Err(e) => debug!(url, error = %e, "failed to parse leaderboard"),
            }
        }

        data
    }

    fn load_cache_file(&self) -> Option<CacheData> {
        let path = self.cache_path.as_ref()?;
        match read_json::<CacheData>(path) {
            Ok(data) => data,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring unreadable directory cache");
                None
            }
        }
    }

    fn save_cache_file(&self) {
        let Some(path) = self.cache_path.as_ref() else {
            return;
        };
        let snapshot = self.read_state().clone();
        if let Err(e) = write_json(path, &snapshot) {
            warn!(path = %path.display(), error = %e, "failed to save directory cache");
        }
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, CacheData> {
        self.state.read().expect("acquire read lock on directory")
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, CacheData> {
        self.state.write().expect("acquire write lock on directory")
    }
}

/// Extract company names from a leaderboard page, skipping rank numbers.
pub fn parse_leaderboard(html: &str) -> Result<Vec<String>> {
    let selector = Selector::parse(LEADERBOARD_SELECTOR).map_err(|e| EnrichError::InvalidSelector {
        selector: LEADERBOARD_SELECTOR.to_string(),
        reason: e.to_string(),
    })?;

    let document = Html::parse_document(html);
    Ok(document
        .select(&selector)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|name| !name.is_empty() && !name.chars().all(|c| c.is_ascii_digit()))
        .collect())
}
