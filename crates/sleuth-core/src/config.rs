//! Configuration management for SalarySleuth.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult, SleuthError};
use crate::types::{JobFilters, SearchQuery, Source};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Main application configuration.
///
/// This is loaded from `~/.config/salarysleuth/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SleuthConfig {
    /// General application settings
    pub general: GeneralConfig,
    /// What to search for
    pub search: SearchConfig,
    /// HTTP, retry and concurrency settings
    pub network: NetworkConfig,
    /// Company compensation enrichment
    pub enrichment: EnrichmentConfig,
    /// Job ledger settings
    pub ledger: LedgerConfig,
}

impl SleuthConfig {
    /// Load configuration from disk, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            tracing::debug!("Loading config from {}", config_path.display());
            let contents = fs::read_to_string(&config_path)?;
            let config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports `SALARYSLEUTH_DESCRIPTION`, `SALARYSLEUTH_TITLE`, `SALARYSLEUTH_CITY`,
    /// `SALARYSLEUTH_PAGES`, `SALARYSLEUTH_SOURCES` (comma-separated),
    /// `SALARYSLEUTH_PROXY`, `SALARYSLEUTH_REMOTE`, `SALARYSLEUTH_INTERNSHIPS`,
    /// `SALARYSLEUTH_TOP_PAY`, `SALARYSLEUTH_DEBUG` and `SALARYSLEUTH_DATA_DIR`.
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply overrides from a key lookup (the process environment in production).
    ///
    /// Values that fail to parse are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("SALARYSLEUTH_DESCRIPTION") {
            tracing::debug!("Override search.description from env: {}", val);
            self.search.description = val;
        }

        if let Some(val) = lookup("SALARYSLEUTH_TITLE") {
            tracing::debug!("Override search.title_keyword from env: {}", val);
            self.search.title_keyword = Some(val).filter(|v| !v.is_empty());
        }

        if let Some(val) = lookup("SALARYSLEUTH_CITY") {
            tracing::debug!("Override search.city from env: {}", val);
            self.search.city = Some(val).filter(|v| !v.is_empty());
        }

        if let Some(val) = lookup("SALARYSLEUTH_PAGES") {
            if let Ok(pages) = val.parse() {
                self.search.pages = pages;
                tracing::debug!("Override search.pages from env: {}", pages);
            }
        }

        if let Some(val) = lookup("SALARYSLEUTH_SOURCES") {
            self.search.sources = val
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            tracing::debug!("Override search.sources from env: {:?}", self.search.sources);
        }

        if let Some(val) = lookup("SALARYSLEUTH_PROXY") {
            tracing::debug!("Override network.proxy_url from env");
            self.network.proxy_url = Some(val).filter(|v| !v.is_empty());
        }

        for (key, target) in [
            ("SALARYSLEUTH_REMOTE", &mut self.search.remote_only),
            ("SALARYSLEUTH_INTERNSHIPS", &mut self.search.internships_only),
            ("SALARYSLEUTH_TOP_PAY", &mut self.search.top_pay_only),
            ("SALARYSLEUTH_DEBUG", &mut self.general.debug),
        ] {
            if let Some(val) = lookup(key) {
                if let Ok(flag) = val.parse() {
                    *target = flag;
                    tracing::debug!("Override {} from env: {}", key, flag);
                }
            }
        }

        if let Some(val) = lookup("SALARYSLEUTH_DATA_DIR") {
            tracing::debug!("Override ledger.data_dir from env: {}", val);
            self.ledger.data_dir = Some(PathBuf::from(val));
        }
    }

    /// Validate the search settings and resolve the selected sources.
    ///
    /// An empty source list selects [`Source::DEFAULT`].
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidValue`] for an empty description, a zero
    /// page budget, or an unknown source name.
    pub fn validate(&self) -> ConfigResult<Vec<Source>> {
        if self.search.description.trim().is_empty() {
            return Err(ConfigError::invalid(
                "search.description",
                "a search description is required",
            ));
        }

        if self.search.pages == 0 {
            return Err(ConfigError::invalid(
                "search.pages",
                "page budget must be at least 1",
            ));
        }

        if self.search.sources.is_empty() {
            return Ok(Source::DEFAULT.to_vec());
        }

        let mut sources = Vec::with_capacity(self.search.sources.len());
        for name in &self.search.sources {
            let source: Source = name
                .parse()
                .map_err(|e: SleuthError| ConfigError::invalid("search.sources", e.to_string()))?;
            if !sources.contains(&source) {
                sources.push(source);
            }
        }
        Ok(sources)
    }

    /// Build the search query described by this configuration.
    #[must_use]
    pub fn query(&self) -> SearchQuery {
        SearchQuery {
            description: self.search.description.trim().to_string(),
            title_keyword: self.search.title_keyword.clone(),
            city: self.search.city.clone(),
            pages: self.search.pages,
            filters: JobFilters {
                remote_only: self.search.remote_only,
                internships_only: self.search.internships_only,
                top_pay_only: self.search.top_pay_only,
            },
        }
    }

    /// Save configuration to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> ConfigResult<()> {
        let config_path = Self::config_path()?;
        let config_dir = config_path
            .parent()
            .ok_or_else(|| ConfigError::invalid("config_path", "no parent directory"))?;

        fs::create_dir_all(config_dir)?;
        tracing::debug!("Saving config to {}", config_path.display());

        let contents = toml::to_string_pretty(self)?;
        fs::write(config_path, contents)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/salarysleuth/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }

    /// Get the data directory path.
    ///
    /// Uses XDG base directories: `~/.local/share/salarysleuth`
    pub fn data_dir() -> ConfigResult<PathBuf> {
        Ok(project_dirs()?.data_dir().to_path_buf())
    }

    /// Get the cache directory path.
    ///
    /// Uses XDG base directories: `~/.cache/salarysleuth`
    pub fn cache_dir() -> ConfigResult<PathBuf> {
        Ok(project_dirs()?.cache_dir().to_path_buf())
    }

    /// Directory holding the ledger and result files.
    ///
    /// `ledger.data_dir` wins over the XDG data directory.
    pub fn resolved_data_dir(&self) -> ConfigResult<PathBuf> {
        match &self.ledger.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Self::data_dir(),
        }
    }
}

fn project_dirs() -> ConfigResult<ProjectDirs> {
    ProjectDirs::from("com", "salarysleuth", "salarysleuth").ok_or(ConfigError::NoConfigDir)
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Verbose logging for every sleuth crate
    pub debug: bool,
}

/// Search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct SearchConfig {
    /// Search description
    pub description: String,
    /// Optional title keyword filter
    pub title_keyword: Option<String>,
    /// Optional city
    pub city: Option<String>,
    /// Page budget for HTML sources
    pub pages: u32,
    /// Source names; empty selects the defaults
    pub sources: Vec<String>,
    /// Only remote positions
    pub remote_only: bool,
    /// Only internships
    pub internships_only: bool,
    /// Only top-paying companies
    pub top_pay_only: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            description: String::new(),
            title_keyword: None,
            city: None,
            pages: 10,
            sources: Source::DEFAULT
                .iter()
                .map(|s| s.as_str().to_string())
                .collect(),
            remote_only: false,
            internships_only: false,
            top_pay_only: false,
        }
    }
}

/// HTTP, retry and concurrency settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Optional HTTP(S) proxy URL
    pub proxy_url: Option<String>,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Attempts per unit of work before it is skipped
    pub max_retries: u32,
    /// Fixed wait after a rate-limited response, in seconds
    pub rate_limit_penalty_secs: u64,
    /// In-flight fetches per source (clamped to 3..=5)
    pub source_concurrency: usize,
}

impl NetworkConfig {
    /// Request timeout as a `Duration`.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Rate-limit penalty as a `Duration`.
    #[must_use]
    pub fn rate_limit_penalty(&self) -> Duration {
        Duration::from_secs(self.rate_limit_penalty_secs)
    }

    /// Worker pool size per source, clamped to the supported range.
    #[must_use]
    pub fn worker_pool_size(&self) -> usize {
        self.source_concurrency.clamp(3, 5)
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            proxy_url: None,
            timeout_secs: 30,
            max_retries: 3,
            rate_limit_penalty_secs: 15,
            source_concurrency: 3,
        }
    }
}

/// Compensation enrichment settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    /// Attach company compensation data to results
    pub enabled: bool,
    /// Cache and directory time-to-live in hours
    pub ttl_hours: i64,
    /// Concurrent company lookups
    pub max_workers: usize,
    /// Persist the enrichment cache between runs
    pub persist_cache: bool,
}

impl EnrichmentConfig {
    /// TTL as a `chrono::Duration`.
    #[must_use]
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.ttl_hours)
    }
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_hours: 24,
            max_workers: 10,
            persist_cache: true,
        }
    }
}

/// Job ledger settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Reconcile results against the persisted ledger
    pub enabled: bool,
    /// Scrape passes merged before reconciliation
    pub passes: u32,
    /// Pause between passes in seconds
    pub pass_delay_secs: u64,
    /// Ledger file name inside the data directory
    pub file_name: String,
    /// Data directory override
    pub data_dir: Option<PathBuf>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            passes: 3,
            pass_delay_secs: 5,
            file_name: "jobs.json".to_string(),
            data_dir: None,
        }
    }
}
