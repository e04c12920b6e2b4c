//! Shared domain types: sources, postings and search parameters.

use crate::error::SleuthError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Salary sentinel for postings that carry no compensation text.
pub const NOT_AVAILABLE: &str = "Not Available";

/// Enrichment sentinel for companies without compensation data.
pub const NO_DATA: &str = "No Data";

/// Returns true when `value` carries real data (not empty, not a sentinel).
#[must_use]
pub fn has_value(value: &str) -> bool {
    let trimmed = value.trim();
    !trimmed.is_empty() && trimmed != NOT_AVAILABLE && trimmed != NO_DATA
}

/// A job board. The set is closed; there is no plugin mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// Greenhouse public board API
    Greenhouse,
    /// Lever public postings API
    Lever,
    /// LinkedIn guest job search
    Linkedin,
    /// Monster search result pages
    Monster,
    /// Indeed search result pages
    Indeed,
}

impl Source {
    /// Every supported source, in registry order.
    pub const ALL: [Source; 5] = [
        Source::Greenhouse,
        Source::Lever,
        Source::Linkedin,
        Source::Monster,
        Source::Indeed,
    ];

    /// Sources searched when the caller selects none.
    ///
    /// Indeed and Monster are opt-in because both serve challenge pages to
    /// most automated traffic.
    pub const DEFAULT: [Source; 3] = [Source::Linkedin, Source::Greenhouse, Source::Lever];

    /// Lowercase identifier used in config files and the ledger.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Greenhouse => "greenhouse",
            Self::Lever => "lever",
            Self::Linkedin => "linkedin",
            Self::Monster => "monster",
            Self::Indeed => "indeed",
        }
    }

    /// Human-readable name for printed output.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Greenhouse => "Greenhouse",
            Self::Lever => "Lever",
            Self::Linkedin => "LinkedIn",
            Self::Monster => "Monster",
            Self::Indeed => "Indeed",
        }
    }

    /// Whether the source is served by a JSON board API rather than HTML pages.
    #[must_use]
    pub fn is_api_backed(self) -> bool {
        matches!(self, Self::Greenhouse | Self::Lever)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = SleuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|source| source.as_str() == wanted)
            .ok_or_else(|| {
                SleuthError::Validation(format!(
                    "invalid source '{s}': must be one of greenhouse, lever, linkedin, monster, indeed"
                ))
            })
    }
}

/// A job posting as extracted from a source.
///
/// `salary_range` is free-text compensation or [`NOT_AVAILABLE`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPosting {
    /// Company display name
    pub company: String,
    /// Job title
    pub title: String,
    /// Location as listed by the source
    pub location: String,
    /// Link to the posting
    pub url: String,
    /// Extracted salary text or the "Not Available" sentinel
    pub salary_range: String,
    /// Board the posting came from
    pub source: Source,
}

impl JobPosting {
    /// Whether the posting carries salary text.
    #[must_use]
    pub fn has_salary(&self) -> bool {
        has_value(&self.salary_range)
    }
}

/// A posting with third-party compensation data attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedJob {
    /// The scraped posting
    #[serde(flatten)]
    pub posting: JobPosting,
    /// Company-level compensation figure or the "No Data" sentinel
    pub level_salary: String,
}

impl EnrichedJob {
    /// Attach the "No Data" sentinel to a posting.
    #[must_use]
    pub fn without_enrichment(posting: JobPosting) -> Self {
        Self {
            posting,
            level_salary: NO_DATA.to_string(),
        }
    }

    /// Whether company compensation data is present.
    #[must_use]
    pub fn has_level_salary(&self) -> bool {
        has_value(&self.level_salary)
    }
}

/// Boolean result filters, all evaluated case-insensitively.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct JobFilters {
    /// Keep only postings with a remote indicator
    pub remote_only: bool,
    /// Keep only internship titles
    pub internships_only: bool,
    /// Keep only companies in the top-paying tier
    pub top_pay_only: bool,
}

/// What to search for in a single run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Search description, matched against titles for API sources
    pub description: String,
    /// Optional title keyword filter
    pub title_keyword: Option<String>,
    /// Optional city for HTML sources that support it
    pub city: Option<String>,
    /// Page budget for HTML sources
    pub pages: u32,
    /// Result filters
    pub filters: JobFilters,
}

impl SearchQuery {
    /// Create a query with default filters and a single page.
    #[must_use]
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            title_keyword: None,
            city: None,
            pages: 1,
            filters: JobFilters::default(),
        }
    }

    /// Set the page budget.
    #[must_use]
    pub fn with_pages(mut self, pages: u32) -> Self {
        self.pages = pages;
        self
    }

    /// Set the result filters.
    #[must_use]
    pub fn with_filters(mut self, filters: JobFilters) -> Self {
        self.filters = filters;
        self
    }
}
