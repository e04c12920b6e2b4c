//! SalarySleuth Scraper - job collection across boards.
//!
//! # Modules
//!
//! - [`sources`] - The source contract, unit driver and the five board scrapers
//! - [`retry`] - Backoff windows, bounded retry and response classification
//! - [`salary`] - Salary extraction from structured fields, metadata and free text
//! - [`selectors`] - Card parsing with ordered selector fallbacks
//! - [`filter`] - Title, remote, internship and top-pay filtering
//! - [`dedup`] - Cross-source deduplication
//! - [`orchestrator`] - Concurrent multi-source runs and the run report

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod dedup;
pub mod error;
pub mod filter;
pub mod orchestrator;
pub mod retry;
pub mod salary;
pub mod selectors;
pub mod sources;

// Re-export commonly used types
pub use dedup::{dedup, dedup_key};
pub use error::{FailureKind, Result, ScrapeError};
pub use filter::JobFilter;
pub use orchestrator::{RunReport, ScrapeOrchestrator, SourceReport};
pub use retry::{classify, BackoffPolicy, RetryPolicy, MAX_RETRIES, RATE_LIMIT_PENALTY};
pub use salary::SalaryRange;
pub use sources::{scrape, scraper_for, ScrapeContext, SourceOutcome, SourceScraper, Unit};
