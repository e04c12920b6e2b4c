//! SalarySleuth Enrich - company identity and compensation data.
//!
//! # Modules
//!
//! - [`normalizer`] - The single company-name canonicalization and alias table
//! - [`directory`] - Top-paying company directory (leaderboards, cache file, fallback)
//! - [`dataset`] - Bundled compensation figures
//! - [`cache`] - TTL-bounded enrichment cache and the levels.fyi source
//! - [`format`] - Salary figure formatting and sorting helpers
//!
//! # Example
//!
//! ```rust
//! use sleuth_enrich::normalize;
//!
//! assert_eq!(normalize("Facebook"), "meta");
//! assert_eq!(normalize("Acme, Inc."), "acme");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod cache;
pub mod dataset;
pub mod directory;
pub mod error;
pub mod format;
pub mod normalizer;

mod persist;

// Re-export commonly used types
pub use cache::{
    CacheEntry, CompensationSource, EnrichmentCache, LevelsFyiSource, Lookup, Tier,
    ENRICHMENT_CACHE_FILE,
};
pub use directory::{CacheData, CompanyDirectory, DIRECTORY_CACHE_FILE};
pub use error::{EnrichError, Result};
pub use format::{format_salary, numeric_value};
pub use normalizer::{levels_slug, normalize};
