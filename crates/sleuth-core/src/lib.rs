//! SalarySleuth Core - Foundation crate for the SalarySleuth workspace.
//!
//! This crate provides shared types, error handling, configuration management,
//! and the time seams that every other SalarySleuth crate depends on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths and env overrides
//! - [`types`] - Sources, postings, sentinels and search parameters
//! - [`clock`] - `Clock` and `Sleeper` seams for time-dependent logic
//!
//! # Example
//!
//! ```rust
//! use sleuth_core::{SleuthConfig, Source};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut config = SleuthConfig::default();
//! config.search.description = "Software Engineer".to_string();
//!
//! let sources = config.validate()?;
//! assert_eq!(sources, vec![Source::Linkedin, Source::Greenhouse, Source::Lever]);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod clock;
pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use clock::{Clock, Sleeper, SystemClock, TokioSleeper};
pub use config::{
    EnrichmentConfig, GeneralConfig, LedgerConfig, NetworkConfig, SearchConfig, SleuthConfig,
};
pub use error::{ConfigError, ConfigResult, Result, SleuthError};
pub use types::{
    has_value, EnrichedJob, JobFilters, JobPosting, SearchQuery, Source, NOT_AVAILABLE, NO_DATA,
};
