//! Error types for enrichment and the company directory.

use thiserror::Error;

/// Result type alias for enrichment operations.
pub type Result<T> = std::result::Result<T, EnrichError>;

/// Errors raised by the enrichment cache and company directory.
#[derive(Debug, Error)]
pub enum EnrichError {
    /// HTTP transport failure
    #[error("http error: {0}")]
    Http(#[from] sleuth_http::HttpError),

    /// Compensation page answered with a non-success status
    #[error("compensation lookup for '{company}' returned status {status}")]
    UnexpectedStatus {
        /// Company being looked up
        company: String,
        /// HTTP status code
        status: u16,
    },

    /// A CSS selector failed to compile
    #[error("invalid selector '{selector}': {reason}")]
    InvalidSelector {
        /// Selector text
        selector: String,
        /// Parser message
        reason: String,
    },

    /// Cache file I/O failure
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Cache file (de)serialization failure
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
