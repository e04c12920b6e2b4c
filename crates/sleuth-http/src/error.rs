//! Error types for HTTP plumbing.

use thiserror::Error;

/// Result type alias for HTTP operations.
pub type Result<T> = std::result::Result<T, HttpError>;

/// Errors raised while building clients or performing requests.
#[derive(Debug, Error)]
pub enum HttpError {
    /// The configured proxy URL is malformed or uses an unsupported scheme
    #[error("invalid proxy URL '{url}': {reason}")]
    InvalidProxy {
        /// Proxy URL as configured
        url: String,
        /// What was wrong with it
        reason: String,
    },

    /// The underlying HTTP client could not be constructed
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(String),

    /// Transport-level failure (connect, timeout, TLS, truncated body)
    #[error("request to {url} failed: {reason}")]
    Request {
        /// Requested URL
        url: String,
        /// Transport error message
        reason: String,
    },

    /// A compressed response body could not be inflated
    #[error("failed to decode {encoding} body: {reason}")]
    Decode {
        /// Value of the Content-Encoding header
        encoding: String,
        /// Decoder error message
        reason: String,
    },
}

impl HttpError {
    /// Whether the error must stop the run before any scraping begins.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::InvalidProxy { .. } | Self::ClientBuild(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = HttpError::Request {
            url: "https://api.lever.co/v0/postings/plaid".to_string(),
            reason: "operation timed out".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "request to https://api.lever.co/v0/postings/plaid failed: operation timed out"
        );
    }

    #[test]
    fn test_configuration_errors() {
        let err = HttpError::InvalidProxy {
            url: "ftp://proxy".to_string(),
            reason: "unsupported scheme".to_string(),
        };
        assert!(err.is_configuration());
        assert!(err.to_string().contains("ftp://proxy"));

        let err = HttpError::Request {
            url: "https://example.com".to_string(),
            reason: "connection reset".to_string(),
        };
        assert!(!err.is_configuration());
    }
}
