//! Failure taxonomy for scraping.

use sleuth_core::Source;
use thiserror::Error;

/// Result type alias for scraping operations.
pub type Result<T> = std::result::Result<T, ScrapeError>;

/// How a failed unit of work should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Retry after the normal jitter window, then skip the unit
    Transient,
    /// Retry after the fixed penalty, then skip the unit
    RateLimited,
    /// Abort the whole source and keep partial results
    Blocked,
    /// Skip the unit without retrying
    ParseFailure,
    /// Stop at once because the source was aborted
    Cancelled,
}

/// Errors raised while scraping a single unit of work (a page or a company).
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Network failure, timeout or unexpected status
    #[error("transient failure on {unit}: {reason}")]
    Transient {
        /// Page or company being fetched
        unit: String,
        /// What went wrong
        reason: String,
    },

    /// 429/403 without a challenge page
    #[error("rate limited on {unit} (HTTP {status})")]
    RateLimited {
        /// Page or company being fetched
        unit: String,
        /// Status code returned
        status: u16,
    },

    /// The source served a challenge page
    #[error("{site} is blocking requests (matched '{signature}')")]
    Blocked {
        /// Source that is blocking
        site: Source,
        /// Block signature that matched
        signature: String,
    },

    /// Response could not be decoded into postings
    #[error("failed to parse {unit}: {reason}")]
    ParseFailure {
        /// Page or company being parsed
        unit: String,
        /// Parser message
        reason: String,
    },

    /// The source was aborted while this unit was waiting or in flight
    #[error("abandoned {unit} after the source blocked")]
    Cancelled {
        /// Page or company being fetched
        unit: String,
    },

    /// A CSS selector failed to compile
    #[error("invalid selector '{selector}': {reason}")]
    InvalidSelector {
        /// Selector text
        selector: String,
        /// Parser message
        reason: String,
    },
}

impl ScrapeError {
    /// Classification used by the retry policy.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Transient { .. } => FailureKind::Transient,
            Self::RateLimited { .. } => FailureKind::RateLimited,
            Self::Blocked { .. } => FailureKind::Blocked,
            Self::ParseFailure { .. } | Self::InvalidSelector { .. } => FailureKind::ParseFailure,
            Self::Cancelled { .. } => FailureKind::Cancelled,
        }
    }

    /// Wrap a transport error as transient.
    pub fn transport(unit: &str, error: &sleuth_http::HttpError) -> Self {
        Self::Transient {
            unit: unit.to_string(),
            reason: error.to_string(),
        }
    }

    /// Wrap a JSON error as a parse failure.
    pub fn json(unit: &str, error: &serde_json::Error) -> Self {
        Self::ParseFailure {
            unit: unit.to_string(),
            reason: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        let transient = ScrapeError::Transient {
            unit: "page 1".to_string(),
            reason: "timeout".to_string(),
        };
        assert_eq!(transient.kind(), FailureKind::Transient);

        let limited = ScrapeError::RateLimited {
            unit: "page 1".to_string(),
            status: 429,
        };
        assert_eq!(limited.kind(), FailureKind::RateLimited);

        let blocked = ScrapeError::Blocked {
            site: Source::Indeed,
            signature: "just a moment".to_string(),
        };
        assert_eq!(blocked.kind(), FailureKind::Blocked);

        let selector = ScrapeError::InvalidSelector {
            selector: "div[".to_string(),
            reason: "unexpected end".to_string(),
        };
        assert_eq!(selector.kind(), FailureKind::ParseFailure);

        let cancelled = ScrapeError::Cancelled {
            unit: "page 3".to_string(),
        };
        assert_eq!(cancelled.kind(), FailureKind::Cancelled);
        assert_eq!(cancelled.to_string(), "abandoned page 3 after the source blocked");
    }

    #[test]
    fn test_blocked_display() {
        let err = ScrapeError::Blocked {
            site: Source::Monster,
            signature: "captcha".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "monster is blocking requests (matched 'captcha')"
        );
    }
}
