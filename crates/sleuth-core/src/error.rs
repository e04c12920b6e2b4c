//! Core error types for SalarySleuth.
//!
//! `SleuthError` is the umbrella type shared by every crate in the workspace.
//! Configuration problems get their own enum because they are the only errors
//! allowed to stop a run before any scraping begins.

use thiserror::Error;

/// Central error type for SalarySleuth operations.
#[derive(Error, Debug)]
pub enum SleuthError {
    /// Configuration errors (file loading, parsing, validation)
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors (invalid input, constraints)
    #[error("validation error: {0}")]
    Validation(String),

    /// Network errors (HTTP requests, DNS, timeouts)
    #[error("network error: {0}")]
    Network(String),

    /// JSON serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to determine config directory path
    #[error("could not determine config directory (XDG base directories not available)")]
    NoConfigDir,

    /// Failed to parse TOML
    #[error("failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize config
    #[error("failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// I/O error reading/writing config
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration value
    #[error("invalid config value for {field}: {reason}")]
    InvalidValue {
        /// Field name
        field: String,
        /// Reason for invalidity
        reason: String,
    },
}

impl ConfigError {
    /// Shorthand for [`ConfigError::InvalidValue`].
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias using `SleuthError`.
pub type Result<T> = std::result::Result<T, SleuthError>;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SleuthError::Validation("empty description".to_string());
        assert_eq!(err.to_string(), "validation error: empty description");

        let err = ConfigError::invalid("search.sources", "unknown source 'dice'");
        assert_eq!(
            err.to_string(),
            "invalid config value for search.sources: unknown source 'dice'"
        );
    }

    #[test]
    fn test_error_from_config() {
        let config_err = ConfigError::NoConfigDir;
        let err: SleuthError = config_err.into();
        assert!(matches!(err, SleuthError::Config(_)));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: SleuthError = io_err.into();
        assert!(matches!(err, SleuthError::Io(_)));
    }
}
