//! Error types for the relay status feed.

use thiserror::Error;

/// Result type alias for status feed operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for roster construction, configuration and rendering
///
/// Ticking the feed itself never fails; every variant here comes from
/// building the inputs or serializing the outputs.
#[derive(Debug, Error)]
pub enum Error {
    /// Roster is empty or contains an invalid/duplicate node
    #[error("Invalid roster: {0}")]
    InvalidRoster(String),

    /// Configuration value rejected by validation
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration source could not be read or deserialized
    #[error("Configuration source error: {0}")]
    ConfigSource(#[from] config::ConfigError),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML serialization error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::ser::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Logging subscriber could not be installed
    #[error("Logging error: {0}")]
    Logging(String),
}

impl Error {
    /// Whether the error was caused by user-supplied configuration
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Error::Config(_) | Error::ConfigSource(_) | Error::InvalidRoster(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidRoster("duplicate node id: bj".to_string());
        assert_eq!(err.to_string(), "Invalid roster: duplicate node id: bj");
    }

    #[test]
    fn test_config_error_classification() {
        assert!(Error::Config("interval_ms must be > 0".into()).is_config_error());
        assert!(Error::InvalidRoster("empty".into()).is_config_error());
        assert!(!Error::Logging("already set".into()).is_config_error());
    }
}
