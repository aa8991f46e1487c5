// ============================================
// File: crates/cryptoserve-server/src/error.rs
// ============================================
//! # Server Error Types
//!
//! ## Last Modified
//! v0.1.0 - Initial server errors

use thiserror::Error;

/// Result type for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

/// Server error types.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Failed to load configuration from '{path}': {reason}")]
    ConfigLoad {
        path: String,
        reason: String,
    },

    #[error("Invalid configuration: {field} - {reason}")]
    ConfigInvalid {
        field: String,
        reason: String,
    },

    #[error("Server failed to start: {reason}")]
    StartupFailed {
        reason: String,
    },

    #[error("No exercises available")]
    NoExercises,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    pub fn config_load(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn config_invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn startup_failed(reason: impl Into<String>) -> Self {
        Self::StartupFailed {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(self, Self::ConfigLoad { .. } | Self::ConfigInvalid { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ServerError::config_load("/etc/cryptoserve.toml", "file not found");
        assert!(err.to_string().contains("/etc/cryptoserve.toml"));
        assert!(err.is_config_error());
    }

    #[test]
    fn test_error_classification() {
        assert!(ServerError::config_invalid("session.timeout_secs", "zero").is_config_error());
        assert!(!ServerError::startup_failed("bind").is_config_error());
        assert!(!ServerError::NoExercises.is_config_error());
        assert!(ServerError::from(std::io::Error::other("boom")).to_string().contains("boom"));
    }
}
