//! Custom error types for Fortuna.
//!
//! This module provides structured error types that enable better
//! error handling, reporting, and recovery throughout the application.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Fortuna operations
#[derive(Error, Debug)]
pub enum FortunaError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Failed to load configuration
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        path: Option<PathBuf>,
    },

    /// Invalid configuration value
    #[error("Invalid configuration: {field} - {reason}")]
    InvalidConfig { field: String, reason: String },

    // =========================================================================
    // Prediction Source Errors
    // =========================================================================
    /// Credential missing or the generative backend could not be reached
    #[error("Prediction source unavailable: {message}")]
    SourceUnavailable { message: String },

    /// The backend replied, but the payload did not parse into a prediction
    #[error("Malformed prediction response: {message}")]
    MalformedResponse { message: String },

    /// Unknown source kind requested at construction time
    #[error("Unknown prediction source '{kind}'. Valid options: gemini, local")]
    UnknownSource { kind: String },

    // =========================================================================
    // Wrapped Errors
    // =========================================================================
    /// IO error wrapper
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON error wrapper
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Generic error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FortunaError {
    // =========================================================================
    // Constructor helpers
    // =========================================================================

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            path: None,
        }
    }

    /// Create a configuration error with path
    pub fn config_with_path(message: impl Into<String>, path: PathBuf) -> Self {
        Self::Config {
            message: message.into(),
            path: Some(path),
        }
    }

    /// Create a source-unavailable error
    pub fn source_unavailable(message: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            message: message.into(),
        }
    }

    /// Create a malformed-response error
    pub fn malformed_response(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    // =========================================================================
    // Classification helpers
    // =========================================================================

    /// Check if this error should surface to the user as a session failure.
    ///
    /// Both source error classes collapse into the same `Failed` phase;
    /// the session state machine never distinguishes them.
    pub fn is_user_visible(&self) -> bool {
        matches!(
            self,
            Self::SourceUnavailable { .. } | Self::MalformedResponse { .. }
        )
    }

    /// Get error code for exit status
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config { .. } | Self::InvalidConfig { .. } => 7,
            Self::UnknownSource { .. } => 6,
            Self::SourceUnavailable { .. } | Self::MalformedResponse { .. } => 2,
            _ => 1,
        }
    }
}

/// Type alias for Fortuna results
pub type Result<T> = std::result::Result<T, FortunaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FortunaError::source_unavailable("API key is missing");
        assert!(err.to_string().contains("API key is missing"));
        assert!(err.to_string().contains("unavailable"));
    }

    #[test]
    fn test_is_user_visible() {
        assert!(FortunaError::source_unavailable("down").is_user_visible());
        assert!(FortunaError::malformed_response("bad json").is_user_visible());
        assert!(!FortunaError::config("missing file").is_user_visible());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(FortunaError::config("test").exit_code(), 7);
        assert_eq!(
            FortunaError::UnknownSource {
                kind: "tarot".into()
            }
            .exit_code(),
            6
        );
        assert_eq!(FortunaError::source_unavailable("down").exit_code(), 2);
    }

    #[test]
    fn test_config_with_path() {
        let path = PathBuf::from("/test/fortuna.json");
        let err = FortunaError::config_with_path("failed to parse", path.clone());
        if let FortunaError::Config {
            message,
            path: opt_path,
        } = err
        {
            assert_eq!(message, "failed to parse");
            assert_eq!(opt_path, Some(path));
        } else {
            panic!("Wrong error variant");
        }
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: FortunaError = io_err.into();
        assert!(matches!(err, FortunaError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_unknown_source_message_lists_valid_kinds() {
        let err = FortunaError::UnknownSource {
            kind: "crystal".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("crystal"));
        assert!(msg.contains("gemini"));
        assert!(msg.contains("local"));
    }
}
