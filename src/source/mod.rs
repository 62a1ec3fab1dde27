//! Prediction source abstraction layer.
//!
//! This module provides a trait-based abstraction for prediction sources,
//! enabling Fortuna to serve predictions from interchangeable backends (the
//! Gemini generative API, a pre-authored local list) through one interface.
//!
//! # Architecture
//!
//! The [`PredictionSource`] trait defines the contract every source must
//! implement. It is designed to be:
//!
//! - **Object-safe**: supports dynamic dispatch via `Arc<dyn PredictionSource>`
//! - **Thread-safe**: `Send + Sync` bounds enable use from async tasks
//! - **Async-first**: fetching is async for non-blocking I/O
//!
//! The session controller is agnostic to which source is wired in; this
//! substitution point is selected at construction time via [`create_source`].

pub mod gemini;
pub mod local;

pub use gemini::{GeminiApiError, GeminiSource};
pub use local::LocalSource;

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::config::SourceConfig;
use crate::error::FortunaError;
use crate::prediction::{PredictionResult, Theme};

/// Abstraction for prediction source operations.
///
/// This trait defines the single capability the session controller depends
/// on: produce one fresh [`PredictionResult`], or fail. Implementations can
/// call a remote generative API or pick from a fixed local list.
///
/// # Errors
///
/// `fetch_prediction` returns an error if the backend is unreachable, the
/// credential is absent, the request times out, or the reply does not parse
/// into the expected shape. The controller treats all of these uniformly.
#[async_trait]
pub trait PredictionSource: Send + Sync + std::fmt::Debug {
    /// Fetch one prediction.
    async fn fetch_prediction(&self) -> Result<PredictionResult>;

    /// Get a short identifier for this source (for logs).
    fn source_name(&self) -> &str;
}

/// Create a prediction source based on configuration.
///
/// # Errors
///
/// Returns [`FortunaError::UnknownSource`] when the configured kind is not
/// recognized.
///
/// # Example
///
/// ```rust
/// use fortuna::config::SourceConfig;
/// use fortuna::source::create_source;
///
/// let config = SourceConfig {
///     kind: "local".to_string(),
///     ..SourceConfig::default()
/// };
/// let source = create_source(&config).unwrap();
/// assert_eq!(source.source_name(), "local");
/// ```
pub fn create_source(
    config: &SourceConfig,
) -> crate::error::Result<Arc<dyn PredictionSource>> {
    match config.kind.as_str() {
        "gemini" => {
            let source = GeminiSource::new(&config.model)
                .with_api_key_env(&config.api_key_env)
                .with_timeout(config.timeout_secs);
            Ok(Arc::new(source))
        }
        "local" => {
            let source = LocalSource::new().with_delay_ms(config.delay_ms);
            Ok(Arc::new(source))
        }
        other => Err(FortunaError::UnknownSource {
            kind: other.to_string(),
        }),
    }
}

/// Mock prediction source for testing.
///
/// Provides controllable behavior for unit tests without network access.
/// Thread-safe for use in async contexts.
///
/// # Example
///
/// ```rust,ignore
/// let source = MockPredictionSource::new()
///     .with_result("Great things ahead", Theme::Success);
///
/// let prediction = source.fetch_prediction().await?;
/// assert_eq!(source.call_count(), 1);
/// ```
#[derive(Debug)]
pub struct MockPredictionSource {
    /// Result to return from `fetch_prediction`.
    result: PredictionResult,
    /// Error to return (if set).
    error: Option<String>,
    /// Artificial delay before resolving, in milliseconds.
    delay_ms: u64,
    /// Count of fetch calls.
    call_count: AtomicU32,
    /// Number of calls to fail before succeeding.
    fail_count: AtomicU32,
}

impl Default for MockPredictionSource {
    fn default() -> Self {
        Self {
            result: PredictionResult {
                text: "Mock fortune smiles upon you.".to_string(),
                theme: Theme::Success,
            },
            error: None,
            delay_ms: 0,
            call_count: AtomicU32::new(0),
            fail_count: AtomicU32::new(0),
        }
    }
}

impl MockPredictionSource {
    /// Create a new mock source with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the result to return.
    #[must_use]
    pub fn with_result(mut self, text: &str, theme: Theme) -> Self {
        self.result = PredictionResult {
            text: text.to_string(),
            theme,
        };
        self
    }

    /// Configure the mock to always return an error.
    #[must_use]
    pub fn with_error(mut self, error: &str) -> Self {
        self.error = Some(error.to_string());
        self
    }

    /// Configure the mock to fail the first N calls, then succeed.
    #[must_use]
    pub fn with_fail_count(mut self, count: u32) -> Self {
        self.fail_count = AtomicU32::new(count);
        self
    }

    /// Add an artificial delay before resolving.
    #[must_use]
    pub fn with_delay_ms(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    /// Get the number of times `fetch_prediction` was called.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PredictionSource for MockPredictionSource {
    async fn fetch_prediction(&self) -> Result<PredictionResult> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        if self.delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
        }

        if self.fail_count.load(Ordering::SeqCst) > 0 {
            self.fail_count.fetch_sub(1, Ordering::SeqCst);
            anyhow::bail!("Mock failure")
        }

        if let Some(ref error) = self.error {
            anyhow::bail!("{}", error)
        }

        Ok(self.result.clone())
    }

    fn source_name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceConfig;

    // =========================================================================
    // Factory Tests
    // =========================================================================

    #[test]
    fn test_create_source_local() {
        let config = SourceConfig {
            kind: "local".to_string(),
            ..SourceConfig::default()
        };
        let source = create_source(&config).unwrap();
        assert_eq!(source.source_name(), "local");
    }

    #[test]
    fn test_create_source_gemini() {
        let config = SourceConfig::default();
        let source = create_source(&config).unwrap();
        assert_eq!(source.source_name(), "gemini");
    }

    #[test]
    fn test_create_source_unknown_kind() {
        let config = SourceConfig {
            kind: "tarot".to_string(),
            ..SourceConfig::default()
        };
        let err = create_source(&config).unwrap_err();
        assert!(matches!(err, FortunaError::UnknownSource { .. }));
        assert!(err.to_string().contains("tarot"));
    }

    // =========================================================================
    // PredictionSource Trait Tests
    // =========================================================================

    /// The trait must be object-safe for dynamic dispatch.
    #[tokio::test]
    async fn test_prediction_source_is_object_safe() {
        let source: Arc<dyn PredictionSource> =
            Arc::new(MockPredictionSource::new().with_result("Boxed luck", Theme::Wealth));

        let result = source.fetch_prediction().await.unwrap();
        assert_eq!(result.text, "Boxed luck");
        assert_eq!(result.theme, Theme::Wealth);
        assert_eq!(source.source_name(), "mock");
    }

    #[test]
    fn test_prediction_source_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MockPredictionSource>();
        assert_send_sync::<GeminiSource>();
        assert_send_sync::<LocalSource>();
    }

    // =========================================================================
    // MockPredictionSource Tests
    // =========================================================================

    #[tokio::test]
    async fn test_mock_source_call_count() {
        let source = MockPredictionSource::new();
        assert_eq!(source.call_count(), 0);

        source.fetch_prediction().await.unwrap();
        source.fetch_prediction().await.unwrap();
        assert_eq!(source.call_count(), 2);
    }

    #[tokio::test]
    async fn test_mock_source_error() {
        let source = MockPredictionSource::new().with_error("backend offline");

        let err = source.fetch_prediction().await.unwrap_err();
        assert!(err.to_string().contains("backend offline"));
    }

    #[tokio::test]
    async fn test_mock_source_fail_count_then_succeed() {
        let source = MockPredictionSource::new().with_fail_count(2);

        assert!(source.fetch_prediction().await.is_err());
        assert!(source.fetch_prediction().await.is_err());
        assert!(source.fetch_prediction().await.is_ok());
        assert_eq!(source.call_count(), 3);
    }
}
