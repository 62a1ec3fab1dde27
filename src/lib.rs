//! Fortuna - festive prediction oracle.
//!
//! A small session core for serving short humorous predictions from
//! interchangeable sources, plus a global counter of predictions served.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`config`] - Configuration loading and validation
//! - [`error`] - Custom error types and handling
//! - [`prediction`] - Prediction data model (text + theme)
//! - [`session`] - The request lifecycle state machine
//! - [`source`] - Prediction source trait and its two variants
//! - [`stats`] - Remote prediction counter client
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use fortuna::session::{Phase, SessionController};
//! use fortuna::source::LocalSource;
//!
//! let controller = SessionController::new(Arc::new(LocalSource::new()));
//! controller.request_prediction().await;
//!
//! if let Phase::Fulfilled(result) = controller.phase() {
//!     println!("{} {}", result.theme.icon(), result.text);
//! }
//! ```

pub mod config;
pub mod error;
pub mod prediction;
pub mod session;
pub mod source;
pub mod stats;

// Re-export commonly used types
pub use error::{FortunaError, Result};

pub use config::{FortunaConfig, SourceConfig, StatsConfig};
pub use prediction::{PredictionResult, Theme};
pub use session::{Phase, RequestOutcome, SessionController};
pub use source::{
    create_source, GeminiSource, LocalSource, MockPredictionSource, PredictionSource,
};
pub use stats::{StatsClient, StatsCount};
