//! Configuration loading and validation.
//!
//! Settings live in a `fortuna.json` file next to the binary's working
//! directory. Every field has a serde default, so an empty object (or a
//! missing file) yields a working configuration pointing at the Gemini
//! source. Only the *name* of the credential's environment variable is
//! configuration; the credential itself never touches disk.
//!
//! # Example fortuna.json
//!
//! ```json
//! {
//!   "source": {
//!     "kind": "local",
//!     "delay_ms": 2000
//!   },
//!   "stats": {
//!     "endpoint": "https://newyearmagic.site/api/click"
//!   }
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{FortunaError, Result};
use crate::source::gemini::GeminiSource;
use crate::source::local::LocalSource;
use crate::stats::StatsClient;

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "fortuna.json";

fn default_kind() -> String {
    "gemini".to_string()
}

fn default_model() -> String {
    GeminiSource::DEFAULT_MODEL.to_string()
}

fn default_api_key_env() -> String {
    GeminiSource::DEFAULT_API_KEY_ENV.to_string()
}

fn default_source_timeout() -> u64 {
    GeminiSource::DEFAULT_TIMEOUT_SECS
}

fn default_delay_ms() -> u64 {
    LocalSource::DEFAULT_DELAY_MS
}

fn default_stats_endpoint() -> String {
    StatsClient::DEFAULT_ENDPOINT.to_string()
}

fn default_stats_timeout() -> u64 {
    StatsClient::DEFAULT_TIMEOUT_SECS
}

/// Which prediction source to wire in, and its options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Source kind: "gemini" or "local".
    #[serde(default = "default_kind")]
    pub kind: String,

    /// Model identifier for the generative variant.
    #[serde(default = "default_model")]
    pub model: String,

    /// Environment variable holding the API key (generative variant).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Network timeout in seconds (generative variant).
    #[serde(default = "default_source_timeout")]
    pub timeout_secs: u64,

    /// Artificial resolution delay in milliseconds (local variant).
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: default_kind(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_source_timeout(),
            delay_ms: default_delay_ms(),
        }
    }
}

/// Remote counter settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsConfig {
    /// Counter endpoint URL.
    #[serde(default = "default_stats_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds.
    #[serde(default = "default_stats_timeout")]
    pub timeout_secs: u64,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            endpoint: default_stats_endpoint(),
            timeout_secs: default_stats_timeout(),
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FortunaConfig {
    /// Prediction source selection and options.
    #[serde(default)]
    pub source: SourceConfig,

    /// Remote counter settings.
    #[serde(default)]
    pub stats: StatsConfig,
}

impl FortunaConfig {
    /// Load configuration from the given file.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the file cannot be read or does
    /// not parse; validation errors when values are out of range.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            FortunaError::config_with_path(
                format!("failed to read: {}", e),
                path.to_path_buf(),
            )
        })?;

        let config: Self = serde_json::from_str(&raw).map_err(|e| {
            FortunaError::config_with_path(
                format!("failed to parse: {}", e),
                path.to_path_buf(),
            )
        })?;

        config.validate()?;
        debug!(path = %path.display(), kind = %config.source.kind, "configuration loaded");
        Ok(config)
    }

    /// Load from `fortuna.json` in the given directory, falling back to
    /// defaults when the file is absent.
    pub fn load_or_default(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE_NAME);
        if path.exists() {
            Self::load(&path)
        } else {
            debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Write a starter configuration file with all defaults spelled out.
    ///
    /// # Errors
    ///
    /// Fails when the file already exists or cannot be written.
    pub fn write_starter(dir: &Path) -> Result<PathBuf> {
        let path = dir.join(CONFIG_FILE_NAME);
        if path.exists() {
            return Err(FortunaError::config_with_path(
                "config file already exists",
                path,
            ));
        }

        let body = serde_json::to_string_pretty(&Self::default())?;
        std::fs::write(&path, body)?;
        Ok(path)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`FortunaError::InvalidConfig`] naming the offending field.
    pub fn validate(&self) -> Result<()> {
        let valid_kinds = ["gemini", "local"];
        if !valid_kinds.contains(&self.source.kind.as_str()) {
            return Err(FortunaError::InvalidConfig {
                field: "source.kind".to_string(),
                reason: format!(
                    "'{}' is not recognized. Valid options: {}",
                    self.source.kind,
                    valid_kinds.join(", ")
                ),
            });
        }

        if self.source.model.trim().is_empty() {
            return Err(FortunaError::InvalidConfig {
                field: "source.model".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        if self.source.api_key_env.trim().is_empty() {
            return Err(FortunaError::InvalidConfig {
                field: "source.api_key_env".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        if self.source.timeout_secs == 0 {
            return Err(FortunaError::InvalidConfig {
                field: "source.timeout_secs".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        if self.stats.endpoint.trim().is_empty() {
            return Err(FortunaError::InvalidConfig {
                field: "stats.endpoint".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        if self.stats.timeout_secs == 0 {
            return Err(FortunaError::InvalidConfig {
                field: "stats.timeout_secs".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(())
    }
}
