//! Gemini prediction source.
//!
//! This module provides the generative variant of [`PredictionSource`]: one
//! structured-output call to the Gemini `generateContent` REST endpoint per
//! prediction. It includes:
//!
//! - Structured error types for API failures
//! - A fixed oracle prompt with a JSON response schema constraining the
//!   theme to the closed enumeration
//! - A high sampling temperature so repeated calls vary
//! - API key management from a configurable environment variable
//!
//! # Example
//!
//! ```rust,ignore
//! use fortuna::source::{GeminiSource, PredictionSource};
//!
//! let source = GeminiSource::new("gemini-2.5-flash")
//!     .with_api_key_env("GEMINI_API_KEY");
//!
//! let prediction = source.fetch_prediction().await?;
//! println!("{} {}", prediction.theme.icon(), prediction.text);
//! ```

use std::env;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::error::FortunaError;
use crate::prediction::{PredictionResult, Theme};
use crate::source::PredictionSource;

/// The fixed instruction prompt sent on every request.
///
/// The response shape is enforced separately via the response schema; the
/// prompt only steers tone and length.
const ORACLE_PROMPT: &str = "\
You are a magical New Year oracle. Invent a short, funny, kind and \
inspiring prediction for the coming year, addressed to a random colleague.

The prediction should touch on work, success, rest or personal happiness, \
delivered in the style of a corporate wizard. Use metaphors of the new \
year, the future, the cosmos and office magic. Do not use any names; \
address the reader directly as a colleague.

Tone: friendly, festive, intriguing, with humor.
Length: 2-3 sentences.";

/// Sampling temperature. Deliberately high for variety between calls.
const TEMPERATURE: f32 = 0.9;

// =============================================================================
// Gemini API Errors
// =============================================================================

/// Errors specific to Gemini API interactions.
///
/// These provide structured information about API failures. The session
/// controller collapses all of them into the same failed phase; the
/// distinctions exist for logs and for callers that want them.
#[derive(Error, Debug)]
pub enum GeminiApiError {
    /// API key not found in environment.
    #[error("API key not found in environment variable '{env_var}'")]
    ApiKeyNotFound { env_var: String },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded: {message} (retry after {retry_after_secs}s)")]
    RateLimited {
        message: String,
        retry_after_secs: u64,
    },

    /// Authentication failed - check API key.
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    /// Invalid request - check prompt/schema.
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// Server error - may be transient.
    #[error("Server error: {message}")]
    ServerError { message: String },

    /// Network/connection error.
    #[error("Connection error: {message}")]
    ConnectionError { message: String },

    /// Timeout waiting for response.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// Response arrived but could not be parsed into a prediction.
    #[error("Invalid API response: {message}")]
    InvalidResponse { message: String },
}

impl GeminiApiError {
    /// Check if this error indicates the request could be retried.
    ///
    /// The session controller never retries automatically; this exists for
    /// callers that drive their own retry.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. }
                | Self::ServerError { .. }
                | Self::Timeout { .. }
                | Self::ConnectionError { .. }
        )
    }

    /// Parse an error from HTTP status code and response body.
    pub fn from_response(status_code: u16, body: &str) -> Self {
        match status_code {
            429 => {
                let retry_after = Self::extract_retry_after(body).unwrap_or(60);
                Self::RateLimited {
                    message: body.to_string(),
                    retry_after_secs: retry_after,
                }
            }
            401 | 403 => Self::AuthenticationFailed {
                message: body.to_string(),
            },
            400 => Self::InvalidRequest {
                message: body.to_string(),
            },
            500..=599 => Self::ServerError {
                message: body.to_string(),
            },
            _ => Self::InvalidResponse {
                message: format!("HTTP {}: {}", status_code, body),
            },
        }
    }

    /// Extract retry-after seconds from an error response body.
    fn extract_retry_after(body: &str) -> Option<u64> {
        // Matches patterns like "retry after 60s" or "retryDelay: 30s"
        let patterns = [r"retry.?(?:after|delay)[:\s]+(\d+)", r"(\d+)\s*seconds?"];

        let lower = body.to_lowercase();
        for pattern in patterns {
            if let Ok(re) = regex::Regex::new(pattern) {
                if let Some(caps) = re.captures(&lower) {
                    if let Some(m) = caps.get(1) {
                        if let Ok(secs) = m.as_str().parse::<u64>() {
                            return Some(secs);
                        }
                    }
                }
            }
        }
        None
    }
}

// =============================================================================
// Gemini API Request/Response Types
// =============================================================================

/// One text part of a content block.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Part {
    text: String,
}

/// Content block in a request or response.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

/// Generation options carried on each request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: serde_json::Value,
    temperature: f32,
}

/// Request body for the `generateContent` endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

/// Candidate in a `generateContent` response.
#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

/// Response from the `generateContent` endpoint.
#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

/// The structured payload the response schema demands.
#[derive(Debug, Deserialize)]
struct PredictionPayload {
    prediction: String,
    theme: String,
}

/// Build the JSON response schema for the structured reply.
///
/// Both fields are required; the theme is constrained to the closed set of
/// five presentation themes.
fn response_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "OBJECT",
        "properties": {
            "prediction": {
                "type": "STRING",
                "description": "The prediction text for the coming year"
            },
            "theme": {
                "type": "STRING",
                "enum": Theme::SCHEMA_THEMES,
                "description": "Main theme of the prediction, used to pick a display icon"
            }
        },
        "required": ["prediction", "theme"]
    })
}

// =============================================================================
// Gemini Source
// =============================================================================

/// Generative prediction source backed by the Gemini API.
///
/// Implements [`PredictionSource`] with one HTTP call per prediction. The
/// call fails if the API key is absent, the transport errors, or the reply
/// does not parse into the expected `{ prediction, theme }` shape.
#[derive(Debug, Clone)]
pub struct GeminiSource {
    /// Model identifier (e.g. "gemini-2.5-flash").
    model: String,
    /// Environment variable name for the API key.
    api_key_env: String,
    /// Request timeout in seconds.
    timeout_secs: u64,
    /// API base URL.
    api_base: String,
    /// Shared HTTP client.
    client: reqwest::Client,
}

impl GeminiSource {
    /// Default model used for predictions.
    pub const DEFAULT_MODEL: &'static str = "gemini-2.5-flash";

    /// Default timeout for requests.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Default API base URL.
    pub const DEFAULT_API_BASE: &'static str =
        "https://generativelanguage.googleapis.com/v1beta";

    /// Default API key environment variable.
    pub const DEFAULT_API_KEY_ENV: &'static str = "GEMINI_API_KEY";

    /// Create a new Gemini source for the given model.
    #[must_use]
    pub fn new(model: &str) -> Self {
        Self {
            model: model.to_string(),
            api_key_env: Self::DEFAULT_API_KEY_ENV.to_string(),
            timeout_secs: Self::DEFAULT_TIMEOUT_SECS,
            api_base: Self::DEFAULT_API_BASE.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Set the environment variable name for the API key.
    #[must_use]
    pub fn with_api_key_env(mut self, env_var: &str) -> Self {
        self.api_key_env = env_var.to_string();
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Set a custom API base URL (for proxies or tests).
    #[must_use]
    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    /// Get the model identifier.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Read the API key from the environment.
    fn api_key(&self) -> Result<String, GeminiApiError> {
        env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| GeminiApiError::ApiKeyNotFound {
                env_var: self.api_key_env.clone(),
            })
    }

    /// Execute one structured-output request.
    async fn execute_request(&self) -> Result<PredictionResult, GeminiApiError> {
        // Fail before any network I/O when the credential is absent.
        let api_key = self.api_key()?;

        let url = format!("{}/models/{}:generateContent", self.api_base, self.model);
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: ORACLE_PROMPT.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: response_schema(),
                temperature: TEMPERATURE,
            },
        };

        debug!(model = %self.model, "sending generateContent request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .timeout(Duration::from_secs(self.timeout_secs))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GeminiApiError::Timeout {
                        timeout_secs: self.timeout_secs,
                    }
                } else {
                    GeminiApiError::ConnectionError {
                        message: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| GeminiApiError::ConnectionError {
                message: format!("Failed to read response body: {}", e),
            })?;

        if !status.is_success() {
            return Err(GeminiApiError::from_response(status.as_u16(), &text));
        }

        Self::parse_reply(&text)
    }

    /// Parse the raw response body into a [`PredictionResult`].
    fn parse_reply(body: &str) -> Result<PredictionResult, GeminiApiError> {
        let response: GenerateContentResponse =
            serde_json::from_str(body).map_err(|e| GeminiApiError::InvalidResponse {
                message: format!("Failed to parse response envelope: {}", e),
            })?;

        let inner = response
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.as_str())
            .ok_or_else(|| GeminiApiError::InvalidResponse {
                message: "No candidates in response".to_string(),
            })?;

        let payload: PredictionPayload =
            serde_json::from_str(inner).map_err(|e| GeminiApiError::InvalidResponse {
                message: format!("Candidate text is not the expected JSON shape: {}", e),
            })?;

        let theme = Theme::parse(&payload.theme)
            .filter(Theme::in_schema)
            .ok_or_else(|| GeminiApiError::InvalidResponse {
                message: format!("Theme '{}' is outside the allowed set", payload.theme),
            })?;

        PredictionResult::new(payload.prediction, theme).ok_or_else(|| {
            GeminiApiError::InvalidResponse {
                message: "Prediction text is empty".to_string(),
            }
        })
    }
}

impl Default for GeminiSource {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MODEL)
    }
}

#[async_trait]
impl PredictionSource for GeminiSource {
    async fn fetch_prediction(&self) -> Result<PredictionResult> {
        self.execute_request().await.map_err(|e| {
            let classified = match &e {
                GeminiApiError::InvalidResponse { message } => {
                    FortunaError::malformed_response(message.clone())
                }
                _ => FortunaError::source_unavailable(e.to_string()),
            };
            anyhow::Error::from(classified)
        })
    }

    fn source_name(&self) -> &str {
        "gemini"
    }
}
