//! Global prediction counter client.
//!
//! Talks to a remote counter service: a `GET` returning `{ "count": <int> }`
//! and a fire-and-forget `POST` that bumps the counter. Every failure here
//! is absorbed locally; nothing a counter does may disturb the prediction
//! session. No retry, no backoff, no caching beyond "refetch on each
//! inspection".

use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

/// The global counter reading: a non-negative total, or unknown when the
/// remote read failed.
pub type StatsCount = Option<u64>;

/// Body of the counter `GET` response.
#[derive(Debug, Deserialize)]
struct CountBody {
    count: u64,
}

/// Client for the remote prediction counter.
///
/// # Example
///
/// ```rust,ignore
/// let stats = StatsClient::new("https://newyearmagic.site/api/click");
///
/// match stats.read_total().await {
///     Some(total) => println!("{} predictions served", total),
///     None => println!("counter unknown"),
/// }
///
/// stats.increment().await; // fire-and-forget
/// ```
#[derive(Debug, Clone)]
pub struct StatsClient {
    /// Counter endpoint, shared by the read and the increment.
    endpoint: String,
    /// Request timeout in seconds. Kept short; the counter is cosmetic.
    timeout_secs: u64,
    /// Shared HTTP client.
    client: reqwest::Client,
}

impl StatsClient {
    /// Default counter endpoint.
    pub const DEFAULT_ENDPOINT: &'static str = "https://newyearmagic.site/api/click";

    /// Default request timeout.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

    /// Create a client for the given counter endpoint.
    #[must_use]
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            timeout_secs: Self::DEFAULT_TIMEOUT_SECS,
            client: reqwest::Client::new(),
        }
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Get the configured endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Read the global total.
    ///
    /// Resolves to `None` on any transport, status or parse failure. Never
    /// returns an error and never panics; failures are logged and treated
    /// as "unknown".
    pub async fn read_total(&self) -> StatsCount {
        let response = match self
            .client
            .get(&self.endpoint)
            .timeout(Duration::from_secs(self.timeout_secs))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(endpoint = %self.endpoint, error = %e, "failed to fetch stats");
                return None;
            }
        };

        if !response.status().is_success() {
            warn!(
                endpoint = %self.endpoint,
                status = %response.status(),
                "stats read returned non-success status"
            );
            return None;
        }

        match response.json::<CountBody>().await {
            Ok(body) => {
                debug!(count = body.count, "fetched global prediction count");
                Some(body.count)
            }
            Err(e) => {
                warn!(endpoint = %self.endpoint, error = %e, "stats body did not parse");
                None
            }
        }
    }

    /// Increment the global counter.
    ///
    /// Fire-and-forget: no body is sent, the response is not parsed, and
    /// failures are logged and otherwise ignored. Nothing awaits this
    /// call's success.
    pub async fn increment(&self) {
        match self
            .client
            .post(&self.endpoint)
            .timeout(Duration::from_secs(self.timeout_secs))
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => {
                debug!("incremented global prediction count");
            }
            Ok(response) => {
                warn!(
                    endpoint = %self.endpoint,
                    status = %response.status(),
                    "stats increment returned non-success status"
                );
            }
            Err(e) => {
                warn!(endpoint = %self.endpoint, error = %e, "failed to increment stats");
            }
        }
    }
}

impl Default for StatsClient {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ENDPOINT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_client() -> StatsClient {
        // Port 9 (discard) refuses connections on loopback.
        StatsClient::new("http://127.0.0.1:9/api/click").with_timeout(2)
    }

    #[test]
    fn test_default_endpoint() {
        let client = StatsClient::default();
        assert_eq!(client.endpoint(), StatsClient::DEFAULT_ENDPOINT);
        assert_eq!(client.timeout_secs, StatsClient::DEFAULT_TIMEOUT_SECS);
    }

    /// A read against an unreachable endpoint resolves to unknown without
    /// raising.
    #[tokio::test]
    async fn test_read_total_unreachable_resolves_unknown() {
        let client = unreachable_client();
        assert_eq!(client.read_total().await, None);
    }

    /// Increment against an unreachable endpoint completes without
    /// propagating any error.
    #[tokio::test]
    async fn test_increment_unreachable_is_absorbed() {
        let client = unreachable_client();
        client.increment().await;
    }

    #[test]
    fn test_count_body_parses() {
        let body: CountBody = serde_json::from_str(r#"{"count": 1234}"#).unwrap();
        assert_eq!(body.count, 1234);
    }

    #[test]
    fn test_count_body_rejects_negative() {
        let result: std::result::Result<CountBody, _> =
            serde_json::from_str(r#"{"count": -5}"#);
        assert!(result.is_err());
    }
}
