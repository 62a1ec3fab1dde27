//! Local prediction source.
//!
//! Serves a uniformly random entry from a fixed, pre-authored list. No
//! network, never fails. An artificial delay (about two seconds by default)
//! lets the loading animation play before the result lands.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use rand::Rng;
use tracing::debug;

use crate::prediction::{PredictionResult, Theme};
use crate::source::PredictionSource;

/// The pre-authored prediction list shipped with the application.
///
/// Read-only and safely shared; every entry has non-empty text and a theme
/// from the closed set (plus the decorative slot-machine tag).
const BUILTIN_PREDICTIONS: &[(&str, Theme)] = &[
    (
        "This year the printer jams for someone else. Your documents glide \
         through like skaters on fresh ice, and so will your plans.",
        Theme::Success,
    ),
    (
        "A forgotten gift card resurfaces exactly when you need it. Small \
         treasures find their way back to patient pockets.",
        Theme::Wealth,
    ),
    (
        "Pack light and say yes. A trip you have postponed three times \
         finally happens, and it is better late than imagined.",
        Theme::Travel,
    ),
    (
        "Someone saves you the last slice at the office party. Cherish \
         them; the stars say this is the beginning of something warm.",
        Theme::Love,
    ),
    (
        "You will finally read the manual before pressing the button. The \
         universe rewards this rare wisdom generously.",
        Theme::Wisdom,
    ),
    (
        "Your boldest idea of the year arrives in the shower on a Tuesday. \
         Write it down before the towel. Glory follows.",
        Theme::Success,
    ),
    (
        "An expense report is approved on the first try. Treat this omen \
         with the reverence it deserves.",
        Theme::Wealth,
    ),
    (
        "A window seat, a clear sky, and nobody reclining into your knees. \
         The travel spirits owe you one, and this year they pay up.",
        Theme::Travel,
    ),
    (
        "Your plants, your pets, and your group chats all thrive under \
         your care. Love multiplies where you water it.",
        Theme::Love,
    ),
    (
        "You will mute the right meeting at the right moment. This is not \
         luck; this is enlightenment.",
        Theme::Wisdom,
    ),
    (
        "Three cherries line up for you this year: good timing, good \
         company, and good coffee. Jackpot.",
        Theme::SlotMachine,
    ),
    (
        "Spin the year like a big shiny wheel. Wherever it stops, snacks \
         are involved.",
        Theme::SlotMachine,
    ),
];

/// Prediction source backed by the built-in list.
///
/// # Example
///
/// ```rust,ignore
/// let source = LocalSource::new().with_delay_ms(0);
/// let prediction = source.fetch_prediction().await?;
/// ```
#[derive(Debug, Clone)]
pub struct LocalSource {
    /// Artificial resolution delay in milliseconds.
    delay_ms: u64,
}

impl LocalSource {
    /// Default artificial delay so the loading animation has time to play.
    pub const DEFAULT_DELAY_MS: u64 = 2000;

    /// Create a local source with the default delay.
    #[must_use]
    pub fn new() -> Self {
        Self {
            delay_ms: Self::DEFAULT_DELAY_MS,
        }
    }

    /// Set the artificial delay. Zero disables it.
    #[must_use]
    pub fn with_delay_ms(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    /// Number of entries in the built-in list.
    #[must_use]
    pub fn len(&self) -> usize {
        BUILTIN_PREDICTIONS.len()
    }

    /// The list is never empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        BUILTIN_PREDICTIONS.is_empty()
    }

    fn pick(&self) -> PredictionResult {
        let index = rand::thread_rng().gen_range(0..BUILTIN_PREDICTIONS.len());
        let (text, theme) = BUILTIN_PREDICTIONS[index];
        PredictionResult {
            text: text.to_string(),
            theme,
        }
    }
}

impl Default for LocalSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PredictionSource for LocalSource {
    async fn fetch_prediction(&self) -> Result<PredictionResult> {
        if self.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        }

        let result = self.pick();
        debug!(theme = %result.theme, "picked local prediction");
        Ok(result)
    }

    fn source_name(&self) -> &str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn instant_source() -> LocalSource {
        LocalSource::new().with_delay_ms(0)
    }

    #[test]
    fn test_builtin_list_entries_are_valid() {
        assert!(BUILTIN_PREDICTIONS.len() >= 10);
        for (text, _theme) in BUILTIN_PREDICTIONS {
            assert!(!text.trim().is_empty());
        }
    }

    #[test]
    fn test_default_delay_is_two_seconds() {
        assert_eq!(LocalSource::new().delay_ms, LocalSource::DEFAULT_DELAY_MS);
        assert_eq!(LocalSource::DEFAULT_DELAY_MS, 2000);
    }

    /// Every returned value comes from the fixed list, never outside it.
    #[tokio::test]
    async fn test_results_come_from_the_list() {
        let source = instant_source();
        let texts: HashSet<&str> = BUILTIN_PREDICTIONS.iter().map(|(t, _)| *t).collect();

        for _ in 0..50 {
            let result = source.fetch_prediction().await.unwrap();
            assert!(texts.contains(result.text.as_str()));
        }
    }

    /// Over enough draws every entry shows up (no starvation).
    #[tokio::test]
    async fn test_every_entry_is_eventually_returned() {
        let source = instant_source();
        let mut seen: HashSet<String> = HashSet::new();

        // With a uniform pick over 12 entries, 1000 draws miss an entry
        // with vanishing probability.
        for _ in 0..1000 {
            let result = source.fetch_prediction().await.unwrap();
            seen.insert(result.text);
            if seen.len() == BUILTIN_PREDICTIONS.len() {
                break;
            }
        }

        assert_eq!(seen.len(), BUILTIN_PREDICTIONS.len());
    }

    /// The local variant never fails.
    #[tokio::test]
    async fn test_local_source_never_fails() {
        let source = instant_source();
        for _ in 0..20 {
            assert!(source.fetch_prediction().await.is_ok());
        }
    }

    #[tokio::test]
    async fn test_delay_is_honored() {
        let source = LocalSource::new().with_delay_ms(50);
        let start = std::time::Instant::now();
        source.fetch_prediction().await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_source_name() {
        assert_eq!(instant_source().source_name(), "local");
    }
}
