//! Prediction data model.
//!
//! A prediction is a short humorous text tagged with a [`Theme`]. The theme
//! is a closed classification used only to pick a display icon; it has no
//! behavioral effect beyond that lookup.

use serde::{Deserialize, Serialize};

/// Theme classification for a prediction.
///
/// The first five variants form the closed set the generative backend is
/// constrained to via its response schema. [`Theme::SlotMachine`] is a
/// decorative extra tag that only the pre-authored local list may carry.
///
/// # Example
///
/// ```rust
/// use fortuna::prediction::Theme;
///
/// assert_eq!(Theme::parse("wealth"), Some(Theme::Wealth));
/// assert_eq!(Theme::Wealth.as_str(), "wealth");
/// assert_eq!(Theme::parse("unknown_theme"), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    /// Career wins and triumphs
    Success,
    /// Money and material fortune
    Wealth,
    /// Journeys and new horizons
    Travel,
    /// Romance and warm company
    Love,
    /// Insight and clear thinking
    Wisdom,
    /// Pure luck of the draw (local list only)
    SlotMachine,
}

impl Theme {
    /// The themes the generative response schema allows.
    pub const SCHEMA_THEMES: &'static [&'static str] =
        &["success", "wealth", "travel", "love", "wisdom"];

    /// Get the canonical snake_case name of this theme.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Wealth => "wealth",
            Self::Travel => "travel",
            Self::Love => "love",
            Self::Wisdom => "wisdom",
            Self::SlotMachine => "slot_machine",
        }
    }

    /// Get the display icon for this theme. Pure presentation lookup.
    #[must_use]
    pub const fn icon(&self) -> &'static str {
        match self {
            Self::Success => "🏆",
            Self::Wealth => "💰",
            Self::Travel => "✈️",
            Self::Love => "❤️",
            Self::Wisdom => "🧠",
            Self::SlotMachine => "🎰",
        }
    }

    /// Parse a theme name, returning `None` for anything outside the set.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "success" => Some(Self::Success),
            "wealth" => Some(Self::Wealth),
            "travel" => Some(Self::Travel),
            "love" => Some(Self::Love),
            "wisdom" => Some(Self::Wisdom),
            "slot_machine" => Some(Self::SlotMachine),
            _ => None,
        }
    }

    /// Check whether this theme is allowed in a generative response.
    #[must_use]
    pub fn in_schema(&self) -> bool {
        Self::SCHEMA_THEMES.contains(&self.as_str())
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One prediction, constructed fresh by a source on each successful request.
///
/// Immutable once built; the session controller discards it when the
/// session resets to idle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// The prediction body. Always non-empty.
    pub text: String,
    /// Theme tag used to select a display icon.
    pub theme: Theme,
}

impl PredictionResult {
    /// Build a prediction, rejecting empty or whitespace-only text.
    pub fn new(text: impl Into<String>, theme: Theme) -> Option<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return None;
        }
        Some(Self { text, theme })
    }
}
