//! Rendering recommendation types.
//!
//! A [`Recommendation`] is the fully-populated page/capture configuration
//! that drives one render. It is built fresh per request: hints are
//! extracted from advice text into a [`RecommendationHints`] (every field
//! optional), then [`crate::pipeline::merge::merge`] fills the gaps from
//! [`Recommendation::default()`].
//!
//! Field names serialise in camelCase with the short capture keys
//! (`waitTime`, `javascript`, `images`) because that is the shape the
//! advice prompt asks for and the shape returned to API callers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Margin applied on all four sides when nothing better is known.
pub const DEFAULT_MARGIN: &str = "1cm";

/// Post-navigation settle delay used by the default recommendation.
pub const DEFAULT_WAIT_MS: u64 = 2000;

/// Lower bound on the post-navigation settle delay.
pub const MIN_WAIT_MS: u64 = 1000;

/// Upper bound on the post-navigation settle delay, reached when the advice
/// reports dynamic content.
pub const MAX_WAIT_MS: u64 = 5000;

/// Optimisation tags every recommendation starts with.
pub const DEFAULT_OPTIMIZATIONS: [&str; 3] = [
    "compress-images",
    "optimize-fonts",
    "remove-unnecessary-elements",
];

// ── Enums ────────────────────────────────────────────────────────────────

/// Paper size of the emitted PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PageFormat {
    Letter,
    Legal,
    Tabloid,
    Ledger,
    A0,
    A1,
    A2,
    A3,
    #[default]
    A4,
    A5,
    A6,
}

impl PageFormat {
    /// Portrait `(width, height)` in inches.
    pub fn dimensions_in(self) -> (f64, f64) {
        match self {
            PageFormat::Letter => (8.5, 11.0),
            PageFormat::Legal => (8.5, 14.0),
            PageFormat::Tabloid => (11.0, 17.0),
            PageFormat::Ledger => (17.0, 11.0),
            PageFormat::A0 => (33.1, 46.8),
            PageFormat::A1 => (23.4, 33.1),
            PageFormat::A2 => (16.54, 23.4),
            PageFormat::A3 => (11.7, 16.54),
            PageFormat::A4 => (8.27, 11.7),
            PageFormat::A5 => (5.83, 8.27),
            PageFormat::A6 => (4.13, 5.83),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PageFormat::Letter => "Letter",
            PageFormat::Legal => "Legal",
            PageFormat::Tabloid => "Tabloid",
            PageFormat::Ledger => "Ledger",
            PageFormat::A0 => "A0",
            PageFormat::A1 => "A1",
            PageFormat::A2 => "A2",
            PageFormat::A3 => "A3",
            PageFormat::A4 => "A4",
            PageFormat::A5 => "A5",
            PageFormat::A6 => "A6",
        }
    }
}

impl fmt::Display for PageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PageFormat {
    type Err = String;

    /// Case-insensitive; accepts `us-letter` style aliases.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalised = s.trim().to_ascii_lowercase();
        let format = match normalised.as_str() {
            "letter" | "us-letter" | "us letter" => PageFormat::Letter,
            "legal" | "us-legal" => PageFormat::Legal,
            "tabloid" => PageFormat::Tabloid,
            "ledger" => PageFormat::Ledger,
            "a0" => PageFormat::A0,
            "a1" => PageFormat::A1,
            "a2" => PageFormat::A2,
            "a3" => PageFormat::A3,
            "a4" => PageFormat::A4,
            "a5" => PageFormat::A5,
            "a6" => PageFormat::A6,
            _ => return Err(format!("unknown page format '{}'", s.trim())),
        };
        Ok(format)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl FromStr for Orientation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "portrait" | "vertical" => Ok(Orientation::Portrait),
            "landscape" | "horizontal" => Ok(Orientation::Landscape),
            other => Err(format!("unknown orientation '{other}'")),
        }
    }
}

// ── Complete configuration ───────────────────────────────────────────────

/// Page geometry of the emitted PDF.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageConfig {
    pub format: PageFormat,
    pub orientation: Orientation,
    /// CSS length applied to all four margins, e.g. `1cm`.
    pub margin: String,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            format: PageFormat::A4,
            orientation: Orientation::Portrait,
            margin: DEFAULT_MARGIN.to_string(),
        }
    }
}

/// How the page is captured once navigation has settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureStrategy {
    /// Extra delay after navigation, before printing. Within
    /// [`MIN_WAIT_MS`]..=[`MAX_WAIT_MS`] once merged.
    #[serde(rename = "waitTime")]
    pub wait_time_ms: u64,
    #[serde(rename = "javascript")]
    pub javascript_enabled: bool,
    #[serde(rename = "images")]
    pub images_enabled: bool,
    pub full_page: bool,
}

impl Default for CaptureStrategy {
    fn default() -> Self {
        Self {
            wait_time_ms: DEFAULT_WAIT_MS,
            javascript_enabled: true,
            images_enabled: true,
            full_page: true,
        }
    }
}

/// Fully-populated rendering recommendation.
///
/// Consumed once by [`crate::pipeline::build::RenderRequest::build`]; never
/// mutated after that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub page_config: PageConfig,
    pub capture_strategy: CaptureStrategy,
    /// Optimisation tags, in the order they were added.
    pub optimizations: Vec<String>,
    /// Free-text challenges reported by the advisor. Informational only.
    #[serde(default)]
    pub challenges: Vec<String>,
}

impl Default for Recommendation {
    fn default() -> Self {
        Self {
            page_config: PageConfig::default(),
            capture_strategy: CaptureStrategy::default(),
            optimizations: DEFAULT_OPTIMIZATIONS.iter().map(|s| s.to_string()).collect(),
            challenges: Vec::new(),
        }
    }
}

// ── Partial configuration ────────────────────────────────────────────────

/// Page fields recovered from advice text; `None` means "no opinion".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageHints {
    pub format: Option<PageFormat>,
    pub orientation: Option<Orientation>,
    pub margin: Option<String>,
}

/// Capture fields recovered from advice text; `None` means "no opinion".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureHints {
    pub wait_time_ms: Option<u64>,
    pub javascript_enabled: Option<bool>,
    pub images_enabled: Option<bool>,
    pub full_page: Option<bool>,
}

/// Zero or more recommendation fields extracted from advice.
///
/// An empty value is equivalent to "no hints": merging it yields the
/// default recommendation unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecommendationHints {
    pub page: PageHints,
    pub capture: CaptureHints,
    /// Tags to append after the defaults.
    pub optimizations: Vec<String>,
    pub challenges: Vec<String>,
}

impl RecommendationHints {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply `other` on top of `self`: every field `other` sets wins,
    /// list fields are appended.
    pub fn overlay(&mut self, other: RecommendationHints) {
        let RecommendationHints {
            page,
            capture,
            optimizations,
            challenges,
        } = other;

        if page.format.is_some() {
            self.page.format = page.format;
        }
        if page.orientation.is_some() {
            self.page.orientation = page.orientation;
        }
        if page.margin.is_some() {
            self.page.margin = page.margin;
        }

        if capture.wait_time_ms.is_some() {
            self.capture.wait_time_ms = capture.wait_time_ms;
        }
        if capture.javascript_enabled.is_some() {
            self.capture.javascript_enabled = capture.javascript_enabled;
        }
        if capture.images_enabled.is_some() {
            self.capture.images_enabled = capture.images_enabled;
        }
        if capture.full_page.is_some() {
            self.capture.full_page = capture.full_page;
        }

        self.optimizations.extend(optimizations);
        self.challenges.extend(challenges);
    }
}
