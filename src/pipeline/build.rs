//! Render configuration: map a [`Recommendation`] onto the exact parameters
//! the browser needs.
//!
//! [`RenderRequest::build`] is a pure function. Everything that is not
//! advice-driven (scale factor, network-idle policy, navigation bound,
//! background printing) is a constant here so two equal recommendations
//! always produce equal requests.

use crate::recommendation::{Orientation, PageFormat, Recommendation};
use serde::Serialize;

/// Upper bound on navigation, independent of the settle delay.
pub const NAVIGATION_TIMEOUT_MS: u64 = 30_000;

/// Device pixel ratio used for every capture.
pub const DEVICE_SCALE_FACTOR: f64 = 2.0;

/// Network counts as idle with at most this many requests in flight...
pub const NETWORK_IDLE_MAX_INFLIGHT: usize = 2;

/// ...for at least this long.
pub const NETWORK_IDLE_WINDOW_MS: u64 = 500;

const LONG_EDGE_PX: u32 = 1920;
const SHORT_EDGE_PX: u32 = 1080;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub device_scale_factor: f64,
}

/// When navigation is considered complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum WaitUntil {
    /// No more than `max_inflight` requests for `idle_window_ms`.
    NetworkIdle { max_inflight: usize, idle_window_ms: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationPolicy {
    pub wait_until: WaitUntil,
    pub timeout_ms: u64,
}

/// CSS lengths for each side of the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Margins {
    pub top: String,
    pub right: String,
    pub bottom: String,
    pub left: String,
}

impl Margins {
    pub fn uniform(length: &str) -> Self {
        Self {
            top: length.to_string(),
            right: length.to_string(),
            bottom: length.to_string(),
            left: length.to_string(),
        }
    }
}

/// PDF emission options.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfOptions {
    pub format: PageFormat,
    pub landscape: bool,
    pub margin: Margins,
    pub print_background: bool,
    /// Always false: the explicit format wins over CSS `@page size`.
    pub prefer_css_page_size: bool,
}

/// Everything the render capability needs for one capture.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    pub url: String,
    pub viewport: Viewport,
    pub navigation: NavigationPolicy,
    /// Fixed delay after navigation settles, before printing.
    pub settle_delay_ms: u64,
    pub pdf: PdfOptions,
}

impl RenderRequest {
    /// Derive the render parameters for `url` from a merged recommendation.
    pub fn build(url: &str, rec: &Recommendation) -> Self {
        let landscape = rec.page_config.orientation == Orientation::Landscape;
        let (width, height) = if landscape {
            (LONG_EDGE_PX, SHORT_EDGE_PX)
        } else {
            (SHORT_EDGE_PX, LONG_EDGE_PX)
        };

        Self {
            url: url.to_string(),
            viewport: Viewport {
                width,
                height,
                device_scale_factor: DEVICE_SCALE_FACTOR,
            },
            navigation: NavigationPolicy {
                wait_until: WaitUntil::NetworkIdle {
                    max_inflight: NETWORK_IDLE_MAX_INFLIGHT,
                    idle_window_ms: NETWORK_IDLE_WINDOW_MS,
                },
                timeout_ms: NAVIGATION_TIMEOUT_MS,
            },
            settle_delay_ms: rec.capture_strategy.wait_time_ms,
            pdf: PdfOptions {
                format: rec.page_config.format,
                landscape,
                margin: Margins::uniform(&rec.page_config.margin),
                print_background: true,
                prefer_css_page_size: false,
            },
        }
    }
}

/// Convert a CSS length (`1cm`, `10mm`, `0.5in`, `12pt`, `40px`, `40`) to
/// inches. Bare numbers are pixels at 96 per inch.
pub fn parse_length_inches(length: &str) -> Option<f64> {
    let s = length.trim().to_ascii_lowercase();
    let split = s
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(s.len());
    let (number, unit) = s.split_at(split);
    let value: f64 = number.parse().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }

    let inches = match unit.trim() {
        "" | "px" => value / 96.0,
        "in" => value,
        "cm" => value / 2.54,
        "mm" => value / 25.4,
        "pt" => value / 72.0,
        _ => return None,
    };
    Some(inches)
}
