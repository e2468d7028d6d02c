//! Merge extracted hints onto a complete recommendation.
//!
//! The merge is total: whatever the advisor said, the result has every
//! field set, a margin that parses and leaves a printable area on the
//! chosen paper, and a settle delay inside [`MIN_WAIT_MS`]..=[`MAX_WAIT_MS`].
//! Hints that would break one of those invariants are dropped (margin) or
//! clamped (delay) rather than rejected.

use crate::pipeline::build::parse_length_inches;
use crate::recommendation::{
    PageFormat, Recommendation, RecommendationHints, MAX_WAIT_MS, MIN_WAIT_MS,
};
use tracing::debug;

/// Overlay `hints` on `base`.
///
/// Set fields replace the base value; optimisation tags and challenges are
/// appended after the base ones.
pub fn merge(hints: RecommendationHints, base: Recommendation) -> Recommendation {
    let RecommendationHints {
        page,
        capture,
        optimizations,
        challenges,
    } = hints;
    let mut rec = base;

    if let Some(format) = page.format {
        rec.page_config.format = format;
    }
    if let Some(orientation) = page.orientation {
        rec.page_config.orientation = orientation;
    }
    if let Some(margin) = page.margin {
        if margin_fits(&margin, rec.page_config.format) {
            rec.page_config.margin = margin;
        } else {
            debug!("Ignoring margin hint '{}' for {} paper", margin, rec.page_config.format);
        }
    }

    if let Some(wait) = capture.wait_time_ms {
        rec.capture_strategy.wait_time_ms = wait;
    }
    if let Some(js) = capture.javascript_enabled {
        rec.capture_strategy.javascript_enabled = js;
    }
    if let Some(images) = capture.images_enabled {
        rec.capture_strategy.images_enabled = images;
    }
    if let Some(full_page) = capture.full_page {
        rec.capture_strategy.full_page = full_page;
    }
    rec.capture_strategy.wait_time_ms =
        rec.capture_strategy.wait_time_ms.clamp(MIN_WAIT_MS, MAX_WAIT_MS);

    rec.optimizations.extend(optimizations);
    rec.challenges.extend(challenges);

    rec
}

/// A uniform margin fits when both opposing margins together stay shorter
/// than the paper's short edge.
fn margin_fits(margin: &str, format: PageFormat) -> bool {
    let (width, height) = format.dimensions_in();
    parse_length_inches(margin).is_some_and(|inches| 2.0 * inches < width.min(height))
}
