//! Hint extraction: free-text advice → partial recommendation.
//!
//! Advice is natural language that may or may not contain the JSON object
//! the prompt asked for. Extraction is therefore best-effort and total: it
//! never fails, it only finds fewer hints.
//!
//! ## Two passes
//!
//! The same keyword machinery runs with two rule sets ([`HintRules`]):
//!
//! * **Summary**: the lightweight pass whose output is reported back to API
//!   callers as `qInsights`. An embedded object short-circuits it and is
//!   returned verbatim.
//! * **Recommendation**: the pass that drives rendering. Embedded-object
//!   fields are used as a base, then its keyword rules are applied on top
//!   (so "dynamic" always wins a 5 s settle delay), and
//!   [`crate::pipeline::merge::merge`] fills whatever is still unset.

use crate::error::AdviceError;
use crate::pipeline::advice::AdviceSource;
use crate::pipeline::merge::merge;
use crate::prompts::advice_prompt;
use crate::recommendation::{
    CaptureHints, CaptureStrategy, Orientation, PageConfig, PageFormat, PageHints, Recommendation,
    RecommendationHints,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

/// Characters of raw advice kept in the heuristic summary.
pub const SUMMARY_PREVIEW_CHARS: usize = 200;

/// Tag appended when the advice asks for print-grade output.
pub const HIGH_QUALITY_TAG: &str = "high-quality-rendering";

const UNAVAILABLE_RAW: &str = "advice unavailable";
const UNAVAILABLE_SUMMARY: &str = "Using default settings";

/// Keyword rule set applied to advice text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HintRules {
    /// Informational pass reported to callers.
    Summary,
    /// Pass that drives rendering.
    Recommendation,
}

// ── Insights ─────────────────────────────────────────────────────────────

/// What the caller is told about the advice.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum InsightSummary {
    /// The advisor's own JSON object, verbatim.
    Structured(Value),
    /// Keyword-derived page and capture settings plus a text preview.
    Heuristic {
        #[serde(rename = "pageConfig")]
        page_config: PageConfig,
        #[serde(rename = "captureStrategy")]
        capture_strategy: CaptureStrategy,
        summary: String,
    },
    /// Plain note, used when no advice was available.
    Note(String),
}

/// Everything learned from one advice call.
#[derive(Debug, Clone, PartialEq)]
pub struct Insights {
    /// Advice text as returned by the command.
    pub raw: String,
    /// Summary-pass output, reported to callers.
    pub summary: InsightSummary,
    /// Recommendation-pass output, used to render.
    pub recommendations: Recommendation,
}

impl Insights {
    /// Run both extraction passes over advice text.
    pub fn from_advice(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let summary = extract_summary(&raw);
        let recommendations = extract(&raw);
        Self {
            raw,
            summary,
            recommendations,
        }
    }

    /// Insights used when the advice source failed: default recommendation,
    /// no extraction at all.
    pub fn unavailable() -> Self {
        Self {
            raw: UNAVAILABLE_RAW.to_string(),
            summary: InsightSummary::Note(UNAVAILABLE_SUMMARY.to_string()),
            recommendations: Recommendation::default(),
        }
    }
}

/// Ask `advisor` about `url` and extract insights from its answer.
///
/// Never fails: an [`AdviceError`] is logged and replaced by
/// [`Insights::unavailable`].
pub async fn consult(advisor: &dyn AdviceSource, url: &str) -> Insights {
    let prompt = advice_prompt(url);
    match advisor.advise(&prompt).await {
        Ok(raw) => {
            let insights = Insights::from_advice(raw);
            info!(
                "Advice received: format={} orientation={:?} wait={}ms",
                insights.recommendations.page_config.format,
                insights.recommendations.page_config.orientation,
                insights.recommendations.capture_strategy.wait_time_ms
            );
            insights
        }
        Err(AdviceError::Disabled) => {
            debug!("Advice disabled; using default settings");
            Insights::unavailable()
        }
        Err(e) => {
            warn!("Advice unavailable, using default settings: {}", e);
            Insights::unavailable()
        }
    }
}

// ── Passes ───────────────────────────────────────────────────────────────

/// Recommendation pass, merged onto the default recommendation.
pub fn extract(raw: &str) -> Recommendation {
    let hints = extract_hints(raw);
    if hints.is_empty() {
        debug!("Advice carried no usable hints; keeping defaults");
    }
    merge(hints, Recommendation::default())
}

/// Recommendation pass, unmerged: embedded-object fields first, keyword
/// rules on top.
pub fn extract_hints(raw: &str) -> RecommendationHints {
    let mut hints = RecommendationHints::default();
    if let Some(object) = parse_embedded_object(raw) {
        hints.overlay(hints_from_object(&object));
    }
    hints.overlay(keyword_hints(raw, HintRules::Recommendation));
    hints
}

/// Summary pass.
///
/// Returns the embedded object verbatim when one parses; otherwise the
/// keyword-derived page and capture settings with a short preview of the
/// advice text.
pub fn extract_summary(raw: &str) -> InsightSummary {
    if let Some(object) = parse_embedded_object(raw) {
        return InsightSummary::Structured(object);
    }

    let merged = merge(keyword_hints(raw, HintRules::Summary), Recommendation::default());
    let preview: String = raw.chars().take(SUMMARY_PREVIEW_CHARS).collect();
    InsightSummary::Heuristic {
        page_config: merged.page_config,
        capture_strategy: merged.capture_strategy,
        summary: format!("{preview}..."),
    }
}

/// Apply one keyword rule set to lower-cased advice text.
pub fn keyword_hints(raw: &str, rules: HintRules) -> RecommendationHints {
    let text = raw.to_lowercase();
    let has = |needle: &str| text.contains(needle);
    let mut hints = RecommendationHints::default();

    match rules {
        HintRules::Summary => {
            if has("landscape") || has("horizontal") {
                hints.page.orientation = Some(Orientation::Landscape);
            }
            if has("letter") {
                hints.page.format = Some(PageFormat::Letter);
            }
            hints.capture = CaptureHints {
                wait_time_ms: Some(if has("dynamic") { 3000 } else { 1000 }),
                javascript_enabled: Some(!has("disable javascript")),
                images_enabled: Some(!has("no images")),
                full_page: Some(true),
            };
        }
        HintRules::Recommendation => {
            if has("landscape") {
                hints.page.orientation = Some(Orientation::Landscape);
            }
            if has("a3") || has("large") {
                hints.page.format = Some(PageFormat::A3);
            }
            if has("javascript") || has("dynamic") {
                hints.capture.javascript_enabled = Some(true);
                hints.capture.wait_time_ms = Some(5000);
            }
            if has("high quality") || has("print quality") {
                hints.optimizations.push(HIGH_QUALITY_TAG.to_string());
            }
        }
    }

    hints
}

// ── Embedded object ──────────────────────────────────────────────────────

// Greedy: first `{` to last `}`.
static RE_EMBEDDED_OBJECT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{.*\}").unwrap());

/// Locate the outermost `{...}` span in the advice text.
pub fn find_embedded_object(raw: &str) -> Option<&str> {
    RE_EMBEDDED_OBJECT.find(raw).map(|m| m.as_str())
}

/// Locate and parse the embedded JSON object, if any.
pub fn parse_embedded_object(raw: &str) -> Option<Value> {
    let span = find_embedded_object(raw)?;
    match serde_json::from_str::<Value>(span) {
        Ok(value) if value.is_object() => Some(value),
        Ok(_) => None,
        Err(e) => {
            debug!("Embedded object did not parse, using keyword heuristics: {}", e);
            None
        }
    }
}

/// Read recommendation fields from a JSON object, leniently.
///
/// Unknown keys are ignored; values of the wrong type or with unknown
/// enum spellings leave their field unset.
pub fn hints_from_object(value: &Value) -> RecommendationHints {
    let mut hints = RecommendationHints::default();
    let Some(root) = value.as_object() else {
        return hints;
    };

    if let Some(page) =
        field(root, &["pageConfig", "page_config", "page"]).and_then(Value::as_object)
    {
        hints.page = PageHints {
            format: field(page, &["format", "size"])
                .and_then(Value::as_str)
                .and_then(|s| s.parse().ok()),
            orientation: field(page, &["orientation"])
                .and_then(Value::as_str)
                .and_then(|s| s.parse().ok()),
            margin: field(page, &["margin", "margins"]).and_then(margin_from_value),
        };
    }

    if let Some(capture) =
        field(root, &["captureStrategy", "capture_strategy", "capture"]).and_then(Value::as_object)
    {
        hints.capture = CaptureHints {
            wait_time_ms: field(capture, &["waitTime", "waitTimeMs", "wait_time_ms", "wait"])
                .and_then(millis_from_value),
            javascript_enabled: field(capture, &["javascript", "javascriptEnabled"])
                .and_then(Value::as_bool),
            images_enabled: field(capture, &["images", "imagesEnabled"]).and_then(Value::as_bool),
            full_page: field(capture, &["fullPage", "full_page"]).and_then(Value::as_bool),
        };
    }

    hints.optimizations = string_list(field(root, &["optimizations"]));
    hints.challenges = string_list(field(root, &["challenges"]));
    hints
}

fn field<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| object.get(*k))
}

fn margin_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => n.as_f64().map(|px| format!("{px}px")),
        // `{top, right, bottom, left}`: a single margin is applied to all
        // four sides, so take the top.
        Value::Object(sides) => sides.get("top").and_then(margin_from_value),
        _ => None,
    }
}

fn millis_from_value(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64)),
        Value::String(s) => s.trim().trim_end_matches("ms").trim().parse().ok(),
        _ => None,
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landscape_keyword_sets_orientation_in_both_passes() {
        let raw = "Para melhor visualização, recomendo orientação landscape";
        assert_eq!(extract(raw).page_config.orientation, Orientation::Landscape);
        match extract_summary(raw) {
            InsightSummary::Heuristic { page_config, .. } => {
                assert_eq!(page_config.orientation, Orientation::Landscape)
            }
            other => panic!("expected heuristic summary, got {other:?}"),
        }
    }

    #[test]
    fn landscape_is_case_insensitive() {
        for raw in ["LANDSCAPE please", "Use Landscape.", "landscape"] {
            assert_eq!(extract(raw).page_config.orientation, Orientation::Landscape, "{raw}");
        }
    }

    #[test]
    fn dynamic_content_summary_waits_three_seconds() {
        let raw = "Site tem conteúdo dynamic que precisa de JavaScript";
        match extract_summary(raw) {
            InsightSummary::Heuristic {
                capture_strategy, ..
            } => {
                assert_eq!(capture_strategy.wait_time_ms, 3000);
                assert!(capture_strategy.javascript_enabled);
            }
            other => panic!("expected heuristic summary, got {other:?}"),
        }
    }

    #[test]
    fn dynamic_content_recommendation_waits_five_seconds() {
        let rec = extract("Site tem conteúdo dynamic que precisa de JavaScript");
        assert!(rec.capture_strategy.javascript_enabled);
        assert_eq!(rec.capture_strategy.wait_time_ms, 5000);
    }

    #[test]
    fn javascript_and_dynamic_force_five_seconds_even_with_object() {
        let raw = r#"Dynamic page. {"captureStrategy": {"waitTime": 1500, "javascript": false}}"#;
        let rec = extract(raw);
        assert!(rec.capture_strategy.javascript_enabled);
        assert_eq!(rec.capture_strategy.wait_time_ms, 5000);
    }

    #[test]
    fn summary_defaults_without_keywords() {
        match extract_summary("Nothing special about this page") {
            InsightSummary::Heuristic {
                page_config,
                capture_strategy,
                summary,
            } => {
                assert_eq!(page_config, PageConfig::default());
                assert_eq!(capture_strategy.wait_time_ms, 1000);
                assert!(capture_strategy.javascript_enabled);
                assert!(capture_strategy.images_enabled);
                assert!(capture_strategy.full_page);
                assert_eq!(summary, "Nothing special about this page...");
            }
            other => panic!("expected heuristic summary, got {other:?}"),
        }
    }

    #[test]
    fn summary_pass_only_rules() {
        let hints = keyword_hints(
            "US letter, horizontal, disable javascript and no images",
            HintRules::Summary,
        );
        assert_eq!(hints.page.format, Some(PageFormat::Letter));
        assert_eq!(hints.page.orientation, Some(Orientation::Landscape));
        assert_eq!(hints.capture.javascript_enabled, Some(false));
        assert_eq!(hints.capture.images_enabled, Some(false));

        // The recommendation pass ignores those phrasings.
        let rec = keyword_hints("US letter, horizontal", HintRules::Recommendation);
        assert!(rec.is_empty());
    }

    #[test]
    fn large_or_a3_selects_a3() {
        assert_eq!(extract("Use A3 paper").page_config.format, PageFormat::A3);
        assert_eq!(extract("a large table").page_config.format, PageFormat::A3);
        assert_eq!(extract("plain page").page_config.format, PageFormat::A4);
    }

    #[test]
    fn print_quality_appends_tag_after_defaults() {
        let rec = extract("Needs print quality output");
        assert_eq!(
            rec.optimizations,
            vec![
                "compress-images",
                "optimize-fonts",
                "remove-unnecessary-elements",
                HIGH_QUALITY_TAG
            ]
        );
    }

    #[test]
    fn summary_preview_truncates_on_char_boundary() {
        let raw = "é".repeat(300);
        match extract_summary(&raw) {
            InsightSummary::Heuristic { summary, .. } => {
                assert_eq!(summary.chars().count(), SUMMARY_PREVIEW_CHARS + 3);
                assert!(summary.ends_with("..."));
            }
            other => panic!("expected heuristic summary, got {other:?}"),
        }
    }

    #[test]
    fn embedded_object_is_greedy() {
        let raw = "Here you go:\n{\"a\": {\"b\": 1}}\nThanks!";
        assert_eq!(find_embedded_object(raw), Some("{\"a\": {\"b\": 1}}"));
        assert_eq!(find_embedded_object("no braces"), None);
    }

    #[test]
    fn summary_returns_structured_object_verbatim() {
        let raw = r#"Sure! {"pageConfig": {"size": "A3"}, "custom": [1, 2]}"#;
        match extract_summary(raw) {
            InsightSummary::Structured(v) => {
                assert_eq!(v["pageConfig"]["size"], "A3");
                assert_eq!(v["custom"][1], 2);
            }
            other => panic!("expected structured summary, got {other:?}"),
        }
    }

    #[test]
    fn broken_object_falls_back_to_keywords() {
        let raw = "Use {landscape, obviously} for this one";
        assert!(parse_embedded_object(raw).is_none());
        assert!(matches!(extract_summary(raw), InsightSummary::Heuristic { .. }));
        assert_eq!(extract(raw).page_config.orientation, Orientation::Landscape);
    }

    #[test]
    fn structured_fields_with_prompt_aliases() {
        let object: Value = serde_json::from_str(
            r#"{
                "pageConfig": {"size": "letter", "orientation": "Landscape", "margins": {"top": "0.5in"}},
                "captureStrategy": {"waitTime": "2500ms", "javascript": true, "images": false},
                "optimizations": ["lazy-load-images", 42],
                "challenges": ["cookie banner"]
            }"#,
        )
        .unwrap();
        let hints = hints_from_object(&object);
        assert_eq!(hints.page.format, Some(PageFormat::Letter));
        assert_eq!(hints.page.orientation, Some(Orientation::Landscape));
        assert_eq!(hints.page.margin.as_deref(), Some("0.5in"));
        assert_eq!(hints.capture.wait_time_ms, Some(2500));
        assert_eq!(hints.capture.images_enabled, Some(false));
        assert_eq!(hints.capture.full_page, None);
        assert_eq!(hints.optimizations, vec!["lazy-load-images"]);
        assert_eq!(hints.challenges, vec!["cookie banner"]);
    }

    #[test]
    fn partial_structured_object_is_default_filled() {
        let rec = extract(r#"{"pageConfig": {"format": "A5"}}"#);
        assert_eq!(rec.page_config.format, PageFormat::A5);
        assert_eq!(rec.page_config.orientation, Orientation::Portrait);
        assert_eq!(rec.page_config.margin, "1cm");
        assert_eq!(rec.capture_strategy, CaptureStrategy::default());
    }

    #[test]
    fn unknown_enum_spellings_are_ignored() {
        let hints = hints_from_object(&serde_json::json!({
            "pageConfig": {"format": "B5", "orientation": "diagonal"}
        }));
        assert_eq!(hints.page, PageHints::default());
    }

    #[test]
    fn unavailable_insights_use_default_recommendation() {
        let insights = Insights::unavailable();
        assert_eq!(insights.recommendations, Recommendation::default());
        assert_eq!(
            serde_json::to_value(&insights.summary).unwrap(),
            Value::String("Using default settings".into())
        );
    }

    #[test]
    fn heuristic_summary_serialises_like_api_payload() {
        let json = serde_json::to_value(extract_summary("dynamic content")).unwrap();
        assert_eq!(json["captureStrategy"]["waitTime"], 3000);
        assert_eq!(json["pageConfig"]["format"], "A4");
        assert!(json["summary"].as_str().unwrap().starts_with("dynamic content"));
    }
}
