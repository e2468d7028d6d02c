//! Prompt sent to the advice command.
//!
//! The reply is free text. The prompt asks for a JSON object with the same
//! keys [`crate::recommendation::Recommendation`] serialises to, but nothing
//! downstream relies on the advisor honouring that: the extractor falls back
//! to keyword heuristics when no object is found.

/// Advice prompt template. `{url}` is replaced with the normalised URL.
pub const ADVICE_PROMPT_TEMPLATE: &str = r#"I need to convert the website {url} to PDF in an optimised way.

Analyse it and give recommendations about:
1. Ideal page settings (size, orientation, margins)
2. Strategies for capturing dynamic content
3. Performance optimisations
4. Handling of specific elements (images, tables, charts)
5. Likely technical challenges

Answer in JSON format with the following keys:
- pageConfig: {format, orientation, margin}
- captureStrategy: {waitTime, javascript, images}
- optimizations: [list of optimisations]
- challenges: [possible challenges]"#;

/// Build the advice prompt for `url`.
pub fn advice_prompt(url: &str) -> String {
    ADVICE_PROMPT_TEMPLATE.replace("{url}", url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_mentions_url_and_keys() {
        let p = advice_prompt("https://example.com");
        assert!(p.contains("https://example.com"));
        assert!(!p.contains("{url}"));
        for key in ["pageConfig", "captureStrategy", "optimizations", "challenges"] {
            assert!(p.contains(key), "prompt missing key {key}");
        }
    }
}
