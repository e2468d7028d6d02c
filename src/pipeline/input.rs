//! Input resolution: turn the user-supplied URL into one a browser accepts.
//!
//! Callers routinely send bare hosts (`example.com`). Anything without an
//! explicit `http://` or `https://` prefix is assumed to be HTTPS; anything
//! with one is passed through untouched.

use crate::error::SitePdfError;
use tracing::debug;

/// Check if the input string already carries an HTTP(S) scheme.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Prepend `https://` unless the input already has an HTTP(S) scheme.
pub fn normalize_url(input: &str) -> String {
    if is_url(input) {
        input.to_string()
    } else {
        format!("https://{input}")
    }
}

/// Trim and normalise a request URL, rejecting blank input.
pub fn resolve_url(input: &str) -> Result<String, SitePdfError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(SitePdfError::MissingUrl);
    }
    if trimmed.chars().any(char::is_whitespace) {
        return Err(SitePdfError::InvalidUrl {
            url: trimmed.to_string(),
            reason: "URL must not contain whitespace".into(),
        });
    }
    let url = normalize_url(trimmed);
    debug!("Normalised URL: {}", url);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/doc"));
        assert!(is_url("http://example.com/doc"));
        assert!(!is_url("example.com"));
        assert!(!is_url("ftp://example.com"));
        assert!(!is_url(""));
    }

    #[test]
    fn bare_host_gets_https() {
        assert_eq!(normalize_url("example.com"), "https://example.com");
        assert_eq!(normalize_url("github.com/rust-lang"), "https://github.com/rust-lang");
    }

    #[test]
    fn existing_scheme_is_identity() {
        for url in ["http://example.com", "https://example.com/a?b=c"] {
            assert_eq!(normalize_url(url), url);
        }
    }

    #[test]
    fn resolve_rejects_blank_and_whitespace() {
        assert!(matches!(resolve_url("   "), Err(SitePdfError::MissingUrl)));
        assert!(matches!(
            resolve_url("exa mple.com"),
            Err(SitePdfError::InvalidUrl { .. })
        ));
        assert_eq!(resolve_url(" example.com ").unwrap(), "https://example.com");
    }
}
