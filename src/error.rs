//! Error types for the sitepdf library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`SitePdfError`]: **Fatal**: the invocation cannot produce a PDF
//!   (no URL, browser would not start, navigation failed). Returned as
//!   `Err(SitePdfError)` from [`crate::convert::SitePdf::generate`] and
//!   mapped to a 400/500 envelope at the HTTP boundary.
//!
//! * [`AdviceError`]: **Non-fatal**: the advice command timed out, exited
//!   non-zero or could not be spawned. It never leaves the library: the
//!   pipeline logs it and renders with the default recommendation.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the sitepdf library.
#[derive(Debug, Error)]
pub enum SitePdfError {
    // ── Request errors ────────────────────────────────────────────────────
    /// No URL was present in the request.
    #[error("URL is required")]
    MissingUrl,

    /// The URL could not be turned into something a browser can navigate to.
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    // ── Browser errors ────────────────────────────────────────────────────
    /// Chrome/Chromium could not be started.
    #[error("Failed to launch headless browser: {0}\nSet CHROME_PATH or pass --chrome <PATH>.")]
    BrowserLaunch(String),

    /// Navigation did not settle within the fixed upper bound.
    #[error("Navigation to '{url}' timed out after {secs}s")]
    NavigationTimeout { url: String, secs: u64 },

    /// The browser failed while loading the page or printing it.
    #[error("Rendering failed for '{url}': {detail}")]
    RenderFailed { url: String, detail: String },

    // ── Client errors ─────────────────────────────────────────────────────
    /// Transport-level failure talking to the PDF API.
    #[error("Request to '{url}' failed: {reason}")]
    Http { url: String, reason: String },

    /// The PDF API answered, but not with a successful envelope.
    #[error("PDF API returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    /// The `pdfBase64` payload could not be decoded.
    #[error("Failed to decode PDF payload: {0}")]
    Decode(String),

    /// Could not create or write the output PDF file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Why the advice command produced no usable text.
///
/// Always recovered locally; see [`crate::pipeline::extract::consult`].
#[derive(Debug, Error)]
pub enum AdviceError {
    /// The command ran past its deadline and was killed.
    #[error("advice command timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The command exited with a non-zero status.
    #[error("advice command failed ({}): {stderr}", exit_detail(.code))]
    CommandFailed { code: Option<i32>, stderr: String },

    /// The executable could not be started at all.
    #[error("could not start advice command '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Reading the command's output failed.
    #[error("advice command I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Advice was switched off in the configuration.
    #[error("advice disabled by configuration")]
    Disabled,
}

fn exit_detail(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("exit code {c}"),
        None => "killed by signal".to_string(),
    }
}
