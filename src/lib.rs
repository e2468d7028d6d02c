//! # sitepdf
//!
//! Turn a web page into a PDF whose layout was chosen by an AI advisor.
//!
//! ## Why this crate?
//!
//! Printing a page with fixed settings works for simple documents but goes
//! wrong on wide dashboards, script-heavy single-page apps and image-dense
//! layouts. Before rendering, this crate asks an external AI CLI how the page
//! should be captured, distils the free-form answer into a typed
//! [`Recommendation`] (format, orientation, margin, wait time), and drives
//! headless Chrome with it. When the advisor is slow, absent or unhelpful
//! the defaults are used; advice never fails a request.
//!
//! ## Pipeline Overview
//!
//! ```text
//! URL
//!  │
//!  ├─ 1. Input    require a URL, add https:// when the scheme is missing
//!  ├─ 2. Advice   `aws q ask "<prompt>"`, 30 s deadline, best effort
//!  ├─ 3. Extract  embedded JSON object + keyword rules → hints
//!  ├─ 4. Merge    hints over A4 / portrait / 1cm / 2000 ms defaults
//!  ├─ 5. Build    viewport, network-idle navigation, print options
//!  └─ 6. Render   scoped headless session → PDF bytes
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sitepdf::{ServiceConfig, SitePdf};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServiceConfig::builder().region("us-east-1").build()?;
//!     let service = SitePdf::from_config(&config);
//!     let output = service.generate("example.com").await?;
//!     std::fs::write("example.pdf", &output.pdf)?;
//!     eprintln!("{} bytes in {}ms", output.pdf.len(), output.duration_ms);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `cli`    | on      | [`client`] module and the `sitepdf` binary (reqwest + clap + indicatif) |
//! | `server` | on      | [`server`] module and the `sitepdf-server` binary (axum + clap) |
//!
//! Disable both when embedding only the library:
//! ```toml
//! sitepdf = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

#[cfg(feature = "cli")]
pub mod client;
pub mod config;
pub mod convert;
pub mod error;
pub mod handler;
pub mod pipeline;
pub mod prompts;
pub mod recommendation;
#[cfg(feature = "server")]
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

#[cfg(feature = "cli")]
pub use client::{PdfClient, SavedPdf};
pub use config::{ServiceConfig, ServiceConfigBuilder};
pub use convert::{PdfOutput, SitePdf};
pub use error::{AdviceError, SitePdfError};
pub use handler::{extract_url, handle_event, ApiResponse};
pub use pipeline::advice::{AdviceSource, CommandAdvisor, NoAdvice};
pub use pipeline::browser::{BrowserSession, ChromiumBackend, RenderBackend};
pub use pipeline::build::RenderRequest;
pub use pipeline::extract::{InsightSummary, Insights};
pub use recommendation::{
    CaptureStrategy, Orientation, PageConfig, PageFormat, Recommendation, RecommendationHints,
};
