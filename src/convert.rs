//! End-to-end generation: URL in, PDF bytes and insights out.
//!
//! ```text
//! URL ──▶ normalise ──▶ advice (best effort) ──▶ extract ──▶ merge
//!                                                              │
//!           PDF bytes ◀── render (scoped session) ◀── build ◀──┘
//! ```
//!
//! Only two things can fail an invocation: a missing/unusable URL, and the
//! render itself. Advice problems degrade to the default recommendation.

use crate::config::ServiceConfig;
use crate::error::SitePdfError;
use crate::pipeline::advice::{AdviceSource, CommandAdvisor, NoAdvice};
use crate::pipeline::browser::{render_pdf, ChromiumBackend, RenderBackend};
use crate::pipeline::build::RenderRequest;
use crate::pipeline::extract::{consult, Insights};
use crate::pipeline::input;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Result of one successful generation.
#[derive(Debug, Clone)]
pub struct PdfOutput {
    /// Normalised URL that was rendered.
    pub url: String,
    pub pdf: Vec<u8>,
    pub insights: Insights,
    /// The exact parameters the browser was driven with.
    pub request: RenderRequest,
    pub duration_ms: u64,
}

/// The PDF generation service.
///
/// Holds no per-request state; one instance can serve concurrent requests,
/// each of which gets its own advice call and browser session.
#[derive(Clone)]
pub struct SitePdf {
    advisor: Arc<dyn AdviceSource>,
    backend: Arc<dyn RenderBackend>,
}

impl std::fmt::Debug for SitePdf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SitePdf")
            .field("advisor", &"<dyn AdviceSource>")
            .field("backend", &"<dyn RenderBackend>")
            .finish()
    }
}

impl SitePdf {
    pub fn new(advisor: Arc<dyn AdviceSource>, backend: Arc<dyn RenderBackend>) -> Self {
        Self { advisor, backend }
    }

    /// Wire the command advisor (or [`NoAdvice`]) and headless Chromium from
    /// configuration.
    pub fn from_config(config: &ServiceConfig) -> Self {
        let advisor: Arc<dyn AdviceSource> = if config.advice_enabled {
            Arc::new(CommandAdvisor::from_config(config))
        } else {
            Arc::new(NoAdvice)
        };
        Self::new(advisor, Arc::new(ChromiumBackend::from_config(config)))
    }

    /// Render `url` to PDF.
    ///
    /// # Errors
    /// - [`SitePdfError::MissingUrl`] / [`SitePdfError::InvalidUrl`] for
    ///   unusable input
    /// - any browser error from the render step
    pub async fn generate(&self, url: &str) -> Result<PdfOutput, SitePdfError> {
        let start = Instant::now();
        let url = input::resolve_url(url)?;
        info!("Generating PDF for {}", url);

        // ── Step 1: Advice → recommendation ──────────────────────────────
        let insights = consult(self.advisor.as_ref(), &url).await;

        // ── Step 2: Recommendation → render parameters ───────────────────
        let request = RenderRequest::build(&url, &insights.recommendations);
        debug!("PDF options: {:?}", request.pdf);

        // ── Step 3: Render ───────────────────────────────────────────────
        let pdf = render_pdf(self.backend.as_ref(), &request).await?;

        let duration_ms = start.elapsed().as_millis() as u64;
        info!("PDF generated: {} bytes in {}ms", pdf.len(), duration_ms);

        Ok(PdfOutput {
            url,
            pdf,
            insights,
            request,
            duration_ms,
        })
    }
}
