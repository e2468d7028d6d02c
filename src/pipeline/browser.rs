//! Render capability: load a page in headless Chrome and print it to PDF.
//!
//! ## Session scoping
//!
//! Every render acquires its own browser session and must release it on
//! every exit path. [`render_pdf`] is the only place sessions are opened:
//! it launches, renders, and closes exactly once whether rendering succeeded
//! or failed, then returns the render result. A panic inside rendering
//! still tears the browser down through `Drop` on [`ChromiumSession`].
//!
//! ## Why traits?
//!
//! [`RenderBackend`] / [`BrowserSession`] are the seam between the pipeline
//! and Chrome. The service wires in [`ChromiumBackend`]; tests wire in fakes
//! that count launches and closes without needing a browser installed.

use crate::config::ServiceConfig;
use crate::error::SitePdfError;
use crate::pipeline::build::{
    parse_length_inches, PdfOptions, RenderRequest, WaitUntil, NAVIGATION_TIMEOUT_MS,
};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventLoadingFailed, EventLoadingFinished, EventRequestWillBeSent,
};
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use chromiumoxide::Page;
use futures::{Stream, StreamExt};
use std::collections::HashSet;
use std::hash::Hash;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Something that can start a browser session.
#[async_trait]
pub trait RenderBackend: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, SitePdfError>;
}

/// One running browser.
#[async_trait]
pub trait BrowserSession: Send {
    /// Navigate to `request.url` and return the printed PDF bytes.
    async fn render(&mut self, request: &RenderRequest) -> Result<Vec<u8>, SitePdfError>;

    /// Shut the browser down. Called exactly once per session.
    async fn close(self: Box<Self>) -> Result<(), SitePdfError>;
}

/// Launch a session, render `request`, and close the session.
///
/// The session is closed on both the success and the failure path; a close
/// failure is logged and never masks the render result.
pub async fn render_pdf(
    backend: &dyn RenderBackend,
    request: &RenderRequest,
) -> Result<Vec<u8>, SitePdfError> {
    let mut session = backend.launch().await?;
    let result = session.render(request).await;
    if let Err(e) = session.close().await {
        warn!("Browser session did not close cleanly: {}", e);
    }
    result
}

// ── Chromium ─────────────────────────────────────────────────────────────

/// Headless Chrome/Chromium driven over the DevTools protocol.
#[derive(Debug, Clone, Default)]
pub struct ChromiumBackend {
    executable: Option<PathBuf>,
    args: Vec<String>,
}

impl ChromiumBackend {
    pub fn new(executable: Option<PathBuf>, args: Vec<String>) -> Self {
        Self { executable, args }
    }

    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(config.chrome_executable.clone(), config.browser_args.clone())
    }
}

#[async_trait]
impl RenderBackend for ChromiumBackend {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, SitePdfError> {
        let mut builder = BrowserConfig::builder()
            .args(self.args.clone())
            .request_timeout(Duration::from_millis(NAVIGATION_TIMEOUT_MS));
        if let Some(ref exe) = self.executable {
            builder = builder.chrome_executable(exe);
        }
        let config = builder.build().map_err(SitePdfError::BrowserLaunch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| SitePdfError::BrowserLaunch(e.to_string()))?;

        // The handler drives the CDP websocket; nothing progresses unless it
        // is polled.
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler error: {}", e);
                }
            }
        });

        info!("Headless browser launched");
        Ok(Box::new(ChromiumSession { browser, handler }))
    }
}

/// A launched Chrome process plus the task polling its connection.
pub struct ChromiumSession {
    browser: Browser,
    handler: JoinHandle<()>,
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn render(&mut self, request: &RenderRequest) -> Result<Vec<u8>, SitePdfError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| render_failed(request, e))?;

        let result = capture(&page, request).await;
        if let Err(e) = page.close().await {
            debug!("Page close failed: {}", e);
        }
        result
    }

    async fn close(mut self: Box<Self>) -> Result<(), SitePdfError> {
        let closed = self.browser.close().await;
        if let Err(e) = self.browser.wait().await {
            debug!("Waiting for browser exit failed: {}", e);
        }
        self.handler.abort();
        closed
            .map(|_| ())
            .map_err(|e| SitePdfError::Internal(format!("browser close failed: {e}")))
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

async fn capture(page: &Page, request: &RenderRequest) -> Result<Vec<u8>, SitePdfError> {
    let start = Instant::now();

    page.execute(SetDeviceMetricsOverrideParams::new(
        i64::from(request.viewport.width),
        i64::from(request.viewport.height),
        request.viewport.device_scale_factor,
        false,
    ))
    .await
    .map_err(|e| render_failed(request, e))?;

    page.execute(EnableParams::default())
        .await
        .map_err(|e| render_failed(request, e))?;

    // Subscribe before navigating so no request event is missed.
    let sent = page
        .event_listener::<EventRequestWillBeSent>()
        .await
        .map_err(|e| render_failed(request, e))?;
    let finished = page
        .event_listener::<EventLoadingFinished>()
        .await
        .map_err(|e| render_failed(request, e))?;
    let failed = page
        .event_listener::<EventLoadingFailed>()
        .await
        .map_err(|e| render_failed(request, e))?;

    info!("Navigating to {}", request.url);
    let navigation = async {
        page.goto(request.url.as_str()).await?;
        match request.navigation.wait_until {
            WaitUntil::NetworkIdle {
                max_inflight,
                idle_window_ms,
            } => {
                let started = sent.map(|e| e.request_id.clone());
                let settled = futures::stream::select(
                    finished.map(|e| e.request_id.clone()),
                    failed.map(|e| e.request_id.clone()),
                );
                wait_for_network_idle(
                    started,
                    settled,
                    max_inflight,
                    Duration::from_millis(idle_window_ms),
                )
                .await
            }
        }
        Ok::<_, chromiumoxide::error::CdpError>(())
    };

    let bound = Duration::from_millis(request.navigation.timeout_ms);
    match tokio::time::timeout(bound, navigation).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => return Err(render_failed(request, e)),
        Err(_) => {
            return Err(SitePdfError::NavigationTimeout {
                url: request.url.clone(),
                secs: bound.as_secs(),
            })
        }
    }

    debug!("Waiting {}ms for the page to settle", request.settle_delay_ms);
    tokio::time::sleep(Duration::from_millis(request.settle_delay_ms)).await;

    let params = print_params(&request.pdf).map_err(|detail| SitePdfError::RenderFailed {
        url: request.url.clone(),
        detail,
    })?;
    let pdf = page.pdf(params).await.map_err(|e| render_failed(request, e))?;

    info!(
        "Printed {} bytes of PDF in {}ms",
        pdf.len(),
        start.elapsed().as_millis()
    );
    Ok(pdf)
}

/// Resolve once no more than `max_inflight` requests have been pending for
/// a full `window`. Any request starting or settling restarts the window.
async fn wait_for_network_idle<K, S, F>(
    started: S,
    settled: F,
    max_inflight: usize,
    window: Duration,
) where
    K: Eq + Hash,
    S: Stream<Item = K>,
    F: Stream<Item = K>,
{
    tokio::pin!(started, settled);
    let mut inflight: HashSet<K> = HashSet::new();

    loop {
        let quiet = inflight.len() <= max_inflight;
        tokio::select! {
            Some(id) = started.next() => {
                inflight.insert(id);
            }
            Some(id) = settled.next() => {
                inflight.remove(&id);
            }
            _ = tokio::time::sleep(window), if quiet => return,
            else => return,
        }
    }
}

/// Map PDF options onto the DevTools `Page.printToPDF` parameters.
///
/// Paper size is given in portrait; Chrome swaps it when `landscape` is set.
fn print_params(pdf: &PdfOptions) -> Result<PrintToPdfParams, String> {
    let (width, height) = pdf.format.dimensions_in();
    let side = |length: &str| {
        parse_length_inches(length).ok_or_else(|| format!("invalid margin '{length}'"))
    };

    Ok(PrintToPdfParams {
        landscape: Some(pdf.landscape),
        print_background: Some(pdf.print_background),
        paper_width: Some(width),
        paper_height: Some(height),
        margin_top: Some(side(&pdf.margin.top)?),
        margin_bottom: Some(side(&pdf.margin.bottom)?),
        margin_left: Some(side(&pdf.margin.left)?),
        margin_right: Some(side(&pdf.margin.right)?),
        prefer_css_page_size: Some(pdf.prefer_css_page_size),
        ..Default::default()
    })
}

fn render_failed(request: &RenderRequest, e: impl std::fmt::Display) -> SitePdfError {
    SitePdfError::RenderFailed {
        url: request.url.clone(),
        detail: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommendation::{Orientation, PageFormat, Recommendation};
    use futures::channel::mpsc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct Counters {
        launches: AtomicUsize,
        closes: AtomicUsize,
    }

    struct FakeBackend {
        counters: Arc<Counters>,
        fail_render: bool,
    }

    struct FakeSession {
        counters: Arc<Counters>,
        fail_render: bool,
    }

    #[async_trait]
    impl RenderBackend for FakeBackend {
        async fn launch(&self) -> Result<Box<dyn BrowserSession>, SitePdfError> {
            self.counters.launches.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FakeSession {
                counters: Arc::clone(&self.counters),
                fail_render: self.fail_render,
            }))
        }
    }

    #[async_trait]
    impl BrowserSession for FakeSession {
        async fn render(&mut self, request: &RenderRequest) -> Result<Vec<u8>, SitePdfError> {
            if self.fail_render {
                Err(SitePdfError::RenderFailed {
                    url: request.url.clone(),
                    detail: "net::ERR_NAME_NOT_RESOLVED".into(),
                })
            } else {
                Ok(b"%PDF-1.4".to_vec())
            }
        }

        async fn close(self: Box<Self>) -> Result<(), SitePdfError> {
            self.counters.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn request() -> RenderRequest {
        RenderRequest::build("https://example.com", &Recommendation::default())
    }

    #[tokio::test]
    async fn session_closed_once_on_success() {
        let counters = Arc::new(Counters::default());
        let backend = FakeBackend {
            counters: Arc::clone(&counters),
            fail_render: false,
        };
        let pdf = render_pdf(&backend, &request()).await.unwrap();
        assert_eq!(pdf, b"%PDF-1.4");
        assert_eq!(counters.launches.load(Ordering::SeqCst), 1);
        assert_eq!(counters.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn session_closed_once_on_failure() {
        let counters = Arc::new(Counters::default());
        let backend = FakeBackend {
            counters: Arc::clone(&counters),
            fail_render: true,
        };
        let err = render_pdf(&backend, &request()).await.unwrap_err();
        assert!(matches!(err, SitePdfError::RenderFailed { .. }));
        assert_eq!(counters.closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn print_params_a4_portrait() {
        let params = print_params(&request().pdf).unwrap();
        assert_eq!(params.paper_width, Some(8.27));
        assert_eq!(params.paper_height, Some(11.7));
        assert_eq!(params.landscape, Some(false));
        assert_eq!(params.print_background, Some(true));
        assert_eq!(params.prefer_css_page_size, Some(false));
        let top = params.margin_top.unwrap();
        assert!((top - 1.0 / 2.54).abs() < 1e-9);
        assert_eq!(params.margin_top, params.margin_left);
    }

    #[test]
    fn print_params_letter_landscape() {
        let mut rec = Recommendation::default();
        rec.page_config.format = PageFormat::Letter;
        rec.page_config.orientation = Orientation::Landscape;
        let req = RenderRequest::build("https://example.com", &rec);
        let params = print_params(&req.pdf).unwrap();
        assert_eq!(params.paper_width, Some(8.5));
        assert_eq!(params.landscape, Some(true));
    }

    #[test]
    fn print_params_rejects_bad_margin() {
        let mut pdf = request().pdf;
        pdf.margin.left = "wide".into();
        assert!(print_params(&pdf).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn network_idle_resolves_on_quiet_network() {
        let start = tokio::time::Instant::now();
        wait_for_network_idle(
            futures::stream::pending::<u32>(),
            futures::stream::pending::<u32>(),
            2,
            Duration::from_millis(50),
        )
        .await;
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test(start_paused = true)]
    async fn network_idle_waits_while_too_many_requests_pending() {
        let window = Duration::from_millis(500);
        let (started_tx, started_rx) = mpsc::unbounded::<u32>();
        let (settled_tx, settled_rx) = mpsc::unbounded::<u32>();
        let idle = tokio::spawn(wait_for_network_idle(started_rx, settled_rx, 2, window));

        for id in 1..=3 {
            started_tx.unbounded_send(id).unwrap();
        }
        tokio::time::sleep(window * 2).await;
        assert!(!idle.is_finished(), "resolved with 3 requests in flight");

        let settled_at = tokio::time::Instant::now();
        settled_tx.unbounded_send(2).unwrap();
        idle.await.unwrap();
        let waited = settled_at.elapsed();
        assert!(waited >= window, "resolved after {waited:?}");
        assert!(waited < window * 2, "resolved after {waited:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn network_idle_window_restarts_on_activity() {
        let window = Duration::from_millis(100);
        let (started_tx, started_rx) = mpsc::unbounded::<u32>();
        let (_settled_tx, settled_rx) = mpsc::unbounded::<u32>();
        let start = tokio::time::Instant::now();
        let idle = tokio::spawn(wait_for_network_idle(started_rx, settled_rx, 2, window));

        tokio::time::sleep(Duration::from_millis(60)).await;
        started_tx.unbounded_send(7).unwrap();
        idle.await.unwrap();

        assert!(start.elapsed() >= Duration::from_millis(160));
        drop(started_tx);
    }
}
