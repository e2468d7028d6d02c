//! In-process stand-ins for the advice command and the browser.

#![allow(dead_code)]

use async_trait::async_trait;
use sitepdf::{
    AdviceError, AdviceSource, BrowserSession, RenderBackend, RenderRequest, SitePdf, SitePdfError,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const FAKE_PDF: &[u8] = b"%PDF-1.4\n%fake\n";

/// Returns a fixed answer, or fails as if the command timed out.
pub struct ScriptedAdvisor {
    answer: Option<String>,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedAdvisor {
    pub fn answering(text: &str) -> Self {
        Self {
            answer: Some(text.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            answer: None,
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl AdviceSource for ScriptedAdvisor {
    async fn advise(&self, prompt: &str) -> Result<String, AdviceError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.answer {
            Some(text) => Ok(text.clone()),
            None => Err(AdviceError::Timeout { secs: 30 }),
        }
    }
}

#[derive(Default)]
struct Log {
    requests: Mutex<Vec<RenderRequest>>,
    launches: AtomicUsize,
    closes: AtomicUsize,
}

/// Records every render request and counts session launches and closes.
#[derive(Default)]
pub struct RecordingBackend {
    fail_render: bool,
    log: Arc<Log>,
}

impl RecordingBackend {
    pub fn failing() -> Self {
        Self {
            fail_render: true,
            ..Self::default()
        }
    }

    pub fn requests(&self) -> Vec<RenderRequest> {
        self.log.requests.lock().unwrap().clone()
    }

    pub fn launches(&self) -> usize {
        self.log.launches.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.log.closes.load(Ordering::SeqCst)
    }
}

struct RecordingSession {
    fail_render: bool,
    log: Arc<Log>,
}

#[async_trait]
impl RenderBackend for RecordingBackend {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, SitePdfError> {
        self.log.launches.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(RecordingSession {
            fail_render: self.fail_render,
            log: Arc::clone(&self.log),
        }))
    }
}

#[async_trait]
impl BrowserSession for RecordingSession {
    async fn render(&mut self, request: &RenderRequest) -> Result<Vec<u8>, SitePdfError> {
        self.log.requests.lock().unwrap().push(request.clone());
        if self.fail_render {
            Err(SitePdfError::RenderFailed {
                url: request.url.clone(),
                detail: "net::ERR_NAME_NOT_RESOLVED".into(),
            })
        } else {
            Ok(FAKE_PDF.to_vec())
        }
    }

    async fn close(self: Box<Self>) -> Result<(), SitePdfError> {
        self.log.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A service wired to the given fakes; both are returned for inspection.
pub fn service(
    advisor: ScriptedAdvisor,
    backend: RecordingBackend,
) -> (SitePdf, Arc<ScriptedAdvisor>, Arc<RecordingBackend>) {
    let advisor = Arc::new(advisor);
    let backend = Arc::new(backend);
    let service = SitePdf::new(advisor.clone(), backend.clone());
    (service, advisor, backend)
}
