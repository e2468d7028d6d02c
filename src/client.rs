//! Client for the PDF generation API.
//!
//! [`PdfClient::generate_pdf`] posts `{url, ...options}` and returns the
//! decoded envelope; [`PdfClient::save_pdf`] additionally decodes the
//! base64 payload and writes it to disk.
//!
//! Rendering can legitimately take a minute (30 s advice deadline, 30 s
//! navigation bound, up to 5 s settle delay), so requests time out after
//! [`REQUEST_TIMEOUT_SECS`].

use crate::error::SitePdfError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Endpoint used when none is given.
pub const DEFAULT_API_URL: &str = "http://localhost:3000/generate-pdf";

/// Client-side request timeout, above the service's worst-case latency.
pub const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Successful API envelope.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub success: bool,
    pub url: String,
    pub pdf_base64: String,
    #[serde(default)]
    pub q_insights: Value,
    pub file_size: usize,
    pub timestamp: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorEnvelope {
    error: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    request_id: Option<String>,
}

/// What [`PdfClient::save_pdf`] wrote.
#[derive(Debug, Clone)]
pub struct SavedPdf {
    pub file_path: PathBuf,
    pub file_size: usize,
    pub q_insights: Value,
}

/// HTTP client for one API endpoint.
#[derive(Debug, Clone)]
pub struct PdfClient {
    api_url: String,
    http: reqwest::Client,
}

impl PdfClient {
    pub fn new(api_url: impl Into<String>) -> Result<Self, SitePdfError> {
        let api_url = api_url.into();
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| SitePdfError::Http {
                url: api_url.clone(),
                reason: e.to_string(),
            })?;
        Ok(Self { api_url, http })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Ask the API to render `url`. `options` are merged into the JSON body.
    pub async fn generate_pdf(
        &self,
        url: &str,
        options: Option<&Map<String, Value>>,
    ) -> Result<GenerateResponse, SitePdfError> {
        info!("Requesting PDF for {} from {}", url, self.api_url);

        let mut payload = Map::new();
        payload.insert("url".into(), Value::String(url.to_string()));
        if let Some(options) = options {
            for (k, v) in options {
                payload.entry(k.clone()).or_insert_with(|| v.clone());
            }
        }

        let response = self
            .http
            .post(&self.api_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| SitePdfError::Http {
                url: self.api_url.clone(),
                reason: if e.is_timeout() {
                    format!("timed out after {REQUEST_TIMEOUT_SECS}s")
                } else {
                    e.to_string()
                },
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| SitePdfError::Http {
            url: self.api_url.clone(),
            reason: e.to_string(),
        })?;

        if !status.is_success() {
            return Err(SitePdfError::Api {
                status: status.as_u16(),
                message: describe_error(&body),
            });
        }

        let envelope: GenerateResponse =
            serde_json::from_str(&body).map_err(|e| SitePdfError::Api {
                status: status.as_u16(),
                message: format!("unexpected response body: {e}"),
            })?;
        if !envelope.success {
            return Err(SitePdfError::Api {
                status: status.as_u16(),
                message: "PDF generation failed".into(),
            });
        }

        debug!("API reported {} bytes", envelope.file_size);
        Ok(envelope)
    }

    /// Generate a PDF for `url` and write it to `output_path`.
    ///
    /// Uses atomic write (temp file + rename) to prevent partial files.
    pub async fn save_pdf(
        &self,
        url: &str,
        output_path: impl AsRef<Path>,
        options: Option<&Map<String, Value>>,
    ) -> Result<SavedPdf, SitePdfError> {
        let result = self.generate_pdf(url, options).await?;
        let bytes = STANDARD
            .decode(result.pdf_base64.as_bytes())
            .map_err(|e| SitePdfError::Decode(e.to_string()))?;

        let path = output_path.as_ref();
        write_atomic(path, &bytes).await?;
        info!("PDF saved to {}", path.display());

        Ok(SavedPdf {
            file_path: path.to_path_buf(),
            file_size: bytes.len(),
            q_insights: result.q_insights,
        })
    }
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), SitePdfError> {
    let write_err = |source| SitePdfError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }
    let tmp_path = path.with_extension("pdf.tmp");
    tokio::fs::write(&tmp_path, bytes).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)
}

fn describe_error(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(env) => {
            let mut msg = env.error;
            if let Some(detail) = env.message.filter(|m| !m.is_empty()) {
                msg = format!("{msg}: {detail}");
            }
            if let Some(id) = env.request_id {
                msg = format!("{msg} (request {id})");
            }
            msg
        }
        Err(_) => body.trim().chars().take(200).collect(),
    }
}

static RE_SCHEME: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://").unwrap());
static RE_NON_ALNUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-zA-Z0-9]").unwrap());

/// `pdf_<domain>_<millis>.pdf`, where `<domain>` is the URL without its
/// scheme and with every non-alphanumeric character replaced by `_`.
pub fn output_filename(url: &str, unix_millis: i64) -> String {
    let without_scheme = RE_SCHEME.replacen(url, 1, "");
    let domain = RE_NON_ALNUM.replace_all(&without_scheme, "_");
    format!("pdf_{domain}_{unix_millis}.pdf")
}

/// [`output_filename`] stamped with the current time.
pub fn default_output_filename(url: &str) -> String {
    output_filename(url, chrono::Utc::now().timestamp_millis())
}
