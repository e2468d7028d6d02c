//! HTTP boundary: request event in, JSON envelope out.
//!
//! The handler is transport-agnostic. It accepts the event as a JSON value
//! in any of the three shapes callers send (top-level `url`, `body.url`,
//! `queryStringParameters.url`) and returns status, headers and body for
//! whichever server hosts it (see [`crate::server`]).

use crate::convert::SitePdf;
use crate::error::SitePdfError;
use crate::pipeline::extract::InsightSummary;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info};

/// Headers sent with every response.
pub const RESPONSE_HEADERS: [(&str, &str); 4] = [
    ("Content-Type", "application/json"),
    ("Access-Control-Allow-Origin", "*"),
    (
        "Access-Control-Allow-Headers",
        "Content-Type,X-Amz-Date,Authorization,X-Api-Key,X-Amz-Security-Token",
    ),
    ("Access-Control-Allow-Methods", "POST,OPTIONS"),
];

/// Status, headers and serialised body of one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status_code: u16,
    pub headers: Vec<(&'static str, &'static str)>,
    pub body: String,
}

impl ApiResponse {
    fn json(status_code: u16, body: &impl Serialize) -> Self {
        let body = serde_json::to_string_pretty(body).unwrap_or_else(|e| {
            format!("{{\"error\": \"serialisation failed\", \"message\": \"{e}\"}}")
        });
        Self {
            status_code,
            headers: RESPONSE_HEADERS.to_vec(),
            body,
        }
    }

    /// Answer to a CORS preflight.
    pub fn preflight() -> Self {
        Self {
            status_code: 200,
            headers: RESPONSE_HEADERS.to_vec(),
            body: String::new(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SuccessBody<'a> {
    success: bool,
    url: &'a str,
    pdf_base64: String,
    q_insights: &'a InsightSummary,
    file_size: usize,
    timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_id: Option<String>,
}

/// Find the URL in a request event.
///
/// Checked in order: `url`, `body.url` (body as object or JSON string),
/// `queryStringParameters.url`. Empty strings count as absent.
pub fn extract_url(event: &Value) -> Option<String> {
    let non_empty = |v: Option<&Value>| {
        v.and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
    };

    if let Some(url) = non_empty(event.get("url")) {
        return Some(url);
    }

    let from_body = match event.get("body") {
        Some(Value::String(raw)) => serde_json::from_str::<Value>(raw)
            .ok()
            .and_then(|body| non_empty(body.get("url"))),
        Some(body @ Value::Object(_)) => non_empty(body.get("url")),
        _ => None,
    };
    if from_body.is_some() {
        return from_body;
    }

    non_empty(event.get("queryStringParameters").and_then(|q| q.get("url")))
}

/// Handle one request event.
///
/// `request_id` correlates a 500 response with the server logs.
pub async fn handle_event(service: &SitePdf, event: &Value, request_id: &str) -> ApiResponse {
    let Some(url) = extract_url(event) else {
        info!("Rejecting request {} without URL", request_id);
        return ApiResponse::json(
            400,
            &ErrorBody {
                error: SitePdfError::MissingUrl.to_string(),
                message: "Provide a valid URL in the \"url\" parameter".into(),
                request_id: None,
            },
        );
    };

    match service.generate(&url).await {
        Ok(output) => ApiResponse::json(
            200,
            &SuccessBody {
                success: true,
                url: &output.url,
                pdf_base64: STANDARD.encode(&output.pdf),
                q_insights: &output.insights.summary,
                file_size: output.pdf.len(),
                timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            },
        ),
        Err(e @ (SitePdfError::MissingUrl | SitePdfError::InvalidUrl { .. })) => ApiResponse::json(
            400,
            &ErrorBody {
                error: "Invalid URL".into(),
                message: e.to_string(),
                request_id: None,
            },
        ),
        Err(e) => {
            error!("Request {} failed: {}", request_id, e);
            ApiResponse::json(
                500,
                &ErrorBody {
                    error: "Internal server error".into(),
                    message: e.to_string(),
                    request_id: Some(request_id.to_string()),
                },
            )
        }
    }
}
