//! axum front-end for [`crate::handler`].
//!
//! Turns each HTTP request into the event shape the handler understands
//! (JSON body under `body`, query parameters under `queryStringParameters`)
//! and copies the handler's status, headers and body back out.

use crate::convert::SitePdf;
use crate::handler::{handle_event, ApiResponse};
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Path the CLI client posts to by default.
pub const GENERATE_PATH: &str = "/generate-pdf";

/// Build the router: `POST`/`OPTIONS` on `/generate-pdf` and `/`.
pub fn router(service: Arc<SitePdf>) -> Router {
    Router::new()
        .route(GENERATE_PATH, post(generate).options(preflight))
        .route("/", post(generate).options(preflight))
        .with_state(service)
}

/// Serve until Ctrl-C.
pub async fn serve(addr: SocketAddr, service: Arc<SitePdf>) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}{}", listener.local_addr()?, GENERATE_PATH);
    axum::serve(listener, router(service))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await
}

async fn generate(
    State(service): State<Arc<SitePdf>>,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let event = event_from_http(&query, &body);
    into_response(handle_event(&service, &event, &request_id).await)
}

async fn preflight() -> Response {
    into_response(ApiResponse::preflight())
}

fn event_from_http(query: &HashMap<String, String>, body: &[u8]) -> Value {
    let body = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(body)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(body).into_owned()))
    };
    json!({
        "body": body,
        "queryStringParameters": query,
    })
}

fn into_response(api: ApiResponse) -> Response {
    let status = StatusCode::from_u16(api.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut response = (status, api.body).into_response();
    for (name, value) in api.headers {
        // Names arrive capitalised; from_bytes lower-cases them.
        if let Ok(name) = HeaderName::from_bytes(name.as_bytes()) {
            response
                .headers_mut()
                .insert(name, HeaderValue::from_static(value));
        }
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_carries_json_body_and_query() {
        let mut query = HashMap::new();
        query.insert("url".to_string(), "q.test".to_string());
        let event = event_from_http(&query, br#"{"url": "b.test"}"#);
        assert_eq!(event["body"]["url"], "b.test");
        assert_eq!(event["queryStringParameters"]["url"], "q.test");
    }

    #[test]
    fn non_json_body_is_kept_as_text() {
        let event = event_from_http(&HashMap::new(), b"url=x");
        assert_eq!(event["body"], "url=x");
        let empty = event_from_http(&HashMap::new(), b"");
        assert!(empty["body"].is_null());
    }

    #[test]
    fn response_headers_are_copied() {
        let response = into_response(ApiResponse::preflight());
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/json"
        );
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "*"
        );
    }
}
