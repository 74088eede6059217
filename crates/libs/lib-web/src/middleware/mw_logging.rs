//! # Request/Response Logging Middleware
//!
//! One line per request and one per response, keyed by request id. The
//! widget is embedded on third-party pages, so the embedding `origin` and the
//! forwarded client address are logged with every request.
//!
//! Headers go to debug level with credentials redacted. Chat bodies are never
//! logged here; the chat handler logs a short preview itself.

use crate::middleware::mw_req_stamp::RequestStamp;
use axum::{
    extract::Request,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Headers whose values are never logged
const SENSITIVE_HEADERS: &[&str] = &["authorization", "cookie", "x-api-key", "x-auth-token"];

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// First hop of `x-forwarded-for`, when behind a proxy
fn client_addr(headers: &HeaderMap) -> Option<&str> {
    header_str(headers, "x-forwarded-for")
        .and_then(|list| list.split(',').next())
        .map(str::trim)
        .filter(|addr| !addr.is_empty())
}

fn redacted_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            let name = name.as_str();
            if SENSITIVE_HEADERS.contains(&name) {
                Some((name.to_string(), "***".to_string()))
            } else {
                value.to_str().ok().map(|v| (name.to_string(), v.to_string()))
            }
        })
        .collect()
}

/// Request/response logging middleware
pub async fn log_requests(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let request_id = req
        .extensions()
        .get::<RequestStamp>()
        .map(|s| s.id.clone())
        .unwrap_or_else(|| "unknown".to_string());

    info!(
        request_id = %request_id,
        origin = header_str(req.headers(), "origin").unwrap_or("-"),
        client = client_addr(req.headers()).unwrap_or("-"),
        "→ {} {}",
        method,
        path
    );
    debug!(
        request_id = %request_id,
        headers = ?redacted_headers(req.headers()),
        "Request headers"
    );

    let response = next.run(req).await;

    let status = response.status();
    let duration_ms = start.elapsed().as_millis();
    let code = status.as_u16();
    match status {
        s if s.is_server_error() => {
            error!(
                request_id = %request_id,
                status = code,
                duration_ms,
                "← {} {} {}",
                method,
                path,
                s
            )
        }
        // Unknown routes are routine noise from crawlers
        StatusCode::NOT_FOUND => {
            debug!(
                request_id = %request_id,
                status = code,
                duration_ms,
                "← {} {} 404",
                method,
                path
            )
        }
        s if s.is_client_error() => {
            warn!(
                request_id = %request_id,
                status = code,
                duration_ms,
                "← {} {} {}",
                method,
                path,
                s
            )
        }
        s => {
            info!(
                request_id = %request_id,
                status = code,
                duration_ms,
                "← {} {} {}",
                method,
                path,
                s
            )
        }
    }

    response
}
