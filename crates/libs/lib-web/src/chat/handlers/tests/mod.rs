//! # Chat Handler Tests
//!
//! Test suite for the chat turn and transcript handlers, driven through the
//! full bridge router.

mod send;

use crate::chat::{ChatAppState, UpstreamClient};
use crate::server::create_router;
use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use axum::Router;
use lib_core::Config;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Router backed by a bridge without any upstream
pub fn test_app() -> (Router, Arc<ChatAppState>) {
    let state = Arc::new(ChatAppState::with_upstream(Config::default(), None));
    (create_router(Arc::clone(&state), Vec::new()), state)
}

/// Router backed by a bridge forwarding to `base_url`
pub fn test_app_with_upstream(base_url: &str) -> (Router, Arc<ChatAppState>) {
    let config = Config {
        upstream_url: Some(base_url.to_string()),
        upstream_timeout_ms: 2_000,
        ..Default::default()
    };
    let upstream = UpstreamClient::new(
        config.upstream_chat_url().unwrap(),
        Duration::from_millis(config.upstream_timeout_ms),
    )
    .unwrap();
    let state = Arc::new(ChatAppState::with_upstream(config, Some(upstream)));
    (create_router(Arc::clone(&state), Vec::new()), state)
}

/// Serve `router` on an ephemeral port and return its base URL
pub async fn spawn_upstream(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Base URL of a port nothing listens on
pub async fn dead_upstream() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn read_json<T: DeserializeOwned>(response: Response) -> T {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}
