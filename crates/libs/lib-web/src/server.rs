//! # Server Setup
//!
//! Server initialization, route registration, and HTTP server startup.
//!
//! This module provides the main server setup function that creates the Axum router,
//! registers all routes, applies middleware, and starts the HTTP server.

// region: --- Imports
use crate::chat::{get_session, send_chat, ChatAppState};
use crate::handlers;
use crate::middleware::{log_requests, stamp_req, RequestStamp};
use axum::http::{header, HeaderValue, Method};
use axum::{routing::{get, post}, Router};
use lib_core::Config;
use lib_utils::envs::{get_env_list, get_env_or};
use std::sync::Arc;
use std::time::Duration;
use tower_http::classify::ServerErrorsFailureClass;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::info;
// endregion: --- Imports

// region: --- Server Configuration
/// Server configuration
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:5001")
    pub bind_address: String,
    /// Allowed CORS origins; empty allows any origin
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:5001".to_string(),
            allowed_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Read `BIND_ADDRESS` and `ALLOWED_ORIGINS` (comma separated).
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind_address: get_env_or("BIND_ADDRESS", &defaults.bind_address),
            allowed_origins: get_env_list("ALLOWED_ORIGINS"),
        }
    }
}
// endregion: --- Server Configuration

// region: --- Server Setup
/// Initialize tracing from `LOG_LEVEL` (default `info`).
///
/// Safe to call more than once; later calls keep the first subscriber.
pub fn init_tracing() {
    let log_level = get_env_or("LOG_LEVEL", "info").to_lowercase();

    let filter = match log_level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {
            tracing_subscriber::EnvFilter::new(&log_level)
        }
        _ => tracing_subscriber::EnvFilter::new("info"),
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        .try_init();
}

/// Initialize and start the HTTP server
///
/// # Errors
///
/// This function will return an error if:
/// - Configuration loading or validation fails
/// - The upstream HTTP client cannot be built
/// - Server binding fails
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    init_tracing();

    info!("🤖 AVATAR CHAT BRIDGE STARTING");

    info!("Loading configuration...");
    let app_config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;
    app_config.validate().map_err(|e| anyhow::anyhow!(e))?;

    match app_config.upstream_chat_url() {
        Some(url) => info!("Upstream AI service: {}", url),
        None => info!("No UPSTREAM_URL set, answering with local fallback replies"),
    }

    let chat_state = Arc::new(ChatAppState::new(app_config)?);
    let app = create_router(chat_state, config.allowed_origins.clone());

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;

    info!(" SERVER READY: http://{}", config.bind_address);
    log_server_info();

    axum::serve(listener, app).await?;
    Ok(())
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let allow_origin: AllowOrigin = if allowed_origins.is_empty() {
        Any.into()
    } else {
        allowed_origins
            .iter()
            .filter_map(|origin| origin.parse::<HeaderValue>().ok())
            .collect::<Vec<_>>()
            .into()
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::HeaderName::from_static("x-request-id")])
}

/// Create the bridge router with all routes and middleware
pub fn create_router(chat_state: Arc<ChatAppState>, allowed_origins: Vec<String>) -> Router {
    info!("[ROUTE SETUP] Registering HTTP routes...");
    Router::new()
        .route("/chat", post(send_chat))
        .route("/api/chat", post(send_chat))
        .route("/api/sessions/{session_id}", get(get_session))
        .route("/health", get(handlers::health))
        .route("/api/health", get(handlers::health))
        .route("/status", get(handlers::status))
        .route("/api/status", get(handlers::status))
        .fallback(|| async {
            info!("[404 HANDLER] Unmatched route - returning 404");
            (axum::http::StatusCode::NOT_FOUND, "Route not found")
        })
        .with_state(chat_state)
        // Innermost: request/response logging, needs the stamp
        .layer(axum::middleware::from_fn(log_requests))
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    let request_id = request
                        .extensions()
                        .get::<RequestStamp>()
                        .map(|s| s.id.clone())
                        .unwrap_or_else(|| "unknown".to_string());
                    tracing::info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = %request.method(),
                        uri = %request.uri(),
                    )
                })
                .on_failure(
                    |error: ServerErrorsFailureClass, latency: Duration, _span: &tracing::Span| {
                        tracing::error!(
                            error = ?error,
                            latency_ms = latency.as_millis(),
                            "[HTTP FAILURE] Error: {:?}, Latency: {}ms",
                            error,
                            latency.as_millis()
                        );
                    },
                ),
        )
        // Outermost after CORS: every request gets an id first
        .layer(axum::middleware::from_fn(stamp_req))
        .layer(cors_layer(&allowed_origins))
}

/// Log server information
fn log_server_info() {
    info!(" CHAT:");
    info!("   • POST /chat            {{message, session_id?, user_id?}}");
    info!("   • POST /api/chat        (alias)");
    info!("   • GET  /api/sessions/{{session_id}}");
    info!(" HEALTH:");
    info!("   • GET  /health, /api/health");
    info!("   • GET  /status, /api/status");
}
// endregion: --- Server Setup
