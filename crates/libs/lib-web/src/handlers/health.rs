//! # Health Handlers

use crate::chat::ChatAppState;
use axum::{extract::State, Json};
use lib_utils::{format_time, now_utc};
use shared::{HealthResponse, StatusResponse};
use std::sync::Arc;

const SERVICE_NAME: &str = "Avatar Chat Bridge";

fn upstream_mode(app_state: &ChatAppState) -> &'static str {
    if app_state.upstream.is_some() {
        "active"
    } else {
        "inactive"
    }
}

/// Liveness probe
pub async fn health(State(app_state): State<Arc<ChatAppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: format_time(now_utc()),
        upstream_status: upstream_mode(&app_state).to_string(),
        service: SERVICE_NAME.to_string(),
    })
}

/// Bridge status with session count and uptime
pub async fn status(State(app_state): State<Arc<ChatAppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        bridge_status: "running".to_string(),
        upstream_configured: app_state.upstream.is_some(),
        sessions_active: app_state.session_count().await,
        uptime_secs: app_state.started_at.elapsed().as_secs(),
        timestamp: format_time(now_utc()),
    })
}

#[cfg(test)]
mod tests {
    use crate::chat::ChatAppState;
    use crate::server::create_router;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use lib_core::Config;
    use shared::{HealthResponse, StatusResponse, TurnRole};
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn get_json<T: serde::de::DeserializeOwned>(app: axum::Router, uri: &str) -> T {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_health_on_both_paths() {
        let state = Arc::new(ChatAppState::with_upstream(Config::default(), None));
        let app = create_router(state, Vec::new());

        for uri in ["/health", "/api/health"] {
            let health: HealthResponse = get_json(app.clone(), uri).await;
            assert_eq!(health.status, "healthy");
            assert_eq!(health.upstream_status, "inactive");
        }
    }

    #[tokio::test]
    async fn test_status_counts_sessions() {
        let state = Arc::new(ChatAppState::with_upstream(Config::default(), None));
        state.record_turn("a", TurnRole::User, "hi").await;
        state.record_turn("b", TurnRole::User, "hi").await;
        let app = create_router(Arc::clone(&state), Vec::new());

        let status: StatusResponse = get_json(app.clone(), "/status").await;
        assert_eq!(status.sessions_active, 2);
        assert!(!status.upstream_configured);

        let aliased: StatusResponse = get_json(app, "/api/status").await;
        assert_eq!(aliased.bridge_status, "running");
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let state = Arc::new(ChatAppState::with_upstream(Config::default(), None));
        let app = create_router(state, Vec::new());

        let response = app
            .oneshot(Request::builder().uri("/nowhere").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
