//! # Transport Tests
//!
//! Each test serves throwaway axum endpoints on `127.0.0.1:0` and points a
//! transport at them.

use super::*;
use crate::services::storage::MemoryStorage;
use axum::http::StatusCode as AxumStatus;
use axum::routing::{get, post};
use axum::{Json, Router};
use lib_utils::is_session_id;
use serde_json::json;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

// region: --- Helpers

/// What a mock endpoint has received
#[derive(Clone, Default)]
struct Recorder {
    hits: Arc<AtomicUsize>,
    bodies: Arc<Mutex<Vec<Value>>>,
}

impl Recorder {
    fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    fn session_ids(&self) -> Vec<String> {
        self.bodies
            .lock()
            .iter()
            .map(|b| b["session_id"].as_str().unwrap_or_default().to_string())
            .collect()
    }
}

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Endpoint answering every chat POST with `status` + `body`, and status probes with `probe`
async fn spawn_endpoint(status: AxumStatus, body: Value, probe: AxumStatus) -> (String, Recorder) {
    let recorder = Recorder::default();
    let handler_recorder = recorder.clone();
    let handler = move |Json(request): Json<Value>| {
        let recorder = handler_recorder.clone();
        let body = body.clone();
        async move {
            recorder.hits.fetch_add(1, Ordering::SeqCst);
            recorder.bodies.lock().push(request);
            (status, Json(body))
        }
    };

    let router = Router::new()
        .route("/chat", post(handler.clone()))
        .route("/chat/send", post(handler))
        .route("/status", get(move || async move { probe }));

    (serve(router).await, recorder)
}

async fn ok_endpoint(body: Value) -> (String, Recorder) {
    spawn_endpoint(AxumStatus::OK, body, AxumStatus::OK).await
}

async fn failing_endpoint() -> (String, Recorder) {
    spawn_endpoint(
        AxumStatus::INTERNAL_SERVER_ERROR,
        json!({ "error": "boom" }),
        AxumStatus::SERVICE_UNAVAILABLE,
    )
    .await
}

/// Endpoint that answers or fails depending on the returned flag
async fn switchable_endpoint(reply: &str) -> (String, Recorder, Arc<AtomicBool>) {
    let recorder = Recorder::default();
    let healthy = Arc::new(AtomicBool::new(false));

    let (chat_recorder, chat_healthy) = (recorder.clone(), Arc::clone(&healthy));
    let reply = reply.to_string();
    let chat = move |Json(request): Json<Value>| {
        let recorder = chat_recorder.clone();
        let healthy = chat_healthy.load(Ordering::SeqCst);
        let reply = reply.clone();
        async move {
            recorder.hits.fetch_add(1, Ordering::SeqCst);
            recorder.bodies.lock().push(request);
            if healthy {
                (AxumStatus::OK, Json(json!({ "response": reply })))
            } else {
                (AxumStatus::INTERNAL_SERVER_ERROR, Json(json!({ "error": "down" })))
            }
        }
    };

    let probe_healthy = Arc::clone(&healthy);
    let probe = move || {
        let healthy = probe_healthy.load(Ordering::SeqCst);
        async move {
            if healthy {
                AxumStatus::OK
            } else {
                AxumStatus::SERVICE_UNAVAILABLE
            }
        }
    };

    let router = Router::new()
        .route("/chat", post(chat))
        .route("/status", get(probe));

    (serve(router).await, recorder, healthy)
}

/// Base URL where nothing listens
async fn dead_endpoint() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

fn config(primary: &str, fallback: Option<&str>, retries: u32) -> WidgetConfig {
    WidgetConfig {
        primary: EndpointConfig {
            retries,
            timeout_ms: Some(2_000),
            ..EndpointConfig::new(primary, "/chat")
        },
        fallback: fallback.map(|url| EndpointConfig {
            timeout_ms: Some(2_000),
            ..EndpointConfig::new(url, "/chat/send")
        }),
        ..Default::default()
    }
}

fn transport(config: &WidgetConfig) -> (ChatTransport, Arc<MemoryStorage>) {
    let storage = Arc::new(MemoryStorage::new());
    (ChatTransport::new(config, storage.clone()), storage)
}

// endregion: --- Helpers

#[tokio::test]
async fn test_happy_path_stores_generated_session() {
    // Arrange
    let (primary, recorder) = ok_endpoint(json!({ "response": "Hello!" })).await;
    let (transport, storage) = transport(&config(&primary, None, 3));

    // Act
    let result = transport.send("Hi", None).await;

    // Assert
    let TransportResult::Success { text, session_id, .. } = result else {
        panic!("expected success");
    };
    assert_eq!(text, "Hello!");
    assert!(is_session_id(&session_id, "website_session"), "bad id: {session_id}");
    assert_eq!(storage.get("chatbot_session").unwrap(), Some(session_id.clone()));
    assert_eq!(recorder.session_ids(), vec![session_id]);
    assert!(transport.status().connected);
}

#[tokio::test]
async fn test_session_is_reused_across_calls_and_reloads() {
    let (primary, recorder) = ok_endpoint(json!({ "response": "ok" })).await;
    let config = config(&primary, None, 3);
    let (transport, storage) = transport(&config);

    transport.send("first", None).await;
    transport.send("second", None).await;

    // A fresh transport over the same storage, as after a page reload
    let reloaded = ChatTransport::new(&config, storage.clone());
    assert_eq!(reloaded.current_session(), transport.current_session());
    reloaded.send("third", None).await;

    let ids = recorder.session_ids();
    assert_eq!(ids.len(), 3);
    assert!(ids.iter().all(|id| id == &ids[0]));
    assert_eq!(storage.get("chatbot_session").unwrap().as_deref(), Some(ids[0].as_str()));
}

#[tokio::test]
async fn test_explicit_and_server_session_ids() {
    let (primary, recorder) =
        ok_endpoint(json!({ "response": "ok", "session_id": "server_assigned" })).await;
    let (transport, storage) = transport(&config(&primary, None, 3));

    let result = transport.send("Hi", Some("caller_chosen")).await;

    assert_eq!(recorder.session_ids(), vec!["caller_chosen"]);
    assert!(matches!(
        result,
        TransportResult::Success { ref session_id, .. } if session_id == "server_assigned"
    ));
    assert_eq!(storage.get("chatbot_session").unwrap().as_deref(), Some("server_assigned"));
}

#[tokio::test]
async fn test_alternate_message_field() {
    let (primary, _) = ok_endpoint(json!({ "message": "from message field" })).await;
    let (transport, _) = transport(&config(&primary, None, 3));

    let result = transport.send("Hi", None).await;

    assert!(matches!(
        result,
        TransportResult::Success { ref text, .. } if text == "from message field"
    ));
}

#[tokio::test]
async fn test_malformed_reply_uses_placeholder() {
    let (primary, _) = ok_endpoint(json!({ "status": "ok" })).await;
    let (transport, _) = transport(&config(&primary, None, 3));

    let result = transport.send("Hi", None).await;
    assert!(matches!(result, TransportResult::Success { ref text, .. } if text == "no response"));

    let router = Router::new().route("/chat", post(|| async { "not json at all" }));
    let plain = serve(router).await;
    let (transport, _) = self::transport(&config(&plain, None, 3));

    let result = transport.send("Hi", None).await;
    assert!(matches!(result, TransportResult::Success { ref text, .. } if text == "no response"));
}

#[tokio::test]
async fn test_fails_over_to_fallback() {
    let (primary, primary_hits) = failing_endpoint().await;
    let (fallback, fallback_hits) = ok_endpoint(json!({ "response": "from fallback" })).await;
    let (transport, _) = transport(&config(&primary, Some(&fallback), 3));

    let result = transport.send("Hi", None).await;

    assert!(matches!(result, TransportResult::Success { ref text, .. } if text == "from fallback"));
    assert_eq!(primary_hits.hits(), 1);
    assert_eq!(fallback_hits.hits(), 1);
    assert!(transport.status().using_fallback);

    // Fallback is now preferred
    transport.send("again", None).await;
    assert_eq!(primary_hits.hits(), 1);
    assert_eq!(fallback_hits.hits(), 2);
}

#[tokio::test]
async fn test_full_outage_returns_configured_message() {
    let primary = dead_endpoint().await;
    let fallback = dead_endpoint().await;
    let config = config(&primary, Some(&fallback), 3);
    let (transport, storage) = transport(&config);

    let result = transport.send("Hi", None).await;

    let TransportResult::Failure { reason, fallback_message } = result else {
        panic!("expected failure");
    };
    assert_eq!(fallback_message, config.fallback_message);
    assert!(matches!(
        reason,
        TransportError::Unreachable { attempts: 2, ref last }
            if matches!(**last, TransportError::Network(_))
    ));
    assert_eq!(storage.get("chatbot_session").unwrap(), None);
    assert!(!transport.status().connected);
}

#[tokio::test]
async fn test_attempts_never_exceed_retries_plus_one() {
    for retries in [0, 1, 3] {
        let (primary, primary_hits) = failing_endpoint().await;
        let (fallback, fallback_hits) = failing_endpoint().await;
        let (transport, _) = transport(&config(&primary, Some(&fallback), retries));

        let result = transport.send("Hi", None).await;

        assert!(!result.is_success());
        let total = primary_hits.hits() + fallback_hits.hits();
        assert!((total as u32) <= retries + 1, "retries={retries} made {total} attempts");
        assert!(total <= 2);
        assert_eq!(primary_hits.hits(), 1);
    }
}

#[tokio::test]
async fn test_retry_budget_is_shared_until_success() {
    let (primary, primary_hits) = failing_endpoint().await;
    let (fallback, fallback_hits) = failing_endpoint().await;
    let (transport, _) = transport(&config(&primary, Some(&fallback), 1));

    // First call spends the only retry on the failover
    let first = transport.send("one", None).await;
    assert!(matches!(
        first,
        TransportResult::Failure { reason: TransportError::Unreachable { attempts: 2, .. }, .. }
    ));

    // Second call starts on the now-preferred fallback and may not fail over
    let second = transport.send("two", None).await;
    assert!(matches!(
        second,
        TransportResult::Failure { reason: TransportError::Unreachable { attempts: 1, .. }, .. }
    ));
    assert_eq!(primary_hits.hits(), 1);
    assert_eq!(fallback_hits.hits(), 2);
}

#[tokio::test]
async fn test_http_error_is_reported() {
    let (primary, _) = failing_endpoint().await;
    let (transport, _) = transport(&config(&primary, None, 3));

    let result = transport.send("Hi", None).await;

    assert!(matches!(
        result,
        TransportResult::Failure {
            reason: TransportError::Unreachable { attempts: 1, ref last },
            ..
        } if **last == TransportError::Http { status: 500 }
    ));
}

#[tokio::test]
async fn test_empty_message_never_hits_network() {
    let (primary, recorder) = ok_endpoint(json!({ "response": "ok" })).await;
    let (transport, _) = transport(&config(&primary, None, 3));

    let result = transport.send("   ", None).await;

    assert!(matches!(
        result,
        TransportResult::Failure { reason: TransportError::UserInput, .. }
    ));
    assert_eq!(recorder.hits(), 0);
}

#[tokio::test]
async fn test_initialize_prefers_live_endpoint() {
    let (primary, primary_hits) = failing_endpoint().await;
    let (fallback, fallback_hits) = ok_endpoint(json!({ "response": "ok" })).await;
    let (transport, _) = transport(&config(&primary, Some(&fallback), 3));

    let status = transport.initialize().await;

    assert_eq!(
        status,
        ConnectionStatus {
            connected: true,
            using_fallback: true
        }
    );
    transport.send("Hi", None).await;
    assert_eq!(primary_hits.hits(), 0);
    assert_eq!(fallback_hits.hits(), 1);
}

#[tokio::test]
async fn test_initialize_with_everything_down() {
    let (primary, fallback) = (dead_endpoint().await, dead_endpoint().await);
    let (transport, _) = transport(&config(&primary, Some(&fallback), 3));

    assert_eq!(transport.initialize().await, ConnectionStatus::default());
}

#[tokio::test]
async fn test_context_tracks_metadata_and_clears() {
    let (primary, _) = ok_endpoint(json!({
        "response": "Here are the projects",
        "metadata": { "intent": "portfolio", "workflow_step": 3 }
    }))
    .await;
    let (transport, storage) = transport(&config(&primary, None, 3));

    transport.send("show me projects", None).await;

    let context = transport.conversation_context();
    assert_eq!(context.topics_discussed, vec!["portfolio"]);
    assert_eq!(context.conversation_flow, "step_3");
    assert!(context.last_interaction.is_some());

    transport.clear_session().unwrap();
    assert_eq!(storage.get("chatbot_session").unwrap(), None);
    assert_eq!(storage.get("chatbot_conversation_context").unwrap(), None);
    assert_eq!(transport.current_session(), None);
}

#[tokio::test]
async fn test_preferences_are_merged() {
    let (transport, storage) = transport(&WidgetConfig::default());

    transport
        .save_preferences(UserPreferences {
            theme: Some("dark".to_string()),
            ..Default::default()
        })
        .unwrap();
    let merged = transport
        .save_preferences(UserPreferences {
            language: Some("fr".to_string()),
            ..Default::default()
        })
        .unwrap();

    assert_eq!(merged.theme.as_deref(), Some("dark"));
    assert_eq!(merged.language.as_deref(), Some("fr"));
    assert_eq!(transport.preferences(), merged);
    assert!(storage.get("chatbot_user_preferences").unwrap().is_some());
}

#[tokio::test]
async fn test_primary_is_rechecked_after_window() {
    // Arrange
    let (primary, primary_rec, primary_up) = switchable_endpoint("from primary").await;
    let (fallback, fallback_rec) = ok_endpoint(json!({ "response": "from fallback" })).await;
    let config = WidgetConfig {
        primary_recheck_ms: 200,
        ..config(&primary, Some(&fallback), 3)
    };
    let (transport, _) = transport(&config);

    // Act: fail over, then stay on the fallback inside the window
    assert!(matches!(transport.send("one", None).await, TransportResult::Success { .. }));
    assert!(matches!(transport.send("two", None).await, TransportResult::Success { .. }));

    // Assert
    assert_eq!(primary_rec.hits(), 1);
    assert_eq!(fallback_rec.hits(), 2);
    assert!(transport.status().using_fallback);

    // Act: primary comes back and the window passes
    primary_up.store(true, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(250)).await;
    let result = transport.send("three", None).await;

    // Assert
    assert!(matches!(
        result,
        TransportResult::Success { ref text, .. } if text == "from primary"
    ));
    assert_eq!(primary_rec.hits(), 2);
    assert_eq!(fallback_rec.hits(), 2);
    assert!(!transport.status().using_fallback);

    // Later messages stay on the primary
    transport.send("four", None).await;
    assert_eq!(primary_rec.hits(), 3);
    assert_eq!(fallback_rec.hits(), 2);
}

#[tokio::test]
async fn test_failed_recheck_returns_to_fallback_for_free() {
    // Arrange: no failover budget at all
    let (primary, primary_rec, _) = switchable_endpoint("from primary").await;
    let (fallback, fallback_rec) = ok_endpoint(json!({ "response": "from fallback" })).await;
    let config = WidgetConfig {
        primary_recheck_ms: 100,
        ..config(&primary, Some(&fallback), 0)
    };
    let (transport, _) = transport(&config);

    let status = transport.initialize().await;
    assert!(status.connected && status.using_fallback);

    // Act
    tokio::time::sleep(Duration::from_millis(150)).await;
    let result = transport.send("hello", None).await;

    // Assert
    assert!(matches!(
        result,
        TransportResult::Success { ref text, .. } if text == "from fallback"
    ));
    assert_eq!(primary_rec.hits(), 1);
    assert_eq!(fallback_rec.hits(), 1);
    assert!(transport.status().using_fallback);

    // The window restarts, so the next message skips the primary
    transport.send("again", None).await;
    assert_eq!(primary_rec.hits(), 1);
    assert_eq!(fallback_rec.hits(), 2);
}
