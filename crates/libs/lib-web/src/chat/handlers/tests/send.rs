//! # Chat Turn Tests

use super::*;
use axum::http::StatusCode;
use axum::routing::post;
use axum::Json;
use lib_core::error::EMPTY_MESSAGE_REPLY;
use lib_utils::is_session_id;
use serde_json::json;
use shared::{respond, ChatResponse, ErrorResponse, ReplyStatus, TurnRole};
use std::sync::Mutex;
use tower::ServiceExt;

#[tokio::test]
async fn test_empty_message_is_rejected() {
    // Arrange
    let (app, state) = test_app();

    // Act
    let response = app
        .oneshot(post_json("/chat", json!({ "message": "   " })))
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: ErrorResponse = read_json(response).await;
    assert_eq!(error.error, "Message is required");
    assert_eq!(error.response.as_deref(), Some(EMPTY_MESSAGE_REPLY));
    assert_eq!(state.session_count().await, 0);
}

#[tokio::test]
async fn test_without_upstream_answers_with_fallback() {
    let (app, state) = test_app();

    let response = app
        .oneshot(post_json("/chat", json!({ "message": "Hello there" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let reply: ChatResponse = read_json(response).await;
    assert_eq!(reply.status, ReplyStatus::Fallback);
    assert_eq!(reply.response, respond("Hello there"));
    assert!(is_session_id(&reply.session_id, "session"), "bad id: {}", reply.session_id);

    let turns = state.transcript(&reply.session_id).await.unwrap();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].role, TurnRole::User);
    assert_eq!(turns[0].content, "Hello there");
    assert_eq!(turns[1].role, TurnRole::Assistant);
}

#[tokio::test]
async fn test_upstream_reply_is_forwarded_with_history() {
    // Arrange: an upstream that records what it receives
    let seen: Arc<Mutex<Vec<Value>>> = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::clone(&seen);
    let upstream = Router::new().route(
        "/chat/send",
        post(move |Json(body): Json<Value>| {
            let recorder = Arc::clone(&recorder);
            async move {
                recorder.lock().unwrap().push(body);
                Json(json!({
                    "response": "Hi from upstream",
                    "metadata": { "intent": "greeting" }
                }))
            }
        }),
    );
    let base_url = spawn_upstream(upstream).await;
    let (app, state) = test_app_with_upstream(&base_url);

    // Act
    let response = app
        .oneshot(post_json(
            "/api/chat",
            json!({ "message": "Hi", "session_id": "website_session_1_abc" }),
        ))
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    let reply: ChatResponse = read_json(response).await;
    assert_eq!(reply.status, ReplyStatus::Active);
    assert_eq!(reply.response, "Hi from upstream");
    assert_eq!(reply.session_id, "website_session_1_abc");
    assert_eq!(reply.metadata, Some(json!({ "intent": "greeting" })));

    let requests = seen.lock().unwrap().clone();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["user_id"], "website_user");
    assert_eq!(requests[0]["session_id"], "website_session_1_abc");
    assert_eq!(requests[0]["context"]["session_history"][0]["content"], "Hi");

    assert_eq!(state.transcript("website_session_1_abc").await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_upstream_message_field_is_accepted() {
    let upstream = Router::new().route(
        "/chat/send",
        post(|| async { Json(json!({ "message": "alternate field" })) }),
    );
    let base_url = spawn_upstream(upstream).await;
    let (app, _) = test_app_with_upstream(&base_url);

    let response = app
        .oneshot(post_json("/chat", json!({ "message": "anything" })))
        .await
        .unwrap();

    let reply: ChatResponse = read_json(response).await;
    assert_eq!(reply.status, ReplyStatus::Active);
    assert_eq!(reply.response, "alternate field");
}

#[tokio::test]
async fn test_upstream_down_still_returns_ok() {
    let base_url = dead_upstream().await;
    let (app, _) = test_app_with_upstream(&base_url);

    let response = app
        .oneshot(post_json("/chat", json!({ "message": "thank you" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let reply: ChatResponse = read_json(response).await;
    assert_eq!(reply.status, ReplyStatus::Fallback);
    assert_eq!(reply.response, respond("thank you"));
}

#[tokio::test]
async fn test_upstream_error_status_falls_back() {
    let upstream = Router::new().route(
        "/chat/send",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let base_url = spawn_upstream(upstream).await;
    let (app, _) = test_app_with_upstream(&base_url);

    let response = app
        .oneshot(post_json("/chat", json!({ "message": "goodbye" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let reply: ChatResponse = read_json(response).await;
    assert_eq!(reply.status, ReplyStatus::Fallback);
    assert_eq!(reply.response, respond("goodbye"));
}
