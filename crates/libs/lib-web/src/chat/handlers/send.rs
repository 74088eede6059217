//! # Chat Turn Handler
//!
//! Handler for `POST /chat` and `POST /api/chat`.
//!
//! The reply always carries text. When the upstream is unset or fails, the
//! keyword responder answers and the reply is marked `fallback`.

use crate::chat::state::ChatAppState;
use axum::{extract::State, Json};
use lib_core::{AppError, Result};
use lib_utils::{format_time, generate_session_id, normalize_message, now_utc};
use shared::{preview, ChatRequest, ChatResponse, ReplyStatus, TurnRole};
use std::sync::Arc;

/// Handle one chat turn
pub async fn send_chat(
    State(app_state): State<Arc<ChatAppState>>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>> {
    let message = normalize_message(&req.message)
        .ok_or(AppError::EmptyMessage)?
        .to_string();

    let session_id = req
        .session_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| generate_session_id(&app_state.config.session_prefix));

    tracing::info!(
        session_id = %session_id,
        "💬 Chat message: {}",
        preview(&message, 60)
    );

    app_state.record_turn(&session_id, TurnRole::User, &message).await;

    let (response, status, metadata) = match &app_state.upstream {
        Some(upstream) => {
            let history = app_state
                .history(&session_id, app_state.config.context_window)
                .await;
            let user_id = req
                .user_id
                .unwrap_or_else(|| app_state.config.upstream_user_id.clone());

            match upstream.send(&message, &session_id, &user_id, history).await {
                Ok(reply) => (reply.text, ReplyStatus::Active, reply.metadata),
                Err(e) => {
                    tracing::warn!(
                        session_id = %session_id,
                        error = %e,
                        "Upstream unavailable, answering with fallback reply"
                    );
                    (app_state.responder.respond(&message), ReplyStatus::Fallback, None)
                }
            }
        }
        None => (app_state.responder.respond(&message), ReplyStatus::Fallback, None),
    };

    app_state
        .record_turn(&session_id, TurnRole::Assistant, &response)
        .await;

    tracing::debug!(session_id = %session_id, status = ?status, "Reply ready");

    Ok(Json(ChatResponse {
        response,
        session_id,
        status,
        timestamp: format_time(now_utc()),
        metadata,
    }))
}
