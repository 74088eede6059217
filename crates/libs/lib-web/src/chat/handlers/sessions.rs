//! # Session Transcript Handler

use crate::chat::state::ChatAppState;
use axum::{
    extract::{Path, State},
    Json,
};
use lib_core::{AppError, Result};
use shared::SessionTranscript;
use std::sync::Arc;

/// `GET /api/sessions/{session_id}`: the recorded turns of one session
pub async fn get_session(
    Path(session_id): Path<String>,
    State(app_state): State<Arc<ChatAppState>>,
) -> Result<Json<SessionTranscript>> {
    let turns = app_state
        .transcript(&session_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session {} not found", session_id)))?;

    Ok(Json(SessionTranscript { session_id, turns }))
}
