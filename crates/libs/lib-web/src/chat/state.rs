//! # Chat State Management
//!
//! Manages the bridge's in-memory chat transcripts, one per session id.
//! Transcripts live for the lifetime of the process only.

use crate::chat::upstream::{UpstreamClient, UpstreamError};
use lib_core::Config;
use lib_utils::{format_time, now_utc};
use shared::{FallbackResponder, Turn, TurnRole};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

/// Transcript of a single session
///
/// Turns are kept in arrival order: the user turn is appended before the
/// upstream call, the assistant turn once a reply (real or fallback) exists.
#[derive(Debug, Clone, Default)]
pub struct ChatSession {
    pub turns: Vec<Turn>,
}

impl ChatSession {
    /// Create a new empty session
    pub fn new() -> Self {
        Self { turns: Vec::new() }
    }

    /// Append a turn stamped with the current time
    pub fn add_turn(&mut self, role: TurnRole, content: &str) {
        self.turns.push(Turn {
            role,
            content: content.to_string(),
            timestamp: format_time(now_utc()),
        });
    }

    /// The last `limit` turns, oldest first
    pub fn recent(&self, limit: usize) -> Vec<Turn> {
        let start = self.turns.len().saturating_sub(limit);
        self.turns[start..].to_vec()
    }
}

/// Application state for the chat routes
pub struct ChatAppState {
    pub config: Config,
    pub sessions: Arc<RwLock<HashMap<String, ChatSession>>>,
    pub upstream: Option<UpstreamClient>,
    pub responder: FallbackResponder,
    pub started_at: Instant,
}

impl ChatAppState {
    /// Build state from config, creating the upstream client when one is configured.
    pub fn new(config: Config) -> Result<Self, UpstreamError> {
        let upstream = UpstreamClient::from_config(&config)?;
        Ok(Self::with_upstream(config, upstream))
    }

    pub fn with_upstream(config: Config, upstream: Option<UpstreamClient>) -> Self {
        Self {
            config,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            upstream,
            responder: FallbackResponder::default(),
            started_at: Instant::now(),
        }
    }

    pub async fn record_turn(&self, session_id: &str, role: TurnRole, content: &str) {
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(session_id.to_string())
            .or_insert_with(ChatSession::new)
            .add_turn(role, content);
    }

    /// Most recent turns of a session (empty for unknown sessions)
    pub async fn history(&self, session_id: &str, limit: usize) -> Vec<Turn> {
        let sessions = self.sessions.read().await;
        sessions
            .get(session_id)
            .map(|s| s.recent(limit))
            .unwrap_or_default()
    }

    pub async fn transcript(&self, session_id: &str) -> Option<Vec<Turn>> {
        let sessions = self.sessions.read().await;
        sessions.get(session_id).map(|s| s.turns.clone())
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
