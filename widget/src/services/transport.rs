//! # Chat Transport
//!
//! HTTP client for the chat backends. Each message is POSTed to the preferred
//! endpoint; when that fails and the other endpoint is configured, the same
//! payload is sent there once and the other endpoint becomes preferred.
//!
//! Failovers draw on a retry budget shared by every call on one transport.
//! A success refills it. Each call makes at most `min(2, retries + 1)`
//! attempts, so no sequence of failures can loop.
//!
//! ## Results
//!
//! [`send`](ChatTransport::send) never returns `Err`. It returns a
//! [`TransportResult`]:
//!
//! - `Success`: reply text (or the no-response placeholder when a 2xx body
//!   has no usable text), the session id, and any metadata
//! - `Failure`: the structured reason plus the configured fallback message
//!
//! ## Side Effects
//!
//! After a success the session id is written to storage and the stored
//! conversation context is updated from the reply metadata.

use crate::config::{EndpointConfig, WidgetConfig};
use crate::core::service::ChatService;
use crate::services::storage::{
    load_json, store_json, ConversationContext, Storage, StorageError, StorageKeys,
    UserPreferences,
};
use async_trait::async_trait;
use lib_utils::{format_time, generate_session_id, normalize_message, now_utc};
use parking_lot::Mutex;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use shared::{ChatReplyEnvelope, ChatRequest};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

/// Probe timeout used when an endpoint has none configured
const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

// region: --- Types

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The request never completed (connect error, timeout)
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP error: status {status}")]
    Http { status: u16 },

    /// 2xx with a body that has no usable text
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Every attempt of this call failed
    #[error("Chat service unreachable after {attempts} attempt(s): {last}")]
    Unreachable {
        attempts: u32,
        last: Box<TransportError>,
    },

    /// Empty message, rejected before any request
    #[error("Message is empty")]
    UserInput,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransportResult {
    Success {
        text: String,
        session_id: String,
        metadata: Option<Value>,
    },
    Failure {
        reason: TransportError,
        fallback_message: String,
    },
}

impl TransportResult {
    pub fn is_success(&self) -> bool {
        matches!(self, TransportResult::Success { .. })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConnectionStatus {
    pub connected: bool,
    pub using_fallback: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Primary,
    Fallback,
}

#[derive(Debug, Default)]
struct TransportState {
    session_id: Option<String>,
    status: ConnectionStatus,
    retry_count: u32,
    /// When the fallback became preferred
    fallback_since: Option<Instant>,
}

impl TransportState {
    fn prefer(&mut self, target: Target) {
        let fallback = target == Target::Fallback;
        self.fallback_since = fallback.then(Instant::now);
        self.status.using_fallback = fallback;
    }
}

// endregion: --- Types

/// HTTP chat transport with primary/fallback failover
pub struct ChatTransport {
    client: Client,
    primary: EndpointConfig,
    fallback: Option<EndpointConfig>,
    retries: u32,
    primary_recheck: Duration,
    session_prefix: String,
    user_id: Option<String>,
    fallback_message: String,
    no_response_message: String,
    keys: StorageKeys,
    storage: Arc<dyn Storage>,
    state: Mutex<TransportState>,
}

impl ChatTransport {
    pub fn new(config: &WidgetConfig, storage: Arc<dyn Storage>) -> Self {
        // Timeouts are set per request from the endpoint config
        let client = Client::builder().build().unwrap_or_else(|_| Client::new());

        Self {
            client,
            primary: config.primary.clone(),
            fallback: config.fallback.clone(),
            retries: config.primary.retries,
            primary_recheck: Duration::from_millis(config.primary_recheck_ms),
            session_prefix: config.session_prefix.clone(),
            user_id: config.user_id.clone(),
            fallback_message: config.fallback_message.clone(),
            no_response_message: config.no_response_message.clone(),
            keys: StorageKeys::new(&config.storage_prefix),
            storage,
            state: Mutex::new(TransportState::default()),
        }
    }

    fn endpoint(&self, target: Target) -> Option<&EndpointConfig> {
        match target {
            Target::Primary => Some(&self.primary),
            Target::Fallback => self.fallback.as_ref(),
        }
    }

    /// Preferred endpoint first, then the other one if configured.
    ///
    /// Once the fallback has been preferred for `primary_recheck`, the primary
    /// goes first again. The second flag is set for such a recheck.
    fn attempt_order(&self) -> (Vec<Target>, bool) {
        let (prefer_fallback, recheck) = {
            let state = self.state.lock();
            let on_fallback = state.status.using_fallback && self.fallback.is_some();
            let due = state
                .fallback_since
                .is_some_and(|since| since.elapsed() >= self.primary_recheck);
            (on_fallback && !due, on_fallback && due)
        };
        let order = if prefer_fallback {
            [Target::Fallback, Target::Primary]
        } else {
            [Target::Primary, Target::Fallback]
        };
        let order = order
            .into_iter()
            .filter(|t| self.endpoint(*t).is_some())
            .collect();
        (order, recheck)
    }

    /// Explicit id, else in-memory, else stored, else a fresh one.
    fn resolve_session(&self, explicit: Option<&str>) -> String {
        if let Some(id) = explicit.map(str::trim).filter(|id| !id.is_empty()) {
            return id.to_string();
        }

        let mut state = self.state.lock();
        if let Some(id) = &state.session_id {
            return id.clone();
        }

        let id = self
            .stored_session()
            .unwrap_or_else(|| generate_session_id(&self.session_prefix));
        state.session_id = Some(id.clone());
        id
    }

    fn stored_session(&self) -> Option<String> {
        match self.storage.get(&self.keys.session) {
            Ok(id) => id.filter(|id| !id.trim().is_empty()),
            Err(e) => {
                tracing::warn!(error = %e, "Could not read stored session");
                None
            }
        }
    }

    async fn post(
        &self,
        endpoint: &EndpointConfig,
        request: &ChatRequest,
    ) -> Result<String, TransportError> {
        let mut builder = self.client.post(endpoint.chat_url()).json(request);
        if let Some(ms) = endpoint.timeout_ms {
            builder = builder.timeout(Duration::from_millis(ms));
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Http {
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))
    }

    /// Send one chat message.
    #[tracing::instrument(skip(self, message), fields(message_len = message.len()))]
    pub async fn send(&self, message: &str, session_id: Option<&str>) -> TransportResult {
        let Some(message) = normalize_message(message) else {
            return self.failure(TransportError::UserInput);
        };

        let session_id = self.resolve_session(session_id);
        let request = ChatRequest {
            message: message.to_string(),
            session_id: Some(session_id.clone()),
            user_id: self.user_id.clone(),
        };

        let mut attempts = 0;
        let mut last_error = None;

        let (order, recheck) = self.attempt_order();
        if recheck {
            tracing::debug!("Rechecking primary endpoint");
        }

        for (i, target) in order.into_iter().enumerate() {
            let Some(endpoint) = self.endpoint(target) else {
                continue;
            };

            // Returning to the fallback after a failed recheck is free
            if i > 0 && !recheck {
                let mut state = self.state.lock();
                if state.retry_count >= self.retries {
                    tracing::warn!(
                        retries = self.retries,
                        "Retry budget exhausted, not failing over"
                    );
                    break;
                }
                state.retry_count += 1;
                state.prefer(target);
                tracing::info!(target = ?target, retry = state.retry_count, "Failing over");
            } else if i > 0 {
                self.state.lock().prefer(target);
            }

            attempts += 1;
            match self.post(endpoint, &request).await {
                Ok(body) => {
                    if recheck && i == 0 {
                        tracing::info!("Primary endpoint recovered");
                        self.state.lock().prefer(Target::Primary);
                    }
                    return self.on_success(&body, session_id);
                }
                Err(e) => {
                    tracing::warn!(target = ?target, error = %e, "Chat request failed");
                    last_error = Some(e);
                }
            }
        }

        self.state.lock().status.connected = false;

        let last = last_error
            .unwrap_or_else(|| TransportError::Network("no endpoint attempted".to_string()));
        self.failure(TransportError::Unreachable {
            attempts,
            last: Box::new(last),
        })
    }

    fn failure(&self, reason: TransportError) -> TransportResult {
        TransportResult::Failure {
            reason,
            fallback_message: self.fallback_message.clone(),
        }
    }

    fn on_success(&self, body: &str, sent_session: String) -> TransportResult {
        let (text, envelope) = match parse_reply(body) {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(error = %e, "Using placeholder for unusable reply");
                (self.no_response_message.clone(), ChatReplyEnvelope::default())
            }
        };

        let session_id = envelope
            .session_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or(sent_session);

        {
            let mut state = self.state.lock();
            state.session_id = Some(session_id.clone());
            state.retry_count = 0;
            state.status.connected = true;
        }

        if let Err(e) = self.persist(&session_id, envelope.metadata.as_ref()) {
            tracing::warn!(error = %e, "Could not persist session");
        }

        TransportResult::Success {
            text,
            session_id,
            metadata: envelope.metadata,
        }
    }

    fn persist(&self, session_id: &str, metadata: Option<&Value>) -> Result<(), StorageError> {
        self.storage.set(&self.keys.session, session_id)?;

        let mut context: ConversationContext = load_json(self.storage.as_ref(), &self.keys.context);
        context.record(metadata, format_time(now_utc()));
        store_json(self.storage.as_ref(), &self.keys.context, &context)
    }

    async fn probe(&self, endpoint: &EndpointConfig) -> bool {
        let timeout = endpoint
            .timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_PROBE_TIMEOUT);

        match self.client.get(endpoint.status_url()).timeout(timeout).send().await {
            Ok(response) => response.status() == StatusCode::OK,
            Err(e) => {
                tracing::debug!(url = %endpoint.status_url(), error = %e, "Status probe failed");
                false
            }
        }
    }

    /// Probe the primary, then the fallback, and prefer the first that answers.
    #[tracing::instrument(skip(self))]
    pub async fn initialize(&self) -> ConnectionStatus {
        let status = if self.probe(&self.primary).await {
            ConnectionStatus {
                connected: true,
                using_fallback: false,
            }
        } else {
            match &self.fallback {
                Some(fallback) if self.probe(fallback).await => ConnectionStatus {
                    connected: true,
                    using_fallback: true,
                },
                _ => ConnectionStatus::default(),
            }
        };

        tracing::info!(
            connected = status.connected,
            using_fallback = status.using_fallback,
            "Transport initialized"
        );
        let mut state = self.state.lock();
        state.status.connected = status.connected;
        state.prefer(if status.using_fallback { Target::Fallback } else { Target::Primary });
        status
    }

    pub fn status(&self) -> ConnectionStatus {
        self.state.lock().status
    }

    pub fn current_session(&self) -> Option<String> {
        let in_memory = self.state.lock().session_id.clone();
        in_memory.or_else(|| self.stored_session())
    }

    /// Forget the session and conversation context.
    pub fn clear_session(&self) -> Result<(), StorageError> {
        self.state.lock().session_id = None;
        self.storage.remove(&self.keys.session)?;
        self.storage.remove(&self.keys.context)
    }

    pub fn preferences(&self) -> UserPreferences {
        load_json(self.storage.as_ref(), &self.keys.preferences)
    }

    /// Merge `patch` into the stored preferences and return the result.
    pub fn save_preferences(
        &self,
        patch: UserPreferences,
    ) -> Result<UserPreferences, StorageError> {
        let mut preferences = self.preferences();
        preferences.merge(patch);
        store_json(self.storage.as_ref(), &self.keys.preferences, &preferences)?;
        Ok(preferences)
    }

    pub fn conversation_context(&self) -> ConversationContext {
        load_json(self.storage.as_ref(), &self.keys.context)
    }
}

/// Reply text (`response`, else `message`) and the parsed envelope
fn parse_reply(body: &str) -> Result<(String, ChatReplyEnvelope), TransportError> {
    let envelope: ChatReplyEnvelope = serde_json::from_str(body)
        .map_err(|e| TransportError::MalformedResponse(e.to_string()))?;

    let text = envelope
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| TransportError::MalformedResponse("reply has no text".to_string()))?
        .to_string();

    Ok((text, envelope))
}

#[async_trait]
impl ChatService for ChatTransport {
    async fn send(&self, message: &str, session_id: Option<&str>) -> TransportResult {
        ChatTransport::send(self, message, session_id).await
    }

    async fn initialize(&self) -> ConnectionStatus {
        ChatTransport::initialize(self).await
    }

    fn status(&self) -> ConnectionStatus {
        ChatTransport::status(self)
    }

    fn current_session(&self) -> Option<String> {
        ChatTransport::current_session(self)
    }
}

#[cfg(test)]
mod tests;
