//! # Chat Data Transfer Objects
//!
//! Request and response structures for the chat endpoints, plus the transcript
//! turn type kept by the bridge.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Chat turn sent by the widget.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// Where a bridge reply came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReplyStatus {
    /// Produced by the upstream AI service
    Active,
    /// Produced locally by the keyword responder
    Fallback,
}

/// Chat reply returned by the bridge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatResponse {
    pub response: String,
    pub session_id: String,
    pub status: ReplyStatus,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

/// Lenient view of any chat reply body.
///
/// Backends disagree on the text field (`response` vs `message`) and on which
/// extras they send, so every field is optional here.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChatReplyEnvelope {
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub metadata: Option<Value>,
}

impl ChatReplyEnvelope {
    /// Reply text, preferring `response` over `message`.
    pub fn text(&self) -> Option<&str> {
        self.response
            .as_deref()
            .or(self.message.as_deref())
    }
}

/// Speaker of a transcript turn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// One entry of a session transcript.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
    pub timestamp: String,
}

/// Full transcript of a bridge session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionTranscript {
    pub session_id: String,
    pub turns: Vec<Turn>,
}

/// Context block forwarded to the upstream AI service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpstreamContext {
    pub user_type: String,
    pub source: String,
    pub session_history: Vec<Turn>,
}

/// Payload the bridge posts to the upstream AI service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpstreamChatRequest {
    pub message: String,
    pub session_id: String,
    pub user_id: String,
    pub context: UpstreamContext,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Displayable text so a widget can render something even on errors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
}
