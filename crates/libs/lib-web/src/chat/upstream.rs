//! # Upstream AI Client
//!
//! Forwards a visitor message, together with recent session history, to the
//! AI service behind the bridge and extracts the reply text.
//!
//! Any failure here (network, timeout, non-2xx status, unusable body) is
//! reported as an [`UpstreamError`]; the chat handler answers with a local
//! fallback reply instead.

use lib_core::Config;
use serde_json::Value;
use shared::{ChatReplyEnvelope, Turn, UpstreamChatRequest, UpstreamContext};
use std::time::Duration;
use thiserror::Error;

/// Longest reply passed back to the widget, in characters
const MAX_RESPONSE_LENGTH: usize = 1000;

/// Context labels attached to every upstream request
const USER_TYPE: &str = "website_visitor";
const SOURCE: &str = "avatar_chat_widget";

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("Failed to build HTTP client: {0}")]
    Client(reqwest::Error),

    #[error("Upstream request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Upstream returned status {0}")]
    Status(u16),

    #[error("Upstream reply had no usable text")]
    EmptyReply,
}

/// Reply extracted from the upstream body
#[derive(Debug, Clone)]
pub struct UpstreamReply {
    pub text: String,
    pub metadata: Option<Value>,
}

/// HTTP client for the upstream chat endpoint
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
    chat_url: String,
}

impl UpstreamClient {
    /// Create a client for the configured upstream, or `None` when no upstream is set.
    pub fn from_config(config: &Config) -> Result<Option<Self>, UpstreamError> {
        match config.upstream_chat_url() {
            Some(chat_url) => Ok(Some(Self::new(
                chat_url,
                Duration::from_millis(config.upstream_timeout_ms),
            )?)),
            None => Ok(None),
        }
    }

    pub fn new(chat_url: String, timeout: Duration) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(UpstreamError::Client)?;

        Ok(Self { client, chat_url })
    }

    pub fn chat_url(&self) -> &str {
        &self.chat_url
    }

    /// Send one message upstream and return the cleaned reply
    pub async fn send(
        &self,
        message: &str,
        session_id: &str,
        user_id: &str,
        history: Vec<Turn>,
    ) -> Result<UpstreamReply, UpstreamError> {
        let request = UpstreamChatRequest {
            message: message.to_string(),
            session_id: session_id.to_string(),
            user_id: user_id.to_string(),
            context: UpstreamContext {
                user_type: USER_TYPE.to_string(),
                source: SOURCE.to_string(),
                session_history: history,
            },
        };

        tracing::debug!(
            session_id = %session_id,
            history_len = request.context.session_history.len(),
            "Calling upstream {}",
            self.chat_url
        );

        let response = self.client.post(&self.chat_url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status.as_u16()));
        }

        let envelope: ChatReplyEnvelope = response.json().await?;
        let text = envelope
            .text()
            .map(clean_reply)
            .filter(|t| !t.is_empty())
            .ok_or(UpstreamError::EmptyReply)?;

        Ok(UpstreamReply {
            text,
            metadata: envelope.metadata,
        })
    }
}

/// Strip assistant boilerplate and cap the reply length, cutting at a sentence
/// or word boundary where one exists.
fn clean_reply(raw: &str) -> String {
    let text = raw
        .trim()
        .replace("As an AI assistant, ", "")
        .replace("As an AI, ", "")
        .replace("As a language model, ", "");
    let text = text.trim();

    let Some((limit, _)) = text.char_indices().nth(MAX_RESPONSE_LENGTH) else {
        return text.to_string();
    };

    // Boundaries in the first half of the limit would drop most of the reply
    let head = &text[..limit];
    let min_cut = head.len() / 2;
    if let Some(cut) = head.rfind('.').filter(|&cut| cut >= min_cut) {
        format!("{}...", &head[..=cut])
    } else if let Some(cut) = head.rfind(' ').filter(|&cut| cut >= min_cut) {
        format!("{}...", head[..cut].trim_end())
    } else {
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_reply_strips_boilerplate() {
        assert_eq!(clean_reply("  As an AI, I like Rust. "), "I like Rust.");
        assert_eq!(clean_reply("plain"), "plain");
    }

    #[test]
    fn test_clean_reply_cuts_long_text_at_late_sentence() {
        let long = format!("{}Done. {}", "word ".repeat(150), "more ".repeat(200));
        let cleaned = clean_reply(&long);
        assert!(cleaned.ends_with("Done...."));
        assert_eq!(cleaned.chars().count(), 150 * 5 + "Done....".len());
    }

    #[test]
    fn test_clean_reply_ignores_early_sentence_end() {
        let long = format!("Sure. {}", "word ".repeat(400));
        let cleaned = clean_reply(&long);
        let kept = cleaned.chars().count();
        assert!(kept >= MAX_RESPONSE_LENGTH - 10, "kept only {kept} chars");
        assert!(kept <= MAX_RESPONSE_LENGTH + 3);
        assert!(cleaned.ends_with("word..."));
    }

    #[test]
    fn test_clean_reply_is_char_safe() {
        let long = "é".repeat(MAX_RESPONSE_LENGTH + 10);
        let cleaned = clean_reply(&long);
        assert_eq!(cleaned.chars().count(), MAX_RESPONSE_LENGTH + 3);
    }

    #[test]
    fn test_from_config_without_upstream() {
        let client = UpstreamClient::from_config(&Config::default()).unwrap();
        assert!(client.is_none());
    }
}
