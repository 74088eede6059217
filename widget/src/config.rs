//! # Widget Configuration
//!
//! Every option is optional: [`WidgetConfig`] deserializes with serde defaults,
//! so an embedding page can pass a partial JSON object and get sensible values
//! for the rest.
//!
//! ```rust
//! use widget::config::WidgetConfig;
//!
//! let config = WidgetConfig::from_json(r#"{ "avatar_name": "Nova", "auto_open": true }"#).unwrap();
//! assert_eq!(config.avatar_name, "Nova");
//! assert_eq!(config.bubble_timeout_ms, 5000);
//! ```
//!
//! Runtime hooks cannot come from JSON and live in [`Callbacks`].

use crate::core::error::{Result, WidgetError};
use crate::services::transport::TransportError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

// region: --- Endpoints

/// One chat backend: where to POST messages and where to probe for liveness
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EndpointConfig {
    pub base_url: String,
    pub chat_path: String,
    pub status_path: String,
    /// Per-request timeout; `None` leaves it to the HTTP client
    pub timeout_ms: Option<u64>,
    /// Failovers allowed before a success resets the budget (primary endpoint only)
    pub retries: u32,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5001".to_string(),
            chat_path: "/chat".to_string(),
            status_path: "/status".to_string(),
            timeout_ms: Some(10_000),
            retries: 3,
        }
    }
}

impl EndpointConfig {
    pub fn new(base_url: &str, chat_path: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            chat_path: chat_path.to_string(),
            ..Default::default()
        }
    }

    fn join(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        if path.starts_with('/') {
            format!("{}{}", base, path)
        } else {
            format!("{}/{}", base, path)
        }
    }

    pub fn chat_url(&self) -> String {
        self.join(&self.chat_path)
    }

    pub fn status_url(&self) -> String {
        self.join(&self.status_path)
    }
}

fn default_fallback_endpoint() -> Option<EndpointConfig> {
    Some(EndpointConfig {
        base_url: "http://localhost:5000".to_string(),
        chat_path: "/chat/send".to_string(),
        status_path: "/status".to_string(),
        timeout_ms: Some(5_000),
        retries: 0,
    })
}

// endregion: --- Endpoints

// region: --- Presentation

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Position {
    #[default]
    BottomRight,
    BottomLeft,
    TopRight,
    TopLeft,
}

/// Granularity of the progressive text reveal
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RevealMode {
    #[default]
    Word,
    Char,
}

// endregion: --- Presentation

/// Complete widget configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WidgetConfig {
    // Avatar
    pub avatar_image: Option<String>,
    pub avatar_name: String,
    pub avatar_color: String,
    pub position: Position,
    pub offset_x: u32,
    pub offset_y: u32,
    pub theme: String,

    // Endpoints and identity
    pub primary: EndpointConfig,
    pub fallback: Option<EndpointConfig>,
    pub session_prefix: String,
    pub storage_prefix: String,
    pub user_id: Option<String>,

    // Texts
    pub welcome_message: String,
    pub show_welcome: bool,
    pub placeholder: String,
    pub thinking_message: String,
    /// Carried by transport failures; the widget itself shows a keyword reply
    pub fallback_message: String,
    /// Shown when a 2xx reply has no usable text
    pub no_response_message: String,

    // Timing
    pub bubble_timeout_ms: u64,
    pub welcome_timeout_ms: u64,
    pub typing_speed_ms: u64,
    pub reveal_mode: RevealMode,
    pub response_timeout_ms: u64,
    /// How long the fallback stays preferred before the primary is tried first again
    pub primary_recheck_ms: u64,
    pub toggle_cooldown_ms: u64,
    pub auto_open: bool,
    pub auto_open_delay_ms: u64,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            avatar_image: None,
            avatar_name: "AI Assistant".to_string(),
            avatar_color: "#6366f1".to_string(),
            position: Position::default(),
            offset_x: 20,
            offset_y: 20,
            theme: "default".to_string(),

            primary: EndpointConfig::default(),
            fallback: default_fallback_endpoint(),
            session_prefix: "website_session".to_string(),
            storage_prefix: "chatbot".to_string(),
            user_id: None,

            welcome_message: "Hi! I'm your AI assistant. Click me to chat! 👋".to_string(),
            show_welcome: true,
            placeholder: "Type your message...".to_string(),
            thinking_message: "Thinking...".to_string(),
            fallback_message:
                "I'm having trouble connecting right now. Please try again in a moment.".to_string(),
            no_response_message: "no response".to_string(),

            bubble_timeout_ms: 5_000,
            welcome_timeout_ms: 5_000,
            typing_speed_ms: 50,
            reveal_mode: RevealMode::default(),
            response_timeout_ms: 20_000,
            primary_recheck_ms: 60_000,
            toggle_cooldown_ms: 500,
            auto_open: false,
            auto_open_delay_ms: 2_000,
        }
    }
}

impl WidgetConfig {
    /// Parse a (possibly partial) JSON configuration and validate it.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| WidgetError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let endpoints = std::iter::once(&self.primary).chain(self.fallback.as_ref());
        for endpoint in endpoints {
            let url = &endpoint.base_url;
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(WidgetError::Config(format!(
                    "endpoint base_url must start with http:// or https://, got {}",
                    url
                )));
            }
            if endpoint.timeout_ms == Some(0) {
                return Err(WidgetError::Config("endpoint timeout_ms must be positive".to_string()));
            }
        }

        if self.session_prefix.trim().is_empty() {
            return Err(WidgetError::Config("session_prefix cannot be empty".to_string()));
        }
        if self.storage_prefix.trim().is_empty() {
            return Err(WidgetError::Config("storage_prefix cannot be empty".to_string()));
        }
        if self.response_timeout_ms == 0 {
            return Err(WidgetError::Config("response_timeout_ms must be positive".to_string()));
        }

        Ok(())
    }

    /// Copy the options that may change at runtime. Endpoints, prefixes and
    /// the user id stay as they were when the transport was built.
    pub(crate) fn apply_presentation(&mut self, other: &WidgetConfig) {
        let keep = (
            self.primary.clone(),
            self.fallback.clone(),
            self.session_prefix.clone(),
            self.storage_prefix.clone(),
            self.user_id.clone(),
        );
        *self = other.clone();
        (
            self.primary,
            self.fallback,
            self.session_prefix,
            self.storage_prefix,
            self.user_id,
        ) = keep;
    }
}

// region: --- Callbacks

type Hook = Arc<dyn Fn() + Send + Sync>;
type TextHook = Arc<dyn Fn(&str) + Send + Sync>;
type ErrorHook = Arc<dyn Fn(&TransportError) + Send + Sync>;

/// Lifecycle hooks
///
/// Hooks run on the task that caused the event, never while widget state is
/// locked, so a hook may call back into the widget.
#[derive(Clone, Default)]
pub struct Callbacks {
    pub on_open: Option<Hook>,
    pub on_close: Option<Hook>,
    pub on_message_sent: Option<TextHook>,
    pub on_response: Option<TextHook>,
    pub on_error: Option<ErrorHook>,
}

impl Callbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_open(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_open = Some(Arc::new(f));
        self
    }

    pub fn on_close(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_close = Some(Arc::new(f));
        self
    }

    pub fn on_message_sent(mut self, f: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_message_sent = Some(Arc::new(f));
        self
    }

    pub fn on_response(mut self, f: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_response = Some(Arc::new(f));
        self
    }

    pub fn on_error(mut self, f: impl Fn(&TransportError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(f));
        self
    }
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("on_open", &self.on_open.is_some())
            .field("on_close", &self.on_close.is_some())
            .field("on_message_sent", &self.on_message_sent.is_some())
            .field("on_response", &self.on_response.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

// endregion: --- Callbacks
