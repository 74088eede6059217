//! # Widget State Types
//!
//! The explicit state behind the widget, and the [`WidgetView`] snapshot a
//! renderer draws from. Visibility is always derived from these fields.

use crate::config::WidgetConfig;
use crate::services::transport::ConnectionStatus;
use serde::Serialize;
use shared::Turn;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Whether the chat surface is open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetState {
    Closed,
    Open,
}

/// Request sub-state, orthogonal to [`WidgetState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Activity {
    Idle,
    AwaitingResponse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BubbleKind {
    Welcome,
    Thinking,
    Response,
}

/// The speech bubble next to the avatar
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bubble {
    pub kind: BubbleKind,
    /// Complete text
    pub text: String,
    /// What is currently rendered; shorter than `text` while revealing
    pub shown: String,
    pub revealing: bool,
}

impl Bubble {
    /// A bubble shown in full right away
    pub fn full(kind: BubbleKind, text: &str) -> Self {
        Self {
            kind,
            text: text.to_string(),
            shown: text.to_string(),
            revealing: false,
        }
    }

    /// A bubble whose text will be revealed progressively
    pub fn revealing(kind: BubbleKind, text: &str) -> Self {
        Self {
            kind,
            text: text.to_string(),
            shown: String::new(),
            revealing: true,
        }
    }
}

/// The message currently awaiting a reply
#[derive(Debug, Clone)]
pub struct PendingMessage {
    pub text: String,
    pub submitted_at: Instant,
    /// Matches the reply to this submission
    pub(crate) seq: u64,
}

/// Render snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WidgetView {
    pub state: WidgetState,
    pub activity: Activity,
    pub input_visible: bool,
    pub input_focused: bool,
    /// Submission is possible only when open and idle
    pub input_enabled: bool,
    pub bubble: Option<Bubble>,
    pub transcript: Vec<Turn>,
    pub avatar_name: String,
    pub avatar_color: String,
    pub placeholder: String,
    pub destroyed: bool,
}

/// Summary for diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WidgetStatus {
    pub state: WidgetState,
    pub activity: Activity,
    pub connection: ConnectionStatus,
    pub session: Option<String>,
    pub destroyed: bool,
}

/// Mutable state guarded by the widget's mutex
#[derive(Debug)]
pub(crate) struct Inner {
    pub config: WidgetConfig,
    pub state: WidgetState,
    pub activity: Activity,
    pub pending: Option<PendingMessage>,
    pub bubble: Option<Bubble>,
    pub transcript: Vec<Turn>,
    pub input_focused: bool,
    pub toggle_cooldown_until: Option<Instant>,
    pub reveal: Option<CancellationToken>,
    pub next_seq: u64,
    pub destroyed: bool,
}

impl Inner {
    pub fn new(config: WidgetConfig) -> Self {
        Self {
            config,
            state: WidgetState::Closed,
            activity: Activity::Idle,
            pending: None,
            bubble: None,
            transcript: Vec::new(),
            input_focused: false,
            toggle_cooldown_until: None,
            reveal: None,
            next_seq: 0,
            destroyed: false,
        }
    }

    pub fn accepts_input(&self) -> bool {
        !self.destroyed && self.state == WidgetState::Open && self.activity == Activity::Idle
    }

    pub fn cancel_reveal(&mut self) {
        if let Some(token) = self.reveal.take() {
            token.cancel();
        }
        if let Some(bubble) = &mut self.bubble {
            bubble.revealing = false;
        }
    }

    /// Hide the bubble if it is of `kind`; returns whether it was.
    pub fn hide_bubble(&mut self, kind: BubbleKind) -> bool {
        if self.bubble.as_ref().map(|b| b.kind) != Some(kind) {
            return false;
        }
        self.cancel_reveal();
        self.bubble = None;
        true
    }

    pub fn view(&self) -> WidgetView {
        let open = self.state == WidgetState::Open && !self.destroyed;
        WidgetView {
            state: self.state,
            activity: self.activity,
            input_visible: open,
            input_focused: open && self.input_focused,
            input_enabled: self.accepts_input(),
            bubble: self.bubble.clone(),
            transcript: self.transcript.clone(),
            avatar_name: self.config.avatar_name.clone(),
            avatar_color: self.config.avatar_color.clone(),
            placeholder: self.config.placeholder.clone(),
            destroyed: self.destroyed,
        }
    }
}
