//! # Widget State Machine
//!
//! [`Widget`] is the public handle: a cheap `Clone` around shared state.
//!
//! ## States
//!
//! ```text
//! Closed --open/toggle--> Open/Idle --submit--> Open/AwaitingResponse
//!    ^                        |                        |
//!    +-----close/toggle-------+<-------reply-----------+
//! ```
//!
//! - Opening hides the welcome or response bubble and cancels its timer.
//! - Submitting shows a thinking bubble and calls the [`ChatService`]; a
//!   second submission while awaiting is ignored.
//! - A reply (or, on failure, a keyword reply) replaces the thinking bubble,
//!   is revealed progressively and dismissed after `bubble_timeout_ms`.
//! - `toggle` is debounced by `toggle_cooldown_ms`; events in the window are
//!   dropped.
//!
//! The state mutex is never held across an `.await` or while a callback runs.

pub mod reveal;
pub mod state;


use crate::config::{Callbacks, WidgetConfig};
use crate::core::error::{Result, WidgetError};
use crate::core::service::ChatService;
use crate::services::storage::{MemoryStorage, Storage};
use crate::services::transport::{ChatTransport, TransportError, TransportResult};
use crate::timers::{BubbleKey, TimerRegistry};
use lib_utils::{format_time, normalize_message, now_utc};
use parking_lot::Mutex;
use shared::{preview, FallbackResponder, Turn, TurnRole};
use state::{
    Activity, Bubble, BubbleKind, Inner, PendingMessage, WidgetState, WidgetStatus, WidgetView,
};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

struct Shared {
    inner: Mutex<Inner>,
    service: Arc<dyn ChatService>,
    callbacks: Callbacks,
    timers: TimerRegistry<BubbleKey>,
    responder: FallbackResponder,
    /// Cancelled by `destroy`; stops background tasks
    lifetime: CancellationToken,
}

/// Handle to one chat widget instance
#[derive(Clone)]
pub struct Widget {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for Widget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Widget").field("view", &self.view()).finish()
    }
}

fn millis(ms: u64) -> Duration {
    Duration::from_millis(ms)
}

fn turn(role: TurnRole, content: &str) -> Turn {
    Turn {
        role,
        content: content.to_string(),
        timestamp: format_time(now_utc()),
    }
}

impl Widget {
    // region: --- Construction

    /// Widget talking HTTP through a [`ChatTransport`] with in-memory storage.
    pub fn new(config: WidgetConfig, callbacks: Callbacks) -> Result<Self> {
        Self::with_storage(config, callbacks, Arc::new(MemoryStorage::new()))
    }

    pub fn with_storage(
        config: WidgetConfig,
        callbacks: Callbacks,
        storage: Arc<dyn Storage>,
    ) -> Result<Self> {
        config.validate()?;
        let transport = ChatTransport::new(&config, storage);
        Self::with_service(config, callbacks, Arc::new(transport))
    }

    /// Widget backed by any [`ChatService`].
    pub fn with_service(
        config: WidgetConfig,
        callbacks: Callbacks,
        service: Arc<dyn ChatService>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner::new(config)),
                service,
                callbacks,
                timers: TimerRegistry::new(),
                responder: FallbackResponder::default(),
                lifetime: CancellationToken::new(),
            }),
        })
    }

    fn from_weak(weak: &Weak<Shared>) -> Option<Self> {
        weak.upgrade().map(|shared| Self { shared })
    }

    /// Show the welcome bubble, probe the endpoints and arm auto-open.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) {
        let (welcome_timeout, auto_open_delay) = {
            let mut inner = self.shared.inner.lock();
            if inner.destroyed {
                return;
            }

            let welcome = inner.config.show_welcome && inner.state == WidgetState::Closed;
            if welcome {
                let bubble = Bubble::full(BubbleKind::Welcome, &inner.config.welcome_message);
                inner.bubble = Some(bubble);
            }

            (
                welcome.then(|| millis(inner.config.welcome_timeout_ms)),
                inner.config.auto_open.then(|| millis(inner.config.auto_open_delay_ms)),
            )
        };

        if let Some(delay) = welcome_timeout {
            self.schedule_hide(BubbleKey::Welcome, BubbleKind::Welcome, delay);
        }

        let service = Arc::clone(&self.shared.service);
        let lifetime = self.shared.lifetime.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = lifetime.cancelled() => {}
                status = service.initialize() => {
                    debug!(
                        connected = status.connected,
                        using_fallback = status.using_fallback,
                        "Chat service probed"
                    );
                }
            }
        });

        if let Some(delay) = auto_open_delay {
            let weak = Arc::downgrade(&self.shared);
            let lifetime = self.shared.lifetime.clone();
            tokio::spawn(async move {
                tokio::select! {
                    () = lifetime.cancelled() => {}
                    () = tokio::time::sleep(delay) => {
                        if let Some(widget) = Widget::from_weak(&weak) {
                            widget.open();
                        }
                    }
                }
            });
        }

        info!("Widget started");
    }

    // endregion: --- Construction

    // region: --- Open / close

    pub fn open(&self) -> bool {
        {
            let mut inner = self.shared.inner.lock();
            if inner.destroyed || inner.state == WidgetState::Open {
                return false;
            }
            inner.state = WidgetState::Open;
            inner.input_focused = true;
            inner.hide_bubble(BubbleKind::Welcome);
            inner.hide_bubble(BubbleKind::Response);
        }

        self.shared.timers.cancel(BubbleKey::Welcome);
        self.shared.timers.cancel(BubbleKey::Response);

        info!("Widget opened");
        if let Some(hook) = &self.shared.callbacks.on_open {
            hook();
        }
        true
    }

    /// Close the chat surface, cancelling any reveal in progress.
    pub fn close(&self) -> bool {
        {
            let mut inner = self.shared.inner.lock();
            if inner.destroyed || inner.state == WidgetState::Closed {
                return false;
            }
            inner.state = WidgetState::Closed;
            inner.input_focused = false;
            inner.cancel_reveal();
            inner.hide_bubble(BubbleKind::Response);
        }

        self.shared.timers.cancel(BubbleKey::Response);

        info!("Widget closed");
        if let Some(hook) = &self.shared.callbacks.on_close {
            hook();
        }
        true
    }

    /// Open or close, ignoring calls inside the cooldown window.
    pub fn toggle(&self) -> bool {
        let now = Instant::now();
        let open = {
            let mut inner = self.shared.inner.lock();
            if inner.destroyed {
                return false;
            }
            if inner.toggle_cooldown_until.is_some_and(|until| now < until) {
                debug!("Toggle dropped during cooldown");
                return false;
            }
            inner.toggle_cooldown_until = Some(now + millis(inner.config.toggle_cooldown_ms));
            inner.state == WidgetState::Open
        };

        if open {
            self.close()
        } else {
            self.open()
        }
    }

    // endregion: --- Open / close

    // region: --- Messages

    /// Submit a message without waiting for the reply.
    ///
    /// Returns `false` when the submission was ignored: empty text, widget
    /// closed or destroyed, or a reply still pending.
    pub fn submit(&self, text: &str) -> bool {
        match self.begin_submission(text) {
            Ok((seq, message)) => {
                let widget = self.clone();
                tokio::spawn(async move {
                    let _ = widget.complete(seq, message).await;
                });
                true
            }
            Err(e) => {
                debug!(reason = %e, "Submission ignored");
                false
            }
        }
    }

    /// Submit a message and wait for the text the widget displays.
    pub async fn send(&self, text: &str) -> Result<String> {
        let (seq, message) = self.begin_submission(text)?;
        self.complete(seq, message).await
    }

    fn begin_submission(&self, text: &str) -> Result<(u64, String)> {
        let message = normalize_message(text)
            .ok_or(WidgetError::EmptyMessage)?
            .to_string();

        let seq = {
            let mut inner = self.shared.inner.lock();
            if inner.destroyed {
                return Err(WidgetError::Destroyed);
            }
            if inner.state != WidgetState::Open {
                return Err(WidgetError::Closed);
            }
            if inner.activity == Activity::AwaitingResponse {
                return Err(WidgetError::Busy);
            }

            inner.next_seq += 1;
            let seq = inner.next_seq;
            inner.activity = Activity::AwaitingResponse;
            inner.pending = Some(PendingMessage {
                text: message.clone(),
                submitted_at: Instant::now(),
                seq,
            });
            inner.transcript.push(turn(TurnRole::User, &message));
            inner.cancel_reveal();
            let thinking = Bubble::full(BubbleKind::Thinking, &inner.config.thinking_message);
            inner.bubble = Some(thinking);
            seq
        };

        self.shared.timers.cancel(BubbleKey::Response);
        self.shared.timers.cancel(BubbleKey::Welcome);

        info!(seq, "Message submitted: {}", preview(&message, 40));
        if let Some(hook) = &self.shared.callbacks.on_message_sent {
            hook(&message);
        }

        Ok((seq, message))
    }

    async fn complete(&self, seq: u64, message: String) -> Result<String> {
        let timeout = millis(self.shared.inner.lock().config.response_timeout_ms);
        let service = Arc::clone(&self.shared.service);

        let outcome = tokio::select! {
            () = self.shared.lifetime.cancelled() => return Err(WidgetError::Destroyed),
            outcome = tokio::time::timeout(timeout, service.send(&message, None)) => outcome,
        };

        let (text, error) = match outcome {
            Ok(TransportResult::Success { text, .. }) => (text, None),
            Ok(TransportResult::Failure { reason, .. }) => {
                (self.shared.responder.respond(&message), Some(reason))
            }
            Err(_) => (
                self.shared.responder.respond(&message),
                Some(TransportError::Network(format!(
                    "no reply within {}ms",
                    timeout.as_millis()
                ))),
            ),
        };

        self.deliver(seq, text, error)
    }

    fn deliver(&self, seq: u64, text: String, error: Option<TransportError>) -> Result<String> {
        let (token, mode, interval, bubble_timeout) = {
            let mut inner = self.shared.inner.lock();
            if inner.destroyed {
                return Err(WidgetError::Destroyed);
            }
            if inner.pending.as_ref().map(|p| p.seq) != Some(seq) {
                return Ok(text);
            }
            let Some(pending) = inner.pending.take() else {
                return Ok(text);
            };
            debug!(seq, elapsed_ms = pending.submitted_at.elapsed().as_millis(), "Reply received");

            inner.activity = Activity::Idle;
            inner.transcript.push(turn(TurnRole::Assistant, &text));
            inner.cancel_reveal();

            let token = CancellationToken::new();
            inner.reveal = Some(token.clone());
            inner.bubble = Some(Bubble::revealing(BubbleKind::Response, &text));

            (
                token,
                inner.config.reveal_mode,
                millis(inner.config.typing_speed_ms),
                millis(inner.config.bubble_timeout_ms),
            )
        };

        if let Some(error) = &error {
            warn!(error = %error, "Chat service failed, showing fallback reply");
            if let Some(hook) = &self.shared.callbacks.on_error {
                hook(error);
            }
        }
        if let Some(hook) = &self.shared.callbacks.on_response {
            hook(&text);
        }

        self.schedule_hide(BubbleKey::Response, BubbleKind::Response, bubble_timeout);

        let weak = Arc::downgrade(&self.shared);
        let frame_token = token.clone();
        reveal::spawn_reveal(text.clone(), mode, interval, token, move |frame| {
            let Some(shared) = weak.upgrade() else {
                return;
            };
            let mut inner = shared.inner.lock();
            if frame_token.is_cancelled() {
                return;
            }
            if let Some(bubble) = inner.bubble.as_mut().filter(|b| b.kind == BubbleKind::Response) {
                bubble.shown = frame.to_string();
                bubble.revealing = bubble.shown.len() < bubble.text.len();
            }
        });

        Ok(text)
    }

    fn schedule_hide(&self, key: BubbleKey, kind: BubbleKind, delay: Duration) {
        let weak = Arc::downgrade(&self.shared);
        self.shared.timers.schedule(key, delay, move || {
            if let Some(shared) = weak.upgrade() {
                if shared.inner.lock().hide_bubble(kind) {
                    debug!(?kind, "Bubble dismissed");
                }
            }
        });
    }

    // endregion: --- Messages

    // region: --- Lifecycle and inspection

    /// Stop every timer, reveal and background task. Later calls are no-ops.
    pub fn destroy(&self) {
        {
            let mut inner = self.shared.inner.lock();
            if inner.destroyed {
                return;
            }
            inner.destroyed = true;
            inner.cancel_reveal();
            inner.bubble = None;
            inner.pending = None;
            inner.activity = Activity::Idle;
            inner.state = WidgetState::Closed;
            inner.input_focused = false;
        }

        self.shared.lifetime.cancel();
        self.shared.timers.cancel_all();
        info!("Widget destroyed");
    }

    /// Replace avatar, text and timing options. Endpoints, storage prefix and
    /// session prefix keep their construction-time values.
    pub fn update_config(&self, config: WidgetConfig) -> Result<()> {
        config.validate()?;
        let mut inner = self.shared.inner.lock();
        if inner.destroyed {
            return Err(WidgetError::Destroyed);
        }
        inner.config.apply_presentation(&config);
        debug!("Widget config updated");
        Ok(())
    }

    pub fn config(&self) -> WidgetConfig {
        self.shared.inner.lock().config.clone()
    }

    pub fn view(&self) -> WidgetView {
        self.shared.inner.lock().view()
    }

    pub fn status(&self) -> WidgetStatus {
        let (state, activity, destroyed) = {
            let inner = self.shared.inner.lock();
            (inner.state, inner.activity, inner.destroyed)
        };
        WidgetStatus {
            state,
            activity,
            connection: self.shared.service.status(),
            session: self.shared.service.current_session(),
            destroyed,
        }
    }

    pub fn is_open(&self) -> bool {
        self.shared.inner.lock().state == WidgetState::Open
    }

    // endregion: --- Lifecycle and inspection
}
