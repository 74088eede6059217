//! # Avatar Chat Widget
//!
//! Client side of the avatar chat: a state machine for the floating avatar
//! and its chat surface, plus an HTTP transport that talks to the bridge
//! (or any compatible chat endpoint) with primary/fallback failover.
//!
//! Rendering is left to the host. It draws from [`WidgetView`] snapshots and
//! forwards clicks and input to the [`Widget`] handle.
//!
//! ## Modules
//!
//! - **[`app`]**: The [`Widget`] handle, its state types and the reveal animation
//! - **[`config`]**: [`WidgetConfig`] (JSON-friendly) and [`Callbacks`]
//! - **[`core`]**: Error type and the [`ChatService`] trait
//! - **[`services`]**: HTTP transport and client storage
//! - **[`timers`]**: Keyed one-shot timers for bubble dismissal
//! - **[`debug`]**: File logging setup
//!
//! ## Example
//!
//! ```rust,no_run
//! use widget::{Callbacks, Widget, WidgetConfig};
//!
//! # async fn run() -> widget::Result<()> {
//! let config = WidgetConfig::from_json(r#"{ "avatar_name": "Nova" }"#)?;
//! let callbacks = Callbacks::new().on_response(|text| println!("{text}"));
//!
//! let widget = Widget::new(config, callbacks)?;
//! widget.start();
//! widget.open();
//! let reply = widget.send("Hello!").await?;
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod config;
pub mod core;
pub mod debug;
pub mod services;
pub mod timers;

pub use app::reveal::reveal_frames;
pub use app::state::{Activity, Bubble, BubbleKind, WidgetState, WidgetStatus, WidgetView};
pub use app::Widget;
pub use config::{Callbacks, EndpointConfig, Position, RevealMode, WidgetConfig};
pub use crate::core::{ChatService, Result, WidgetError};
pub use services::{
    ChatTransport, ConnectionStatus, FileStorage, MemoryStorage, Storage, StorageError,
    TransportError, TransportResult,
};
pub use timers::{BubbleKey, TimerRegistry};
