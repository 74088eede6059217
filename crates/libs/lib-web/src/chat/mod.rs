//! # Chat Module
//!
//! The bridge's chat endpoint: per-session transcripts, the optional upstream
//! AI client, and the HTTP handlers that tie them together.

pub mod state;
pub mod handlers;
pub mod upstream;

pub use state::{ChatSession, ChatAppState};
pub use handlers::{get_session, send_chat};
pub use upstream::{UpstreamClient, UpstreamError, UpstreamReply};
