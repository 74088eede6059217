//! # Data Transfer Objects (DTOs)
//!
//! This module contains all data structures exchanged between the widget and
//! the bridge via the REST API.
//!
//! ## Module Organization
//!
//! - [`chat`] - Chat turn request/response, transcript turns, error body
//! - [`status`] - Health and status probe payloads
//!
//! ## Example JSON Communication
//!
//! ```text
//! POST /api/chat
//! Content-Type: application/json
//!
//! {
//!   "message": "Hi",
//!   "session_id": "website_session_1718000000000_k3j9x0a1b2c"
//! }
//! ```
//!
//! ```text
//! HTTP/1.1 200 OK
//! Content-Type: application/json
//!
//! {
//!   "response": "Hello! How can I help you today?",
//!   "session_id": "website_session_1718000000000_k3j9x0a1b2c",
//!   "status": "active",
//!   "timestamp": "2024-06-10T08:00:00Z"
//! }
//! ```

pub mod chat;
pub mod status;

pub use chat::*;
pub use status::*;
