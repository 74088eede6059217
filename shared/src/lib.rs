//! # Shared Chat Contract Library
//!
//! This library defines the contract between the chat widget and the bridge server.
//! All DTOs use JSON serialization via `serde` for API communication.
//!
//! ## Structure
//!
//! - **[`dto`]**: Data Transfer Objects for API communication
//!   - **[`dto::chat`]**: Chat turn request/response, transcript turns
//!   - **[`dto::status`]**: Health and status probe payloads
//! - **[`responder`]**: Keyword-based fallback replies used by both sides when
//!   the AI backend cannot be reached
//! - **[`utils`]**: Shared utility functions
//!
//! ## Wire Format
//!
//! All DTOs serialize to JSON using the default `serde` behavior:
//! - Field names use **snake_case** in both Rust and JSON
//! - Optional fields are omitted from JSON when `None`
//! - Unknown fields are ignored on deserialization, so a backend that adds
//!   fields never breaks the widget
//!
//! ## Usage in the Bridge
//!
//! ```rust,ignore
//! use shared::dto::chat::{ChatRequest, ChatResponse};
//! use axum::Json;
//!
//! async fn chat(Json(request): Json<ChatRequest>) -> Json<ChatResponse> {
//!     # todo!()
//! }
//! ```
//!
//! ## Usage in the Widget
//!
//! ```rust,no_run
//! use shared::responder::respond;
//!
//! let reply = respond("hello there");
//! assert!(reply.starts_with("Hello!"));
//! ```

pub mod dto;
pub mod responder;
pub mod utils;

pub use dto::*;
pub use responder::{respond, FallbackResponder};
pub use utils::*;
