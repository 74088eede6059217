//! # Centralized Error Handling
//!
//! This module defines the bridge-wide error type [`AppError`] used consistently
//! across the server crates. It follows the `thiserror` pattern for ergonomic error handling.
//!
//! ## Error Categories
//!
//! 1. **Client Errors** (4xx) - User/input issues
//!    - [`EmptyMessage`](AppError::EmptyMessage) → 400 Bad Request
//!    - [`NotFound`](AppError::NotFound) → 404 Not Found
//!
//! 2. **Server Errors** (5xx) - Startup issues only
//!    - [`Config`](AppError::Config) → 500 Internal Server Error
//!
//! Upstream failures never become an `AppError`: the chat handler turns them
//! into a `200` fallback reply, so the widget always has text to render.
//!
//! ## Usage Example
//!
//! ```rust
//! use lib_core::error::{AppError, Result};
//!
//! fn require_message(message: &str) -> Result<&str> {
//!     lib_utils::normalize_message(message).ok_or(AppError::EmptyMessage)
//! }
//! ```

use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use shared::ErrorResponse;
use thiserror::Error;

/// Convenience type alias for `Result<T, AppError>`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Displayable reply attached to empty-message rejections.
pub const EMPTY_MESSAGE_REPLY: &str = "Please provide a message to chat with me! 🤖";

/// Bridge-wide error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration error during startup or environment loading.
    ///
    /// **HTTP Status**: 500 Internal Server Error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Chat message was empty or whitespace only.
    ///
    /// **HTTP Status**: 400 Bad Request
    #[error("Message is required")]
    EmptyMessage,

    /// Requested resource not found.
    ///
    /// **HTTP Status**: 404 Not Found
    #[error("Not found: {0}")]
    NotFound(String),
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::EmptyMessage => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            AppError::EmptyMessage => "Message is required".to_string(),
            AppError::NotFound(msg) => msg.clone(),
            AppError::Config(_) => "An internal error occurred".to_string(),
        }
    }

    /// Stable error code for the JSON body.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "Config",
            AppError::EmptyMessage => "EmptyMessage",
            AppError::NotFound(_) => "NotFound",
        }
    }
}

/// Implement Axum's `IntoResponse` for automatic error handling.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!("Server error: {}", self);
        } else {
            tracing::debug!("Client error: {}", self);
        }

        let response = match &self {
            AppError::EmptyMessage => Some(EMPTY_MESSAGE_REPLY.to_string()),
            _ => None,
        };

        let body = Json(ErrorResponse {
            error: self.user_message(),
            code: Some(self.code().to_string()),
            response,
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_message_body_carries_reply() {
        let response = AppError::EmptyMessage.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.error, "Message is required");
        assert_eq!(error.code.as_deref(), Some("EmptyMessage"));
        assert_eq!(error.response.as_deref(), Some(EMPTY_MESSAGE_REPLY));
    }

    #[test]
    fn test_config_error_hides_details() {
        let err = AppError::Config("UPSTREAM_URL is bad".to_string());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.user_message(), "An internal error occurred");
        assert_eq!(err.to_string(), "Configuration error: UPSTREAM_URL is bad");
    }
}
