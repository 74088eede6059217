//! # Widget Error Types
//!
//! Errors surfaced by the widget's public handle. Transport failures are not
//! here: they never escape as errors, the widget answers with a fallback reply
//! and reports the [`TransportError`](crate::services::transport::TransportError)
//! through the `on_error` hook instead.

use crate::services::storage::StorageError;
use thiserror::Error;

/// Convenience alias for `Result<T, WidgetError>`.
pub type Result<T> = std::result::Result<T, WidgetError>;

#[derive(Debug, Error)]
pub enum WidgetError {
    /// Invalid or unparsable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Logging could not be initialised
    #[error("Logging error: {0}")]
    Logging(String),

    /// The message was empty after trimming
    #[error("Message is empty")]
    EmptyMessage,

    /// Submissions are only accepted while the widget is open
    #[error("Widget is closed")]
    Closed,

    /// A previous message is still awaiting its reply
    #[error("A message is already awaiting a reply")]
    Busy,

    #[error("Widget has been destroyed")]
    Destroyed,
}
