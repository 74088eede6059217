//! # Service Traits
//!
//! Traits for dependency injection, enabling better testability and modularity.

use crate::services::transport::{ConnectionStatus, TransportResult};
use async_trait::async_trait;

/// Chat backend as seen by the widget
///
/// The widget only needs a reply (or a failure) per message plus a little
/// connection bookkeeping. [`ChatTransport`](crate::services::transport::ChatTransport)
/// is the HTTP implementation; tests substitute scripted mocks.
#[async_trait]
pub trait ChatService: Send + Sync {
    /// Send one message, reusing the stored session when `session_id` is `None`
    async fn send(&self, message: &str, session_id: Option<&str>) -> TransportResult;

    /// Probe the endpoints and pick the preferred one
    async fn initialize(&self) -> ConnectionStatus;

    fn status(&self) -> ConnectionStatus;

    fn current_session(&self) -> Option<String>;
}
