//! # Core Abstractions
//!
//! Error type and the service trait the widget talks to.
//!
//! ## Modules
//!
//! - **[`error`]**: Widget error type (`WidgetError`, `Result<T>`)
//! - **[`service`]**: [`ChatService`], implemented by
//!   [`ChatTransport`](crate::services::transport::ChatTransport) and by test mocks
//!
//! ## Dependency Injection
//!
//! ```rust,ignore
//! use widget::core::service::ChatService;
//!
//! // In production: the HTTP transport
//! let service: Arc<dyn ChatService> = Arc::new(ChatTransport::new(&config, storage));
//!
//! // In tests: a scripted mock
//! let service: Arc<dyn ChatService> = Arc::new(MockChatService::replying("Hello!"));
//! ```

pub mod error;
pub mod service;

pub use error::{Result, WidgetError};
pub use service::ChatService;
