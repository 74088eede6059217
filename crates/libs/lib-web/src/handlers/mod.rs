//! # HTTP Request Handlers
//!
//! Handlers that are not part of the chat flow itself. Chat handlers live in
//! [`crate::chat::handlers`] next to the state they use.
//!
//! ## Handler Modules
//!
//! - **[`health`]**: Liveness and status probes
//!   - `GET /health`, `GET /api/health` - Liveness plus upstream mode
//!   - `GET /status`, `GET /api/status` - Session count and uptime
//!
//! Both probes answer `200` whenever the process is serving; the widget's
//! transport uses that status code to pick its preferred endpoint.

pub mod health;

pub use health::{health, status};
