//! # Logging
//!
//! File-based structured logging for hosts embedding the widget.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use widget::debug::{self, LogConfig};
//!
//! // Keep the guard alive for as long as logs should be flushed
//! let _guard = debug::init_logger(&LogConfig::from_env()).unwrap();
//!
//! tracing::info!(seq = 1, "Message submitted");
//! ```
//!
//! ## Configuration
//!
//! Environment variables:
//! - `RUST_LOG`: Log level filter (default `widget=info,warn`)
//! - `WIDGET_LOG_DIR`: Log directory (default `logs`)
//! - `WIDGET_LOG_STDERR`: Mirror logs to stderr (1=on, 0=off)

pub mod config;
pub mod logger;

pub use config::LogConfig;
pub use logger::init as init_logger;
