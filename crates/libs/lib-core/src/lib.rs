//! # Core Library
//!
//! Bridge configuration and the shared error type.

pub mod config;
pub mod error;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, Result};
