//! # Utilities Library
//!
//! Shared utility functions for environment variables, time, session ids, and validation.

pub mod envs;
pub mod session;
pub mod time;
pub mod validation;

// Re-export commonly used functions
pub use envs::{get_env, get_env_list, get_env_or, get_env_parse, get_env_parse_or};
pub use session::{generate_session_id, is_session_id};
pub use time::{epoch_millis, format_time, now_utc, parse_utc};
pub use validation::normalize_message;
