//! # Bridge Configuration
//!
//! This module manages bridge configuration loaded from environment variables.
//! All configuration is validated on startup to fail fast if misconfigured.
//!
//! ## Variables
//!
//! | Variable              | Default        | Meaning                                   |
//! |-----------------------|----------------|-------------------------------------------|
//! | `UPSTREAM_URL`        | unset          | Base URL of the AI service; unset = local replies only |
//! | `UPSTREAM_CHAT_PATH`  | `/chat/send`   | Chat path appended to `UPSTREAM_URL`      |
//! | `UPSTREAM_TIMEOUT_MS` | `10000`        | Per-request timeout for the upstream call |
//! | `UPSTREAM_USER_ID`    | `website_user` | `user_id` forwarded when the widget sends none |
//! | `CONTEXT_WINDOW`      | `20`           | Transcript turns forwarded as history     |
//! | `SESSION_PREFIX`      | `session`      | Prefix for server-assigned session ids    |

use crate::error::{AppError, Result};
use lib_utils::envs::{self, get_env_or, get_env_parse_or};

/// Bridge configuration loaded from environment variables.
#[derive(Clone, Debug)]
pub struct Config {
    /// Base URL of the upstream AI service
    pub upstream_url: Option<String>,

    /// Path of the upstream chat endpoint
    pub upstream_chat_path: String,

    /// Upstream request timeout in milliseconds
    ///
    /// Valid range: 100-120000
    pub upstream_timeout_ms: u64,

    /// Default `user_id` sent upstream
    pub upstream_user_id: String,

    /// Number of most recent transcript turns sent upstream
    pub context_window: usize,

    /// Prefix for session ids assigned by the bridge
    pub session_prefix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            upstream_url: None,
            upstream_chat_path: "/chat/send".to_string(),
            upstream_timeout_ms: 10_000,
            upstream_user_id: "website_user".to_string(),
            context_window: 20,
            session_prefix: "session".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let upstream_url = envs::get_env("UPSTREAM_URL")
            .ok()
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty());

        let upstream_timeout_ms =
            get_env_parse_or("UPSTREAM_TIMEOUT_MS", defaults.upstream_timeout_ms)
                .map_err(|e| AppError::Config(format!("UPSTREAM_TIMEOUT_MS: {}", e)))?;

        let context_window = get_env_parse_or("CONTEXT_WINDOW", defaults.context_window)
            .map_err(|e| AppError::Config(format!("CONTEXT_WINDOW: {}", e)))?;

        Ok(Self {
            upstream_url,
            upstream_chat_path: get_env_or("UPSTREAM_CHAT_PATH", &defaults.upstream_chat_path),
            upstream_timeout_ms,
            upstream_user_id: get_env_or("UPSTREAM_USER_ID", &defaults.upstream_user_id),
            context_window,
            session_prefix: get_env_or("SESSION_PREFIX", &defaults.session_prefix),
        })
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if let Some(url) = &self.upstream_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(AppError::Config(format!(
                    "UPSTREAM_URL must start with http:// or https://, got {}",
                    url
                )));
            }
        }

        if !self.upstream_chat_path.starts_with('/') {
            return Err(AppError::Config("UPSTREAM_CHAT_PATH must start with '/'".to_string()));
        }

        if self.upstream_timeout_ms < 100 || self.upstream_timeout_ms > 120_000 {
            return Err(AppError::Config(
                "UPSTREAM_TIMEOUT_MS must be between 100 and 120000".to_string(),
            ));
        }

        if self.session_prefix.trim().is_empty() {
            return Err(AppError::Config("SESSION_PREFIX cannot be empty".to_string()));
        }

        Ok(())
    }

    /// Full URL of the upstream chat endpoint, when an upstream is configured.
    pub fn upstream_chat_url(&self) -> Option<String> {
        self.upstream_url
            .as_ref()
            .map(|base| format!("{}{}", base, self.upstream_chat_path))
    }
}
