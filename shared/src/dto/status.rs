//! # Status Data Transfer Objects
//!
//! Payloads for the health and status probes. The widget only looks at the
//! HTTP status code of these endpoints; the bodies are for humans and
//! dashboards.

use serde::{Deserialize, Serialize};

/// `GET /health` body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    /// `active` when an upstream is configured, `inactive` otherwise
    pub upstream_status: String,
    pub service: String,
}

/// `GET /status` body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusResponse {
    pub bridge_status: String,
    pub upstream_configured: bool,
    pub sessions_active: usize,
    pub uptime_secs: u64,
    pub timestamp: String,
}
