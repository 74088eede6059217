//! # Time Utilities
//!
//! Timestamps on the wire are RFC 3339 in UTC with millisecond precision.

use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("not an RFC 3339 timestamp: {0}")]
    FailToDateParse(String),
}

pub fn now_utc() -> DateTime<Utc> {
    Utc::now()
}

/// Milliseconds since the Unix epoch, as used in session ids.
pub fn epoch_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// `2024-05-01T12:00:00.123Z`
pub fn format_time(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_utc(moment: &str) -> Result<DateTime<Utc>, Error> {
    DateTime::parse_from_rfc3339(moment)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| Error::FailToDateParse(moment.to_string()))
}
