//! # Validation Utilities
//!
//! Input validation helpers.

/// Trim a chat message, returning `None` when nothing is left.
pub fn normalize_message(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}
