//! # Shared Utility Functions
//!
//! Common helpers used by both the widget and the bridge.
//!
//! ## Text Previews
//!
//! Chat messages are logged on both sides; [`preview`] keeps those log lines
//! short without splitting a multi-byte character.
//!
//! ```rust
//! use shared::utils::preview;
//!
//! assert_eq!(preview("Hello there, friend", 5), "Hello...");
//! assert_eq!(preview("short", 10), "short");
//! ```

/// Shorten `text` to at most `max_chars` characters, appending `...` when cut.
pub fn preview(text: &str, max_chars: usize) -> String {
    let mut chars = text.char_indices();
    match chars.nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}
