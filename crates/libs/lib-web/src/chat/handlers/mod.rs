//! # Chat Handlers
//!
//! HTTP handlers for chat functionality.

// region: --- Modules
pub mod send;
pub mod sessions;

#[cfg(test)]
mod tests;
// endregion: --- Modules

// region: --- Re-exports
pub use send::send_chat;
pub use sessions::get_session;
// endregion: --- Re-exports
