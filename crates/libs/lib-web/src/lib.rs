//! # Web Library
//!
//! The chat bridge: HTTP handlers, middleware, upstream client and server setup.

pub mod chat;
pub mod handlers;
pub mod middleware;
pub mod server;

pub use server::{create_router, init_tracing, start_server, ServerConfig};
