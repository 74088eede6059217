//! # Chat Bridge Service
//!
//! Thin entry point that delegates to lib-web for server setup.
//! Settings come from the environment, with `.env` loaded first when present.

use lib_web::{start_server, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    start_server(ServerConfig::from_env()).await
}
