//! # Forge Generation Server
//!
//! File: cli/src/commands/srv/mod.rs
//!
//! ## Overview
//!
//! `forge serve` runs the generation engine behind an HTTP and WebSocket
//! API: clients list blueprints, validate configurations, generate projects,
//! watch generation progress live and download the resulting archive while
//! it is held in the expiring session store.
//!
//! ## Architecture
//!
//! - `config.rs`: merges `serve` flags with the Forge configuration
//! - `server_logic.rs`: startup, middleware, port selection, shutdown
//! - `routes.rs`: the JSON API and its error mapping
//! - `ws.rs`: the progress WebSocket
//!
//! ## Examples
//!
//! ```bash
//! forge serve --port 9000 --blueprints ./blueprints
//! curl -s localhost:9000/blueprints
//! curl -s -X POST localhost:9000/generate \
//!      -H 'content-type: application/json' \
//!      -d '{"blueprint_id":"go-api","config":{"ProjectName":"demo"}}'
//! ```
//!
use crate::core::error::Result;
use tracing::info;

pub use config::ServeArgs;

/// Merges command-line flags with the loaded configuration.
pub mod config;

/// JSON API handlers, shared state and error responses.
pub mod routes;

/// Server startup, middleware and graceful shutdown.
pub mod server_logic;

/// The per-generation progress WebSocket.
pub mod ws;

/// # Handle Serve Command (`handle_serve`)
///
/// Loads the effective configuration and runs the server until shutdown.
pub async fn handle_serve(args: ServeArgs) -> Result<()> {
    info!("Handling serve command with args: {:?}", args);
    let config = config::load_and_merge_config(args).await?;
    info!("Effective server config: {:?}", config);
    server_logic::run_server(config).await?;
    Ok(())
}
