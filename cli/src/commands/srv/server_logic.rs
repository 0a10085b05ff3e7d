//! # Forge HTTP Server Implementation
//!
//! File: cli/src/commands/srv/server_logic.rs
//!
//! ## Overview
//!
//! Starts the generation service behind `forge serve`:
//! - opens the blueprint loader over the configured directory
//! - creates the session store and starts its expiry sweeper
//! - starts the progress broadcaster actor
//! - binds the first free port at or after the requested one
//! - serves the API until Ctrl+C or SIGTERM, then shuts down gracefully
//!
//! ## Architecture
//!
//! [`create_app`] wraps the API router from `routes` in the tracing and CORS
//! middleware, so tests can drive exactly the router the server runs.
//!
use super::config::ServerConfig;
use super::routes::{self, AppState};
use crate::blueprint::BlueprintLoader;
use crate::core::error::Result;
use crate::progress::Broadcaster;
use crate::session::{spawn_sweeper, SessionStore};
use anyhow::Context;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{error, info, warn, Level};

/// # Run HTTP Server (`run_server`)
///
/// Builds the generation service from `config` and serves it until a
/// shutdown signal arrives.
///
/// ## Process:
/// 1. Finds a bindable address, starting at the configured port.
/// 2. Opens the blueprint loader and counts the blueprints for the banner.
///    A directory that cannot be listed is logged, not fatal: blueprints
///    can be added while the server runs.
/// 3. Creates the session store, its sweeper and the progress broadcaster.
/// 4. Prints the banner, binds the listener and serves with graceful
///    shutdown.
/// 5. Stops the sweeper once the server has drained.
///
/// ## Arguments
///
/// * `config`: the merged `ServerConfig` (address, blueprint directory,
///   session TTL and sweep interval, listener buffer, CORS).
///
/// ## Returns
///
/// * `Result<()>`: `Ok(())` after a clean shutdown.
///
/// ## Errors
///
/// - No port is free within the allowed attempts.
/// - Binding the `TcpListener` fails.
/// - `axum::serve` fails while running.
pub async fn run_server(config: ServerConfig) -> Result<()> {
    // Resolve the final address first so the banner shows the real port.
    let max_port_attempts = 10;
    let addr = find_available_port(config.host, config.port, max_port_attempts).await?;

    let loader = Arc::new(BlueprintLoader::from_directory(config.blueprints_dir.clone()));
    let blueprint_count = match loader.list() {
        Ok(summaries) => summaries.len(),
        Err(e) => {
            warn!("Could not list blueprints at startup: {}", e);
            0
        }
    };

    // Shared engine state. The sweeper holds its own `Arc` to the store.
    let store = Arc::new(SessionStore::new(config.ttl));
    let sweeper = spawn_sweeper(Arc::clone(&store), config.sweep_interval);
    let progress = Broadcaster::spawn(config.listener_buffer);
    let app = create_app(AppState::new(loader, store, progress), config.enable_cors);

    println!("\n=================================================================");
    println!("📂 Blueprints from:    {}", config.blueprints_dir.display());
    println!("📚 Blueprints loaded:  {}", blueprint_count);
    println!("🌐 Local URL:          http://localhost:{}", addr.port());
    println!("⚙️  Binding to address: {}", addr);
    println!("⏳ Artifact TTL:       {}s", config.ttl.as_secs());
    println!("🔒 CORS enabled:       {}", config.enable_cors);
    println!("=================================================================\n");

    info!(
        "Starting server on {} for blueprints in {}",
        addr,
        config.blueprints_dir.display()
    );
    println!("Server starting! Press Ctrl+C to stop.");

    // The port search above released its listener; bind again to serve.
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind TCP listener to address {}", addr))?;

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    sweeper.stop();
    println!("\nServer shutdown complete.");
    Ok(())
}

/// # Handle Shutdown Signal (`shutdown_signal`)
///
/// Resolves on Ctrl+C, or on SIGTERM on Unix. Passed to
/// `with_graceful_shutdown`, so in-flight requests (including a running
/// generation) finish before the server exits.
///
/// ## Returns
///
/// * A future that completes on the first signal received. If the SIGTERM
///   handler cannot be installed, only Ctrl+C ends it.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
        info!("Received Ctrl+C, initiating graceful shutdown...");
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
                info!("Received SIGTERM, initiating graceful shutdown...");
            }
            Err(e) => {
                error!(
                    "Failed to install SIGTERM handler: {}. Shutdown on SIGTERM might not work.",
                    e
                );
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// # Find Available Port (`find_available_port`)
///
/// Tries `start_port` and then the following ports, up to `max_attempts`
/// ports in total. Each candidate is bound and released immediately.
///
/// ## Arguments
///
/// * `req_host`: the address to bind on.
/// * `start_port`: the first port tried.
/// * `max_attempts`: how many consecutive ports to try.
///
/// ## Returns
///
/// * `Result<SocketAddr>`: the first address that could be bound.
///
/// ## Errors
///
/// Fails when every candidate is taken, or when the port range runs out
/// before `max_attempts` is reached.
async fn find_available_port(
    req_host: std::net::IpAddr,
    start_port: u16,
    max_attempts: u8,
) -> Result<SocketAddr> {
    let mut current_port = start_port;

    for attempt in 0..max_attempts {
        let addr = SocketAddr::new(req_host, current_port);
        match TcpListener::bind(addr).await {
            Ok(listener) => {
                drop(listener);
                if attempt > 0 {
                    info!(
                        "Port {} was unavailable, successfully bound to available port {}.",
                        start_port, current_port
                    );
                }
                return Ok(addr);
            }
            Err(e) => {
                warn!(
                    "Attempt {}: Port {} on host {} is unavailable (Error: {}). Trying next port...",
                    attempt + 1,
                    current_port,
                    req_host,
                    e
                );
                current_port = match current_port.checked_add(1) {
                    Some(next) => next,
                    None => break,
                };
            }
        }
    }

    anyhow::bail!(
        "Could not find an available port on host {} starting from port {} after trying {} ports.",
        req_host,
        start_port,
        max_attempts
    )
}

/// # Create Axum Application (`create_app`)
///
/// Wraps the API router from `routes::router` in the middleware stack.
///
/// ## Arguments
///
/// * `state`: the shared `AppState` every handler receives.
/// * `enable_cors`: `true` adds a permissive `CorsLayer`; `false` adds an
///   empty one, which sets no CORS headers.
///
/// ## Returns
///
/// * `Router`: ready for `axum::serve`, or for `oneshot` in tests.
pub fn create_app(state: AppState, enable_cors: bool) -> Router {
    let cors_layer = if enable_cors {
        info!("CORS middleware enabled (permissive).");
        CorsLayer::permissive()
    } else {
        info!("CORS middleware disabled.");
        CorsLayer::new()
    };

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::default().include_headers(true))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    routes::router(state).layer(
        ServiceBuilder::new()
            .layer(trace_layer)
            .layer(cors_layer),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[tokio::test]
    async fn test_find_available_port_start_is_free() -> Result<()> {
        let host = Ipv4Addr::LOCALHOST.into();
        let start_port = 50000;
        let addr = find_available_port(host, start_port, 5).await?;
        assert_eq!(addr.port(), start_port);
        assert_eq!(addr.ip(), host);
        Ok(())
    }

    #[tokio::test]
    async fn test_find_available_port_start_occupied() -> Result<()> {
        let host = Ipv4Addr::LOCALHOST.into();
        let start_port = 51000;
        let _listener = TcpListener::bind(SocketAddr::new(host, start_port)).await?;

        let addr = find_available_port(host, start_port, 5).await?;
        assert!(addr.port() > start_port);
        assert!(addr.port() < start_port + 5);
        Ok(())
    }

    #[tokio::test]
    async fn test_shutdown_signal_creation() {
        let shutdown_future = shutdown_signal();
        drop(shutdown_future);
    }
}
