//! # Forge Server Configuration
//!
//! File: cli/src/commands/srv/config.rs
//!
//! ## Overview
//!
//! Turns `forge serve` arguments plus the loaded Forge configuration into
//! the one [`ServerConfig`] the server runs with. Flags given on the command
//! line win over every configuration file; anything left unset falls back
//! to `[server]`, `[sessions]`, `[progress]` and `[blueprints]` from the
//! merged `ForgeConfig`.
//!
//! ## Examples
//!
//! ```bash
//! forge serve                                  # everything from config
//! forge serve --host 0.0.0.0 --port 9000       # override the bind address
//! forge serve --blueprints ./blueprints --no-cors --ttl-secs 600
//! ```
//!
use crate::core::config::{self, ForgeConfig};
use crate::core::error::Result;
use anyhow::Context;
use clap::Parser;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// # Serve Command Arguments (`ServeArgs`)
#[derive(Parser, Debug, Default)]
pub struct ServeArgs {
    /// Network address to bind. Defaults to `[server] host` (127.0.0.1).
    #[arg(long)]
    pub host: Option<IpAddr>,

    /// Port to listen on; the next free port is used if it is taken.
    /// Defaults to `[server] port` (8080).
    #[arg(long, short)]
    pub port: Option<u16>,

    /// Do not send CORS headers.
    #[arg(long)]
    pub no_cors: bool,

    /// Read blueprints from this directory instead of the configured one.
    #[arg(long)]
    pub blueprints: Option<PathBuf>,

    /// How long generated projects stay downloadable, in seconds.
    #[arg(long)]
    pub ttl_secs: Option<u64>,
}

/// # Effective Server Configuration (`ServerConfig`)
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    pub enable_cors: bool,
    pub blueprints_dir: PathBuf,
    pub ttl: Duration,
    pub sweep_interval: Duration,
    pub listener_buffer: usize,
}

impl ServerConfig {
    /// Applies `args` on top of `cfg`.
    pub fn from_parts(cfg: &ForgeConfig, args: &ServeArgs) -> Result<Self> {
        let ttl_secs = args.ttl_secs.unwrap_or(cfg.sessions.ttl_secs);
        if ttl_secs == 0 {
            anyhow::bail!("--ttl-secs must be greater than zero");
        }
        let blueprints_dir = match &args.blueprints {
            Some(dir) => dir.clone(),
            None => PathBuf::from(&cfg.blueprints.directory),
        };
        Ok(Self {
            host: args.host.unwrap_or(cfg.server.host),
            port: args.port.unwrap_or(cfg.server.port),
            enable_cors: cfg.server.enable_cors && !args.no_cors,
            blueprints_dir,
            ttl: Duration::from_secs(ttl_secs),
            sweep_interval: cfg.sessions.sweep_interval(),
            listener_buffer: cfg.progress.listener_buffer,
        })
    }
}

/// # Load and Merge Server Configuration (`load_and_merge_config`)
///
/// Loads the Forge configuration, applies the command-line flags and checks
/// that the blueprint directory exists.
pub async fn load_and_merge_config(args: ServeArgs) -> Result<ServerConfig> {
    let cfg = config::load_config().context("Failed to load Forge configuration")?;
    let effective = ServerConfig::from_parts(&cfg, &args)?;
    debug!("Effective server config: {:?}", effective);

    if !effective.blueprints_dir.is_dir() {
        anyhow::bail!(
            "Blueprint directory '{}' does not exist or is not a directory.",
            effective.blueprints_dir.display()
        );
    }
    Ok(effective)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_defaults_come_from_config() {
        let cfg = ForgeConfig::default();
        let effective = ServerConfig::from_parts(&cfg, &ServeArgs::default()).unwrap();
        assert_eq!(effective.host, IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(effective.port, 8080);
        assert!(effective.enable_cors);
        assert_eq!(effective.ttl, Duration::from_secs(3600));
        assert_eq!(effective.sweep_interval, Duration::from_secs(900));
        assert_eq!(effective.listener_buffer, 64);
    }

    #[test]
    fn test_flags_override_config() {
        let cfg = ForgeConfig::default();
        let args = ServeArgs::try_parse_from([
            "serve",
            "--host",
            "0.0.0.0",
            "-p",
            "9000",
            "--no-cors",
            "--blueprints",
            "/srv/bp",
            "--ttl-secs",
            "60",
        ])
        .unwrap();
        let effective = ServerConfig::from_parts(&cfg, &args).unwrap();
        assert_eq!(effective.host, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert_eq!(effective.port, 9000);
        assert!(!effective.enable_cors);
        assert_eq!(effective.blueprints_dir, PathBuf::from("/srv/bp"));
        assert_eq!(effective.ttl, Duration::from_secs(60));
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let args = ServeArgs {
            ttl_secs: Some(0),
            ..Default::default()
        };
        assert!(ServerConfig::from_parts(&ForgeConfig::default(), &args).is_err());
    }
}
