//! # Forge Configuration System
//!
//! File: cli/src/core/config.rs
//!
//! ## Overview
//!
//! Loads, merges and validates the settings shared by the CLI and the HTTP
//! server: where blueprints live, how the server binds, how long generated
//! projects stay downloadable and how often expired ones are swept.
//!
//! ## Architecture
//!
//! Configuration sources (in order of precedence):
//! 1. Command-line flags (applied by the command handlers on top of the result)
//! 2. The `FORGE_BLUEPRINTS_DIR` environment variable
//! 3. Project-specific `.forge.toml` in the current directory or ancestors
//! 4. User-specific `config.toml` in the platform config directory
//! 5. Default values defined in the code
//!
//! Paths are tilde-expanded and the merged result is validated before use.
//!
//! ## Examples
//!
//! ```rust,no_run
//! let cfg = forge::core::config::load_config()?;
//! let blueprint_dir = &cfg.blueprints.directory;
//! let ttl = cfg.sessions.ttl();
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
use crate::core::error::{ForgeError, Result};
use anyhow::{anyhow, Context};
use directories::ProjectDirs;
use serde::Deserialize;
use std::{
    fs,
    net::{IpAddr, Ipv4Addr},
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::{debug, info, warn};

/// Represents the main configuration structure, loaded from TOML files.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct ForgeConfig {
    #[serde(default)]
    pub blueprints: BlueprintsConfig,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub sessions: SessionSettings,
    #[serde(default)]
    pub progress: ProgressSettings,
}

/// Where blueprint definitions are read from.
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct BlueprintsConfig {
    /// Directory holding one subdirectory per blueprint (can use ~).
    #[serde(default = "default_blueprint_dir")]
    pub directory: String,
}

impl Default for BlueprintsConfig {
    fn default() -> Self {
        Self {
            directory: default_blueprint_dir(),
        }
    }
}

/// Settings for `forge serve`.
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_true")]
    pub enable_cors: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            enable_cors: true,
        }
    }
}

/// Lifetime of generated artifacts held by the session store.
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct SessionSettings {
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl SessionSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

/// Live-preview channel settings.
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct ProgressSettings {
    /// Per-listener delivery buffer; a listener whose buffer fills is dropped.
    #[serde(default = "default_listener_buffer")]
    pub listener_buffer: usize,
}

impl Default for ProgressSettings {
    fn default() -> Self {
        Self {
            listener_buffer: default_listener_buffer(),
        }
    }
}

fn default_blueprint_dir() -> String {
    "~/.config/forge/blueprints".to_string()
}
fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}
fn default_port() -> u16 {
    8080
}
fn default_true() -> bool {
    true
}
fn default_ttl_secs() -> u64 {
    3600
}
fn default_sweep_interval_secs() -> u64 {
    900
}
fn default_listener_buffer() -> usize {
    64
}

const PROJECT_CONFIG_FILENAME: &str = ".forge.toml";
pub const BLUEPRINTS_DIR_ENV: &str = "FORGE_BLUEPRINTS_DIR";

/// # Load Configuration (`load_config`)
///
/// Produces the effective `ForgeConfig` for this invocation.
///
/// ## Process:
/// 1. Reads the user `config.toml`, if the platform has a config directory
///    and the file exists.
/// 2. Searches for `.forge.toml` from the current directory upwards,
///    stopping at the first directory that contains `.git`.
/// 3. Merges the two, project values first (see `merge_configs`).
/// 4. Applies `FORGE_BLUEPRINTS_DIR`.
/// 5. Expands `~` in paths and validates the result.
///
/// ## Returns
///
/// * `Result<ForgeConfig>`: the merged configuration. With no files and no
///   environment override this is `ForgeConfig::default()`, expanded.
///
/// ## Errors
///
/// - A config file exists but cannot be read or is not valid TOML (unknown
///   keys included).
/// - The current directory cannot be determined.
/// - Validation fails: the blueprint path is a file, or a session or
///   progress setting is zero.
pub fn load_config() -> Result<ForgeConfig> {
    let user_config = load_user_config()?;
    let project_config = load_project_config()?;
    let mut merged_config = merge_configs(user_config.unwrap_or_default(), project_config);
    // Environment beats both files; CLI flags are applied later by the caller.
    apply_env_overrides(&mut merged_config);
    expand_config_paths(&mut merged_config).context("Failed to expand paths in configuration")?;
    validate_config(&merged_config).context("Configuration validation failed")?;
    debug!("Final loaded configuration: {:?}", merged_config);
    Ok(merged_config)
}

/// Reads `<config dir>/forge/config.toml`. `Ok(None)` when the platform has
/// no config directory or the file is absent.
fn load_user_config() -> Result<Option<ForgeConfig>> {
    if let Some(proj_dirs) = ProjectDirs::from("dev", "Forge", "forge") {
        let config_path = proj_dirs.config_dir().join("config.toml");
        if config_path.exists() {
            info!("Loading user configuration from: {}", config_path.display());
            load_config_from_path(&config_path).map(Some)
        } else {
            debug!(
                "User configuration file not found at {}",
                config_path.display()
            );
            Ok(None)
        }
    } else {
        warn!("Could not determine user config directory.");
        Ok(None)
    }
}

fn load_project_config() -> Result<Option<ForgeConfig>> {
    if let Some(project_config_path) = find_project_config_path()? {
        info!(
            "Loading project configuration from: {}",
            project_config_path.display()
        );
        load_config_from_path(&project_config_path).map(Some)
    } else {
        debug!("No project configuration file (.forge.toml) found in current directory or ancestors.");
        Ok(None)
    }
}

/// # Find Project Config (`find_project_config_path`)
///
/// Walks from the current directory towards the filesystem root looking for
/// `.forge.toml`. A directory containing `.git` is the last one checked, so
/// a config file outside the enclosing repository is never picked up.
///
/// ## Returns
///
/// * `Ok(Some(path))` for the nearest `.forge.toml`.
/// * `Ok(None)` if none exists below the repository root (or filesystem
///   root outside a repository).
fn find_project_config_path() -> Result<Option<PathBuf>> {
    let current_dir = std::env::current_dir().context("Failed to get current directory")?;
    let mut path: &Path = &current_dir;
    loop {
        let project_config = path.join(PROJECT_CONFIG_FILENAME);
        if project_config.is_file() {
            return Ok(Some(project_config));
        }
        if path.join(".git").is_dir() {
            debug!(
                "Found .git directory at {}, stopping project config search.",
                path.display()
            );
            return Ok(None);
        }
        match path.parent() {
            Some(parent) => path = parent,
            None => break,
        }
    }
    Ok(None)
}

/// # Load Config File (`load_config_from_path`)
///
/// Parses one TOML file into a `ForgeConfig`. Missing sections and keys take
/// their defaults; unknown keys are rejected.
///
/// ## Errors
///
/// The file cannot be read, or its contents do not parse.
pub fn load_config_from_path(path: &Path) -> Result<ForgeConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse TOML from file: {}", path.display()))
}

/// Project values win wherever they differ from the built-in defaults.
fn merge_configs(user: ForgeConfig, project: Option<ForgeConfig>) -> ForgeConfig {
    let project_cfg = match project {
        Some(p) => p,
        None => return user,
    };
    let mut merged = ForgeConfig::default();
    merged.blueprints.directory = if project_cfg.blueprints.directory != default_blueprint_dir() {
        project_cfg.blueprints.directory
    } else {
        user.blueprints.directory
    };
    merged.server.host = if project_cfg.server.host != default_host() {
        project_cfg.server.host
    } else {
        user.server.host
    };
    merged.server.port = if project_cfg.server.port != default_port() {
        project_cfg.server.port
    } else {
        user.server.port
    };
    merged.server.enable_cors = project_cfg.server.enable_cors && user.server.enable_cors;
    merged.sessions.ttl_secs = if project_cfg.sessions.ttl_secs != default_ttl_secs() {
        project_cfg.sessions.ttl_secs
    } else {
        user.sessions.ttl_secs
    };
    merged.sessions.sweep_interval_secs =
        if project_cfg.sessions.sweep_interval_secs != default_sweep_interval_secs() {
            project_cfg.sessions.sweep_interval_secs
        } else {
            user.sessions.sweep_interval_secs
        };
    merged.progress.listener_buffer =
        if project_cfg.progress.listener_buffer != default_listener_buffer() {
            project_cfg.progress.listener_buffer
        } else {
            user.progress.listener_buffer
        };
    merged
}

fn apply_env_overrides(config: &mut ForgeConfig) {
    if let Ok(dir) = std::env::var(BLUEPRINTS_DIR_ENV) {
        if !dir.trim().is_empty() {
            debug!("Blueprint directory overridden by {}: {}", BLUEPRINTS_DIR_ENV, dir);
            config.blueprints.directory = dir;
        }
    }
}

/// Expands a leading `~` in the blueprint directory.
pub fn expand_config_paths(config: &mut ForgeConfig) -> Result<()> {
    config.blueprints.directory = shellexpand::tilde(&config.blueprints.directory).into_owned();
    debug!(
        "Expanded blueprint directory: {}",
        config.blueprints.directory
    );
    Ok(())
}

/// # Validate Configuration (`validate_config`)
///
/// Checks the merged, expanded configuration before anything uses it.
///
/// A blueprint directory that does not exist yet only logs a warning, so
/// the server can start before any blueprint is installed.
///
/// ## Errors
///
/// A `ForgeError::Config` (wrapped in `anyhow`) when:
/// - the blueprint path exists but is not a directory;
/// - `sessions.ttl_secs` or `sessions.sweep_interval_secs` is zero;
/// - `progress.listener_buffer` is zero.
pub fn validate_config(config: &ForgeConfig) -> Result<()> {
    let bp_dir = PathBuf::from(&config.blueprints.directory);
    if !bp_dir.exists() {
        warn!(
            "Configured blueprint directory '{}' does not exist.",
            bp_dir.display()
        );
    } else if !bp_dir.is_dir() {
        return Err(anyhow!(ForgeError::Config(format!(
            "Configured blueprint path '{}' exists but is not a directory.",
            bp_dir.display()
        ))));
    }
    if config.sessions.ttl_secs == 0 {
        return Err(anyhow!(ForgeError::Config(
            "sessions.ttl_secs must be greater than zero.".to_string()
        )));
    }
    if config.sessions.sweep_interval_secs == 0 {
        return Err(anyhow!(ForgeError::Config(
            "sessions.sweep_interval_secs must be greater than zero.".to_string()
        )));
    }
    if config.progress.listener_buffer == 0 {
        return Err(anyhow!(ForgeError::Config(
            "progress.listener_buffer must be greater than zero.".to_string()
        )));
    }
    Ok(())
}
