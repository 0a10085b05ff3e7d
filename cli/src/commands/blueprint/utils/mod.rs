//! # Blueprint Command Utilities
//!
//! File: cli/src/commands/blueprint/utils/mod.rs
//!
//! ## Overview
//!
//! Helpers shared by the `forge blueprint` subcommands:
//!
//! - opening a [`BlueprintLoader`] over the configured blueprint directory
//! - parsing repeated `--var KEY=VALUE` flags into a raw configuration payload
//! - printing batched validation and render errors
//! - `tree_printer`: drawing a list of paths as a tree
//!
use crate::blueprint::variables::RawConfig;
use crate::blueprint::BlueprintLoader;
use crate::core::config;
use crate::core::error::{ForgeError, Result};
use anyhow::{anyhow, Context};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// # Tree Printer (`tree_printer`)
///
/// Renders relative file paths as a `tree`-style listing.
pub mod tree_printer;

/// # Parse Key-Value Pair (`parse_key_val`)
///
/// Used by `clap` for `--var` flags. Expects `KEY=VALUE` and splits on the
/// first `=`, so values may themselves contain `=`.
pub fn parse_key_val(s: &str) -> Result<(String, String)> {
    s.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| {
            anyhow!(
                "Invalid variable format: '{}'. Expected format: KEY=VALUE",
                s
            )
        })
}

/// Turns `--var` pairs into a payload. Every value is passed as a JSON
/// string; the resolver coerces `"true"` and numeric strings per kind. A
/// repeated key keeps its last value.
pub fn raw_config(vars: &[(String, String)]) -> RawConfig {
    vars.iter()
        .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
        .collect()
}

/// # Open Blueprint Loader (`open_loader`)
///
/// Loads the Forge configuration and opens a loader over its blueprint
/// directory, or over `override_dir` when given.
///
/// ## Errors
///
/// Fails if configuration loading fails or the directory does not exist.
pub fn open_loader(override_dir: Option<&Path>) -> Result<(PathBuf, Arc<BlueprintLoader>)> {
    let bp_dir = match override_dir {
        Some(dir) => dir.to_path_buf(),
        None => {
            let cfg = config::load_config().context("Failed to load Forge configuration")?;
            PathBuf::from(&cfg.blueprints.directory)
        }
    };
    debug!("Using blueprint directory: {}", bp_dir.display());

    if !bp_dir.is_dir() {
        anyhow::bail!(
            "Blueprint directory '{}' is not a valid directory (or does not exist). \
             Check your Forge configuration or pass --blueprints.",
            bp_dir.display()
        );
    }
    let loader = Arc::new(BlueprintLoader::from_directory(bp_dir.clone()));
    Ok((bp_dir, loader))
}

/// Prints every entry of a batched validation or render failure to stderr.
/// Other errors print nothing; the caller still propagates them.
pub fn print_error_details(err: &ForgeError) {
    match err {
        ForgeError::Validation(errors) => {
            eprintln!("\nInvalid configuration:");
            for e in errors {
                eprintln!("  - {}", e);
            }
        }
        ForgeError::Render(errors) => {
            eprintln!("\nTemplates failed to render:");
            for e in errors {
                eprintln!("  - {}", e);
            }
        }
        _ => {}
    }
}
