//! # Forge Blueprint Validate Command
//!
//! File: cli/src/commands/blueprint/validate.rs
//!
//! ## Overview
//!
//! Implements `forge blueprint validate <id> --var KEY=VALUE ...`: resolves
//! the given variables against the blueprint without rendering anything and
//! reports either the resolved configuration or every validation error at
//! once. This is the command-line counterpart of `POST /validate`.
//!
use super::utils;
use crate::blueprint::variables::VariableValue;
use crate::core::error::{ForgeError, Result};
use crate::generate::Generator;
use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

/// Arguments for `forge blueprint validate`.
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// The blueprint id (its directory name).
    blueprint_id: String,

    /// A variable value, `KEY=VALUE`. Can be given multiple times.
    #[arg(long = "var", value_parser = utils::parse_key_val, action = clap::ArgAction::Append)]
    var: Vec<(String, String)>,
}

fn display_value(value: &VariableValue) -> String {
    match value {
        VariableValue::String(s) | VariableValue::Choice(s) => s.clone(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

/// # Handle Blueprint Validate Command (`handle_validate`)
///
/// ## Errors
///
/// Fails if the blueprint cannot be loaded or the configuration is invalid.
/// Each validation error is printed before the command fails.
pub async fn handle_validate(args: ValidateArgs, blueprints_dir: Option<PathBuf>) -> Result<()> {
    info!("Handling blueprint validate command for '{}'...", args.blueprint_id);

    let (_, loader) = utils::open_loader(blueprints_dir.as_deref())?;
    let generator = Generator::new(loader);
    let config = utils::raw_config(&args.var);

    match generator.validate(&args.blueprint_id, &config) {
        Ok(vars) => {
            println!("✅ Configuration is valid for '{}'.", args.blueprint_id);
            for (name, value) in vars.iter() {
                println!("   {} = {}", name, display_value(value));
            }
            Ok(())
        }
        Err(err @ ForgeError::Validation(_)) => {
            utils::print_error_details(&err);
            Err(err).context("Configuration is invalid")
        }
        Err(err) => {
            Err(err).with_context(|| format!("Failed to load blueprint '{}'", args.blueprint_id))
        }
    }
}
