//! # Forge Blueprint Command Group
//!
//! File: cli/src/commands/blueprint/mod.rs
//!
//! ## Overview
//!
//! Entry point and router for `forge blueprint`. It defines the subcommands
//! (`list`, `info`, `validate`, `create`) and dispatches each to its handler.
//! Every subcommand accepts `--blueprints <dir>` to read blueprints from a
//! directory other than the configured one.
//!
//! ## Examples
//!
//! ```bash
//! forge blueprint list
//! forge blueprint info go-api
//! forge blueprint validate go-api --var ProjectName=my-api
//! forge blueprint create go-api ./my-api --var ProjectName=my-api
//! ```
//!
use crate::core::error::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Contains the handler and arguments for `forge blueprint create`.
mod create;
/// Contains the handler and arguments for `forge blueprint info`.
mod info;
/// Contains the handler and arguments for `forge blueprint list`.
mod list;
/// Contains the handler and arguments for `forge blueprint validate`.
mod validate;
/// Helpers shared by the subcommands (loader setup, `--var` parsing, tree printing).
pub mod utils;

/// # Blueprint Command Group Arguments (`BlueprintArgs`)
#[derive(Parser, Debug)]
pub struct BlueprintArgs {
    /// Read blueprints from this directory instead of the configured one.
    #[arg(long, global = true, env = "FORGE_BLUEPRINTS_DIR")]
    blueprints: Option<PathBuf>,

    #[command(subcommand)]
    command: BlueprintCommand,
}

/// # Blueprint Subcommands (`BlueprintCommand`)
#[derive(Subcommand, Debug)]
enum BlueprintCommand {
    /// List the blueprints in the blueprint directory.
    List(list::ListArgs),
    /// Show a blueprint's variables, files, dependencies and hooks.
    Info(info::InfoArgs),
    /// Check variable values against a blueprint without generating anything.
    Validate(validate::ValidateArgs),
    /// Generate a project from a blueprint.
    Create(create::CreateArgs),
}

/// # Handle Blueprint Command (`handle_blueprint`)
///
/// Dispatches to the handler of the chosen subcommand and propagates its result.
pub async fn handle_blueprint(args: BlueprintArgs) -> Result<()> {
    let dir = args.blueprints;
    match args.command {
        BlueprintCommand::List(args) => list::handle_list(args, dir).await?,
        BlueprintCommand::Info(args) => info::handle_info(args, dir).await?,
        BlueprintCommand::Validate(args) => validate::handle_validate(args, dir).await?,
        BlueprintCommand::Create(args) => create::handle_create(args, dir).await?,
    }
    Ok(())
}
