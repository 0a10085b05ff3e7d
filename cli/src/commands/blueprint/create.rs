//! # Forge Blueprint Create Command
//!
//! File: cli/src/commands/blueprint/create.rs
//!
//! ## Overview
//!
//! Implements `forge blueprint create <id> <dir>`: runs the full generation
//! pipeline for a blueprint and writes the result either as a directory tree
//! or, with `--archive`, as a single `.tar.gz` file.
//!
//! ## Architecture
//!
//! 1. Open the blueprint loader over the configured directory.
//! 2. Turn `--var KEY=VALUE` flags into a raw configuration payload.
//! 3. Run `Generator::generate`. Validation and render errors are printed in
//!    full and nothing is written.
//! 4. Write the project:
//!    - directory mode assembles on disk, refusing a non-empty target unless
//!      `--force` is given
//!    - archive mode packages the project and writes the archive bytes,
//!      refusing an existing file unless `--force` is given
//! 5. Print the generated tree and the blueprint's hooks as next steps. Hooks
//!    are never run by Forge.
//!
//! ## Examples
//!
//! ```bash
//! forge blueprint create go-api ./my-api --var ProjectName=my-api --var UseDocker=true
//! forge blueprint create rust-cli ./tool.tar.gz --archive --var CrateName=tool
//! ```
//!
use super::utils::{self, tree_printer};
use crate::blueprint::schema::Hook;
use crate::common::archive;
use crate::core::error::{ForgeError, Result};
use crate::generate::{GeneratedProject, GenerationRequest, Generator};
use anyhow::Context;
use clap::Parser;
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

/// Arguments for `forge blueprint create`.
#[derive(Parser, Debug)]
pub struct CreateArgs {
    /// The blueprint id (its directory name).
    blueprint_id: String,

    /// Where to write the project: a directory, or a file with `--archive`.
    target: PathBuf,

    /// A variable value, `KEY=VALUE`. Can be given multiple times.
    #[arg(long = "var", value_parser = utils::parse_key_val, action = clap::ArgAction::Append)]
    var: Vec<(String, String)>,

    /// Write into a non-empty directory, or replace an existing archive.
    #[arg(long, short = 'f')]
    force: bool,

    /// Write a gzip-compressed tar archive instead of a directory.
    #[arg(long)]
    archive: bool,
}

/// # Handle Blueprint Create Command (`handle_create`)
///
/// ## Errors
///
/// Fails if the blueprint cannot be loaded, the configuration is invalid,
/// any template fails to render, two files collide, or the target cannot be
/// written. In every case nothing is left on disk.
pub async fn handle_create(args: CreateArgs, blueprints_dir: Option<PathBuf>) -> Result<()> {
    info!(
        "Creating project at '{}' from '{}' blueprint",
        args.target.display(),
        args.blueprint_id
    );

    let (_, loader) = utils::open_loader(blueprints_dir.as_deref())?;
    let generator = Generator::new(loader);

    let mut request = GenerationRequest::new(&args.blueprint_id);
    request.config = utils::raw_config(&args.var);
    debug!("Raw configuration: {:?}", request.config);

    let project = match generator.generate(request) {
        Ok(project) => project,
        Err(err) => {
            utils::print_error_details(&err);
            return Err(err).with_context(|| {
                format!("Failed to generate project from '{}'", args.blueprint_id)
            });
        }
    };

    let target = absolute(&args.target)?;
    if args.archive {
        write_archive(&generator, project.clone(), &target, args.force)?;
    } else {
        generator
            .write_to_disk(&project, target.clone(), args.force)
            .with_context(|| format!("Failed to write project to '{}'", target.display()))?;
    }

    print_completion_message(&project, &target, args.archive);
    Ok(())
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = env::current_dir().context("Failed to get current directory")?;
    Ok(cwd.join(path))
}

fn write_archive(
    generator: &Generator,
    project: GeneratedProject,
    target: &Path,
    force: bool,
) -> Result<()> {
    if target.is_dir() {
        anyhow::bail!("'{}' is a directory, expected an archive path", target.display());
    }
    if target.exists() && !force {
        return Err(ForgeError::FileSystem(format!(
            "'{}' already exists; pass --force to replace it",
            target.display()
        )))
        .context("Refusing to overwrite archive");
    }

    let packaged = generator.package(project).context("Failed to package project")?;
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory '{}'", parent.display()))?;
    }
    fs::write(target, &packaged.archive)
        .with_context(|| format!("Failed to write archive '{}'", target.display()))?;
    info!("Wrote {} byte archive to {}", packaged.archive.len(), target.display());
    Ok(())
}

/// Relative to the current directory when possible, for friendlier output.
fn display_path(target: &Path) -> String {
    env::current_dir()
        .ok()
        .and_then(|cwd| pathdiff::diff_paths(target, cwd))
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| target.display().to_string())
}

fn format_next_steps(hooks: &[Hook], target: &str, archive: bool) -> Vec<String> {
    let mut steps = Vec::new();
    if archive {
        steps.push(format!("Unpack the archive: tar -xzf {}", target));
    } else {
        steps.push(format!("Navigate to your project: cd {}", target));
    }
    for hook in hooks {
        if hook.description.is_empty() {
            steps.push(format!("Run: {}", hook.command));
        } else {
            steps.push(format!("{}: {}", hook.description, hook.command));
        }
    }
    steps
}

fn print_completion_message(project: &GeneratedProject, target: &Path, archive: bool) {
    let shown = display_path(target);
    let label = if archive {
        format!("{} ({})", shown, archive::EXTENSION)
    } else {
        shown.clone()
    };

    println!(
        "\n✅ Project generated from '{}' ({} file(s)).",
        project.blueprint_id,
        project.files.len()
    );
    println!("   Location: {}\n", target.display());
    print!(
        "{}",
        tree_printer::render_tree(&label, project.files.iter().map(|f| f.path.as_str()))
    );

    if !project.dependencies.is_empty() {
        println!("\nDependencies:");
        for dep in &project.dependencies {
            println!("  - {} {}", dep.module, dep.version);
        }
    }

    println!("\nNext steps:");
    for (i, step) in format_next_steps(&project.hooks, &shown, archive)
        .iter()
        .enumerate()
    {
        println!("  {}. {}", i + 1, step);
    }
}
