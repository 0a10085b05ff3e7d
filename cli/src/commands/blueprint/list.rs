//! # Forge Blueprint List Command
//!
//! File: cli/src/commands/blueprint/list.rs
//!
//! ## Overview
//!
//! Implements `forge blueprint list`: loads every blueprint in the
//! configured directory and prints a catalogue table. Blueprints that fail
//! their load-time checks are left out of the table (the loader logs why).
//!
//! Example output:
//!
//! ```text
//! Available Blueprints in '/home/user/.config/forge/blueprints':
//!
//! Id         | Type       | Architecture | Description
//! -----------+------------+--------------+------------------------------
//! go-api     | web-api    | layered      | Go HTTP service with optional Docker
//! rust-cli   | cli        | single-crate | Rust command-line application
//!
//! Found 2 blueprint(s).
//! ```
//!
use super::utils;
use crate::blueprint::BlueprintSummary;
use crate::core::error::Result;
use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::info;

/// Arguments for `forge blueprint list`. The command currently takes none.
#[derive(Parser, Debug)]
pub struct ListArgs {}

/// # Handle Blueprint List Command (`handle_list`)
///
/// Opens the blueprint directory (the configured one unless `blueprints_dir`
/// overrides it), collects the catalogue and prints it.
pub async fn handle_list(_args: ListArgs, blueprints_dir: Option<PathBuf>) -> Result<()> {
    info!("Handling blueprint list command...");

    let (bp_dir, loader) = utils::open_loader(blueprints_dir.as_deref())?;
    let summaries = loader.list().with_context(|| {
        format!(
            "Failed to read blueprints from directory '{}'",
            bp_dir.display()
        )
    })?;

    print_blueprint_table(&summaries, &bp_dir);
    Ok(())
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max.saturating_sub(3)).collect();
    cut.push_str("...");
    cut
}

/// Formats the catalogue as a table, sizing the columns to their contents.
fn format_blueprint_table(summaries: &[BlueprintSummary]) -> String {
    let id_w = summaries.iter().map(|s| s.id.len()).max().unwrap_or(0).max(10);
    let type_w = summaries.iter().map(|s| s.kind.len()).max().unwrap_or(0).max(10);
    let arch_w = summaries
        .iter()
        .map(|s| s.architecture.len())
        .max()
        .unwrap_or(0)
        .max(12);

    let mut out = format!(
        "{:<id_w$} | {:<type_w$} | {:<arch_w$} | Description\n",
        "Id", "Type", "Architecture"
    );
    out.push_str(&format!(
        "{}-+-{}-+-{}-+-{}\n",
        "-".repeat(id_w),
        "-".repeat(type_w),
        "-".repeat(arch_w),
        "-".repeat(30)
    ));
    for s in summaries {
        let description = s.description.as_deref().unwrap_or("[No description]");
        out.push_str(&format!(
            "{:<id_w$} | {:<type_w$} | {:<arch_w$} | {}\n",
            s.id,
            s.kind,
            s.architecture,
            truncate(description, 60)
        ));
    }
    out
}

fn print_blueprint_table(summaries: &[BlueprintSummary], bp_dir: &Path) {
    if summaries.is_empty() {
        println!("No blueprints found in '{}'.", bp_dir.display());
        println!(
            "Add a blueprint by creating '{}/<id>/blueprint.toml' with a templates/ directory beside it.",
            bp_dir.display()
        );
        return;
    }

    println!("Available Blueprints in '{}':\n", bp_dir.display());
    print!("{}", format_blueprint_table(summaries));
    println!("\nFound {} blueprint(s).", summaries.len());
    println!(
        "Use 'forge blueprint info <Id>' for details or 'forge blueprint create <Id> <dir>' to use one."
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(id: &str, description: Option<&str>) -> BlueprintSummary {
        BlueprintSummary {
            id: id.into(),
            name: id.into(),
            kind: "cli".into(),
            architecture: "single-crate".into(),
            description: description.map(str::to_string),
            variable_count: 1,
            file_count: 2,
        }
    }

    #[test]
    fn test_table_layout() {
        let table = format_blueprint_table(&[
            summary("go-api", Some("Go HTTP service")),
            summary("rust-cli", None),
        ]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Id         | Type       | Architecture | Description"));
        assert!(lines[2].starts_with("go-api     | cli        | single-crate | Go HTTP service"));
        assert!(lines[3].ends_with("[No description]"));
    }

    #[test]
    fn test_truncate_long_descriptions() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghijkl", 8), "abcde...");
    }

    #[tokio::test]
    async fn test_handle_list_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let result = handle_list(ListArgs {}, Some(dir.path().join("missing"))).await;
        assert!(result.is_err());
    }
}
