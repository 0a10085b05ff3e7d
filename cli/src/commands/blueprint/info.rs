//! # Forge Blueprint Info Command
//!
//! File: cli/src/commands/blueprint/info.rs
//!
//! ## Overview
//!
//! Implements `forge blueprint info <id>`: loads one blueprint (running all
//! of its load-time checks) and prints its metadata, variables, file
//! mappings, dependency entries, hooks and template layout. With `--json`
//! the checked schema is printed as JSON instead, in the same shape
//! `GET /blueprints/{id}` returns.
//!
//! ## Examples
//!
//! ```bash
//! forge blueprint info go-api
//! forge blueprint info go-api --json | jq '.variables[].name'
//! ```
//!
use super::utils::{self, tree_printer};
use crate::blueprint::schema::{BlueprintSchema, VariableSpec};
use crate::blueprint::variables::VariableValue;
use crate::core::error::Result;
use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

/// Arguments for `forge blueprint info`.
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// The blueprint id (its directory name).
    blueprint_id: String,

    /// Print the checked schema as JSON.
    #[arg(long)]
    json: bool,
}

/// # Handle Blueprint Info Command (`handle_info`)
///
/// ## Errors
///
/// Fails if the blueprint directory cannot be opened, or the blueprint is
/// missing or malformed. A malformed blueprint's error names the offending
/// field.
pub async fn handle_info(args: InfoArgs, blueprints_dir: Option<PathBuf>) -> Result<()> {
    info!("Handling blueprint info command for '{}'...", args.blueprint_id);

    let (_, loader) = utils::open_loader(blueprints_dir.as_deref())?;
    let blueprint = loader
        .load(&args.blueprint_id)
        .with_context(|| format!("Failed to load blueprint '{}'", args.blueprint_id))?;
    let schema = &blueprint.schema;

    if args.json {
        let json = serde_json::to_string_pretty(schema)
            .context("Failed to serialise blueprint schema")?;
        println!("{}", json);
        return Ok(());
    }

    print!("{}", format_details(schema));
    Ok(())
}

fn describe_default(value: &VariableValue) -> String {
    match value {
        VariableValue::String(s) | VariableValue::Choice(s) => format!("\"{}\"", s),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

fn format_variable(spec: &VariableSpec) -> String {
    let mut line = format!("┃    - {} ({}", spec.name, spec.kind);
    if spec.required {
        line.push_str(", required");
    }
    if let Some(default) = &spec.default {
        line.push_str(&format!(", default {}", describe_default(default)));
    }
    line.push(')');
    if !spec.choices.is_empty() {
        line.push_str(&format!(" one of [{}]", spec.choices.join(", ")));
    }
    if let Some(pattern) = &spec.pattern {
        line.push_str(&format!(" matching /{}/", pattern.as_str()));
    }
    if let Some(description) = &spec.description {
        line.push_str(&format!("\n┃        {}", description));
    }
    line
}

const RULE: &str = "┣--------------------------------------------------------------------┫";

/// Builds the boxed, human-readable report for `schema`.
fn format_details(schema: &BlueprintSchema) -> String {
    let mut out = Vec::new();
    out.push(String::new());
    out.push("┏━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┓".to_string());
    out.push(format!("┃ 🔎 Blueprint Details: {}", schema.id));
    out.push("┣━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┫".to_string());
    out.push(format!("┃ 🏷️  Name:          {}", schema.name));
    out.push(format!(
        "┃ 📝 Description:   {}",
        schema.description.as_deref().unwrap_or("[No description]")
    ));
    out.push(format!("┃ 🛠️  Type:          {}", schema.kind));
    out.push(format!("┃ 🧱 Architecture:  {}", schema.architecture));
    out.push(RULE.to_string());

    out.push(format!("┃ ⚙️  Variables ({}):", schema.variables.len()));
    if schema.variables.is_empty() {
        out.push("┃    (none)".to_string());
    }
    out.extend(schema.variables.iter().map(format_variable));
    out.push(RULE.to_string());

    out.push(format!("┃ 📄 Files ({}):", schema.files.len()));
    for mapping in &schema.files {
        let mut line = format!("┃    - {} → {}", mapping.source, mapping.destination);
        if mapping.manifest {
            line.push_str(" [manifest]");
        }
        if let Some(condition) = &mapping.condition {
            line.push_str(&format!(" when `{}`", condition.as_str()));
        }
        out.push(line);
    }

    if !schema.dependencies.is_empty() {
        out.push(RULE.to_string());
        out.push(format!("┃ 📦 Dependencies ({}):", schema.dependencies.len()));
        for dep in &schema.dependencies {
            let mut line = format!("┃    - {} {}", dep.module, dep.version);
            if let Some(condition) = &dep.condition {
                line.push_str(&format!(" when `{}`", condition.as_str()));
            }
            out.push(line);
        }
    }

    if !schema.hooks.is_empty() {
        out.push(RULE.to_string());
        out.push("┃ 🪝 Post-generation hooks:".to_string());
        for hook in &schema.hooks {
            if hook.description.is_empty() {
                out.push(format!("┃    $ {}", hook.command));
            } else {
                out.push(format!("┃    $ {}    # {}", hook.command, hook.description));
            }
        }
    }

    out.push(RULE.to_string());
    out.push("┃ 📁 Templates:".to_string());
    let tree = tree_printer::render_tree(
        "templates",
        schema.files.iter().map(|m| m.source.as_str()),
    );
    out.extend(tree.lines().map(|line| format!("┃    {}", line)));
    out.push(RULE.to_string());

    out.push("┃ 🚀 Usage:".to_string());
    out.push(format!(
        "┃      forge blueprint create {} <dir> --var Name=value ...",
        schema.id
    ));
    out.push("┗━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┛".to_string());

    let mut text = out.join("\n");
    text.push('\n');
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprint::{BlueprintLoader, MemorySource};

    #[test]
    fn test_info_args_requires_id() {
        assert!(InfoArgs::try_parse_from(["info"]).is_err());
        let args = InfoArgs::try_parse_from(["info", "go-api", "--json"]).unwrap();
        assert_eq!(args.blueprint_id, "go-api");
        assert!(args.json);
    }

    #[test]
    fn test_format_details_lists_everything() {
        let source = MemorySource::new().with_blueprint(
            "svc",
            r#"
            [blueprint]
            type = "web-api"
            architecture = "layered"

            [[variables]]
            name = "Database"
            kind = "choice"
            choices = ["postgres", "none"]
            default = "none"

            [[files]]
            source = "cmd/main.go.tera"

            [[files]]
            source = "db.go.tera"
            condition = "Database != 'none'"

            [[dependencies]]
            module = "github.com/lib/pq"
            version = "v1.10.9"
            condition = "Database == 'postgres'"

            [[hooks]]
            command = "go mod tidy"
            description = "Resolve checksums"
            "#,
            [("cmd/main.go.tera", "package main"), ("db.go.tera", "package db")],
        );
        let loader = BlueprintLoader::new(source);
        let blueprint = loader.load("svc").unwrap();
        let text = format_details(&blueprint.schema);

        assert!(text.contains("Blueprint Details: svc"));
        assert!(text.contains("- Database (choice, default \"none\") one of [postgres, none]"));
        assert!(text.contains("- db.go.tera → db.go when `Database != 'none'`"));
        assert!(text.contains("- github.com/lib/pq v1.10.9 when `Database == 'postgres'`"));
        assert!(text.contains("$ go mod tidy    # Resolve checksums"));
        assert!(text.contains("│   └── main.go.tera"));
    }
}
