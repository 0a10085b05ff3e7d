//! # Forge Template Engine
//!
//! File: cli/src/core/templating/mod.rs
//!
//! ## Overview
//!
//! Wraps the Tera templating engine for blueprint rendering. A `TemplateSet`
//! holds every template of one blueprint, compiled once when the blueprint
//! is loaded and shared read-only by all generation requests afterwards.
//!
//! ## Architecture
//!
//! - Template bodies are registered under their source identifier (the path
//!   below the blueprint's `templates/` directory), all in one batch so
//!   `{% include %}`, `{% import %}` and `{% extends %}` can refer to each
//!   other by that identifier.
//! - Each file mapping's destination path is itself a template, registered
//!   under a synthetic `@destination/<index>` name.
//! - Autoescaping is off for every template: blueprints produce source code,
//!   not HTML.
//! - The filters in [`filters`] are registered on top of Tera's built-ins.
//! - [`references`] finds the context names a template reads, which lets
//!   the loader reject undeclared variables before anything is rendered.
//!
//! ## Examples
//!
//! ```rust
//! use forge::core::templating::TemplateSet;
//! use std::collections::BTreeMap;
//!
//! let mut bodies = BTreeMap::new();
//! bodies.insert("README.md.tera".to_string(), "# {{ name | pascal_case }}".to_string());
//! let set = TemplateSet::compile(&bodies, &["{{ name }}/README.md".to_string()]).unwrap();
//!
//! let mut context = tera::Context::new();
//! context.insert("name", "my-app");
//! assert_eq!(set.render_file("README.md.tera", &context).unwrap(), "# MyApp");
//! assert_eq!(set.render_path(0, &context).unwrap(), "my-app/README.md");
//! ```
//!
pub mod filters;
pub mod references;

use crate::core::error::{ForgeError, ForgeResult};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tera::{Context, Tera};

const DESTINATION_PREFIX: &str = "@destination/";

fn destination_name(index: usize) -> String {
    format!("{}{}", DESTINATION_PREFIX, index)
}

/// Flattens a Tera error and its causes into one line.
///
/// Tera's top-level message is usually just "Failed to render 'x'"; the
/// useful part (which variable, which filter, which line) lives in the
/// source chain.
pub fn describe(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// The compiled templates of a single blueprint.
pub struct TemplateSet {
    tera: Tera,
    sources: BTreeSet<String>,
    destinations: usize,
}

impl TemplateSet {
    /// Compiles template bodies (keyed by source identifier) and destination
    /// path templates (in file mapping order).
    pub fn compile(bodies: &BTreeMap<String, String>, destinations: &[String]) -> ForgeResult<Self> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        filters::register(&mut tera);

        let mut batch: Vec<(String, &str)> = bodies
            .iter()
            .map(|(name, body)| (name.clone(), body.as_str()))
            .collect();
        batch.extend(
            destinations
                .iter()
                .enumerate()
                .map(|(i, dest)| (destination_name(i), dest.as_str())),
        );

        tera.add_raw_templates(batch)
            .map_err(|e| ForgeError::malformed("templates", describe(&e)))?;

        Ok(Self {
            tera,
            sources: bodies.keys().cloned().collect(),
            destinations: destinations.len(),
        })
    }

    pub fn contains(&self, source: &str) -> bool {
        self.sources.contains(source)
    }

    /// Renders the body registered under `source`.
    pub fn render_file(&self, source: &str, context: &Context) -> Result<String, String> {
        if !self.contains(source) {
            return Err(format!("template '{}' does not exist", source));
        }
        self.tera.render(source, context).map_err(|e| describe(&e))
    }

    /// Renders the destination path template of file mapping `index`.
    pub fn render_path(&self, index: usize, context: &Context) -> Result<String, String> {
        if index >= self.destinations {
            return Err(format!("no destination template at index {}", index));
        }
        self.tera
            .render(&destination_name(index), context)
            .map(|path| path.trim().to_string())
            .map_err(|e| describe(&e))
    }
}

impl fmt::Debug for TemplateSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateSet")
            .field("sources", &self.sources)
            .field("destinations", &self.destinations)
            .finish()
    }
}
