//! # Blueprints
//!
//! File: cli/src/blueprint/mod.rs
//!
//! ## Overview
//!
//! Everything that is known about a blueprint before a generation request
//! arrives: its schema, its compiled templates, and the pure stages that
//! interpret the schema against a request's configuration.
//!
//! ## Architecture
//!
//! - `source`: where blueprint files come from (directory or memory)
//! - `loader`: parsing, load-time checks and caching
//! - `schema`: the immutable in-memory model
//! - `variables`: the variable resolver
//! - `condition`: the condition grammar and evaluator
//! - `dependencies`: the dependency merger
//!
pub mod condition;
pub mod dependencies;
pub mod loader;
pub mod schema;
pub mod source;
pub mod variables;

pub use loader::BlueprintLoader;
pub use schema::{BlueprintSchema, BlueprintSummary};
pub use source::{BlueprintSource, DirectorySource, MemorySource};

use crate::core::templating::TemplateSet;

/// A loaded blueprint: its checked schema and compiled templates.
#[derive(Debug)]
pub struct Blueprint {
    pub schema: BlueprintSchema,
    pub templates: TemplateSet,
}
