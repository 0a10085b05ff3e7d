//! # Blueprint Schema
//!
//! File: cli/src/blueprint/schema.rs
//!
//! ## Overview
//!
//! The in-memory form of a blueprint definition and the raw `blueprint.toml`
//! document it is built from.
//!
//! The raw `*Document` structs mirror the TOML file one-to-one and are only
//! seen by the loader. The schema types are what every later stage works
//! with: defaults are already typed, patterns already compiled and
//! conditions already parsed, so nothing downstream re-inspects raw values.
//!
use crate::blueprint::condition::Condition;
use crate::blueprint::variables::VariableValue;
use regex::Regex;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Context names the renderer provides itself; variables may not shadow them.
pub const RESERVED_NAMES: &[&str] = &["blueprint", "choices", "dependencies"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableKind {
    String,
    Bool,
    Choice,
    Number,
}

impl fmt::Display for VariableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "string",
            Self::Bool => "bool",
            Self::Choice => "choice",
            Self::Number => "number",
        };
        f.write_str(name)
    }
}

/// A compiled validation pattern; serialises as its source text.
#[derive(Debug, Clone)]
pub struct Pattern(Regex);

impl Pattern {
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        Regex::new(source).map(Self)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_match(&self, value: &str) -> bool {
        self.0.is_match(value)
    }
}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VariableSpec {
    pub name: String,
    pub kind: VariableKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<VariableValue>,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<Pattern>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileMapping {
    /// Template identifier: a path under the blueprint's `templates/` tree.
    pub source: String,
    /// Destination path template, rendered with the same context as the body.
    pub destination: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
    /// Rendered after the dependency merge (e.g. `go.mod`, `Cargo.toml`).
    pub manifest: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DependencySpec {
    pub module: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
}

/// A post-generation step. Executed by whoever receives the project, never by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Hook {
    pub command: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BlueprintSchema {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub architecture: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub variables: Vec<VariableSpec>,
    pub files: Vec<FileMapping>,
    pub dependencies: Vec<DependencySpec>,
    pub hooks: Vec<Hook>,
}

impl BlueprintSchema {
    pub fn variable(&self, name: &str) -> Option<&VariableSpec> {
        self.variables.iter().find(|v| v.name == name)
    }

    pub fn summary(&self) -> BlueprintSummary {
        BlueprintSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            kind: self.kind.clone(),
            architecture: self.architecture.clone(),
            description: self.description.clone(),
            variable_count: self.variables.len(),
            file_count: self.files.len(),
        }
    }
}

/// Catalogue entry returned by `GET /blueprints` and `forge blueprint list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlueprintSummary {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub architecture: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub variable_count: usize,
    pub file_count: usize,
}

// --- Raw blueprint.toml document ---

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct BlueprintDocument {
    #[serde(default)]
    pub blueprint: MetaDocument,
    #[serde(default)]
    pub variables: Vec<VariableDocument>,
    #[serde(default)]
    pub files: Vec<FileDocument>,
    #[serde(default)]
    pub dependencies: Vec<DependencyDocument>,
    #[serde(default)]
    pub hooks: Vec<Hook>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct MetaDocument {
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub architecture: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct VariableDocument {
    pub name: String,
    pub kind: VariableKind,
    pub default: Option<serde_json::Value>,
    #[serde(default)]
    pub required: bool,
    pub pattern: Option<String>,
    #[serde(default)]
    pub choices: Vec<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct FileDocument {
    pub source: String,
    pub destination: Option<String>,
    pub condition: Option<String>,
    #[serde(default)]
    pub manifest: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct DependencyDocument {
    pub module: String,
    pub version: String,
    pub condition: Option<String>,
}
