//! # Forge Error Types
//!
//! File: cli/src/core/error.rs
//!
//! ## Overview
//!
//! This module defines the error taxonomy of the generation engine and the
//! `Result` aliases used across the crate.
//!
//! ## Architecture
//!
//! Two layers, mirroring how the rest of the crate is split:
//! - `ForgeError`: a `thiserror` enum returned by every engine stage
//!   (loading, validation, rendering, assembly, packaging, session lookup).
//!   Callers such as the HTTP layer match on it to pick a status code.
//! - `Result<T>`: an alias for `anyhow::Result<T>` used by commands, config
//!   loading and server startup, where context matters more than the variant.
//!
//! Validation and render failures are *batched*: a single `ForgeError`
//! carries every offending field or file so a caller can fix all of them in
//! one round trip.
//!
//! ## Examples
//!
//! ```rust
//! use forge::core::error::{ForgeError, ValidationError, ValidationErrorKind};
//!
//! let err = ForgeError::Validation(vec![ValidationError::new(
//!     "ProjectName",
//!     ValidationErrorKind::MissingRequiredField,
//! )]);
//! assert_eq!(err.to_string(), "Validation failed with 1 error(s)");
//! ```
//!
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// What went wrong with a single configuration field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationErrorKind {
    /// A required variable had no value and no default.
    MissingRequiredField,
    /// The supplied value cannot be read as the declared kind.
    TypeMismatch { expected: String },
    /// A choice variable received a value outside its declared choices.
    InvalidChoice { allowed: Vec<String> },
    /// A string did not match the variable's validation pattern.
    PatternMismatch { pattern: String },
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRequiredField => write!(f, "required field is missing"),
            Self::TypeMismatch { expected } => write!(f, "expected a value of kind {}", expected),
            Self::InvalidChoice { allowed } => {
                write!(f, "value must be one of [{}]", allowed.join(", "))
            }
            Self::PatternMismatch { pattern } => {
                write!(f, "value does not match pattern '{}'", pattern)
            }
        }
    }
}

/// A per-field validation failure produced by the variable resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{field}: {kind}")]
pub struct ValidationError {
    pub field: String,
    #[serde(flatten)]
    pub kind: ValidationErrorKind,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, kind: ValidationErrorKind) -> Self {
        Self {
            field: field.into(),
            kind,
        }
    }
}

/// A per-file rendering failure.
///
/// `file` names the mapping's template source so blueprint authors can find
/// the offending template; `message` carries the full Tera error chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{file}: {message}")]
pub struct RenderError {
    pub file: String,
    pub message: String,
}

impl RenderError {
    pub fn new(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            message: message.into(),
        }
    }
}

/// Errors produced by the generation engine.
#[derive(Error, Debug)]
pub enum ForgeError {
    #[error("Blueprint '{id}' not found")]
    SchemaNotFound { id: String },

    #[error("Blueprint is malformed at '{field}': {reason}")]
    SchemaMalformed { field: String, reason: String },

    #[error("Validation failed with {} error(s)", .0.len())]
    Validation(Vec<ValidationError>),

    #[error("Rendering failed with {} error(s)", .0.len())]
    Render(Vec<RenderError>),

    #[error("Two files render to the same destination '{path}'")]
    DestinationConflict { path: String },

    /// Covers both unknown and expired artifacts; callers cannot tell them apart.
    #[error("Generated project '{id}' not found")]
    ArtifactNotFound { id: String },

    #[error("Generation id '{id}' is already in use")]
    GenerationIdInUse { id: String },

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("Filesystem error: {0}")]
    FileSystem(String),

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ForgeError {
    pub fn malformed(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SchemaMalformed {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// True for the lookup-time "nothing there" class of errors.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::SchemaNotFound { .. } | Self::ArtifactNotFound { .. }
        )
    }

    /// Short machine-readable name used in API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SchemaNotFound { .. } => "schema_not_found",
            Self::SchemaMalformed { .. } => "schema_malformed",
            Self::Validation(_) => "validation_failed",
            Self::Render(_) => "render_failed",
            Self::DestinationConflict { .. } => "destination_conflict",
            Self::ArtifactNotFound { .. } => "not_found",
            Self::GenerationIdInUse { .. } => "generation_id_in_use",
            Self::Archive(_) => "archive_error",
            Self::FileSystem(_) | Self::Io { .. } => "filesystem_error",
            Self::Config(_) => "config_error",
        }
    }
}

/// Result alias for engine operations.
pub type ForgeResult<T> = std::result::Result<T, ForgeError>;

/// Type alias for Result using anyhow::Error for application-level code.
pub type Result<T> = anyhow::Result<T>;
