//! # Forge Common Utilities (`common`)
//!
//! File: cli/src/common/mod.rs
//!
//! ## Overview
//!
//! Shared infrastructure that is not specific to blueprints or generation.
//! Currently this is archive packaging; command handlers and the HTTP layer
//! import from the submodules directly.
//!

/// Utilities for packing and unpacking project archives.
pub mod archive;
