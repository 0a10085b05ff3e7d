//! # Forge Archive Utilities (`common::archive`)
//!
//! File: cli/src/common/archive/mod.rs
//!
//! ## Overview
//!
//! Packaging of generated projects for download. The only format is a
//! gzipped tarball; see [`tar`] for the exact layout guarantees.
//!
pub mod tar;

/// MIME type served for packaged projects.
pub const CONTENT_TYPE: &str = "application/gzip";

/// File extension used for packaged projects.
pub const EXTENSION: &str = "tar.gz";
