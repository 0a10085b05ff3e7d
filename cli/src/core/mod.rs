//! # Forge Core Infrastructure
//!
//! File: cli/src/core/mod.rs
//!
//! ## Overview
//!
//! Foundational pieces shared by every engine stage and by the front ends:
//! - `config`: configuration loading, merging and validation
//! - `error`: the engine error taxonomy and `Result` aliases
//! - `id`: the opaque generation identifier
//! - `templating`: the Tera-backed template renderer
//!
//! ## Usage
//!
//! ```rust
//! use forge::core::config; // For loading configuration
//! use forge::core::error::{ForgeError, Result}; // For error handling
//! use forge::core::templating; // For blueprint template rendering
//! ```
//!
pub mod config;
pub mod error;
pub mod id;
pub mod templating;
