//! # Forge Commands
//!
//! File: cli/src/commands/mod.rs
//!
//! ## Overview
//!
//! The top-level command groups of the `forge` binary:
//!
//! - `blueprint`: inspect blueprints and generate projects on the command line
//! - `srv`: the `forge serve` HTTP and WebSocket front end
//!
//! Each group exposes a clap `Args` type and an async `handle_*` function
//! that `main.rs` dispatches to.
//!
pub mod blueprint;
pub mod srv;
