//! # Forge
//!
//! File: cli/src/lib.rs
//!
//! ## Overview
//!
//! Forge generates projects from blueprints: declarative bundles of typed
//! variables, Tera templates, conditional file mappings, dependency entries
//! and post-generation hooks. The same engine drives the `forge` command
//! line and the `forge serve` HTTP/WebSocket service.
//!
//! ## Architecture
//!
//! One generation request flows through:
//!
//! 1. `blueprint::loader`: load and check the blueprint (cached)
//! 2. `blueprint::variables`: resolve the configuration payload
//! 3. `blueprint::condition`: select file mappings and dependency entries
//! 4. `blueprint::dependencies`: merge the active dependencies
//! 5. `generate::render`: render bodies and destination paths
//! 6. `generate::assembler`: collect the files into one tree
//! 7. `common::archive`: pack the tree into a `.tar.gz`
//!
//! Around the engine sit `session` (the expiring artifact store and its
//! sweeper), `progress` (the event broadcaster actor) and `commands` (the
//! CLI and the HTTP/WebSocket front end).
//!
pub mod blueprint;
pub mod commands;
pub mod common;
pub mod core;
pub mod generate;
pub mod progress;
pub mod session;
