//! # Generation Progress
//!
//! File: cli/src/progress/mod.rs
//!
//! ## Overview
//!
//! Best-effort, per-generation progress notifications for live previews.
//! The generator publishes a [`ProgressEvent`] for each rendered file, each
//! failure, and once at the end; WebSocket clients subscribed to the same
//! generation id receive them.
//!
//! Nothing here is a system of record. A slow listener loses its
//! subscription instead of slowing generation down, and a generation runs
//! the same whether or not anyone is listening.
//!
pub mod broadcaster;
pub mod event;

pub use broadcaster::{Broadcaster, BroadcasterHandle, ListenerId, Subscription};
pub use event::{ProgressEvent, ProgressKind};
