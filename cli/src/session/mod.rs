//! # Generation Sessions
//!
//! File: cli/src/session/mod.rs
//!
//! ## Overview
//!
//! Short-lived storage for packaged projects awaiting download. Each
//! artifact lives for a fixed time-to-live; after that it is logically gone
//! even if the background sweeper has not physically removed it yet.
//!
//! ## Architecture
//!
//! - `store`: the `SessionStore`, a map behind a single reader/writer lock.
//!   There is no global instance; whoever needs one constructs it and
//!   passes it on (the server keeps it in its shared state).
//! - `clock`: the time source, injectable so tests can expire artifacts
//!   without sleeping.
//! - `reservation`: ids claimed by generations that have not been stored
//!   yet, so two requests cannot render under the same id.
//! - `sweeper`: the periodic background task that removes expired entries.
//!
pub mod clock;
pub mod reservation;
pub mod store;
pub mod sweeper;

pub use clock::{Clock, ManualClock, SystemClock};
pub use reservation::{Claim, InFlight};
pub use store::{ArtifactState, GenerationArtifact, SessionStore};
pub use sweeper::{spawn_sweeper, SweeperHandle};
