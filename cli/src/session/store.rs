//! # Session Store
//!
//! File: cli/src/session/store.rs
//!
//! ## Overview
//!
//! A concurrency-safe, time-to-live keyed store of generation artifacts.
//!
//! Each artifact moves through `Active → Expired → Removed`:
//! - `put` stamps `created_at` and `expires_at = created_at + ttl`.
//! - Once `expires_at` has passed the artifact is `Expired`. `get` and
//!   `delete` treat it exactly like a missing one (`ArtifactNotFound`).
//! - `sweep_expired` (run periodically by the sweeper) physically removes
//!   expired entries. Correctness never depends on it having run.
//!
//! ## Concurrency
//!
//! One `std::sync::RwLock` guards the map and is only held for the map
//! operation itself; artifacts are handed out as `Arc`s so no caller ever
//! holds the lock while streaming an archive. A poisoned lock is recovered
//! rather than propagated: the map is never left half-updated by any
//! operation here.
//!
use super::clock::{Clock, SystemClock};
use crate::blueprint::dependencies::ResolvedDependency;
use crate::blueprint::schema::Hook;
use crate::blueprint::variables::ResolvedVariables;
use crate::core::error::{ForgeError, ForgeResult};
use crate::core::id::GenerationId;
use crate::generate::{PackagedProject, RenderedFile};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tracing::{debug, info};

/// An immutable, stored generation result.
#[derive(Debug)]
pub struct GenerationArtifact {
    pub id: GenerationId,
    pub blueprint_id: String,
    pub files: Vec<RenderedFile>,
    /// Shared with every download response; cloning it does not copy.
    pub archive: Bytes,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// The resolved configuration, kept for inspection only.
    pub config: ResolvedVariables,
    pub dependencies: Vec<ResolvedDependency>,
    pub hooks: Vec<Hook>,
}

impl GenerationArtifact {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactState {
    Active,
    Expired,
}

pub struct SessionStore {
    entries: RwLock<HashMap<GenerationId, Arc<GenerationArtifact>>>,
    ttl: chrono::Duration,
    clock: Arc<dyn Clock>,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::days(36_500));
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<GenerationId, Arc<GenerationArtifact>>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<GenerationId, Arc<GenerationArtifact>>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn not_found(id: GenerationId) -> ForgeError {
        ForgeError::ArtifactNotFound { id: id.to_string() }
    }

    /// Stores a packaged project under its generation id.
    ///
    /// Fails with `GenerationIdInUse` if an active artifact already holds the
    /// id; an expired one is silently replaced.
    pub fn put(&self, packaged: PackagedProject) -> ForgeResult<Arc<GenerationArtifact>> {
        let PackagedProject { project, archive } = packaged;
        let created_at = self.clock.now();
        let expires_at = created_at
            .checked_add_signed(self.ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let artifact = Arc::new(GenerationArtifact {
            id: project.id,
            blueprint_id: project.blueprint_id,
            files: project.files,
            archive: Bytes::from(archive),
            created_at,
            expires_at,
            config: project.variables,
            dependencies: project.dependencies,
            hooks: project.hooks,
        });

        let mut entries = self.write();
        if let Some(existing) = entries.get(&artifact.id) {
            if !existing.is_expired_at(created_at) {
                return Err(ForgeError::GenerationIdInUse {
                    id: artifact.id.to_string(),
                });
            }
        }
        entries.insert(artifact.id, Arc::clone(&artifact));
        drop(entries);

        info!(
            generation_id = %artifact.id,
            expires_at = %artifact.expires_at,
            "Stored artifact ({} bytes)",
            artifact.archive.len()
        );
        Ok(artifact)
    }

    /// Returns the artifact if it exists and has not expired.
    pub fn get(&self, id: GenerationId) -> ForgeResult<Arc<GenerationArtifact>> {
        let now = self.clock.now();
        self.read()
            .get(&id)
            .filter(|artifact| !artifact.is_expired_at(now))
            .cloned()
            .ok_or_else(|| Self::not_found(id))
    }

    /// Removes the artifact. Expired entries are removed too, but still
    /// reported as not found.
    pub fn delete(&self, id: GenerationId) -> ForgeResult<()> {
        let now = self.clock.now();
        let removed = self.write().remove(&id);
        match removed {
            Some(artifact) if !artifact.is_expired_at(now) => {
                debug!(generation_id = %id, "Artifact deleted");
                Ok(())
            }
            _ => Err(Self::not_found(id)),
        }
    }

    /// `None` means the id is not in the map at all.
    pub fn state(&self, id: GenerationId) -> Option<ArtifactState> {
        let now = self.clock.now();
        self.read().get(&id).map(|artifact| {
            if artifact.is_expired_at(now) {
                ArtifactState::Expired
            } else {
                ArtifactState::Active
            }
        })
    }

    /// Whether an active artifact holds `id`.
    pub fn is_reserved(&self, id: GenerationId) -> bool {
        self.state(id) == Some(ArtifactState::Active)
    }

    /// Physically removes every expired entry. Returns how many were removed.
    pub fn sweep_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.write();
        let before = entries.len();
        entries.retain(|_, artifact| !artifact.is_expired_at(now));
        let removed = before - entries.len();
        drop(entries);

        if removed > 0 {
            info!("Swept {} expired artifact(s)", removed);
        }
        removed
    }

    /// Entries physically present, expired or not.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn active_count(&self) -> usize {
        let now = self.clock.now();
        self.read()
            .values()
            .filter(|artifact| !artifact.is_expired_at(now))
            .count()
    }

    /// Whether `id` is physically present, expired or not.
    pub fn contains(&self, id: GenerationId) -> bool {
        self.read().contains_key(&id)
    }

    pub fn ttl(&self) -> chrono::Duration {
        self.ttl
    }
}
