//! # In-Flight Generation Ids
//!
//! File: cli/src/session/reservation.rs
//!
//! ## Overview
//!
//! A generation id belongs to one request from the moment that request is
//! accepted until its artifact is stored (or the request fails). The
//! session store only knows about finished artifacts, so the ids of
//! generations still rendering are tracked here.
//!
//! [`InFlight::claim`] hands out a [`Claim`] guard; dropping the guard
//! releases the id. Callers keep the guard alive across
//! [`SessionStore::put`](super::SessionStore::put), so an id is never free
//! between "rendering" and "stored".
//!
use super::store::SessionStore;
use crate::core::error::{ForgeError, ForgeResult};
use crate::core::id::GenerationId;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

type IdSet = Arc<Mutex<HashSet<GenerationId>>>;

fn lock(ids: &IdSet) -> MutexGuard<'_, HashSet<GenerationId>> {
    ids.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Ids of the generations currently running. Cheap to clone.
#[derive(Clone, Default)]
pub struct InFlight {
    ids: IdSet,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// # Claim Generation Id (`claim`)
    ///
    /// Reserves `id` for one generation.
    ///
    /// ## Errors
    ///
    /// `GenerationIdInUse` if another running generation holds `id`, or if
    /// `store` holds an active artifact under it.
    pub fn claim(&self, id: GenerationId, store: &SessionStore) -> ForgeResult<Claim> {
        let mut ids = lock(&self.ids);
        if ids.contains(&id) || store.is_reserved(id) {
            return Err(ForgeError::GenerationIdInUse { id: id.to_string() });
        }
        ids.insert(id);
        debug!(generation_id = %id, "Generation id claimed");
        Ok(Claim {
            ids: Arc::clone(&self.ids),
            id,
        })
    }

    pub fn contains(&self, id: GenerationId) -> bool {
        lock(&self.ids).contains(&id)
    }

    pub fn len(&self) -> usize {
        lock(&self.ids).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.ids).is_empty()
    }
}

/// Holds a generation id until dropped.
#[derive(Debug)]
pub struct Claim {
    ids: IdSet,
    id: GenerationId,
}

impl Claim {
    pub fn id(&self) -> GenerationId {
        self.id
    }
}

impl Drop for Claim {
    fn drop(&mut self) {
        lock(&self.ids).remove(&self.id);
    }
}
