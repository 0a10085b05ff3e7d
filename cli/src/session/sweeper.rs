//! Background expiry sweeping.
//!
//! The sweeper wakes on a fixed interval, independent of request traffic,
//! and calls [`SessionStore::sweep_expired`]. It holds the store's write
//! lock only for the duration of one `retain` pass.

use super::store::SessionStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Owns the sweeper task; dropping the handle stops it.
#[derive(Debug)]
pub struct SweeperHandle {
    task: JoinHandle<()>,
}

impl SweeperHandle {
    pub fn stop(self) {
        drop(self);
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Starts sweeping `store` every `interval` on the current Tokio runtime.
pub fn spawn_sweeper(store: Arc<SessionStore>, interval: Duration) -> SweeperHandle {
    let period = interval.max(Duration::from_millis(1));
    info!("Session sweeper running every {:?}", period);

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = store.sweep_expired();
            debug!(removed, remaining = store.len(), "Sweep finished");
        }
    });
    SweeperHandle { task }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprint::variables::ResolvedVariables;
    use crate::core::id::GenerationId;
    use crate::generate::{GeneratedProject, PackagedProject};
    use crate::session::clock::ManualClock;

    #[tokio::test]
    async fn test_sweeper_removes_expired_entries() {
        let clock = Arc::new(ManualClock::default());
        let store = Arc::new(SessionStore::with_clock(Duration::from_secs(60), clock.clone()));
        let id = GenerationId::new();
        store
            .put(PackagedProject {
                project: GeneratedProject {
                    id,
                    blueprint_id: "demo".into(),
                    variables: ResolvedVariables::default(),
                    files: Vec::new(),
                    dependencies: Vec::new(),
                    hooks: Vec::new(),
                },
                archive: Vec::new(),
            })
            .unwrap();

        let sweeper = spawn_sweeper(Arc::clone(&store), Duration::from_millis(10));
        clock.advance(chrono::Duration::seconds(61));

        for _ in 0..200 {
            if !store.contains(id) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(!store.contains(id));
        assert!(sweeper.is_running());
        sweeper.stop();
    }
}
