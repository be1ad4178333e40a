//! Session input workflow.
//!
//! Feeds snapshots and location changes to the shared core, then persists
//! any role cache writes with no lock held. A stalled storage backend only
//! delays the caller of these functions; other tasks keep using the core.

use crate::bridge::SessionSnapshot;
use crate::core::{GuardTransition, SessionCore};
use crate::role_store::PendingWrite;
use async_lock::RwLock;
use std::sync::Arc;

/// Apply one session source emission.
pub async fn apply_snapshot(
    core: &Arc<RwLock<SessionCore>>,
    snapshot: SessionSnapshot,
) -> GuardTransition {
    let (transition, writes) = {
        let mut core = core.write().await;
        let transition = core.apply_snapshot(snapshot);
        (transition, core.take_pending_writes())
    };
    persist(writes).await;
    transition
}

/// Re-run the guard after the navigation layer moved.
pub async fn location_changed(core: &Arc<RwLock<SessionCore>>) -> GuardTransition {
    let (transition, writes) = {
        let mut core = core.write().await;
        let transition = core.location_changed();
        (transition, core.take_pending_writes())
    };
    persist(writes).await;
    transition
}

/// Persist cache writes in order.
pub async fn persist(writes: Vec<PendingWrite>) {
    for write in writes {
        write.persist().await;
    }
}
