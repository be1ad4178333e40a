//! Role switch workflow.

use super::session::persist;
use crate::core::SessionCore;
use crate::errors::{SessionError, ToastLevel};
use crate::events::SessionEvent;
use async_lock::RwLock;
use hestia_core::Role;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of a switch request that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// The server confirmed the new active role
    Switched(Role),
    /// Another switch was already running; nothing was sent
    AlreadyInFlight,
    /// The requested role is already active; nothing was sent
    AlreadyActive,
}

/// Clears the in-flight flag on every exit path, including cancellation.
struct InFlight(Arc<AtomicBool>);

impl InFlight {
    fn acquire(flag: Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Switch the active role.
///
/// **What it does**: asks the session source to make `target` the active
/// profile, then records it in the role cache
/// **Returns**: the outcome, or `SwitchFailed` when the server rejects it
/// **Events**: `SwitcherDismissed` before the request; `RoleSwitched` on
/// success; an error toast on failure
///
/// The resolved phase is not touched here. It follows once the session
/// source emits the new profile, which re-runs the guard. The cache write
/// is persisted last, after the in-flight flag is released.
pub async fn switch_to(
    core: &Arc<RwLock<SessionCore>>,
    target: Role,
) -> Result<SwitchOutcome, SessionError> {
    let (bridge, events, flag, active) = {
        let core = core.read().await;
        if core.identity().is_none() {
            return Err(SessionError::NoIdentity);
        }
        (
            core.session_bridge(),
            core.events().clone(),
            core.switch_flag(),
            core.active_role(),
        )
    };

    let Some(in_flight) = InFlight::acquire(flag) else {
        debug!(%target, "Role switch already in flight; ignoring");
        return Ok(SwitchOutcome::AlreadyInFlight);
    };

    if active == Some(target) {
        debug!(%target, "Role already active");
        return Ok(SwitchOutcome::AlreadyActive);
    }

    events.publish(SessionEvent::SwitcherDismissed { target });
    info!(%target, "Switching active role");

    match bridge.switch_active_role(target).await {
        Ok(()) => {
            let writes = {
                let mut core = core.write().await;
                core.record_switch(target);
                core.take_pending_writes()
            };
            events.publish(SessionEvent::RoleSwitched(target));
            drop(in_flight);
            persist(writes).await;
            Ok(SwitchOutcome::Switched(target))
        }
        Err(cause) => {
            let err = SessionError::SwitchFailed { target, cause };
            warn!(error = %err, "Role switch failed");
            events.toast(ToastLevel::Error, err.to_string());
            Err(err)
        }
    }
}
