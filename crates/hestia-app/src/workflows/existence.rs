//! Dual-profile existence probe.
//!
//! Both ownership checks run concurrently. A failed check counts as "no
//! record" and is logged; it never blocks switching or navigation.

use crate::bridge::RecordKind;
use crate::core::{RoleExistenceFlags, SessionCore, SwitchOffer};
use crate::errors::{FetchSource, SessionError};
use async_lock::RwLock;
use hestia_core::{HestiaError, Role};
use std::sync::Arc;
use tracing::{debug, warn};

/// Probe which role profiles the signed-in identity has.
///
/// **What it does**: checks home and organization ownership, ORs in the
/// active role, and stores the flags on the core
/// **Returns**: the flags; `NoIdentity` when signed out
pub async fn probe_role_existence(
    core: &Arc<RwLock<SessionCore>>,
) -> Result<RoleExistenceFlags, SessionError> {
    let (identity, active, probe) = {
        let core = core.read().await;
        let identity = core.identity_id().ok_or(SessionError::NoIdentity)?;
        (identity, core.active_role(), core.probe())
    };

    let (homes, organizations) = futures::join!(
        probe.has_record_owned_by(&identity, RecordKind::Home),
        probe.has_record_owned_by(&identity, RecordKind::Organization),
    );

    let flags = RoleExistenceFlags {
        has_homeowner_profile: settle(homes, RecordKind::Home),
        has_provider_profile: settle(organizations, RecordKind::Organization),
    }
    .with_active(active);

    let mut core = core.write().await;
    if core.identity_id() == Some(identity) {
        core.set_existence(flags);
    } else {
        debug!(%identity, "Identity changed during probe; discarding flags");
    }
    Ok(flags)
}

/// Probe, then label the switch to `target`.
pub async fn switch_offer(
    core: &Arc<RwLock<SessionCore>>,
    target: Role,
) -> Result<SwitchOffer, SessionError> {
    let flags = probe_role_existence(core).await?;
    Ok(SwitchOffer::for_target(target, flags))
}

fn settle(result: Result<bool, HestiaError>, kind: RecordKind) -> bool {
    match result {
        Ok(owned) => owned,
        Err(e) => {
            let err = SessionError::TransientFetch {
                source_kind: FetchSource::Probe,
                reason: e.to_string(),
            };
            warn!(%kind, error = %err, "Ownership probe failed; assuming none");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{Navigator, RecordProbe, SessionBridge, SessionDeps, SessionSnapshot};
    use crate::config::SessionConfig;
    use crate::core::OfferAction;
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use hestia_core::{Identity, IdentityId, LocationGroup, Profile};
    use hestia_effects::MemoryStorageHandler;

    struct NoopSession;

    #[async_trait]
    impl SessionBridge for NoopSession {
        async fn switch_active_role(&self, _target: Role) -> Result<(), HestiaError> {
            Ok(())
        }
    }

    /// Owns homes; the organization lookup fails.
    struct HomesOnly;

    #[async_trait]
    impl RecordProbe for HomesOnly {
        async fn has_record_owned_by(
            &self,
            _identity: &IdentityId,
            kind: RecordKind,
        ) -> Result<bool, HestiaError> {
            match kind {
                RecordKind::Home => Ok(true),
                RecordKind::Organization => Err(HestiaError::network("offline")),
            }
        }
    }

    struct StaticNavigator;

    impl Navigator for StaticNavigator {
        fn current_location_group(&self) -> LocationGroup {
            LocationGroup::Other
        }

        fn redirect_to(&self, _route: &str) {}
    }

    async fn core(role: Role) -> Arc<RwLock<SessionCore>> {
        let deps = SessionDeps {
            session: Arc::new(NoopSession),
            probe: Arc::new(HomesOnly),
            navigator: Arc::new(StaticNavigator),
            storage: Arc::new(MemoryStorageHandler::new()),
        };
        let mut core = SessionCore::bootstrap(SessionConfig::default(), deps)
            .await
            .unwrap();
        core.apply_snapshot(SessionSnapshot::resolved(
            Identity::new(IdentityId::new_random()),
            Profile::new("p1", role, "Ana"),
        ));
        drop(core.take_pending_writes());
        Arc::new(RwLock::new(core))
    }

    #[tokio::test]
    async fn test_probe_failure_counts_as_missing() {
        let core = core(Role::Homeowner).await;
        let flags = probe_role_existence(&core).await.unwrap();
        assert!(flags.has_homeowner_profile);
        assert!(!flags.has_provider_profile);
        assert_eq!(core.read().await.existence(), flags);
    }

    #[tokio::test]
    async fn test_active_role_overrides_failed_probe() {
        let core = core(Role::Provider).await;
        let flags = probe_role_existence(&core).await.unwrap();
        assert!(flags.is_dual());
    }

    #[tokio::test]
    async fn test_switch_offer_labels_missing_profile_as_create() {
        let core = core(Role::Homeowner).await;
        let offer = switch_offer(&core, Role::Provider).await.unwrap();
        assert_eq!(offer.action, OfferAction::Create);
        assert_eq!(offer.label(), "Create provider account");
    }

    #[tokio::test]
    async fn test_probe_requires_identity() {
        let core = core(Role::Homeowner).await;
        core.write()
            .await
            .apply_snapshot(SessionSnapshot::signed_out());
        assert_matches!(
            probe_role_existence(&core).await,
            Err(SessionError::NoIdentity)
        );
    }
}
