//! # Session Core
//!
//! Explicitly owned state container for one running app. Hosts share it as
//! `Arc<RwLock<SessionCore>>` and feed it two kinds of input:
//!
//! - session snapshots (identity / profile / loading) via [`SessionCore::apply_snapshot`]
//! - location changes via [`SessionCore::location_changed`]
//!
//! Each input re-runs the resolver and the guard synchronously. Role cache
//! updates land in memory at once; the durable writes queue up as
//! [`PendingWrite`]s that the caller persists after releasing the core
//! (see `workflows::session`), so storage never stalls navigation.

use super::existence::RoleExistenceFlags;
use super::guard::{GuardState, GuardTransition, GuardView, NavigationGuard};
use super::resolver::{resolve, Resolution, RoleSource, SessionPhase};
use crate::bridge::{RecordProbe, SessionBridge, SessionDeps, SessionSnapshot};
use crate::config::SessionConfig;
use crate::errors::{FetchSource, SessionError};
use crate::events::{EventBus, SessionEvent};
use crate::role_store::{PendingWrite, RoleStore};
use hestia_core::{Identity, IdentityId, Profile, Role};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Session state container.
pub struct SessionCore {
    config: SessionConfig,
    deps: SessionDeps,
    role_store: RoleStore,
    pending_writes: Vec<PendingWrite>,
    guard: NavigationGuard,
    events: EventBus,
    identity: Option<Identity>,
    profile: Option<Profile>,
    loading: bool,
    phase: SessionPhase,
    existence: RoleExistenceFlags,
    switch_in_flight: Arc<AtomicBool>,
}

impl SessionCore {
    /// Validate the configuration and read the role cache.
    ///
    /// The guard starts in [`GuardState::Initializing`]; nothing is resolved
    /// until the first snapshot arrives.
    pub async fn bootstrap(config: SessionConfig, deps: SessionDeps) -> Result<Self, SessionError> {
        config.validate()?;

        let role_store = RoleStore::load(deps.storage.clone(), config.storage_key.clone()).await;
        let guard = NavigationGuard::new(
            config.routes.clone(),
            config.max_redirects_per_resolution,
        );
        let events = EventBus::new(config.event_capacity);

        info!(cached = ?role_store.cached_claim(), "Session core ready");

        Ok(Self {
            config,
            deps,
            role_store,
            pending_writes: Vec::new(),
            guard,
            events,
            identity: None,
            profile: None,
            loading: true,
            phase: SessionPhase::Loading,
            existence: RoleExistenceFlags::default(),
            switch_in_flight: Arc::new(AtomicBool::new(false)),
        })
    }

    // =========================================================================
    // Inputs
    // =========================================================================

    /// Apply one emission of the session source.
    pub fn apply_snapshot(&mut self, snapshot: SessionSnapshot) -> GuardTransition {
        let previous = self.identity_id();
        let next = snapshot.identity.as_ref().map(|i| i.id);
        let identity_changed = previous != next;
        if identity_changed {
            debug!(?previous, ?next, "Identity changed; dropping resolved profile data");
            self.profile = None;
            self.existence = RoleExistenceFlags::default();
            self.guard.invalidate();
        }

        if let Some(e) = &snapshot.fetch_error {
            let err = SessionError::TransientFetch {
                source_kind: FetchSource::Profile,
                reason: e.to_string(),
            };
            warn!(error = %err, "Continuing without a server profile");
        }

        self.identity = snapshot.identity;
        self.profile = snapshot.profile;
        self.loading = snapshot.loading;

        let resolution = if self.loading && self.phase.is_settled() {
            if !identity_changed {
                debug!(phase = %self.phase, "Session reloading; holding settled phase");
                return self.hold();
            }
            // The held phase belongs to the previous identity; only the
            // cache and the default apply until the new profile arrives.
            debug!(stale = %self.phase, "Identity changed while loading");
            resolve(
                None,
                self.role_store.cached_claim(),
                false,
                self.identity.is_some(),
            )
        } else {
            resolve(
                self.profile.as_ref().map(|p| &p.role),
                self.role_store.cached_claim(),
                self.loading,
                self.identity.is_some(),
            )
        };

        if let Some(rejected) = &resolution.rejected {
            let err = SessionError::InvalidRoleValue {
                value: rejected.clone(),
            };
            warn!(error = %err, fallback = %Role::DEFAULT, "Correcting role");
        }

        let phase = self.guard.effective_phase(resolution.phase);
        if phase != resolution.phase {
            debug!(resolved = %resolution.phase, %phase, "Keeping default role after loop");
        }
        self.set_phase(phase, resolution.source);

        let transition = self.evaluate_guard();

        // A loop during this input may have reverted the role; the reverted
        // value is already queued and must not be overwritten.
        let pinned = self.guard.effective_phase(resolution.phase) != resolution.phase;
        if !pinned {
            if let Some(role) = self.cache_update(&resolution) {
                self.queue_cache_write(role);
            }
        }

        transition
    }

    /// Re-evaluate after the navigation layer moved.
    pub fn location_changed(&mut self) -> GuardTransition {
        self.evaluate_guard()
    }

    /// Durable cache writes produced since the last call.
    #[must_use = "pending writes must be persisted"]
    pub fn take_pending_writes(&mut self) -> Vec<PendingWrite> {
        std::mem::take(&mut self.pending_writes)
    }

    fn hold(&self) -> GuardTransition {
        GuardTransition {
            state: self.guard.state().clone(),
            redirected: None,
            loop_detected: None,
        }
    }

    fn set_phase(&mut self, phase: SessionPhase, source: Option<RoleSource>) {
        if phase == self.phase {
            return;
        }
        info!(from = %self.phase, to = %phase, ?source, "Session phase changed");
        self.phase = phase;
        self.events.publish(SessionEvent::PhaseChanged(phase));
    }

    /// Role to write back after a resolution: the correction of an invalid
    /// value, or a valid profile role the cache does not hold yet.
    fn cache_update(&self, resolution: &Resolution) -> Option<Role> {
        let profile_role = match resolution.source {
            Some(RoleSource::Profile) => resolution
                .phase
                .role()
                .filter(|role| self.role_store.cached_role() != Some(*role)),
            _ => None,
        };
        resolution.correction.or(profile_role)
    }

    fn queue_cache_write(&mut self, role: Role) {
        let write = self.role_store.write_cached_role(role);
        self.pending_writes.push(write);
    }

    fn evaluate_guard(&mut self) -> GuardTransition {
        let navigator = self.deps.navigator.clone();
        let location = navigator.current_location_group();
        let transition = self.guard.on_input(self.phase, location, navigator.as_ref());

        if let Some(report) = &transition.loop_detected {
            let err = SessionError::NavigationLoop {
                target: report.failed_target.clone(),
            };
            debug!(error = %err, "Loop recorded");
            self.events.publish(SessionEvent::NavigationLoop {
                fallback: report.fallback.clone(),
            });
            self.set_phase(report.reverted, Some(RoleSource::Corrected));
            if let Some(role) = report.reverted.role() {
                if self.role_store.cached_role() != Some(role) {
                    self.queue_cache_write(role);
                }
            }
        }
        if let Some(route) = &transition.redirected {
            self.events.publish(SessionEvent::Redirected {
                route: route.clone(),
            });
        }
        transition
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Current phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Role of the current phase, if resolved.
    pub fn active_role(&self) -> Option<Role> {
        self.phase.role()
    }

    /// Guard state.
    pub fn guard_state(&self) -> &GuardState {
        self.guard.state()
    }

    /// What the host should render.
    pub fn view(&self) -> GuardView {
        self.guard.view()
    }

    /// Signed-in identity.
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Identifier of the signed-in identity.
    pub fn identity_id(&self) -> Option<IdentityId> {
        self.identity.as_ref().map(|i| i.id)
    }

    /// Active profile, if fetched.
    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    /// Whether the last snapshot was still loading.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Cached role, if valid.
    pub fn cached_role(&self) -> Option<Role> {
        self.role_store.cached_role()
    }

    /// Last probed existence flags.
    pub fn existence(&self) -> RoleExistenceFlags {
        self.existence
    }

    /// Configuration in use.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Event bus.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Subscribe to session events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Whether a role switch is in flight.
    pub fn is_switching(&self) -> bool {
        self.switch_in_flight.load(Ordering::Acquire)
    }

    // =========================================================================
    // Workflow access
    // =========================================================================

    pub(crate) fn session_bridge(&self) -> Arc<dyn SessionBridge> {
        self.deps.session.clone()
    }

    pub(crate) fn probe(&self) -> Arc<dyn RecordProbe> {
        self.deps.probe.clone()
    }

    pub(crate) fn switch_flag(&self) -> Arc<AtomicBool> {
        self.switch_in_flight.clone()
    }

    pub(crate) fn set_existence(&mut self, flags: RoleExistenceFlags) {
        self.existence = flags;
    }

    /// Record a server-confirmed switch in the cache. The phase itself only
    /// changes when the session source emits the new profile.
    pub(crate) fn record_switch(&mut self, role: Role) {
        self.queue_cache_write(role);
    }
}

impl std::fmt::Debug for SessionCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCore")
            .field("phase", &self.phase)
            .field("guard", self.guard.state())
            .field("identity", &self.identity_id())
            .field("role_store", &self.role_store)
            .field("pending_writes", &self.pending_writes.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{Navigator, RecordKind};
    use async_trait::async_trait;
    use hestia_core::effects::{StorageEffects, StorageError};
    use hestia_core::{HestiaError, LocationGroup, RoleClaim};
    use hestia_effects::MemoryStorageHandler;
    use std::sync::Mutex;
    use std::time::Duration;

    struct NoopSession;

    #[async_trait]
    impl SessionBridge for NoopSession {
        async fn switch_active_role(&self, _target: Role) -> Result<(), HestiaError> {
            Ok(())
        }
    }

    struct NoRecords;

    #[async_trait]
    impl RecordProbe for NoRecords {
        async fn has_record_owned_by(
            &self,
            _identity: &IdentityId,
            _kind: RecordKind,
        ) -> Result<bool, HestiaError> {
            Ok(false)
        }
    }

    /// Storage whose writes never complete.
    struct StalledStorage;

    #[async_trait]
    impl StorageEffects for StalledStorage {
        async fn store(&self, _key: &str, _value: Vec<u8>) -> Result<(), StorageError> {
            std::future::pending().await
        }

        async fn retrieve(&self, _key: &str) -> Result<Option<Vec<u8>>, StorageError> {
            Ok(None)
        }

        async fn remove(&self, _key: &str) -> Result<bool, StorageError> {
            Ok(false)
        }
    }

    /// Navigator that moves to the redirect target immediately, except that
    /// provider routes bounce back to the login screen when `bounce` is set.
    struct FollowingNavigator {
        location: Mutex<LocationGroup>,
        redirects: Mutex<Vec<String>>,
        bounce: bool,
    }

    impl FollowingNavigator {
        fn at(location: LocationGroup) -> Self {
            Self {
                location: Mutex::new(location),
                redirects: Mutex::default(),
                bounce: false,
            }
        }

        fn redirects(&self) -> Vec<String> {
            self.redirects.lock().unwrap().clone()
        }
    }

    impl Navigator for FollowingNavigator {
        fn current_location_group(&self) -> LocationGroup {
            *self.location.lock().unwrap()
        }

        fn redirect_to(&self, route: &str) {
            let group = match LocationGroup::of_route(route) {
                LocationGroup::Provider if self.bounce => LocationGroup::Auth,
                group => group,
            };
            *self.location.lock().unwrap() = group;
            self.redirects.lock().unwrap().push(route.to_string());
        }
    }

    const KEY: &str = "hestia.session.active_role";

    async fn build(
        storage: Arc<dyn StorageEffects>,
        navigator: Arc<FollowingNavigator>,
    ) -> SessionCore {
        let deps = SessionDeps {
            session: Arc::new(NoopSession),
            probe: Arc::new(NoRecords),
            navigator,
            storage,
        };
        SessionCore::bootstrap(SessionConfig::default(), deps)
            .await
            .unwrap()
    }

    async fn core_with(
        cached: Option<&str>,
        location: LocationGroup,
    ) -> (SessionCore, Arc<FollowingNavigator>, MemoryStorageHandler) {
        let storage = match cached {
            Some(raw) => MemoryStorageHandler::with_entries([(KEY, raw)]),
            None => MemoryStorageHandler::new(),
        };
        let navigator = Arc::new(FollowingNavigator::at(location));
        let core = build(Arc::new(storage.clone()), navigator.clone()).await;
        (core, navigator, storage)
    }

    async fn flush(core: &mut SessionCore) {
        for write in core.take_pending_writes() {
            write.persist().await;
        }
    }

    fn identity() -> Identity {
        Identity::new(IdentityId::new_random())
    }

    fn provider_profile() -> Profile {
        Profile::new("p1", Role::Provider, "Ana")
    }

    #[tokio::test]
    async fn test_bootstrap_rejects_invalid_config() {
        let navigator = Arc::new(FollowingNavigator::at(LocationGroup::Auth));
        let deps = SessionDeps {
            session: Arc::new(NoopSession),
            probe: Arc::new(NoRecords),
            navigator,
            storage: Arc::new(MemoryStorageHandler::new()),
        };
        let config = SessionConfig {
            storage_key: String::new(),
            ..SessionConfig::default()
        };
        assert!(SessionCore::bootstrap(config, deps).await.is_err());
    }

    #[tokio::test]
    async fn test_profile_role_is_written_to_cache() {
        let (mut core, _nav, storage) = core_with(None, LocationGroup::Auth).await;
        core.apply_snapshot(SessionSnapshot::resolved(identity(), provider_profile()));

        assert_eq!(core.cached_role(), Some(Role::Provider));
        assert!(storage.is_empty().await);

        flush(&mut core).await;
        assert_eq!(
            storage.retrieve(KEY).await.unwrap(),
            Some(b"provider".to_vec())
        );
    }

    #[tokio::test]
    async fn test_default_resolution_does_not_write_cache() {
        let (mut core, _nav, storage) = core_with(None, LocationGroup::Auth).await;
        core.apply_snapshot(SessionSnapshot::without_profile(identity()));
        assert_eq!(core.phase(), SessionPhase::Resolved(Role::Homeowner));
        assert!(core.take_pending_writes().is_empty());
        assert!(storage.is_empty().await);
    }

    #[tokio::test]
    async fn test_invalid_cache_is_corrected() {
        let (mut core, _nav, storage) = core_with(Some("superuser"), LocationGroup::Auth).await;
        core.apply_snapshot(SessionSnapshot::without_profile(identity()));
        flush(&mut core).await;

        assert_eq!(core.phase(), SessionPhase::Resolved(Role::Homeowner));
        assert_eq!(
            storage.retrieve(KEY).await.unwrap(),
            Some(b"homeowner".to_vec())
        );
    }

    #[tokio::test]
    async fn test_invalid_profile_role_falls_back_to_homeowner() {
        let (mut core, nav, _storage) = core_with(Some("provider"), LocationGroup::Auth).await;
        let mut profile = provider_profile();
        profile.role = RoleClaim::Invalid("vendor".into());
        core.apply_snapshot(SessionSnapshot::resolved(identity(), profile));

        assert_eq!(core.phase(), SessionPhase::Resolved(Role::Homeowner));
        assert_eq!(core.cached_role(), Some(Role::Homeowner));
        assert_eq!(nav.redirects(), vec!["/(homeowner)/home".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_profile_fetch_resolves_from_cache() {
        let (mut core, _nav, _storage) = core_with(Some("provider"), LocationGroup::Auth).await;
        core.apply_snapshot(SessionSnapshot::fetch_failed(
            identity(),
            HestiaError::network("timed out"),
        ));
        assert_eq!(core.phase(), SessionPhase::Resolved(Role::Provider));
    }

    #[tokio::test]
    async fn test_settled_phase_never_returns_to_loading() {
        let (mut core, _nav, _storage) = core_with(None, LocationGroup::Auth).await;
        let me = identity();
        core.apply_snapshot(SessionSnapshot::resolved(
            me.clone(),
            Profile::new("p1", Role::Homeowner, "Ana"),
        ));
        core.location_changed();
        let t = core.apply_snapshot(SessionSnapshot::fetching(me));

        assert_eq!(core.phase(), SessionPhase::Resolved(Role::Homeowner));
        assert_eq!(t.redirected, None);
        assert_eq!(core.view(), GuardView::Children);
    }

    #[tokio::test]
    async fn test_new_identity_while_loading_ignores_previous_phase() {
        let (mut core, nav, _storage) = core_with(Some("provider"), LocationGroup::Auth).await;
        core.apply_snapshot(SessionSnapshot::signed_out());
        assert_eq!(core.phase(), SessionPhase::Unauthenticated);

        core.apply_snapshot(SessionSnapshot::fetching(identity()));

        assert_eq!(core.phase(), SessionPhase::Resolved(Role::Provider));
        assert_eq!(nav.redirects(), vec!["/(provider)/home".to_string()]);
    }

    #[tokio::test]
    async fn test_identity_change_drops_profile_and_flags() {
        let (mut core, _nav, _storage) = core_with(None, LocationGroup::Auth).await;
        core.apply_snapshot(SessionSnapshot::resolved(identity(), provider_profile()));
        core.set_existence(RoleExistenceFlags {
            has_homeowner_profile: true,
            has_provider_profile: true,
        });

        core.apply_snapshot(SessionSnapshot::signed_out());
        assert_eq!(core.profile(), None);
        assert_eq!(core.existence(), RoleExistenceFlags::default());
        assert_eq!(core.phase(), SessionPhase::Unauthenticated);
    }

    #[tokio::test]
    async fn test_phase_changes_are_published() {
        let (mut core, _nav, _storage) = core_with(None, LocationGroup::Auth).await;
        let mut events = core.subscribe();
        core.apply_snapshot(SessionSnapshot::loading());
        core.apply_snapshot(SessionSnapshot::signed_out());

        assert_eq!(
            events.try_recv().unwrap(),
            SessionEvent::PhaseChanged(SessionPhase::Unauthenticated)
        );
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_navigation_loop_reverts_role_and_cache() {
        let navigator = Arc::new(FollowingNavigator {
            bounce: true,
            ..FollowingNavigator::at(LocationGroup::Homeowner)
        });
        let storage = MemoryStorageHandler::new();
        let mut core = build(Arc::new(storage.clone()), navigator.clone()).await;
        let mut events = core.subscribe();
        let me = identity();

        core.apply_snapshot(SessionSnapshot::resolved(me.clone(), provider_profile()));
        for _ in 0..4 {
            core.location_changed();
        }
        flush(&mut core).await;

        assert_eq!(
            navigator.redirects(),
            vec!["/(provider)/home".to_string(), "/(homeowner)/home".to_string()]
        );
        assert_eq!(core.phase(), SessionPhase::Resolved(Role::Homeowner));
        assert_eq!(core.view(), GuardView::Children);
        assert_eq!(core.cached_role(), Some(Role::Homeowner));
        assert_eq!(
            storage.retrieve(KEY).await.unwrap(),
            Some(b"homeowner".to_vec())
        );

        let published: Vec<_> = std::iter::from_fn(|| events.try_recv().ok()).collect();
        assert!(published.contains(&SessionEvent::NavigationLoop {
            fallback: "/(homeowner)/home".to_string()
        }));
        assert!(published.contains(&SessionEvent::PhaseChanged(SessionPhase::Resolved(
            Role::Homeowner
        ))));

        // The server profile still says provider; the reverted role holds
        core.apply_snapshot(SessionSnapshot::resolved(me, provider_profile()));
        assert_eq!(core.phase(), SessionPhase::Resolved(Role::Homeowner));
        assert!(core.take_pending_writes().is_empty());
        assert_eq!(navigator.redirects().len(), 2);
    }

    #[tokio::test]
    async fn test_stalled_storage_does_not_block_inputs() {
        let navigator = Arc::new(FollowingNavigator::at(LocationGroup::Auth));
        let mut core = build(Arc::new(StalledStorage), navigator.clone()).await;

        core.apply_snapshot(SessionSnapshot::resolved(identity(), provider_profile()));
        core.location_changed();

        assert_eq!(core.cached_role(), Some(Role::Provider));
        assert_eq!(core.view(), GuardView::Children);

        let writes = core.take_pending_writes();
        assert_eq!(writes.len(), 1);
        for write in writes {
            let stalled = tokio::time::timeout(Duration::from_millis(20), write.persist()).await;
            assert!(stalled.is_err());
        }
    }
}
