//! # Collaborator Bridges
//!
//! Traits for everything the session core consumes but does not own:
//!
//! ```text
//!  host app                          hestia-app (pure)
//! ┌──────────────────┐  snapshots   ┌──────────────────────┐
//! │ auth + data store├─────────────►│ SessionCore          │
//! │  SessionBridge   │◄─────────────┤  switch_active_role  │
//! │  RecordProbe     │◄─────────────┤  existence probe     │
//! │ router           │◄─────────────┤  Navigator commands  │
//! └──────────────────┘              └──────────────────────┘
//! ```
//!
//! Profile changes arrive as [`SessionSnapshot`]s pushed by the host through
//! `SessionCore::apply_snapshot`; the bridge only carries commands.

use async_trait::async_trait;
use hestia_core::effects::StorageEffects;
use hestia_core::{HestiaError, Identity, IdentityId, LocationGroup, Profile, Role};
use std::fmt;
use std::sync::Arc;

/// One emission of the session source: who is signed in, their active
/// profile, and whether the profile fetch is still in flight.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Authenticated identity, if any
    pub identity: Option<Identity>,
    /// Active profile, if fetched
    pub profile: Option<Profile>,
    /// Whether the profile fetch is in flight
    pub loading: bool,
    /// Why the last profile fetch produced nothing, if it failed
    pub fetch_error: Option<HestiaError>,
}

impl SessionSnapshot {
    /// Fetch in flight, nothing known yet.
    pub fn loading() -> Self {
        Self {
            identity: None,
            profile: None,
            loading: true,
            fetch_error: None,
        }
    }

    /// No one is signed in.
    pub fn signed_out() -> Self {
        Self::default()
    }

    /// Identity known, profile fetch still running.
    pub fn fetching(identity: Identity) -> Self {
        Self {
            identity: Some(identity),
            profile: None,
            loading: true,
            fetch_error: None,
        }
    }

    /// Identity and profile both known.
    pub fn resolved(identity: Identity, profile: Profile) -> Self {
        Self {
            identity: Some(identity),
            profile: Some(profile),
            loading: false,
            fetch_error: None,
        }
    }

    /// Identity known but the profile fetch settled without a result.
    pub fn without_profile(identity: Identity) -> Self {
        Self {
            identity: Some(identity),
            profile: None,
            loading: false,
            fetch_error: None,
        }
    }

    /// Identity known but the profile fetch failed.
    pub fn fetch_failed(identity: Identity, error: HestiaError) -> Self {
        Self {
            fetch_error: Some(error),
            ..Self::without_profile(identity)
        }
    }
}

/// Commands against the session source.
#[async_trait]
pub trait SessionBridge: Send + Sync {
    /// Repoint the identity's active profile to `target`, server-side.
    ///
    /// Fails with a descriptive error on network or authorization failure.
    async fn switch_active_role(&self, target: Role) -> Result<(), HestiaError>;
}

/// Kinds of domain record whose ownership implies a role profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// A home (homeowner side)
    Home,
    /// An organization (provider side)
    Organization,
}

impl RecordKind {
    /// Record kind that implies a profile for `role`.
    #[must_use]
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Homeowner => Self::Home,
            Role::Provider => Self::Organization,
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Home => write!(f, "home"),
            Self::Organization => write!(f, "organization"),
        }
    }
}

/// Ownership probe against the remote data store.
#[async_trait]
pub trait RecordProbe: Send + Sync {
    /// Whether any record of `kind` is owned by `identity`.
    async fn has_record_owned_by(
        &self,
        identity: &IdentityId,
        kind: RecordKind,
    ) -> Result<bool, HestiaError>;
}

/// The navigation layer.
pub trait Navigator: Send + Sync {
    /// Group of the screen currently shown.
    fn current_location_group(&self) -> LocationGroup;

    /// Navigate to `route`. Fire-and-forget.
    fn redirect_to(&self, route: &str);
}

/// Collaborators injected into `SessionCore`.
#[derive(Clone)]
pub struct SessionDeps {
    /// Session source commands
    pub session: Arc<dyn SessionBridge>,
    /// Record ownership probe
    pub probe: Arc<dyn RecordProbe>,
    /// Navigation layer
    pub navigator: Arc<dyn Navigator>,
    /// Durable storage for the role cache
    pub storage: Arc<dyn StorageEffects>,
}

impl fmt::Debug for SessionDeps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionDeps").finish_non_exhaustive()
    }
}
