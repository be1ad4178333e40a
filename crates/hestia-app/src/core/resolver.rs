//! # Role Resolver
//!
//! Combines the three role signals into one session phase:
//!
//! ```text
//! profile role ─┐
//! cached role  ─┼─► resolve ─► SessionPhase (+ optional cache correction)
//! default      ─┘
//! ```
//!
//! The function is pure. The cache correction for an invalid value is
//! returned as data and performed by the caller, so the resolver can be
//! re-run on every input change without side effects.

use hestia_core::{Role, RoleClaim};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The guard's view of resolution progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionPhase {
    /// The session source has not settled yet
    Loading,
    /// Nobody is signed in
    Unauthenticated,
    /// Signed in under the given role
    Resolved(Role),
}

impl SessionPhase {
    /// The resolved role, if any.
    #[must_use]
    pub fn role(self) -> Option<Role> {
        match self {
            Self::Resolved(role) => Some(role),
            Self::Loading | Self::Unauthenticated => None,
        }
    }

    /// Whether the phase is final for the current inputs.
    #[must_use]
    pub fn is_settled(self) -> bool {
        !matches!(self, Self::Loading)
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loading => write!(f, "loading"),
            Self::Unauthenticated => write!(f, "unauthenticated"),
            Self::Resolved(role) => write!(f, "resolved({role})"),
        }
    }
}

/// Which signal decided the role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleSource {
    /// Server profile
    Profile,
    /// Local cache
    Cache,
    /// No signal at all; [`Role::DEFAULT`]
    Default,
    /// The winning signal was invalid and was replaced by [`Role::DEFAULT`]
    Corrected,
}

/// Output of [`resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Resulting phase
    pub phase: SessionPhase,
    /// Winning signal, when resolved
    pub source: Option<RoleSource>,
    /// Value the cache must be overwritten with
    pub correction: Option<Role>,
    /// Rejected raw value, when a correction was needed
    pub rejected: Option<String>,
}

impl Resolution {
    fn unresolved(phase: SessionPhase) -> Self {
        Self {
            phase,
            source: None,
            correction: None,
            rejected: None,
        }
    }
}

/// Compute the session phase.
///
/// 1. `session_loading` wins: [`SessionPhase::Loading`].
/// 2. No identity: [`SessionPhase::Unauthenticated`].
/// 3. Otherwise the first present signal of profile, cache, default.
/// 4. An invalid winning signal resolves to [`Role::DEFAULT`] and requests a
///    cache correction.
pub fn resolve(
    profile_role: Option<&RoleClaim>,
    cached_role: Option<&RoleClaim>,
    session_loading: bool,
    is_authenticated: bool,
) -> Resolution {
    if session_loading {
        return Resolution::unresolved(SessionPhase::Loading);
    }
    if !is_authenticated {
        return Resolution::unresolved(SessionPhase::Unauthenticated);
    }

    let (claim, source) = match (profile_role, cached_role) {
        (Some(claim), _) => (Some(claim), RoleSource::Profile),
        (None, Some(claim)) => (Some(claim), RoleSource::Cache),
        (None, None) => (None, RoleSource::Default),
    };

    match claim {
        None => Resolution {
            phase: SessionPhase::Resolved(Role::DEFAULT),
            source: Some(source),
            correction: None,
            rejected: None,
        },
        Some(RoleClaim::Valid(role)) => Resolution {
            phase: SessionPhase::Resolved(*role),
            source: Some(source),
            correction: None,
            rejected: None,
        },
        Some(RoleClaim::Invalid(raw)) => Resolution {
            phase: SessionPhase::Resolved(Role::DEFAULT),
            source: Some(RoleSource::Corrected),
            correction: Some(Role::DEFAULT),
            rejected: Some(raw.clone()),
        },
    }
}
