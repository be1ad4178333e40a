//! Categorized session errors
//!
//! Every failure the session core can observe is classified by how it
//! reaches the user:
//! - silently recovered (fetch/probe failures, storage failures)
//! - surfaced as a dismissible toast (a failed role switch)
//! - recorded for diagnostics only (invalid role values, navigation loops)

use hestia_core::{HestiaError, Role};
use std::fmt;

/// Toast severity levels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ToastLevel {
    /// Informational
    #[default]
    Info,
    /// Something degraded but the app continues
    Warning,
    /// An action the user asked for did not happen
    Error,
}

impl ToastLevel {
    /// Get a short label for display.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ToastLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How an error is presented.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Disposition {
    /// Recovered locally; never shown to the user
    Silent,
    /// Shown as a dismissible toast
    Toast(ToastLevel),
    /// Logged for diagnostics only
    Diagnostic,
}

/// Which collaborator read failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchSource {
    /// Server profile fetch
    Profile,
    /// Domain-record existence probe
    Probe,
    /// Local role cache
    Cache,
}

impl fmt::Display for FetchSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Profile => write!(f, "profile fetch"),
            Self::Probe => write!(f, "existence probe"),
            Self::Cache => write!(f, "role cache"),
        }
    }
}

/// Errors produced by the session core.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// A read from a collaborator failed; the value is treated as absent.
    #[error("{source_kind} failed: {reason}")]
    TransientFetch {
        /// Which read failed
        source_kind: FetchSource,
        /// Underlying failure
        reason: String,
    },

    /// The server rejected or never completed a role switch.
    #[error("Couldn't switch to {target}: {cause}")]
    SwitchFailed {
        /// Requested role
        target: Role,
        /// Underlying failure
        cause: HestiaError,
    },

    /// A cached or profile role was neither `homeowner` nor `provider`.
    #[error("Invalid role value '{value}'")]
    InvalidRoleValue {
        /// The rejected value
        value: String,
    },

    /// The guard needed a second redirect before the first one landed.
    #[error("Navigation loop detected while redirecting to {target}")]
    NavigationLoop {
        /// Route that was not honored
        target: String,
    },

    /// An operation required an authenticated identity.
    #[error("No active identity")]
    NoIdentity,

    /// Configuration could not be loaded or failed validation.
    #[error("Configuration error: {message}")]
    Config {
        /// What was wrong
        message: String,
    },
}

impl SessionError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// How this error reaches the user.
    #[must_use]
    pub fn disposition(&self) -> Disposition {
        match self {
            Self::TransientFetch { .. } => Disposition::Silent,
            Self::SwitchFailed { .. } => Disposition::Toast(ToastLevel::Error),
            Self::InvalidRoleValue { .. } | Self::NavigationLoop { .. } => Disposition::Diagnostic,
            Self::NoIdentity => Disposition::Toast(ToastLevel::Warning),
            Self::Config { .. } => Disposition::Diagnostic,
        }
    }

    /// Whether the user should see this error.
    #[must_use]
    pub fn is_user_visible(&self) -> bool {
        matches!(self.disposition(), Disposition::Toast(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_switch_failures_and_missing_identity_are_visible() {
        let failed = SessionError::SwitchFailed {
            target: Role::Provider,
            cause: HestiaError::network("offline"),
        };
        assert_eq!(failed.disposition(), Disposition::Toast(ToastLevel::Error));
        assert!(SessionError::NoIdentity.is_user_visible());

        let fetch = SessionError::TransientFetch {
            source_kind: FetchSource::Probe,
            reason: "timeout".into(),
        };
        assert!(!fetch.is_user_visible());
        assert!(!SessionError::InvalidRoleValue { value: "x".into() }.is_user_visible());
    }

    #[test]
    fn test_switch_failed_message() {
        let failed = SessionError::SwitchFailed {
            target: Role::Provider,
            cause: HestiaError::permission_denied("profile locked"),
        };
        assert_eq!(
            failed.to_string(),
            "Couldn't switch to provider: Permission denied: profile locked"
        );
    }
}
