//! Screen location groups.
//!
//! The navigation layer organizes routes into top-level groups. Routes use
//! the `/(group)/screen` convention; the group segment may also appear
//! without parentheses.

use crate::role::Role;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The top-level group of the current screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationGroup {
    /// Sign-in and sign-up screens
    Auth,
    /// Screens for the provider role
    Provider,
    /// Screens for the homeowner role
    Homeowner,
    /// Anything outside the three groups above
    #[default]
    Other,
}

impl LocationGroup {
    /// The group that holds a role's screens.
    #[must_use]
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Homeowner => Self::Homeowner,
            Role::Provider => Self::Provider,
        }
    }

    /// Classify a route by its first path segment.
    pub fn of_route(route: &str) -> Self {
        let first = route
            .trim_start_matches('/')
            .split('/')
            .next()
            .unwrap_or_default();
        let segment = first
            .strip_prefix('(')
            .and_then(|s| s.strip_suffix(')'))
            .unwrap_or(first);
        match segment {
            "auth" => Self::Auth,
            "provider" => Self::Provider,
            "homeowner" => Self::Homeowner,
            _ => Self::Other,
        }
    }

    /// The role whose screens live in this group, if any.
    #[must_use]
    pub fn role(self) -> Option<Role> {
        match self {
            Self::Homeowner => Some(Role::Homeowner),
            Self::Provider => Some(Role::Provider),
            Self::Auth | Self::Other => None,
        }
    }

    /// Get a short label for logging.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Provider => "provider",
            Self::Homeowner => "homeowner",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for LocationGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_of_route_parenthesized_groups() {
        assert_eq!(LocationGroup::of_route("/(auth)/login"), LocationGroup::Auth);
        assert_eq!(
            LocationGroup::of_route("/(provider)/jobs/42"),
            LocationGroup::Provider
        );
        assert_eq!(
            LocationGroup::of_route("(homeowner)/home"),
            LocationGroup::Homeowner
        );
    }

    #[test]
    fn test_of_route_bare_segments_and_other() {
        assert_eq!(LocationGroup::of_route("/provider"), LocationGroup::Provider);
        assert_eq!(LocationGroup::of_route("/settings"), LocationGroup::Other);
        assert_eq!(LocationGroup::of_route(""), LocationGroup::Other);
        assert_eq!(LocationGroup::of_route("/(auth"), LocationGroup::Other);
    }

    #[test]
    fn test_role_group_mapping() {
        for role in Role::all() {
            assert_eq!(LocationGroup::for_role(*role).role(), Some(*role));
        }
        assert_eq!(LocationGroup::Auth.role(), None);
    }
}
