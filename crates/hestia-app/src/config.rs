//! Session configuration.
//!
//! Every field has a default, so an empty TOML document is a valid
//! configuration:
//!
//! ```toml
//! storage_key = "hestia.session.active_role"
//! event_capacity = 64
//! max_redirects_per_resolution = 3
//!
//! [routes]
//! login = "/(auth)/login"
//! homeowner_home = "/(homeowner)/home"
//! provider_home = "/(provider)/home"
//! ```

use crate::errors::SessionError;
use hestia_core::{LocationGroup, Role};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default storage key for the cached role.
pub const DEFAULT_STORAGE_KEY: &str = "hestia.session.active_role";
/// Default event bus capacity.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;
/// Default redirect budget for one resolution.
pub const DEFAULT_MAX_REDIRECTS: u32 = 3;

/// Entry routes the guard redirects to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteTable {
    /// Login entry point
    pub login: String,
    /// Homeowner home route
    pub homeowner_home: String,
    /// Provider home route
    pub provider_home: String,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self {
            login: "/(auth)/login".to_string(),
            homeowner_home: "/(homeowner)/home".to_string(),
            provider_home: "/(provider)/home".to_string(),
        }
    }
}

impl RouteTable {
    /// Home route for a role.
    pub fn home(&self, role: Role) -> &str {
        match role {
            Role::Homeowner => &self.homeowner_home,
            Role::Provider => &self.provider_home,
        }
    }

    /// Check that every route is absolute and sits in its expected group.
    pub fn validate(&self) -> Result<(), SessionError> {
        let expected = [
            ("login", &self.login, LocationGroup::Auth),
            ("homeowner_home", &self.homeowner_home, LocationGroup::Homeowner),
            ("provider_home", &self.provider_home, LocationGroup::Provider),
        ];
        for (name, route, group) in expected {
            if !route.starts_with('/') {
                return Err(SessionError::config(format!(
                    "routes.{name} must start with '/': {route}"
                )));
            }
            let actual = LocationGroup::of_route(route);
            if actual != group {
                return Err(SessionError::config(format!(
                    "routes.{name} must be in the {group} group, found {actual}: {route}"
                )));
            }
        }
        Ok(())
    }
}

/// Session core configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Storage key holding the cached role
    pub storage_key: String,
    /// Event bus capacity (messages buffered per subscriber)
    pub event_capacity: usize,
    /// Redirects allowed for a single resolution before the guard declares a loop
    pub max_redirects_per_resolution: u32,
    /// Redirect targets
    pub routes: RouteTable,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
            max_redirects_per_resolution: DEFAULT_MAX_REDIRECTS,
            routes: RouteTable::default(),
        }
    }
}

impl SessionConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, SessionError> {
        let config: Self = toml::from_str(source)
            .map_err(|e| SessionError::config(format!("Invalid TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self, SessionError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SessionError::config(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.storage_key.trim().is_empty() {
            return Err(SessionError::config("storage_key cannot be empty"));
        }
        if self.event_capacity == 0 {
            return Err(SessionError::config("event_capacity must be at least 1"));
        }
        if self.max_redirects_per_resolution == 0 {
            return Err(SessionError::config(
                "max_redirects_per_resolution must be at least 1",
            ));
        }
        self.routes.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_empty_document_is_default() {
        let config = SessionConfig::from_toml_str("").unwrap();
        assert_eq!(config, SessionConfig::default());
    }

    #[test]
    fn test_partial_routes_keep_defaults() {
        let config = SessionConfig::from_toml_str(
            r#"
            max_redirects_per_resolution = 5

            [routes]
            provider_home = "/(provider)/jobs"
            "#,
        )
        .unwrap();
        assert_eq!(config.max_redirects_per_resolution, 5);
        assert_eq!(config.routes.home(Role::Provider), "/(provider)/jobs");
        assert_eq!(config.routes.login, "/(auth)/login");
    }

    #[test]
    fn test_route_in_wrong_group_is_rejected() {
        let err = SessionConfig::from_toml_str(
            r#"
            [routes]
            homeowner_home = "/(provider)/home"
            "#,
        )
        .unwrap_err();
        assert_matches!(err, SessionError::Config { ref message } if message.contains("homeowner_home"));
    }

    #[test]
    fn test_relative_route_and_zero_capacity_rejected() {
        let mut config = SessionConfig::default();
        config.routes.login = "(auth)/login".to_string();
        assert!(config.validate().is_err());

        let config = SessionConfig {
            event_capacity: 0,
            ..SessionConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.toml");
        std::fs::write(&path, "storage_key = \"app.role\"\n").unwrap();
        let config = SessionConfig::load_from_file(&path).unwrap();
        assert_eq!(config.storage_key, "app.role");

        assert!(SessionConfig::load_from_file(&dir.path().join("missing.toml")).is_err());
    }
}
