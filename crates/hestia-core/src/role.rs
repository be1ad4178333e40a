//! User roles.
//!
//! A session operates under exactly one [`Role`] at a time. Values read back
//! from storage or from the server are not trusted to be valid, so they enter
//! the system as a [`RoleClaim`] and are validated by the resolver.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// The mutually exclusive mode the UI operates under for an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Owns homes and books services
    Homeowner,
    /// Belongs to an organization that performs services
    Provider,
}

impl Role {
    /// Role used when no signal exists at all, and when a stored value is invalid.
    pub const DEFAULT: Role = Role::Homeowner;

    /// Get all roles in display order.
    #[must_use]
    pub fn all() -> &'static [Self] {
        &[Self::Homeowner, Self::Provider]
    }

    /// Wire/storage representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Homeowner => "homeowner",
            Self::Provider => "provider",
        }
    }

    /// The opposite role.
    #[must_use]
    pub fn other(self) -> Self {
        match self {
            Self::Homeowner => Self::Provider,
            Self::Provider => Self::Homeowner,
        }
    }

    /// Get a short label for display.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Homeowner => "Homeowner",
            Self::Provider => "Provider",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not one of the two valid roles.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid role value '{value}'")]
pub struct InvalidRole {
    /// The rejected value
    pub value: String,
}

impl FromStr for Role {
    type Err = InvalidRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "homeowner" => Ok(Self::Homeowner),
            "provider" => Ok(Self::Provider),
            other => Err(InvalidRole {
                value: other.to_string(),
            }),
        }
    }
}

/// An unvalidated role value.
///
/// Parsing never fails: anything that is not a valid role is kept verbatim as
/// [`RoleClaim::Invalid`] so it can be logged and corrected.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RoleClaim {
    /// One of the two valid roles
    Valid(Role),
    /// Any other value
    Invalid(String),
}

impl RoleClaim {
    /// Classify a raw value.
    pub fn parse(raw: &str) -> Self {
        raw.parse::<Role>()
            .map_or_else(|e| Self::Invalid(e.value), Self::Valid)
    }

    /// The role, if the claim is valid.
    #[must_use]
    pub fn valid(&self) -> Option<Role> {
        match self {
            Self::Valid(role) => Some(*role),
            Self::Invalid(_) => None,
        }
    }

    /// Raw string form.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Valid(role) => role.as_str(),
            Self::Invalid(raw) => raw,
        }
    }
}

impl From<Role> for RoleClaim {
    fn from(role: Role) -> Self {
        Self::Valid(role)
    }
}

impl fmt::Display for RoleClaim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for RoleClaim {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RoleClaim {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}
