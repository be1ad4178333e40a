//! Identity and profile records.

use crate::role::{Role, RoleClaim};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque handle for an authenticated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IdentityId(Uuid);

impl IdentityId {
    /// Wrap an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Generate a fresh random identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Underlying UUID.
    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "identity-{}", self.0)
    }
}

/// An authenticated user, independent of role.
///
/// Immutable for the lifetime of a session; a different `Identity` means a
/// different session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    /// Stable identifier issued by the identity provider
    pub id: IdentityId,
    /// Contact address, if the provider exposes one
    pub email: Option<String>,
}

impl Identity {
    /// Create an identity without contact details.
    pub fn new(id: IdentityId) -> Self {
        Self { id, email: None }
    }

    /// Attach an email address.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// Server-side profile identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProfileId(pub String);

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The role-tagged record for the active role of an identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Profile identifier
    pub id: ProfileId,
    /// Authoritative role, as stored server-side
    pub role: RoleClaim,
    /// Name shown in the UI
    pub display_name: String,
    /// Optional phone number
    pub phone: Option<String>,
}

impl Profile {
    /// Create a profile with a valid role.
    pub fn new(id: impl Into<String>, role: Role, display_name: impl Into<String>) -> Self {
        Self {
            id: ProfileId(id.into()),
            role: RoleClaim::Valid(role),
            display_name: display_name.into(),
            phone: None,
        }
    }

    /// The profile's role, if it is valid.
    pub fn role(&self) -> Option<Role> {
        self.role.valid()
    }
}
