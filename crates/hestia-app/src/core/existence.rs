//! Dual-profile existence flags.
//!
//! Advisory only: they pick the wording of the role switcher and are never
//! consulted by the guard or required by a switch.

use hestia_core::Role;

/// Which role profiles an identity appears to have.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RoleExistenceFlags {
    /// A home is owned, or the active role is homeowner
    pub has_homeowner_profile: bool,
    /// An organization is owned, or the active role is provider
    pub has_provider_profile: bool,
}

impl RoleExistenceFlags {
    /// Flag for one role.
    #[must_use]
    pub fn has(&self, role: Role) -> bool {
        match role {
            Role::Homeowner => self.has_homeowner_profile,
            Role::Provider => self.has_provider_profile,
        }
    }

    /// The active role always counts as existing.
    #[must_use]
    pub fn with_active(mut self, active: Option<Role>) -> Self {
        match active {
            Some(Role::Homeowner) => self.has_homeowner_profile = true,
            Some(Role::Provider) => self.has_provider_profile = true,
            None => {}
        }
        self
    }

    /// Whether both profiles exist.
    #[must_use]
    pub fn is_dual(&self) -> bool {
        self.has_homeowner_profile && self.has_provider_profile
    }
}

/// Whether switching leads to an existing profile or to onboarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferAction {
    /// The destination profile exists
    Manage,
    /// The destination profile still has to be created
    Create,
}

/// A labeled switch destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchOffer {
    /// Destination role
    pub target: Role,
    /// Manage or create
    pub action: OfferAction,
}

impl SwitchOffer {
    /// Label the destination using the existence flags.
    #[must_use]
    pub fn for_target(target: Role, flags: RoleExistenceFlags) -> Self {
        let action = if flags.has(target) {
            OfferAction::Manage
        } else {
            OfferAction::Create
        };
        Self { target, action }
    }

    /// Button copy for the switcher.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match (self.target, self.action) {
            (Role::Homeowner, OfferAction::Manage) => "Manage your homes",
            (Role::Homeowner, OfferAction::Create) => "Create homeowner account",
            (Role::Provider, OfferAction::Manage) => "Manage your business",
            (Role::Provider, OfferAction::Create) => "Create provider account",
        }
    }
}
