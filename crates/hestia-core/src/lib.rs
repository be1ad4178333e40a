//! Hestia Core - Session Domain Foundation
//!
//! Pure types shared by every Hestia crate. Nothing here performs I/O; the
//! storage interface is an effect trait implemented in `hestia-effects`.
//!
//! # Contents
//!
//! - [`Role`] / [`RoleClaim`]: the two mutually exclusive user roles, and an
//!   unvalidated role value as read from a cache entry or a server profile
//! - [`Identity`] / [`Profile`]: the authenticated user and its role-tagged record
//! - [`LocationGroup`]: the top-level screen group reported by the navigation layer
//! - [`HestiaError`]: unified error returned by external collaborators
//! - [`effects::StorageEffects`]: durable key-value storage interface

#![forbid(unsafe_code)]

/// Pure effect interfaces (no implementations)
pub mod effects;

/// Unified error handling
pub mod errors;

/// Identity and profile records
pub mod identity;

/// Screen location groups
pub mod location;

/// User roles
pub mod role;

pub use errors::{HestiaError, Result};
pub use identity::{Identity, IdentityId, Profile, ProfileId};
pub use location::LocationGroup;
pub use role::{Role, RoleClaim};
