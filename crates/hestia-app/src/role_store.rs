//! Role cache
//!
//! Holds the last-known active role across process restarts. It is read once
//! at startup, before the guard makes its first decision, and is the only
//! role signal available until the profile fetch settles.
//!
//! Failures never leave this module: a failed read is an absent cache, a
//! failed write is logged and the in-memory value stays authoritative for
//! the running session.
//!
//! Writes are split in two. [`RoleStore::write_cached_role`] updates the
//! in-memory cell immediately and hands back a [`PendingWrite`]; the caller
//! persists it once no lock on the session core is held.

use crate::errors::{FetchSource, SessionError};
use hestia_core::effects::StorageEffects;
use hestia_core::{Role, RoleClaim};
use std::sync::Arc;
use tracing::{debug, warn};

/// Durable single-value cache of the active role.
pub struct RoleStore {
    storage: Arc<dyn StorageEffects>,
    key: String,
    cached: Option<RoleClaim>,
}

impl RoleStore {
    /// Read the cached value from storage.
    ///
    /// A missing key, an unreadable entry and a storage failure all load as
    /// an empty cache. Values other than the two roles load as
    /// [`RoleClaim::Invalid`] so the resolver can correct them.
    pub async fn load(storage: Arc<dyn StorageEffects>, key: impl Into<String>) -> Self {
        let key = key.into();
        let cached = match storage.retrieve(&key).await {
            Ok(Some(bytes)) => match String::from_utf8(bytes) {
                Ok(raw) => Some(RoleClaim::parse(raw.trim())),
                Err(e) => {
                    warn!(key = %key, error = %e, "Cached role is not UTF-8; ignoring");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                let err = SessionError::TransientFetch {
                    source_kind: FetchSource::Cache,
                    reason: e.to_string(),
                };
                warn!(key = %key, error = %err, "Treating role cache as empty");
                None
            }
        };
        debug!(key = %key, cached = ?cached, "Loaded role cache");
        Self {
            storage,
            key,
            cached,
        }
    }

    /// The loaded value, valid or not.
    pub fn cached_claim(&self) -> Option<&RoleClaim> {
        self.cached.as_ref()
    }

    /// The loaded value, if it is a valid role.
    pub fn cached_role(&self) -> Option<Role> {
        self.cached.as_ref().and_then(RoleClaim::valid)
    }

    /// Storage key in use.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Overwrite the cached role in memory and return the durable write.
    #[must_use = "the returned write must be persisted"]
    pub fn write_cached_role(&mut self, role: Role) -> PendingWrite {
        self.cached = Some(RoleClaim::Valid(role));
        PendingWrite {
            storage: self.storage.clone(),
            key: self.key.clone(),
            role,
        }
    }
}

impl std::fmt::Debug for RoleStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleStore")
            .field("key", &self.key)
            .field("cached", &self.cached)
            .finish_non_exhaustive()
    }
}

/// A cache write that has been applied in memory but not yet persisted.
pub struct PendingWrite {
    storage: Arc<dyn StorageEffects>,
    key: String,
    role: Role,
}

impl PendingWrite {
    /// Role being written.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Write to storage. Failures are logged and dropped.
    pub async fn persist(self) {
        let role = self.role;
        match self
            .storage
            .store(&self.key, role.as_str().as_bytes().to_vec())
            .await
        {
            Ok(()) => debug!(key = %self.key, %role, "Persisted cached role"),
            Err(e) => warn!(key = %self.key, %role, error = %e, "Failed to persist cached role"),
        }
    }
}

impl std::fmt::Debug for PendingWrite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingWrite")
            .field("key", &self.key)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}
