//! Durable key-value storage interface.
//!
//! # Effect Classification
//!
//! - **Category**: Infrastructure Effect
//! - **Implementation**: `hestia-effects`
//! - **Usage**: the role cache; values are opaque bytes

use async_trait::async_trait;

/// Error type for storage operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// Reading a key failed
    #[error("Read failed: {0}")]
    ReadFailed(String),
    /// Writing a key failed
    #[error("Write failed: {0}")]
    WriteFailed(String),
    /// Removing a key failed
    #[error("Delete failed: {0}")]
    DeleteFailed(String),
    /// The key is not acceptable to this backend
    #[error("Invalid key: {reason}")]
    InvalidKey {
        /// Why the key was rejected
        reason: String,
    },
    /// The backend could not be set up
    #[error("Configuration error: {reason}")]
    Configuration {
        /// What went wrong
        reason: String,
    },
}

/// Durable key-value storage.
#[async_trait]
pub trait StorageEffects: Send + Sync {
    /// Store a value, overwriting any previous value.
    async fn store(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;

    /// Retrieve a value; `Ok(None)` when the key is absent.
    async fn retrieve(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Remove a value; returns whether it existed.
    async fn remove(&self, key: &str) -> Result<bool, StorageError>;

    /// Check whether a key exists.
    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.retrieve(key).await?.is_some())
    }
}
