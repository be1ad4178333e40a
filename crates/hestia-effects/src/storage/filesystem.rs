//! Filesystem storage handler
//!
//! One file per key under a base directory:
//! - file names are the BLAKE3 digest of the key, so any valid key is a safe name
//! - writes land in a temporary file first and are renamed into place

use async_trait::async_trait;
use hestia_core::effects::{StorageEffects, StorageError};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

const MAX_KEY_LEN: usize = 255;

/// Durable storage backed by plain files.
#[derive(Debug, Clone)]
pub struct FilesystemStorageHandler {
    base_path: PathBuf,
}

impl FilesystemStorageHandler {
    /// Create a handler rooted at `base_path`, creating the directory if needed.
    pub fn new(base_path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let base_path = base_path.into();
        std::fs::create_dir_all(&base_path).map_err(|e| StorageError::Configuration {
            reason: format!("Failed to create storage directory: {e}"),
        })?;

        info!(path = %base_path.display(), "Initialized filesystem storage");
        Ok(Self { base_path })
    }

    /// Directory holding the stored files.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn validate_key(key: &str) -> Result<(), StorageError> {
        if key.is_empty() {
            return Err(StorageError::InvalidKey {
                reason: "Key cannot be empty".to_string(),
            });
        }

        if key.len() > MAX_KEY_LEN {
            return Err(StorageError::InvalidKey {
                reason: format!("Key too long (max {MAX_KEY_LEN} characters)"),
            });
        }

        if key.contains("..") || key.contains('\0') || key.contains('/') {
            return Err(StorageError::InvalidKey {
                reason: "Key contains invalid characters".to_string(),
            });
        }

        Ok(())
    }

    fn key_to_path(&self, key: &str) -> PathBuf {
        let hash = blake3::hash(key.as_bytes());
        self.base_path.join(format!("{}.dat", hash.to_hex()))
    }
}

#[async_trait]
impl StorageEffects for FilesystemStorageHandler {
    async fn store(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        Self::validate_key(key)?;
        let path = self.key_to_path(key);
        let tmp = path.with_extension("tmp");

        fs::write(&tmp, &value)
            .await
            .map_err(|e| StorageError::WriteFailed(format!("{key}: {e}")))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|e| StorageError::WriteFailed(format!("{key}: {e}")))?;

        debug!(key, bytes = value.len(), "Stored value");
        Ok(())
    }

    async fn retrieve(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Self::validate_key(key)?;
        match fs::read(self.key_to_path(key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::ReadFailed(format!("{key}: {e}"))),
        }
    }

    async fn remove(&self, key: &str) -> Result<bool, StorageError> {
        Self::validate_key(key)?;
        match fs::remove_file(self.key_to_path(key)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::DeleteFailed(format!("{key}: {e}"))),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        Self::validate_key(key)?;
        fs::try_exists(self.key_to_path(key))
            .await
            .map_err(|e| StorageError::ReadFailed(format!("{key}: {e}")))
    }
}
