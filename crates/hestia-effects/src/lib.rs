//! Hestia Effects - concrete handlers for `hestia-core` effect traits.
//!
//! - [`MemoryStorageHandler`]: process-local storage for tests and offline hosts
//! - [`FilesystemStorageHandler`]: durable storage, one file per key

#![forbid(unsafe_code)]

pub mod storage;

pub use storage::{FilesystemStorageHandler, MemoryStorageHandler};
