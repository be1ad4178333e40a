//! Effect interfaces.
//!
//! Traits only; handlers live in `hestia-effects`, test doubles live next to
//! the tests that need them.

pub mod storage;

pub use storage::{StorageEffects, StorageError};
