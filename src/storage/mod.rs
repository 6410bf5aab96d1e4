//! Pluggable key/value storage backends.
//!
//! Backends are string-keyed, string-valued and fully synchronous. A
//! persistent container owns exactly one key and performs unsynchronized
//! read-then-write sequences, assuming single-writer-per-key usage.

mod disk;
mod memory;

pub use disk::DiskStorage;
pub use memory::MemoryStorage;

use crate::error::StorageError;

/// A synchronous string-keyed, string-valued storage backend.
pub trait Storage: Send + Sync {
    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any existing value.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}
