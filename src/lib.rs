//! # Statecell
//!
//! A minimal reactive state container for Rust.
//!
//! Statecell provides two layers for managing a single state record:
//!
//! ## StateContainer (core)
//!
//! One mutable "current state" value that can be read synchronously,
//! replaced or patched, reset to a default, and observed as an ordered
//! stream of changes:
//! - Late observers receive the current value immediately on subscribe
//! - `select`/`selector` derive sub-streams that only emit when the
//!   projected value actually changes
//! - `complete` closes the stream for good
//!
//! ## PersistentStateContainer (write-through persistence)
//!
//! Wraps a `StateContainer` with a pluggable codec and key/value storage
//! backend: the container rehydrates from storage at construction
//! (falling back to the default on corrupt data) and mirrors every state
//! write back to storage.

pub mod container;
pub mod error;
pub mod persist;
pub mod storage;

// Re-export main types for convenience
pub use container::{StateContainer, StateEvent, Subscription};
pub use error::{StateError, StateResult, StorageError};
pub use persist::{Codec, PersistConfig, PersistentStateContainer};
pub use storage::{DiskStorage, MemoryStorage, Storage};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_works() {
        // Basic smoke test
        let container = StateContainer::new(0);
        assert_eq!(container.snapshot(), 0);
        container.set(42).unwrap();
        assert_eq!(container.snapshot(), 42);
    }
}
