//! Write-through persistence for state containers.
//!
//! A [`PersistentStateContainer`] wraps a plain container with a
//! pluggable [`Codec`] and [`Storage`](crate::storage::Storage) backend:
//! it rehydrates from the backend at construction and mirrors every
//! state write back to it.

mod codec;
mod container;

pub use codec::{Codec, DecodeFn, EncodeFn};
pub use container::{PersistConfig, PersistentStateContainer};
