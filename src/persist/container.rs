use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::container::{StateContainer, StateEvent, Subscription};
use crate::error::StateResult;
use crate::storage::{MemoryStorage, Storage};

use super::{Codec, DecodeFn, EncodeFn};

/// Configuration for a persistent container.
///
/// Each field defaults independently: JSON encode and decode
/// ([`Codec::json`]) and the process-wide [`MemoryStorage::global`]
/// backend.
pub struct PersistConfig<T> {
    pub encode: Option<EncodeFn<T>>,
    pub decode: Option<DecodeFn<T>>,
    pub backend: Option<Arc<dyn Storage>>,
}

impl<T> Default for PersistConfig<T> {
    fn default() -> Self {
        Self {
            encode: None,
            decode: None,
            backend: None,
        }
    }
}

/// A state container that mirrors every write to a storage backend.
///
/// Wraps a [`StateContainer`] rather than replacing it: all mutation
/// paths route through [`set`](PersistentStateContainer::set), which
/// publishes through the inner container and then writes the encoded
/// snapshot to the backend under the container's storage key. At
/// construction the container rehydrates from an existing stored value,
/// falling back to the default state when the stored value does not
/// decode.
pub struct PersistentStateContainer<T> {
    inner: StateContainer<T>,
    storage_key: String,
    codec: Codec<T>,
    backend: Arc<dyn Storage>,
}

impl<T> PersistentStateContainer<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Create a persistent container with the default codec and backend.
    ///
    /// Fails when establishing the storage record fails; an undecodable
    /// existing value is absorbed by falling back to `default_state`.
    pub fn new(storage_key: impl Into<String>, default_state: T) -> StateResult<Self> {
        Self::with_config(storage_key, default_state, PersistConfig::default())
    }

    /// Create a persistent container, overriding any of the codec
    /// functions or the backend.
    ///
    /// If the backend already holds a value under `storage_key`, the
    /// decoded value becomes the *current* state; the reset target stays
    /// `default_state` until replaced via
    /// [`reset_with`](PersistentStateContainer::reset_with). Otherwise
    /// the encoded default is written immediately, establishing the
    /// record.
    pub fn with_config(
        storage_key: impl Into<String>,
        default_state: T,
        config: PersistConfig<T>,
    ) -> StateResult<Self> {
        let codec = Codec {
            encode: config.encode.unwrap_or_else(|| Codec::<T>::json().encode),
            decode: config.decode.unwrap_or_else(|| Codec::<T>::json().decode),
        };
        let backend = config
            .backend
            .unwrap_or_else(|| MemoryStorage::global() as Arc<dyn Storage>);

        let container = Self {
            inner: StateContainer::new(default_state.clone()),
            storage_key: storage_key.into(),
            codec,
            backend,
        };

        match container.backend.get(&container.storage_key) {
            Ok(Some(raw)) => {
                let state = (container.codec.decode)(&raw).unwrap_or_else(|err| {
                    warn!(
                        key = %container.storage_key, %err,
                        "stored state undecodable, falling back to default"
                    );
                    default_state
                });
                // Publishes the rehydrated value and re-writes it in the
                // active codec's canonical form.
                container.set(state)?;
            }
            Ok(None) => container.write_through()?,
            Err(err) => {
                warn!(
                    key = %container.storage_key, %err,
                    "storage read failed, keeping default state"
                );
                container.write_through()?;
            }
        }

        Ok(container)
    }
}

impl<T: Clone + Send + Sync + 'static> PersistentStateContainer<T> {
    /// The backend key this container owns.
    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    /// Set the next state, publish it, then write it through to storage.
    ///
    /// The write-through runs even when the publish fails on a completed
    /// container; the current snapshot is re-encoded and stored either
    /// way. A publish error takes precedence in the returned result;
    /// otherwise a write-through failure surfaces. The in-memory state
    /// has already changed at that point, and detecting or retrying the
    /// divergence is the caller's responsibility.
    pub fn set(&self, state: T) -> StateResult<()> {
        let published = self.inner.set(state);
        let written = self.write_through();
        published.and(written)
    }

    /// Patch the state by applying `patch` to a copy of the current
    /// snapshot, publishing and persisting the result as one write.
    pub fn patch<F>(&self, patch: F) -> StateResult<()>
    where
        F: FnOnce(&mut T),
    {
        let mut state = self.inner.snapshot();
        patch(&mut state);
        self.set(state)
    }

    /// Reset the state to the default value and persist it.
    pub fn reset(&self) -> StateResult<()> {
        self.set(self.inner.default_state())
    }

    /// Replace the stored default for all future resets, then reset to it.
    pub fn reset_with(&self, new_default: T) -> StateResult<()> {
        self.inner.replace_default(new_default.clone());
        self.set(new_default)
    }

    /// Get a snapshot of the current state.
    pub fn snapshot(&self) -> T {
        self.inner.snapshot()
    }

    /// Get the default state used by the constructor or the most recent
    /// [`reset_with`](PersistentStateContainer::reset_with).
    pub fn default_state(&self) -> T {
        self.inner.default_state()
    }

    /// Subscribe to state changes. See [`StateContainer::observe`].
    pub fn observe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.inner.observe(observer)
    }

    /// Subscribe to state changes and the completion signal. See
    /// [`StateContainer::observe_events`].
    pub fn observe_events<F>(&self, observer: F) -> Subscription
    where
        F: Fn(StateEvent<&T>) + Send + Sync + 'static,
    {
        self.inner.observe_events(observer)
    }

    /// Subscribe to changes of a single state field. See
    /// [`StateContainer::select`].
    pub fn select<U, P, F>(&self, field: P, observer: F) -> Subscription
    where
        U: Clone + PartialEq + Send + 'static,
        P: Fn(&T) -> &U + Send + Sync + 'static,
        F: Fn(&U) + Send + Sync + 'static,
    {
        self.inner.select(field, observer)
    }

    /// Subscribe to changes of a value computed from the state. See
    /// [`StateContainer::selector`].
    pub fn selector<U, P, F>(&self, project: P, observer: F) -> Subscription
    where
        U: PartialEq + Send + 'static,
        P: Fn(&T) -> U + Send + Sync + 'static,
        F: Fn(&U) + Send + Sync + 'static,
    {
        self.inner.selector(project, observer)
    }

    /// Stop the emission of state changes. Storage keeps its last
    /// written value.
    pub fn complete(&self) {
        self.inner.complete();
    }

    /// Whether the container has been completed.
    pub fn is_completed(&self) -> bool {
        self.inner.is_completed()
    }

    /// Encode the current snapshot and store it under the container's key.
    fn write_through(&self) -> StateResult<()> {
        let encoded = (self.codec.encode)(&self.inner.snapshot())?;
        self.backend.set(&self.storage_key, &encoded)?;
        debug!(key = %self.storage_key, bytes = encoded.len(), "state written through");
        Ok(())
    }
}
