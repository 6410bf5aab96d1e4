use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use crate::error::StorageError;

use super::Storage;

/// An in-memory storage backend.
///
/// [`MemoryStorage::global`] is the crate's default backend: a single
/// process-wide store shared by every container that does not configure
/// its own, so a container constructed later rehydrates from an earlier
/// one's writes. Isolated instances from [`MemoryStorage::new`] are the
/// usual choice in tests.
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create an isolated in-memory store.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Get the process-wide shared store.
    pub fn global() -> Arc<Self> {
        static GLOBAL: OnceLock<Arc<MemoryStorage>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(MemoryStorage::default())))
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }

    /// Remove a single entry, returning the previous value if any.
    pub fn remove(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().remove(key)
    }

    /// Remove all entries.
    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
