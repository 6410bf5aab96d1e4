//! Durable key/value storage backed by redb.

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, TableDefinition};
use tracing::debug;

use crate::error::StorageError;

use super::Storage;

const STATE: TableDefinition<&str, &str> = TableDefinition::new("state");

/// Convert any `Display` error into a `StorageError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StorageError::$variant(e.to_string())
    };
}

/// Storage backend persisting to an embedded redb database file.
pub struct DiskStorage {
    db: Database,
}

impl DiskStorage {
    /// Open (or create) a storage file at the given path.
    pub fn open(path: &Path) -> Result<Arc<Self>, StorageError> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let storage = Self { db };
        storage.ensure_table()?;
        debug!(?path, "disk storage opened");
        Ok(Arc::new(storage))
    }

    /// Create an ephemeral in-memory database (for testing).
    pub fn open_in_memory() -> Result<Arc<Self>, StorageError> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let storage = Self { db };
        storage.ensure_table()?;
        Ok(Arc::new(storage))
    }

    fn ensure_table(&self) -> Result<(), StorageError> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(STATE).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }
}

impl Storage for DiskStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(STATE).map_err(map_err!(Table))?;
        match table.get(key).map_err(map_err!(Read))? {
            Some(guard) => Ok(Some(guard.value().to_string())),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(STATE).map_err(map_err!(Table))?;
            table.insert(key, value).map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }
}
