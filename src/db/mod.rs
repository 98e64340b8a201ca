//! Persistence layer: JSON collections in a key-value store.
//!
//! Every read parses a whole collection and every write replaces it. There is
//! no locking: two writers doing read-modify-write on the same collection
//! race, and the last write wins.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

/// Collection names as constants.
pub mod collections {
    pub const RESERVATIONS: &str = "reservations";
    pub const DRIVERS: &str = "taxi_drivers";
    pub const ADMIN_LOGS: &str = "admin_logs";
    /// Reservations moved to the admin trash bin
    pub const DELETED_RESERVATIONS: &str = "deleted_reservations";
    pub const PASSWORD_RESET_REQUESTS: &str = "password_reset_requests";
    pub const SUGGESTIONS: &str = "suggestions";
}

/// Default per-collection size limit, same order as browser local storage.
pub const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;

/// Errors from the storage backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to serialize collection '{collection}': {source}")]
    Serialize {
        collection: String,
        source: serde_json::Error,
    },

    #[error("Collection '{collection}' is {size} bytes, over the {quota} byte quota")]
    QuotaExceeded {
        collection: String,
        size: usize,
        quota: usize,
    },

    #[error("Invalid collection key: {0}")]
    InvalidKey(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Raw key-value backend. Values are complete JSON documents.
pub trait Store: Send + Sync {
    /// Returns `None` when nothing has been stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Replaces the value under `key`.
    fn set(&self, key: &str, value: String) -> Result<(), StoreError>;
}

/// Typed access to collections on top of a [`Store`].
#[derive(Clone)]
pub struct Db {
    store: Arc<dyn Store>,
    quota_bytes: usize,
}

impl Db {
    pub fn new(store: Arc<dyn Store>, quota_bytes: usize) -> Self {
        Self { store, quota_bytes }
    }

    /// In-memory database with the default quota, for tests and local runs.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::default()), DEFAULT_QUOTA_BYTES)
    }

    /// Read a whole collection.
    ///
    /// Absent, unreadable or malformed collections read as empty. The
    /// deserialization into `T` is the schema check: one bad record makes the
    /// whole collection read as empty.
    pub fn read<T: DeserializeOwned>(&self, collection: &str) -> Vec<T> {
        let raw = match self.store.get(collection) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::error!(collection, error = %e, "Failed to read collection");
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<T>>(&raw) {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(
                    collection,
                    error = %e,
                    "Malformed collection, treating as empty"
                );
                Vec::new()
            }
        }
    }

    /// Replace a whole collection.
    pub fn write<T: Serialize>(&self, collection: &str, items: &[T]) -> Result<(), StoreError> {
        let raw = serde_json::to_string(items).map_err(|source| StoreError::Serialize {
            collection: collection.to_string(),
            source,
        })?;

        if raw.len() > self.quota_bytes {
            return Err(StoreError::QuotaExceeded {
                collection: collection.to_string(),
                size: raw.len(),
                quota: self.quota_bytes,
            });
        }

        self.store.set(collection, raw)?;
        tracing::debug!(collection, count = items.len(), "Collection written");
        Ok(())
    }

    /// Read a collection, let `f` change it, and write it back.
    ///
    /// Nothing is written when `f` fails.
    pub fn update<T, R, F>(&self, collection: &str, f: F) -> Result<R, crate::error::AppError>
    where
        T: DeserializeOwned + Serialize,
        F: FnOnce(&mut Vec<T>) -> Result<R, crate::error::AppError>,
    {
        let mut items = self.read::<T>(collection);
        let result = f(&mut items)?;
        self.write(collection, &items)?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Item {
        id: u32,
        name: String,
    }

    #[test]
    fn test_write_then_read_preserves_order() {
        let db = Db::in_memory();
        let items = vec![
            Item { id: 2, name: "b".to_string() },
            Item { id: 1, name: "a".to_string() },
        ];

        db.write("items", &items).unwrap();

        assert_eq!(db.read::<Item>("items"), items);
    }

    #[test]
    fn test_absent_collection_reads_empty() {
        let db = Db::in_memory();
        assert!(db.read::<Item>("missing").is_empty());
    }

    #[test]
    fn test_malformed_collection_reads_empty() {
        let store = Arc::new(MemoryStore::default());
        store.set("items", "{not json".to_string()).unwrap();
        store.set("shape", r#"[{"id":"x"}]"#.to_string()).unwrap();
        let db = Db::new(store, DEFAULT_QUOTA_BYTES);

        assert!(db.read::<Item>("items").is_empty());
        assert!(db.read::<Item>("shape").is_empty());
    }

    #[test]
    fn test_quota_exceeded_leaves_previous_value() {
        let db = Db::new(Arc::new(MemoryStore::default()), 64);
        let small = vec![Item { id: 1, name: "a".to_string() }];
        db.write("items", &small).unwrap();

        let big = vec![Item { id: 2, name: "x".repeat(100) }];
        let err = db.write("items", &big).unwrap_err();

        assert!(matches!(err, StoreError::QuotaExceeded { .. }));
        assert_eq!(db.read::<Item>("items"), small);
    }

    #[test]
    fn test_update_does_not_write_on_error() {
        let db = Db::in_memory();
        db.write("items", &[Item { id: 1, name: "a".to_string() }])
            .unwrap();

        let result = db.update::<Item, (), _>("items", |items| {
            items.clear();
            Err(crate::error::AppError::validation("nope"))
        });

        assert!(result.is_err());
        assert_eq!(db.read::<Item>("items").len(), 1);
    }
}
