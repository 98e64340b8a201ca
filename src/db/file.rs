// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! File-backed store: one `<key>.json` per collection.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{Store, StoreError};

/// Store that persists each collection as a JSON file in a directory.
///
/// Writes go to a temporary file that is renamed over the target, so a
/// collection on disk is always either the old or the new version.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) the data directory.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        tracing::info!(path = %root.display(), "Opened file store");
        Ok(Self { root })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(format!("{key}.json")))
    }
}

impl Store for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        let tmp = self.root.join(format!(".{key}.json.tmp"));
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("cityride-store-{}", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_file_store_roundtrip() {
        let dir = scratch_dir();
        let store = FileStore::open(&dir).unwrap();

        assert_eq!(store.get("reservations").unwrap(), None);
        store.set("reservations", "[1,2]".to_string()).unwrap();
        assert_eq!(store.get("reservations").unwrap().as_deref(), Some("[1,2]"));

        // A second handle on the same directory sees the data
        let reopened = FileStore::open(&dir).unwrap();
        assert_eq!(
            reopened.get("reservations").unwrap().as_deref(),
            Some("[1,2]")
        );

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_file_store_rejects_path_keys() {
        let dir = scratch_dir();
        let store = FileStore::open(&dir).unwrap();

        assert!(matches!(
            store.set("../escape", "[]".to_string()),
            Err(StoreError::InvalidKey(_))
        ));

        fs::remove_dir_all(dir).ok();
    }
}
