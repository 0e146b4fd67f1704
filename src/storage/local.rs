//! File-backed local store
//!
//! All operations complete immediately. Mutations rewrite the whole file;
//! the map is tiny (a handful of keys), so there is no journaling.

use super::StorageError;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Key/value store, optionally persisted to a JSON file
#[derive(Debug, Clone, Default)]
pub struct LocalStore {
    /// Backing file; `None` keeps everything in memory
    path: Option<PathBuf>,
    items: BTreeMap<String, String>,
}

impl LocalStore {
    /// Store that never touches the filesystem
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open (or lazily create) a store backed by `path`
    ///
    /// A missing file is an empty store. A corrupt file is reported so the
    /// caller can decide whether to start over.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let items = match std::fs::read_to_string(&path) {
            Ok(contents) if contents.trim().is_empty() => BTreeMap::new(),
            Ok(contents) => serde_json::from_str(&contents).map_err(|source| StorageError::Corrupt {
                path: path.display().to_string(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => {
                return Err(StorageError::Io {
                    path: path.display().to_string(),
                    source,
                })
            }
        };
        Ok(Self { path: Some(path), items })
    }

    /// Open the default store in `dir`, falling back to memory on failure
    pub fn open_in_dir_or_memory(dir: &Path) -> Self {
        let path = dir.join("local_storage.json");
        match Self::open(&path) {
            Ok(store) => store,
            Err(e) => {
                tracing::warn!(error = %e, "local storage unavailable, using in-memory store");
                Self::in_memory()
            }
        }
    }

    /// Backing file, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get_item(&self, key: &str) -> Option<&str> {
        self.items.get(key).map(String::as_str)
    }

    pub fn set_item(&mut self, key: &str, value: impl Into<String>) {
        self.items.insert(key.to_string(), value.into());
        self.persist();
    }

    /// Remove a key. Removing a missing key is fine.
    pub fn remove_item(&mut self, key: &str) {
        if self.items.remove(key).is_some() {
            self.persist();
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Write the map to disk. Failures are logged; the in-memory value stays.
    fn persist(&self) {
        if let Err(e) = self.try_persist() {
            tracing::warn!(error = %e, "failed to persist local storage");
        }
    }

    fn try_persist(&self) -> Result<(), StorageError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let io_err = |source| StorageError::Io {
            path: path.display().to_string(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let contents = serde_json::to_string_pretty(&self.items).map_err(|source| StorageError::Corrupt {
            path: path.display().to_string(),
            source,
        })?;
        std::fs::write(path, contents).map_err(io_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_test_dir() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("local_storage.json");
        (dir, path)
    }

    #[test]
    fn test_set_and_reopen() {
        let (_dir, path) = setup_test_dir();

        let mut store = LocalStore::open(&path).unwrap();
        store.set_item("theme", "dark");
        store.set_item("token", "abc123");

        let reopened = LocalStore::open(&path).unwrap();
        assert_eq!(reopened.get_item("theme"), Some("dark"));
        assert_eq!(reopened.get_item("token"), Some("abc123"));
        assert_eq!(reopened.len(), 2);
    }

    #[test]
    fn test_remove_item_persists() {
        let (_dir, path) = setup_test_dir();

        let mut store = LocalStore::open(&path).unwrap();
        store.set_item("token", "abc123");
        store.remove_item("token");
        // Removing again is fine
        store.remove_item("token");

        let reopened = LocalStore::open(&path).unwrap();
        assert_eq!(reopened.get_item("token"), None);
    }

    #[test]
    fn test_missing_file_is_empty() {
        let (_dir, path) = setup_test_dir();
        let store = LocalStore::open(&path).unwrap();
        assert!(store.is_empty());
        assert!(!path.exists());
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let (_dir, path) = setup_test_dir();
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(LocalStore::open(&path), Err(StorageError::Corrupt { .. })));
    }

    #[test]
    fn test_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("deep/nested/local_storage.json");

        let mut store = LocalStore::open(&path).unwrap();
        store.set_item("theme", "light");
        assert!(path.exists());
    }

    #[test]
    fn test_in_memory_never_writes() {
        let mut store = LocalStore::in_memory();
        store.set_item("theme", "dark");
        assert_eq!(store.get_item("theme"), Some("dark"));
        assert!(store.path().is_none());
    }
}
