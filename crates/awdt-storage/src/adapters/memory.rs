//! In-memory object store for unit and integration tests.

use std::collections::BTreeMap;

use parking_lot::RwLock;

use crate::errors::StorageError;
use crate::ports::{check_location, check_path, ObjectStore};

/// Map-backed store. Paths exist implicitly.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    objects: RwLock<BTreeMap<(String, String), Vec<u8>>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects across all paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }
}

impl ObjectStore for InMemoryStore {
    fn put(&self, path: &str, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        check_location(path, key)?;
        self.objects
            .write()
            .insert((path.to_string(), key.to_string()), bytes.to_vec());
        Ok(())
    }

    fn append(&self, path: &str, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        check_location(path, key)?;
        self.objects
            .write()
            .entry((path.to_string(), key.to_string()))
            .or_default()
            .extend_from_slice(bytes);
        Ok(())
    }

    fn get(&self, path: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        check_location(path, key)?;
        self.objects
            .read()
            .get(&(path.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| StorageError::NotFound {
                path: path.to_string(),
                key: key.to_string(),
            })
    }

    fn exists(&self, path: &str, key: &str) -> Result<bool, StorageError> {
        check_location(path, key)?;
        Ok(self
            .objects
            .read()
            .contains_key(&(path.to_string(), key.to_string())))
    }

    fn delete(&self, path: &str, key: &str) -> Result<(), StorageError> {
        check_location(path, key)?;
        self.objects
            .write()
            .remove(&(path.to_string(), key.to_string()))
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound {
                path: path.to_string(),
                key: key.to_string(),
            })
    }

    fn list(&self, path: &str) -> Result<Vec<String>, StorageError> {
        check_path(path)?;
        // BTreeMap iteration keeps keys sorted.
        Ok(self
            .objects
            .read()
            .keys()
            .filter(|(p, k)| p == path && !k.starts_with('.'))
            .map(|(_, k)| k.clone())
            .collect())
    }
}
