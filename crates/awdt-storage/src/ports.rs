//! # Outbound Ports (Driven Ports)
//!
//! Interface both roles require from the host for durable state.

use crate::errors::StorageError;

/// Path-addressed byte store.
///
/// Production: [`FileSystemStore`](crate::FileSystemStore)
/// Testing: [`InMemoryStore`](crate::InMemoryStore)
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` under `path/key`, replacing any previous object.
    fn put(&self, path: &str, key: &str, bytes: &[u8]) -> Result<(), StorageError>;

    /// Add `bytes` to the end of `path/key` in one step, creating it if
    /// missing. Concurrent appends never lose each other's bytes.
    fn append(&self, path: &str, key: &str, bytes: &[u8]) -> Result<(), StorageError>;

    /// Read `path/key`. A missing object is `StorageError::NotFound`.
    fn get(&self, path: &str, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Check whether `path/key` exists.
    fn exists(&self, path: &str, key: &str) -> Result<bool, StorageError>;

    /// Remove `path/key`. A missing object is `StorageError::NotFound`.
    fn delete(&self, path: &str, key: &str) -> Result<(), StorageError>;

    /// Keys under `path`, sorted, dot-files excluded.
    fn list(&self, path: &str) -> Result<Vec<String>, StorageError>;

    /// Read a UTF-8 object.
    fn get_string(&self, path: &str, key: &str) -> Result<String, StorageError> {
        let bytes = self.get(path, key)?;
        String::from_utf8(bytes).map_err(|e| StorageError::Corrupt {
            path: path.to_string(),
            key: key.to_string(),
            reason: e.to_string(),
        })
    }

    /// Read a version counter. A missing file reads as `0` and is created.
    fn read_version(&self, path: &str, key: &str) -> Result<u64, StorageError> {
        let text = match self.get_string(path, key) {
            Ok(text) => text,
            Err(e) if e.is_not_found() => {
                self.put(path, key, b"0")?;
                return Ok(0);
            }
            Err(e) => return Err(e),
        };
        text.trim().parse::<u64>().map_err(|e| StorageError::Corrupt {
            path: path.to_string(),
            key: key.to_string(),
            reason: e.to_string(),
        })
    }

    /// Write a version counter.
    fn write_version(&self, path: &str, key: &str, version: u64) -> Result<(), StorageError> {
        self.put(path, key, version.to_string().as_bytes())
    }
}

fn bad_segment(s: &str) -> bool {
    s.is_empty() || s == "." || s == ".."
}

pub(crate) fn check_path(path: &str) -> Result<(), StorageError> {
    if path.starts_with('/') || path.split('/').any(bad_segment) {
        return Err(StorageError::InvalidLocation(format!("path {path:?}")));
    }
    Ok(())
}

/// Reject locations that would leave the store root.
pub(crate) fn check_location(path: &str, key: &str) -> Result<(), StorageError> {
    check_path(path)?;
    if key.contains('/') || key.contains('\\') || bad_segment(key) {
        return Err(StorageError::InvalidLocation(format!("key {key:?}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_checks() {
        assert!(check_location("device_staging_area", "update").is_ok());
        assert!(check_location("a/b", "c").is_ok());
        assert!(check_location("/etc", "passwd").is_err());
        assert!(check_location("../up", "x").is_err());
        assert!(check_location("ok", "../x").is_err());
        assert!(check_location("ok", "").is_err());
    }
}
