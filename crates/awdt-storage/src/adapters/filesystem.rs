//! # File-Backed Store
//!
//! Each storage path is a directory under the base dir and each key a file.
//!
//! ## Write Protocol
//!
//! 1. Take an exclusive `fs2` lock on `<dir>/.lock`
//! 2. Write `<dir>/.<key>.tmp` and sync it
//! 3. Rename over `<dir>/<key>`
//!
//! Readers therefore see either the old or the new object, never a torn one.
//! Appends skip the temp file and write in place under the same lock.
//! Lock and temp files start with a dot and never show up in `list`.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::debug;

use crate::errors::StorageError;
use crate::ports::{check_location, check_path, ObjectStore};

const LOCK_FILE: &str = ".lock";

/// Object store rooted at a directory.
#[derive(Debug, Clone)]
pub struct FileSystemStore {
    base: PathBuf,
}

impl FileSystemStore {
    /// Open a store at `base`, creating the directory if needed.
    pub fn open(base: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let base = base.into();
        fs::create_dir_all(&base).map_err(|e| io_error(&base, e))?;
        Ok(Self { base })
    }

    /// Root directory.
    #[must_use]
    pub fn base(&self) -> &Path {
        &self.base
    }

    fn dir(&self, path: &str) -> PathBuf {
        self.base.join(path)
    }

    fn ensure_dir(&self, path: &str) -> Result<PathBuf, StorageError> {
        let dir = self.dir(path);
        fs::create_dir_all(&dir).map_err(|e| io_error(&dir, e))?;
        Ok(dir)
    }

    fn lock_dir(dir: &Path) -> Result<File, StorageError> {
        let lock_path = dir.join(LOCK_FILE);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|e| io_error(&lock_path, e))?;
        file.lock_exclusive().map_err(|e| io_error(&lock_path, e))?;
        Ok(file)
    }
}

impl ObjectStore for FileSystemStore {
    fn put(&self, path: &str, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        check_location(path, key)?;
        let dir = self.ensure_dir(path)?;
        let lock = Self::lock_dir(&dir)?;

        let target = dir.join(key);
        let tmp = dir.join(format!(".{key}.tmp"));
        let result = (|| -> io::Result<()> {
            let mut file = File::create(&tmp)?;
            file.write_all(bytes)?;
            file.sync_all()?;
            fs::rename(&tmp, &target)
        })();

        let _ = FileExt::unlock(&lock);
        result.map_err(|e| io_error(&target, e))?;

        debug!(path, key, len = bytes.len(), "object stored");
        Ok(())
    }

    fn append(&self, path: &str, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        check_location(path, key)?;
        let dir = self.ensure_dir(path)?;
        let lock = Self::lock_dir(&dir)?;

        let target = dir.join(key);
        let result = (|| -> io::Result<()> {
            let mut file = OpenOptions::new().create(true).append(true).open(&target)?;
            file.write_all(bytes)?;
            file.sync_data()
        })();

        let _ = FileExt::unlock(&lock);
        result.map_err(|e| io_error(&target, e))?;

        debug!(path, key, len = bytes.len(), "object appended");
        Ok(())
    }

    fn get(&self, path: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        check_location(path, key)?;
        let target = self.dir(path).join(key);
        fs::read(&target).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => not_found(path, key),
            _ => io_error(&target, e),
        })
    }

    fn exists(&self, path: &str, key: &str) -> Result<bool, StorageError> {
        check_location(path, key)?;
        let target = self.dir(path).join(key);
        match fs::metadata(&target) {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(io_error(&target, e)),
        }
    }

    fn delete(&self, path: &str, key: &str) -> Result<(), StorageError> {
        check_location(path, key)?;
        let dir = self.ensure_dir(path)?;
        let lock = Self::lock_dir(&dir)?;
        let target = dir.join(key);
        let result = fs::remove_file(&target);
        let _ = FileExt::unlock(&lock);
        result.map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => not_found(path, key),
            _ => io_error(&target, e),
        })?;
        debug!(path, key, "object deleted");
        Ok(())
    }

    fn list(&self, path: &str) -> Result<Vec<String>, StorageError> {
        check_path(path)?;
        let dir = self.ensure_dir(path)?;
        let entries = fs::read_dir(&dir).map_err(|e| io_error(&dir, e))?;

        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| io_error(&dir, e))?;
            let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
            let name = entry.file_name().to_string_lossy().into_owned();
            if is_file && !name.starts_with('.') {
                keys.push(name);
            }
        }
        keys.sort();
        Ok(keys)
    }
}

fn not_found(path: &str, key: &str) -> StorageError {
    StorageError::NotFound {
        path: path.to_string(),
        key: key.to_string(),
    }
}

fn io_error(location: &Path, source: io::Error) -> StorageError {
    StorageError::Io {
        location: location.display().to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{DEVICE_SECURE_STORAGE, STAGING_AREA, VERSION_FILE};

    fn store() -> (tempfile::TempDir, FileSystemStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSystemStore::open(dir.path().join("memory")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_put_get_creates_directories() {
        let (_dir, store) = store();
        store.put(STAGING_AREA, "update", b"payload").unwrap();
        assert_eq!(store.get(STAGING_AREA, "update").unwrap(), b"payload");
        assert!(store.base().join(STAGING_AREA).is_dir());
    }

    #[test]
    fn test_concurrent_appends_keep_every_line() {
        let (_dir, store) = store();
        std::thread::scope(|scope| {
            for writer in 0..8 {
                let store = &store;
                scope.spawn(move || {
                    for i in 0..25 {
                        let line = format!("{writer};{i}\n");
                        store.append("server_data_storage", "measured_data.txt", line.as_bytes()).unwrap();
                    }
                });
            }
        });
        let text = store.get_string("server_data_storage", "measured_data.txt").unwrap();
        assert_eq!(text.lines().count(), 200);
        assert!(!store.list("server_data_storage").unwrap().iter().any(|k| k.starts_with('.')));
    }

    #[test]
    fn test_missing_object_is_not_found() {
        let (_dir, store) = store();
        let err = store.get(STAGING_AREA, "bootticket").unwrap_err();
        assert!(err.is_not_found());
        assert!(!store.exists(STAGING_AREA, "bootticket").unwrap());
        assert!(store.delete(STAGING_AREA, "bootticket").unwrap_err().is_not_found());
    }

    #[test]
    fn test_list_skips_dot_files() {
        let (_dir, store) = store();
        store.put(STAGING_AREA, "update", b"u").unwrap();
        store.put(STAGING_AREA, "bootticket", b"b").unwrap();
        std::fs::write(store.base().join(STAGING_AREA).join(".DS_Store"), b"x").unwrap();

        assert_eq!(store.list(STAGING_AREA).unwrap(), vec!["bootticket", "update"]);
    }

    #[test]
    fn test_list_of_missing_path_is_empty() {
        let (_dir, store) = store();
        assert!(store.list(STAGING_AREA).unwrap().is_empty());
    }

    #[test]
    fn test_read_version_sentinel_creates_file() {
        let (_dir, store) = store();
        assert_eq!(store.read_version(DEVICE_SECURE_STORAGE, VERSION_FILE).unwrap(), 0);
        assert_eq!(store.get(DEVICE_SECURE_STORAGE, VERSION_FILE).unwrap(), b"0");

        store.write_version(DEVICE_SECURE_STORAGE, VERSION_FILE, 3).unwrap();
        assert_eq!(store.read_version(DEVICE_SECURE_STORAGE, VERSION_FILE).unwrap(), 3);
    }

    #[test]
    fn test_corrupt_version_is_error() {
        let (_dir, store) = store();
        store.put(DEVICE_SECURE_STORAGE, VERSION_FILE, b"seven").unwrap();
        let err = store.read_version(DEVICE_SECURE_STORAGE, VERSION_FILE).unwrap_err();
        assert!(matches!(err, StorageError::Corrupt { .. }));
    }

    #[test]
    fn test_overwrite_replaces_object() {
        let (_dir, store) = store();
        store.put(STAGING_AREA, "update", b"old").unwrap();
        store.put(STAGING_AREA, "update", b"new").unwrap();
        assert_eq!(store.get(STAGING_AREA, "update").unwrap(), b"new");
        store.delete(STAGING_AREA, "update").unwrap();
        assert!(!store.exists(STAGING_AREA, "update").unwrap());
    }
}
