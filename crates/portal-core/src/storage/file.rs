use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use super::{Storage, StorageError};

#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;

type Items = BTreeMap<String, String>;

/// Storage persisted as a single JSON object file.
///
/// Every write rewrites the whole file through a sibling temp file and a
/// rename, so a reader sees either the previous map or the new one. The
/// file holds bearer tokens and is restricted to the owner on Unix.
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Items, StorageError> {
        if !self.path.exists() {
            return Ok(Items::new());
        }
        let contents = std::fs::read_to_string(&self.path)
            .map_err(|e| StorageError::io(&self.path, e))?;
        if contents.trim().is_empty() {
            return Ok(Items::new());
        }
        serde_json::from_str(&contents).map_err(|source| StorageError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn write(&self, items: &Items) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
            }
        }

        let contents = serde_json::to_string_pretty(items)?;
        let tmp = self.path.with_extension("json.tmp");
        write_private(&tmp, contents.as_bytes()).map_err(|e| StorageError::io(&tmp, e))?;

        std::fs::rename(&tmp, &self.path).map_err(|e| StorageError::io(&self.path, e))?;
        debug!(path = %self.path.display(), keys = items.len(), "Storage file written");
        Ok(())
    }

    /// Read-modify-write under the in-process lock. Skips the write when
    /// `f` reports no change.
    fn update(&self, f: impl FnOnce(&mut Items) -> bool) -> Result<(), StorageError> {
        let _guard = self.lock.lock().map_err(|_| StorageError::Poisoned)?;
        let mut items = self.read()?;
        if f(&mut items) {
            self.write(&items)?;
        }
        Ok(())
    }
}

/// Create `path` owner-only from the start, so the tokens are never
/// readable by others, not even between create and chmod. A leftover temp
/// file from an interrupted write is replaced, not reused.
#[cfg(unix)]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    use std::io::Write;

    match std::fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(contents)?;
    file.sync_all()
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    std::fs::write(path, contents)
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(self.read()?.remove(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.set_items(&[(key, value)])
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.remove_items(&[key])
    }

    fn set_items(&self, entries: &[(&str, &str)]) -> Result<(), StorageError> {
        self.update(|items| {
            for (key, value) in entries {
                items.insert(key.to_string(), value.to_string());
            }
            true
        })
    }

    fn remove_items(&self, keys: &[&str]) -> Result<(), StorageError> {
        self.update(|items| {
            let before = items.len();
            for key in keys {
                items.remove(*key);
            }
            items.len() != before
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage_in(dir: &tempfile::TempDir) -> FileStorage {
        FileStorage::new(dir.path().join("nested").join("storage.json"))
    }

    #[test]
    fn test_missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage_in(&dir);
        assert_eq!(storage.get_item("access").unwrap(), None);
        assert!(!storage.path().exists());
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        storage_in(&dir)
            .set_items(&[("access", "a"), ("refresh", "r")])
            .unwrap();

        let reopened = storage_in(&dir);
        assert_eq!(reopened.get_item("access").unwrap().as_deref(), Some("a"));
        assert_eq!(reopened.get_item("refresh").unwrap().as_deref(), Some("r"));
    }

    #[test]
    fn test_remove_items_in_one_write() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage_in(&dir);
        storage
            .set_items(&[("access", "a"), ("refresh", "r"), ("theme", "dark")])
            .unwrap();

        storage.remove_items(&["access", "refresh", "user"]).unwrap();

        let contents = std::fs::read_to_string(storage.path()).unwrap();
        let items: Items = serde_json::from_str(&contents).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items.get("theme").map(String::as_str), Some("dark"));
    }

    #[test]
    fn test_remove_on_missing_file_does_not_create_it() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage_in(&dir);
        storage.remove_items(&["access", "refresh", "user"]).unwrap();
        assert!(!storage.path().exists());
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();

        let storage = FileStorage::new(&path);
        let err = storage.get_item("access").unwrap_err();
        assert!(matches!(err, StorageError::Corrupt { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let storage = storage_in(&dir);
        storage.set_item("access", "a").unwrap();

        let mode = std::fs::metadata(storage.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn test_leftover_temp_file_is_not_reused() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let storage = storage_in(&dir);
        let tmp = storage.path().with_extension("json.tmp");
        std::fs::create_dir_all(tmp.parent().unwrap()).unwrap();
        std::fs::write(&tmp, "stale").unwrap();
        std::fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o644)).unwrap();

        storage.set_item("access", "a").unwrap();

        assert!(!tmp.exists());
        let mode = std::fs::metadata(storage.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(storage.get_item("access").unwrap().as_deref(), Some("a"));
    }
}
