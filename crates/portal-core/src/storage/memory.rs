use std::collections::HashMap;
use std::sync::Mutex;

use super::{Storage, StorageError};

/// In-memory storage. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> Result<usize, StorageError> {
        self.with_items(|items| items.len())
    }

    pub fn is_empty(&self) -> Result<bool, StorageError> {
        self.with_items(|items| items.is_empty())
    }

    fn with_items<R>(
        &self,
        f: impl FnOnce(&mut HashMap<String, String>) -> R,
    ) -> Result<R, StorageError> {
        let mut items = self.items.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(f(&mut items))
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.with_items(|items| items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.with_items(|items| {
            items.insert(key.to_string(), value.to_string());
        })
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.with_items(|items| {
            items.remove(key);
        })
    }

    // Multi-key operations run under one lock acquisition.

    fn set_items(&self, entries: &[(&str, &str)]) -> Result<(), StorageError> {
        self.with_items(|items| {
            for (key, value) in entries {
                items.insert(key.to_string(), value.to_string());
            }
        })
    }

    fn remove_items(&self, keys: &[&str]) -> Result<(), StorageError> {
        self.with_items(|items| {
            for key in keys {
                items.remove(*key);
            }
        })
    }
}
