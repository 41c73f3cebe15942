//! Durable key-value storage backing the session.
//!
//! This module provides:
//! - `Storage`: the string-keyed store trait the session and the request
//!   augmenter are built against
//! - `FileStorage`: a JSON object file on disk (the default backend)
//! - `KeyringStorage`: one OS keychain entry per key
//! - `MemoryStorage`: an in-process map for tests and ephemeral sessions
//!
//! Stores are shared process-wide through `Arc<dyn Storage>`. Across
//! processes there is no coordination; the last writer wins.

pub mod error;
pub mod file;
pub mod keychain;
pub mod memory;

pub use error::StorageError;
pub use file::FileStorage;
pub use keychain::KeyringStorage;
pub use memory::MemoryStorage;

/// Synchronous string-keyed storage, modeled on the browser's `localStorage`.
pub trait Storage: Send + Sync {
    /// Read a value. A missing key is `Ok(None)`, not an error.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a value. Removing a missing key succeeds.
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;

    /// Write several values in one logical step.
    ///
    /// Entries are applied in order. Backends that can commit all of them at
    /// once override this.
    fn set_items(&self, items: &[(&str, &str)]) -> Result<(), StorageError> {
        for (key, value) in items {
            self.set_item(key, value)?;
        }
        Ok(())
    }

    /// Remove several values in one logical step.
    fn remove_items(&self, keys: &[&str]) -> Result<(), StorageError> {
        for key in keys {
            self.remove_item(key)?;
        }
        Ok(())
    }
}
