//! Application configuration management.
//!
//! This module handles loading and saving the client configuration: the
//! backend base URL, which durable storage backend holds the session, and
//! the last email used to log in.
//!
//! Configuration is stored at `~/.config/portal/config.json`; the file
//! storage backend lives at `~/.local/share/portal/storage.json` (or the
//! platform equivalents).

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::storage::{FileStorage, KeyringStorage, Storage};

/// Application name used for config/data directory paths
pub const APP_NAME: &str = "portal";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// File backend name
const STORAGE_FILE: &str = "storage.json";

/// Backend used when no base URL is configured
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    File,
    Keyring,
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::File => write!(f, "file"),
            StorageBackend::Keyring => write!(f, "keyring"),
        }
    }
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(StorageBackend::File),
            "keyring" | "keychain" => Ok(StorageBackend::Keyring),
            other => Err(anyhow::anyhow!(
                "Unknown storage backend '{}' (expected 'file' or 'keyring')",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub base_url: Option<String>,
    pub storage: StorageBackend,
    pub last_email: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Apply command-line/environment overrides on top of the file values.
    /// An override that is `None` leaves the file value in place.
    pub fn with_overrides(
        mut self,
        base_url: Option<String>,
        storage: Option<StorageBackend>,
    ) -> Self {
        if let Some(base_url) = base_url {
            self.base_url = Some(base_url);
        }
        if let Some(storage) = storage {
            self.storage = storage;
        }
        self
    }

    /// Configured base URL, or the local development backend
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn storage_path(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME).join(STORAGE_FILE))
    }

    /// Open the configured durable storage backend
    pub fn open_storage(&self) -> Result<Arc<dyn Storage>> {
        match self.storage {
            StorageBackend::File => Ok(Arc::new(FileStorage::new(self.storage_path()?))),
            StorageBackend::Keyring => Ok(Arc::new(KeyringStorage::default())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.base_url(), DEFAULT_BASE_URL);
        assert_eq!(config.storage, StorageBackend::File);
    }

    #[test]
    fn test_blank_base_url_falls_back() {
        let config = Config {
            base_url: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(config.base_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn test_missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("portal").join("config.json");
        let config = Config {
            base_url: Some("https://portal.example.org".to_string()),
            storage: StorageBackend::Keyring,
            last_email: Some("ana@example.org".to_string()),
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert!(std::fs::read_to_string(&path).unwrap().contains(r#""storage": "keyring""#));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"last_email": "ana@example.org"}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.storage, StorageBackend::File);
        assert_eq!(config.last_email.as_deref(), Some("ana@example.org"));
    }

    fn file_config() -> Config {
        Config {
            base_url: Some("https://file.example.org".to_string()),
            storage: StorageBackend::Keyring,
            last_email: Some("ana@example.org".to_string()),
        }
    }

    #[test]
    fn test_overrides_win_over_file_values() {
        let config = file_config().with_overrides(
            Some("https://flag.example.org".to_string()),
            Some(StorageBackend::File),
        );
        assert_eq!(config.base_url(), "https://flag.example.org");
        assert_eq!(config.storage, StorageBackend::File);
        assert_eq!(config.last_email.as_deref(), Some("ana@example.org"));
    }

    #[test]
    fn test_absent_overrides_keep_file_values() {
        let config = file_config().with_overrides(None, None);
        assert_eq!(config, file_config());

        let config = Config::default().with_overrides(None, Some(StorageBackend::Keyring));
        assert_eq!(config.base_url(), DEFAULT_BASE_URL);
        assert_eq!(config.storage, StorageBackend::Keyring);
    }

    #[test]
    fn test_storage_backend_from_str() {
        assert_eq!("file".parse::<StorageBackend>().unwrap(), StorageBackend::File);
        assert_eq!("Keyring".parse::<StorageBackend>().unwrap(), StorageBackend::Keyring);
        assert!("redis".parse::<StorageBackend>().is_err());
        assert_eq!(StorageBackend::Keyring.to_string(), "keyring");
    }
}
