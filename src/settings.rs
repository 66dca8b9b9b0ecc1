//! Typed key-value persistence for session state
//!
//! A small string/boolean store with a file-backed implementation. Missing
//! keys read as defaults (empty string, `false`), so a never-saved store
//! reconstructs an unconnected, token-less session.

use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to access settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse settings file: {0}")]
    Format(#[from] serde_json::Error),
}

/// String/boolean key-value store backing durable session state
pub trait SettingsStore {
    fn get_string(&self, key: &str) -> Result<String, SettingsError>;
    fn set_string(&mut self, key: &str, value: &str) -> Result<(), SettingsError>;
    fn get_bool(&self, key: &str) -> Result<bool, SettingsError>;
    fn set_bool(&mut self, key: &str, value: bool) -> Result<(), SettingsError>;
}

/// JSON-file-backed settings
///
/// Every set rewrites the whole file; the store holds a handful of short
/// values and stays trivially consistent on disk.
pub struct FileSettings {
    path: PathBuf,
    values: BTreeMap<String, Value>,
}

impl FileSettings {
    /// Open the store at `path`, creating an empty one if the file does
    /// not exist yet
    pub fn open(path: PathBuf) -> Result<Self, SettingsError> {
        let values = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, values })
    }

    fn persist(&self) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&self.values)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

impl SettingsStore for FileSettings {
    fn get_string(&self, key: &str) -> Result<String, SettingsError> {
        Ok(match self.values.get(key) {
            Some(Value::String(s)) => s.clone(),
            _ => String::new(),
        })
    }

    fn set_string(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        self.values
            .insert(key.to_string(), Value::String(value.to_string()));
        self.persist()
    }

    fn get_bool(&self, key: &str) -> Result<bool, SettingsError> {
        Ok(matches!(self.values.get(key), Some(Value::Bool(true))))
    }

    fn set_bool(&mut self, key: &str, value: bool) -> Result<(), SettingsError> {
        self.values.insert(key.to_string(), Value::Bool(value));
        self.persist()
    }
}

/// Ephemeral in-memory settings; state saved here dies with the process
#[derive(Debug, Default)]
pub struct MemorySettings {
    values: BTreeMap<String, Value>,
}

impl SettingsStore for MemorySettings {
    fn get_string(&self, key: &str) -> Result<String, SettingsError> {
        Ok(match self.values.get(key) {
            Some(Value::String(s)) => s.clone(),
            _ => String::new(),
        })
    }

    fn set_string(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        self.values
            .insert(key.to_string(), Value::String(value.to_string()));
        Ok(())
    }

    fn get_bool(&self, key: &str) -> Result<bool, SettingsError> {
        Ok(matches!(self.values.get(key), Some(Value::Bool(true))))
    }

    fn set_bool(&mut self, key: &str, value: bool) -> Result<(), SettingsError> {
        self.values.insert(key.to_string(), Value::Bool(value));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_fresh_store_reads_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSettings::open(temp_dir.path().join("session.json")).unwrap();

        assert_eq!(store.get_string("csrfhw").unwrap(), "");
        assert!(!store.get_bool("connected").unwrap());
    }

    #[test]
    fn test_set_then_get() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = FileSettings::open(temp_dir.path().join("session.json")).unwrap();

        store.set_string("csrfhw", "token").unwrap();
        store.set_bool("connected", true).unwrap();

        assert_eq!(store.get_string("csrfhw").unwrap(), "token");
        assert!(store.get_bool("connected").unwrap());
    }

    #[test]
    fn test_values_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("session.json");

        let mut store = FileSettings::open(path.clone()).unwrap();
        store.set_string("login-url", "https://example.net/login").unwrap();
        store.set_bool("connected", true).unwrap();
        drop(store);

        let reopened = FileSettings::open(path).unwrap();
        assert_eq!(
            reopened.get_string("login-url").unwrap(),
            "https://example.net/login"
        );
        assert!(reopened.get_bool("connected").unwrap());
    }

    #[test]
    fn test_parent_directory_is_created() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/dir/session.json");

        let mut store = FileSettings::open(path.clone()).unwrap();
        store.set_string("csrfhw", "token").unwrap();

        assert!(path.exists());
    }

    #[test]
    fn test_memory_settings_round_trip() {
        let mut store = MemorySettings::default();
        assert_eq!(store.get_string("username").unwrap(), "");

        store.set_string("username", "bob@nauta.com.cu").unwrap();
        store.set_bool("connected", false).unwrap();

        assert_eq!(store.get_string("username").unwrap(), "bob@nauta.com.cu");
        assert!(!store.get_bool("connected").unwrap());
    }
}
