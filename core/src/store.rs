//! Persistent boolean flags, grouped by namespace.
//!
//! `FlagStore` is the narrow interface the TLS gate persists through.
//! `MemoryFlagStore` backs tests and ephemeral processes; `FileFlagStore`
//! keeps the flags in a JSON file so they survive a restart.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::StoreError;

type Namespaces = BTreeMap<String, BTreeMap<String, bool>>;

/// Key-value storage for boolean flags.
pub trait FlagStore: Send + Sync {
    /// Read a flag, `None` when it was never written.
    fn get_bool(&self, namespace: &str, key: &str) -> Result<Option<bool>, StoreError>;

    fn set_bool(&self, namespace: &str, key: &str, value: bool) -> Result<(), StoreError>;
}

/// Flags held in process memory only.
#[derive(Debug, Default)]
pub struct MemoryFlagStore {
    flags: Mutex<Namespaces>,
}

impl MemoryFlagStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FlagStore for MemoryFlagStore {
    fn get_bool(&self, namespace: &str, key: &str) -> Result<Option<bool>, StoreError> {
        let flags = self.flags.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(flags.get(namespace).and_then(|ns| ns.get(key)).copied())
    }

    fn set_bool(&self, namespace: &str, key: &str, value: bool) -> Result<(), StoreError> {
        let mut flags = self.flags.lock().map_err(|_| StoreError::Poisoned)?;
        flags
            .entry(namespace.to_string())
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }
}

/// Flags persisted as a JSON document on disk.
///
/// Every read goes to the file, so flags written by another process are
/// observed. A missing file reads as "nothing written yet".
#[derive(Debug)]
pub struct FileFlagStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileFlagStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Namespaces, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(Namespaces::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Namespaces::new()),
            Err(e) => Err(e.into()),
        }
    }
}

impl FlagStore for FileFlagStore {
    fn get_bool(&self, namespace: &str, key: &str) -> Result<Option<bool>, StoreError> {
        let flags = self.load()?;
        Ok(flags.get(namespace).and_then(|ns| ns.get(key)).copied())
    }

    fn set_bool(&self, namespace: &str, key: &str, value: bool) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut flags = self.load()?;
        flags
            .entry(namespace.to_string())
            .or_default()
            .insert(key.to_string(), value);
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&flags)?)?;
        Ok(())
    }
}
