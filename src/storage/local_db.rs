//! Local JSON key-value store for prototype records
//!
//! The whole store is a single JSON object on disk. Every save reads the
//! file, replaces one key and writes it back; callers serialize access.

use crate::Result;
use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// File-backed record store
#[derive(Debug, Clone)]
pub struct LocalDb {
    path: PathBuf,
}

impl LocalDb {
    /// Open the store, creating parent directories and an empty `{}` file
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        if !path.exists() {
            fs::write(&path, "{}")?;
        }

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<Map<String, Value>> {
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let data: Map<String, Value> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", self.path.display()))?;
        Ok(data)
    }

    /// Store `record` under `key`, replacing any previous value
    pub fn save<T: Serialize>(&self, key: &str, record: &T) -> Result<()> {
        let mut data = self.read_all()?;
        data.insert(key.to_string(), serde_json::to_value(record)?);

        let content = serde_json::to_string_pretty(&data)?;
        fs::write(&self.path, content)?;
        Ok(())
    }

    /// Raw record stored under `key`
    pub fn load(&self, key: &str) -> Result<Option<Value>> {
        let mut data = self.read_all()?;
        Ok(data.remove(key))
    }

    /// Record under `key` decoded into `T`
    pub fn load_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.load(key)? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }
}
