//! State file management for hooks.

use anyhow::{Context, Result};
use serde::{Serialize, de::DeserializeOwned};
use std::fs;
use std::path::PathBuf;

/// Manager for hook state files in /tmp.
///
/// State files coordinate independent hook invocations; each file is a
/// small JSON document named `<prefix>-<key>.json`.
#[derive(Debug, Clone)]
pub struct StateManager {
    /// Base directory for state files
    base_dir: PathBuf,
    /// Prefix for state file names
    prefix: String,
}

impl StateManager {
    /// Create a new state manager with the given prefix.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            base_dir: PathBuf::from("/tmp"),
            prefix: prefix.into(),
        }
    }

    /// Get the path for a state file with the given key.
    pub fn state_path(&self, key: &str) -> PathBuf {
        self.base_dir.join(format!("{}-{}.json", self.prefix, key))
    }

    /// Load state from file.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let path = self.state_path(key);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read state file: {}", path.display()))?;

        let state: T = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse state file: {}", path.display()))?;

        Ok(Some(state))
    }

    /// Save state to file.
    pub fn save<T: Serialize>(&self, key: &str, state: &T) -> Result<()> {
        let path = self.state_path(key);
        let content = serde_json::to_string_pretty(state)?;
        fs::write(&path, content)
            .with_context(|| format!("Failed to write state file: {}", path.display()))?;
        Ok(())
    }

    /// Delete state file.
    pub fn delete(&self, key: &str) -> Result<()> {
        let path = self.state_path(key);
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to delete state file: {}", path.display()))?;
        }
        Ok(())
    }

    /// Check if state file exists.
    pub fn exists(&self, key: &str) -> bool {
        self.state_path(key).exists()
    }
}
