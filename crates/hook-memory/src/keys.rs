//! Encryption key and memory root resolution.
//!
//! Both follow the same shape: explicit environment override first, then a
//! home-relative default.

use anyhow::{Context, Result, anyhow};
use camino::Utf8PathBuf;
use std::fs;
use std::path::{Path, PathBuf};

const KEY_ENV: &str = "MEMORYD_KEY";
const KEY_FILE_ENV: &str = "MEMORYD_KEY_FILE";
const ROOT_ENV: &str = "MEMORYD_ROOT";

/// Resolve the store encryption passphrase.
///
/// Priority:
/// 1. MEMORYD_KEY environment variable (if set and non-blank)
/// 2. Key file (MEMORYD_KEY_FILE, default ~/.config/memoryd/key)
///
/// Absence is a normal condition and returns `Ok(None)`; the caller
/// decides whether to skip quietly or complain.
pub fn encryption_key() -> Result<Option<String>> {
    if let Ok(key) = std::env::var(KEY_ENV) {
        let key = key.trim();
        if !key.is_empty() {
            return Ok(Some(key.to_string()));
        }
    }
    read_key_file(&key_file_path())
}

/// Resolve the memory storage root.
///
/// Priority:
/// 1. MEMORYD_ROOT environment variable (if set)
/// 2. ~/.local/share/memoryd
pub fn memory_root() -> Result<Utf8PathBuf> {
    if let Ok(custom) = std::env::var(ROOT_ENV) {
        return Ok(Utf8PathBuf::from(custom));
    }

    let data_dir = dirs::data_local_dir().context("cannot resolve local data directory")?;
    Utf8PathBuf::from_path_buf(data_dir.join("memoryd"))
        .map_err(|path| anyhow!("memory root is not UTF-8: {}", path.display()))
}

fn key_file_path() -> PathBuf {
    if let Ok(custom) = std::env::var(KEY_FILE_ENV) {
        return PathBuf::from(custom);
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("memoryd")
        .join("key")
}

/// Read and trim a key file; missing or blank files count as absent.
fn read_key_file(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }

    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read key file: {}", path.display()))?;
    let key = raw.trim();
    if key.is_empty() {
        Ok(None)
    } else {
        Ok(Some(key.to_string()))
    }
}
