//! Settings files for vmon
//!
//! JSON files live in `~/.config/vmon/` unless `VMON_CONFIG_DIR` points
//! somewhere else. [`init`] creates the directory; the binary calls it once
//! before loading anything.

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "vmon";

/// Overrides the settings directory when set and non-empty
pub const DIR_ENV: &str = "VMON_CONFIG_DIR";

/// Create the settings directory and return its path
pub fn init() -> Result<PathBuf> {
    ensure_config_dir()
}

/// `$VMON_CONFIG_DIR`, or `vmon/` under the platform config root
pub fn config_dir() -> Option<PathBuf> {
    resolve_dir(std::env::var_os(DIR_ENV), dirs::config_dir())
}

fn resolve_dir(overridden: Option<OsString>, platform: Option<PathBuf>) -> Option<PathBuf> {
    match overridden {
        Some(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
        _ => platform.map(|root| root.join(APP_DIR)),
    }
}

pub fn config_path(filename: &str) -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(filename))
}

/// Read `filename` from the settings directory
pub fn load_json<T: DeserializeOwned>(filename: &str) -> Result<T> {
    let path = config_path(filename).context("Could not determine config directory")?;
    load_json_file(&path)
}

pub fn load_json_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

pub fn config_exists(filename: &str) -> bool {
    config_path(filename).is_some_and(|path| path.is_file())
}

pub fn ensure_config_dir() -> Result<PathBuf> {
    let dir = config_dir().context("Could not determine config directory")?;
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;
    Ok(dir)
}

/// Write `filename` into the settings directory, creating it if needed
pub fn save_json<T: Serialize>(filename: &str, value: &T) -> Result<()> {
    let dir = ensure_config_dir()?;
    save_json_file(&dir.join(filename), value)
}

/// Write pretty-printed JSON to `path`
pub fn save_json_file<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(value)?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;
    Ok(())
}
