use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// Overrides the `~/.slipway` directory.
pub const HOME_ENV: &str = "SLIPWAY_HOME";

pub fn slipway_home() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").context("HOME is not set (or set SLIPWAY_HOME)")?;
    Ok(PathBuf::from(home).join(".slipway"))
}

pub fn ensure_slipway_home() -> Result<PathBuf> {
    let dir = slipway_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}
