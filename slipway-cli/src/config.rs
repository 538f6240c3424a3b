use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use slipway_core::{GeneratorSettings, Language};
use std::fs;
use std::path::{Path, PathBuf};

use crate::state::{ensure_slipway_home, slipway_home};

/// Supplies the generator API key when the config file doesn't.
pub const API_KEY_ENV: &str = "SLIPWAY_API_KEY";

const REDACTED: &str = "********";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub generator: GeneratorSection,
    #[serde(default)]
    pub output: OutputSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorSection {
    pub provider: String,
    pub model: String,
    pub base_url: String,
    pub max_tokens: u32,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    pub pretty: bool,
    pub language: Language,
}

impl Default for GeneratorSection {
    fn default() -> Self {
        Self {
            provider: "anthropic".to_string(),
            model: "claude-3-5-sonnet-latest".to_string(),
            base_url: "https://api.anthropic.com".to_string(),
            max_tokens: 1500,
            temperature: 0.3,
            api_key: None,
        }
    }
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            pretty: true,
            language: Language::En,
        }
    }
}

impl Config {
    /// Generator settings with the key resolved. `env_key` wins over the file.
    pub fn generator_settings(&self, env_key: Option<String>) -> GeneratorSettings {
        let api_key = env_key
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.generator.api_key.clone());
        GeneratorSettings {
            model: self.generator.model.clone(),
            base_url: self.generator.base_url.clone(),
            max_tokens: self.generator.max_tokens,
            temperature: self.generator.temperature,
            api_key,
        }
    }

    /// Copy safe to print.
    pub fn redacted(&self) -> Config {
        let mut cfg = self.clone();
        if cfg.generator.api_key.is_some() {
            cfg.generator.api_key = Some(REDACTED.to_string());
        }
        cfg
    }
}

/// Output settings from a config load, or the defaults if it failed.
///
/// Pure computations only format output, so an unreadable config file (or
/// an unset `HOME`) is logged rather than fatal.
pub fn output_or_default(loaded: Result<Config>) -> OutputSection {
    match loaded {
        Ok(cfg) => cfg.output,
        Err(e) => {
            tracing::warn!(error = %format!("{e:#}"), "ignoring unreadable config; using output defaults");
            OutputSection::default()
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(slipway_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    load_config_from(&config_path()?)
}

pub fn load_config_from(p: &Path) -> Result<Config> {
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_config_to(cfg: &Config, p: &Path) -> Result<()> {
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

/// Write the defaults unless a config already exists. Returns the path.
pub fn init_config() -> Result<PathBuf> {
    let p = ensure_slipway_home()?.join("config.toml");
    if p.exists() {
        eprintln!("Config already exists: {}", p.display());
        return Ok(p);
    }
    save_config_to(&Config::default(), &p)?;
    eprintln!("Wrote {}", p.display());
    Ok(p)
}
