// Configuration management module
// Handles the analysis service address, request timeout and default language

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Environment variable overriding `base_url`
pub const BASE_URL_ENV_VAR: &str = "COGNITIA_BASE_URL";
/// Environment variable overriding `timeout_secs`
pub const TIMEOUT_ENV_VAR: &str = "COGNITIA_TIMEOUT_SECS";

/// Keys accepted by `cognitia config set`
pub const CONFIG_KEYS: &[&str] = &["base_url", "timeout_secs", "default_language"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub timeout_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_language: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            default_language: None,
        }
    }
}

impl Config {
    /// Load from the config file (defaults when absent), then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_file_path()?)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;
        Ok(config)
    }

    /// Apply `COGNITIA_*` overrides through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(BASE_URL_ENV_VAR).filter(|u| !u.trim().is_empty()) {
            debug!("{} overrides base_url", BASE_URL_ENV_VAR);
            self.base_url = url;
        }
        if let Some(secs) = lookup(TIMEOUT_ENV_VAR) {
            self.timeout_secs = secs
                .trim()
                .parse()
                .map_err(|_| anyhow!("{} must be a number of seconds, got '{}'", TIMEOUT_ENV_VAR, secs))?;
        }
        Ok(())
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(&self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Set one key from its string form
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "base_url" => {
                if !(value.starts_with("http://") || value.starts_with("https://")) {
                    return Err(anyhow!("base_url must start with http:// or https://"));
                }
                self.base_url = value.trim_end_matches('/').to_string();
            }
            "timeout_secs" => {
                let secs: u64 = value
                    .parse()
                    .map_err(|_| anyhow!("timeout_secs must be a positive integer"))?;
                if secs == 0 {
                    return Err(anyhow!("timeout_secs must be a positive integer"));
                }
                self.timeout_secs = secs;
            }
            "default_language" => {
                self.default_language = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                };
            }
            _ => {
                return Err(anyhow!(
                    "Unknown key: {}. Supported: {}",
                    key,
                    CONFIG_KEYS.join(", ")
                ))
            }
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// Get the config file path
    pub fn config_file_path() -> Result<PathBuf> {
        dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
            .map(|dir| dir.join("cognitia").join("config.json"))
            .ok_or_else(|| anyhow!("Could not determine config directory or home directory"))
    }

    /// Rows for `config show`
    pub fn rows(&self) -> Vec<(&'static str, String)> {
        vec![
            ("base_url", self.base_url.clone()),
            ("timeout_secs", self.timeout_secs.to_string()),
            (
                "default_language",
                self.default_language.clone().unwrap_or_else(|| "(none)".to_string()),
            ),
        ]
    }
}
