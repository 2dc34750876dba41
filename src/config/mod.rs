use crate::core::path::{config_file, default_cellar, ensure_dir};
use crate::core::{StagerError, StagerResult};
use crate::di::ConfigProvider;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Cache directory (defaults to platform-specific cache directory)
    ///
    /// Default locations:
    /// - Windows: %LOCALAPPDATA%\stager\cache
    /// - Linux: ~/.cache/stager
    /// - macOS: ~/Library/Caches/stager
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<String>,

    /// Directory holding installed kegs (defaults to platform data directory)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cellar: Option<String>,

    /// Interpreter used when a formula does not name one
    #[serde(default = "default_python")]
    pub python: String,

    /// Timeout for a single download, in seconds
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

fn default_python() -> String {
    "python3".to_string()
}

fn default_fetch_timeout_secs() -> u64 {
    300
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: None,
            cellar: None,
            python: default_python(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
        }
    }
}

/// Keys accepted by `stager config set`
pub const CONFIG_KEYS: &[&str] = &["cache_dir", "cellar", "python", "fetch_timeout_secs"];

impl Config {
    /// Load config from platform-specific config directory, creating default if it doesn't exist
    ///
    /// Config locations:
    /// - Windows: %APPDATA%\stager\config.yaml
    /// - Linux: ~/.config/stager/config.yaml
    /// - macOS: ~/Library/Application Support/stager/config.yaml
    pub fn load() -> StagerResult<Self> {
        Self::load_from(&config_file()?)
    }

    /// Load config from an explicit file, creating it with defaults when missing
    pub fn load_from(config_path: &Path) -> StagerResult<Self> {
        if !config_path.exists() {
            let config = Self::default();
            config.save_to(config_path)?;
            return Ok(config);
        }

        let content = fs::read_to_string(config_path)?;
        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| StagerError::Config(format!("Failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Save config to platform-specific config directory
    pub fn save(&self) -> StagerResult<()> {
        self.save_to(&config_file()?)
    }

    pub fn save_to(&self, config_path: &Path) -> StagerResult<()> {
        let config_dir = config_path
            .parent()
            .ok_or_else(|| StagerError::Path("Invalid config path".to_string()))?;

        ensure_dir(config_dir)?;

        let content = serde_yaml::to_string(self)
            .map_err(|e| StagerError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(config_path, content)?;
        Ok(())
    }

    /// Update one setting by key
    pub fn set(&mut self, key: &str, value: &str) -> StagerResult<()> {
        match key {
            "cache_dir" => self.cache_dir = Some(value.to_string()),
            "cellar" => self.cellar = Some(value.to_string()),
            "python" => {
                if value.trim().is_empty() {
                    return Err(StagerError::Config("python cannot be empty".to_string()));
                }
                self.python = value.to_string();
            }
            "fetch_timeout_secs" => {
                let secs: u64 = value.parse().map_err(|_| {
                    StagerError::Config(format!(
                        "fetch_timeout_secs must be a positive integer, got '{}'",
                        value
                    ))
                })?;
                if secs == 0 {
                    return Err(StagerError::Config(
                        "fetch_timeout_secs must be greater than zero".to_string(),
                    ));
                }
                self.fetch_timeout_secs = secs;
            }
            _ => {
                return Err(StagerError::Config(format!(
                    "Unknown config key '{}'. Known keys: {}",
                    key,
                    CONFIG_KEYS.join(", ")
                )))
            }
        }
        Ok(())
    }

    /// Get the cache directory path
    pub fn get_cache_dir(&self) -> StagerResult<PathBuf> {
        if let Some(ref dir) = self.cache_dir {
            Ok(PathBuf::from(dir))
        } else {
            crate::core::path::cache_dir()
        }
    }

    /// Get the cellar path
    pub fn get_cellar(&self) -> StagerResult<PathBuf> {
        if let Some(ref dir) = self.cellar {
            Ok(PathBuf::from(dir))
        } else {
            default_cellar()
        }
    }
}

// Implement ConfigProvider trait
impl ConfigProvider for Config {
    fn cache_dir(&self) -> StagerResult<PathBuf> {
        self.get_cache_dir()
    }

    fn cellar(&self) -> StagerResult<PathBuf> {
        self.get_cellar()
    }

    fn python(&self) -> &str {
        &self.python
    }

    fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}
