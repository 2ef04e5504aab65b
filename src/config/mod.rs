//! Configuration management for ClipShelf
//!
//! This module handles loading, validating, and managing configuration
//! for the clipboard history store.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "CLIPSHELF_CONFIG";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading config file
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("Failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("Failed to serialize TOML: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Validation error
    #[error("Config validation failed: {0}")]
    Validation(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// History limits and polling
    #[serde(default)]
    pub history: HistoryConfig,

    /// On-disk locations
    #[serde(default)]
    pub storage: StorageConfig,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// History configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Maximum number of entries kept, pinned ones included
    #[serde(default = "default_max_history_size")]
    pub max_history_size: usize,

    /// Maximum number of pinned entries
    #[serde(default = "default_max_pinned_size")]
    pub max_pinned_size: usize,

    /// Clipboard poll interval in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl HistoryConfig {
    /// Poll interval as a `Duration`
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the history document and image sidecars
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

// Default value functions
fn default_max_history_size() -> usize {
    200
}

fn default_max_pinned_size() -> usize {
    10
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("~/.local/share/clipshelf")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_history_size: default_max_history_size(),
            max_pinned_size: default_max_pinned_size(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            history: HistoryConfig::default(),
            storage: StorageConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Build a default configuration rooted at `data_dir`
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        let mut config = Self::default();
        config.storage.data_dir = data_dir.into();
        config
    }

    /// Load configuration from default locations
    ///
    /// Checks in order:
    /// 1. Path from CLIPSHELF_CONFIG environment variable
    /// 2. <config_dir>/clipshelf/config.toml
    /// 3. Built-in defaults
    pub fn load() -> Result<Self, ConfigError> {
        if let Some(path) = Self::find_config_path() {
            Self::load_from_path(&path)
        } else {
            let mut config = Self::default();
            config.expand_paths();
            Ok(config)
        }
    }

    /// Load configuration with an optional explicit path
    pub fn load_config(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        match config_path {
            Some(path) => Self::load_from_path(path),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let mut config: Config = toml::from_str(toml_str)?;
        config.expand_paths();
        config.validate()?;
        Ok(config)
    }

    /// Path of the config file that `load` would read
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("clipshelf").join("config.toml"))
    }

    fn find_config_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        Self::default_config_path().filter(|p| p.exists())
    }

    fn expand_paths(&mut self) {
        self.storage.data_dir = expand_path(&self.storage.data_dir);
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let history = &self.history;

        if history.max_history_size < 1 || history.max_history_size > 10_000 {
            return Err(ConfigError::Validation(
                "max_history_size must be between 1 and 10000".to_string(),
            ));
        }

        if history.max_pinned_size < 1 {
            return Err(ConfigError::Validation(
                "max_pinned_size must be at least 1".to_string(),
            ));
        }
        if history.max_pinned_size > history.max_history_size {
            return Err(ConfigError::Validation(
                "max_pinned_size must not exceed max_history_size".to_string(),
            ));
        }

        if history.poll_interval_ms < 50 || history.poll_interval_ms > 10_000 {
            return Err(ConfigError::Validation(
                "poll_interval_ms must be between 50 and 10000".to_string(),
            ));
        }

        if self.storage.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "data_dir must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Save configuration to `path`, or the default location when `None`
    pub fn save(&self, path: Option<&Path>) -> Result<PathBuf, ConfigError> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::default_config_path().ok_or_else(|| {
                ConfigError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "Could not find config directory",
                ))
            })?,
        };

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, toml_string)?;

        Ok(config_path)
    }

    /// Write the commented example to the default location
    pub fn generate_example_config(path: Option<&Path>, force: bool) -> Result<PathBuf, ConfigError> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::default_config_path().ok_or_else(|| {
                ConfigError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "Could not find config directory",
                ))
            })?,
        };

        if !force && config_path.exists() {
            return Err(ConfigError::Validation(
                "Config file already exists. Use --force to overwrite.".to_string(),
            ));
        }

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&config_path, Self::generate_example())?;

        Ok(config_path)
    }

    /// Generate example configuration file
    pub fn generate_example() -> String {
        let config = Config::default();

        format!(
            r#"# ClipShelf Configuration File
# Location: ~/.config/clipshelf/config.toml

# Logging level (trace, debug, info, warn, error)
log_level = "{}"

# History settings
[history]
# Entries kept in total; pinned entries are never evicted
max_history_size = {}
# Entries that may be pinned at once
max_pinned_size = {}
# How often the clipboard is checked for changes
poll_interval_ms = {}

# Storage settings
[storage]
# Holds history.json and the images/ directory
data_dir = "{}"
"#,
            config.log_level,
            config.history.max_history_size,
            config.history.max_pinned_size,
            config.history.poll_interval_ms,
            config.storage.data_dir.display(),
        )
    }
}

/// Expand tilde in path
fn expand_path(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    let expanded = shellexpand::tilde(path_str.as_ref());
    PathBuf::from(expanded.into_owned())
}
