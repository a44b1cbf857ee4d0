use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::types::Config;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

impl Config {
    /// Returns the path to the configuration file.
    ///
    /// Uses `~/.config/cmdrunner/config.toml` on Unix, or the platform
    /// equivalent via `dirs::config_dir()`. Falls back to the current
    /// directory if config_dir is unavailable.
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        config_dir.join("cmdrunner").join("config.toml")
    }

    /// Loads configuration from the default config file.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Loads configuration from `path`.
    ///
    /// - If the file doesn't exist, returns `Config::default()`.
    /// - Otherwise parses it as TOML and validates; missing keys take
    ///   their defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// Checks:
    /// - The default runner, prompt and command prefix are non-empty
    /// - The poll interval is positive
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.defaults.runner.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                message: "Default runner must not be empty".to_string(),
            });
        }

        if self.defaults.poll_interval_ms == 0 {
            return Err(ConfigError::ValidationError {
                message: "poll_interval_ms must be greater than 0".to_string(),
            });
        }

        if self.repl.command_prefix.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                message: "REPL command_prefix must not be empty".to_string(),
            });
        }

        if self.repl.prompt.is_empty() {
            return Err(ConfigError::ValidationError {
                message: "REPL prompt must not be empty".to_string(),
            });
        }

        Ok(())
    }
}
