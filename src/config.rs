//! Configuration management for Redtape
//!
//! This module handles loading and validating configuration from TOML files
//! and `REDTAPE_*` environment variables.

use crate::error::{RedtapeError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Environment variable naming an optional configuration file for [`Config::load`]
pub const CONFIG_PATH_ENV: &str = "REDTAPE_CONFIG";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

/// Storage configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Run the background sweep that physically removes expired keys
    pub expiration_sweep: bool,
    pub sweep_interval_ms: u64,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    pub file_path: Option<PathBuf>,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogFormat {
    Json,
    Pretty,
    Compact,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            expiration_sweep: true,
            sweep_interval_ms: 1000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            file_path: None,
        }
    }
}

impl StorageConfig {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }
}

impl FromStr for LogFormat {
    type Err = RedtapeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            _ => Err(config_error(
                format!("invalid log format: {s}"),
                "logging.format",
            )),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogFormat::Json => "Json",
            LogFormat::Pretty => "Pretty",
            LogFormat::Compact => "Compact",
        };
        f.write_str(name)
    }
}

impl Config {
    /// Load configuration from a TOML file. Missing keys fall back to defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| RedtapeError::ConfigError {
            message: format!("failed to parse {}: {e}", path.display()),
            field: None,
        })
    }

    /// Build configuration from defaults overridden by environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Load a file, then let environment variables override it
    pub fn from_file_and_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Config::from_file(path)?;
        config.apply_env()?;
        Ok(config)
    }

    /// Load configuration from `REDTAPE_CONFIG` (if set) and the environment, then validate it
    pub fn load() -> Result<Self> {
        let config = match env::var(CONFIG_PATH_ENV) {
            Ok(path) => Config::from_file_and_env(path)?,
            Err(_) => Config::from_env()?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if crate::logging::parse_log_level(&self.logging.level).is_err() {
            return Err(config_error(
                format!("invalid log level: {}", self.logging.level),
                "logging.level",
            ));
        }
        if self.storage.expiration_sweep && self.storage.sweep_interval_ms == 0 {
            return Err(config_error(
                "sweep interval must be greater than zero",
                "storage.sweep_interval_ms",
            ));
        }
        Ok(())
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Some(value) = env_var("REDTAPE_STORAGE_EXPIRATION_SWEEP") {
            self.storage.expiration_sweep = parse_env(&value, "storage.expiration_sweep")?;
        }
        if let Some(value) = env_var("REDTAPE_STORAGE_SWEEP_INTERVAL_MS") {
            self.storage.sweep_interval_ms = parse_env(&value, "storage.sweep_interval_ms")?;
        }
        if let Some(value) = env_var("REDTAPE_LOGGING_LEVEL") {
            self.logging.level = value;
        }
        if let Some(value) = env_var("REDTAPE_LOGGING_FORMAT") {
            self.logging.format = value.parse()?;
        }
        if let Some(value) = env_var("REDTAPE_LOGGING_FILE_PATH") {
            self.logging.file_path = Some(PathBuf::from(value));
        }
        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

fn parse_env<T: FromStr>(value: &str, field: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| config_error(format!("invalid value '{value}' for {field}"), field))
}

fn config_error(message: impl Into<String>, field: &str) -> RedtapeError {
    RedtapeError::ConfigError {
        message: message.into(),
        field: Some(field.to_string()),
    }
}
