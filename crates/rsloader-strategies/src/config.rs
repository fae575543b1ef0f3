//! Configuration management for rsloader strategies.
//!
//! Settings are layered from three sources:
//! 1. Default values (hardcoded)
//! 2. Configuration file (YAML)
//! 3. Environment variables (override)
//!
//! Environment variables take precedence over file values, which take
//! precedence over defaults.
//!
//! # Example
//!
//! ```ignore
//! use rsloader_strategies::config::LoaderSettings;
//!
//! // Load from file with env overrides
//! let settings = LoaderSettings::load("loader.yaml")?;
//!
//! // Or load from environment only
//! let settings = LoaderSettings::from_env()?;
//! ```
//!
//! # Example YAML Configuration
//!
//! ```yaml
//! strategy:
//!   kind: standard
//! standard:
//!   timeout_ms: 10
//! once:
//!   detached: false
//! logging:
//!   level: info
//!   json: false
//! ```

use std::path::Path;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::Level;

use crate::logging::{init_logging, LoggingConfig};
use crate::once::OnceOptions;
use crate::standard::{StandardOptions, DEFAULT_TIMEOUT};

/// Prefix for environment variable overrides, e.g. `RSLOADER_STANDARD__TIMEOUT_MS`.
pub const ENV_PREFIX: &str = "RSLOADER";

/// Loader configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct LoaderSettings {
    /// Which strategy the loader uses
    #[serde(default)]
    pub strategy: StrategySettings,

    /// Windowed strategy settings
    #[serde(default)]
    pub standard: StandardSettings,

    /// Immediate strategy settings
    #[serde(default)]
    pub once: OnceSettings,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Available batching strategies.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Collect calls into a window and resolve them together.
    #[default]
    Standard,
    /// Resolve every call on its own.
    Once,
}

/// Strategy selection.
///
/// Environment variable: `RSLOADER_STRATEGY__KIND`
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct StrategySettings {
    #[serde(default)]
    pub kind: StrategyKind,
}

/// Windowed strategy settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct StandardSettings {
    /// Window flush deadline in milliseconds.
    ///
    /// Environment variable: `RSLOADER_STANDARD__TIMEOUT_MS`
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for StandardSettings {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
        }
    }
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT.as_millis() as u64
}

/// Immediate strategy settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct OnceSettings {
    /// Run the resolver in a background task instead of inline.
    ///
    /// Environment variable: `RSLOADER_ONCE__DETACHED`
    #[serde(default)]
    pub detached: bool,
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LoggingSettings {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Use JSON format (true for production, false for development)
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ConfigError),

    #[error("configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("invalid configuration: {message}")]
    Invalid { message: String },
}

impl LoaderSettings {
    /// Load settings from a YAML file with environment variable overrides.
    ///
    /// Environment variables are prefixed with `RSLOADER_` and use `__` as
    /// the nested key separator, e.g. `RSLOADER_ONCE__DETACHED=true`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigLoadError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let config = Config::builder()
            .add_source(Config::try_from(&LoaderSettings::default())?)
            .add_source(File::from(path).format(FileFormat::Yaml))
            .add_source(env_source())
            .build()?;

        let settings: LoaderSettings = config.try_deserialize()?;
        settings.validate()?;

        Ok(settings)
    }

    /// Load settings from defaults and environment variables only.
    pub fn from_env() -> Result<Self, ConfigLoadError> {
        let config = Config::builder()
            .add_source(Config::try_from(&LoaderSettings::default())?)
            .add_source(env_source())
            .build()?;

        let settings: LoaderSettings = config.try_deserialize()?;
        settings.validate()?;

        Ok(settings)
    }

    /// Validate the settings.
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.standard.timeout_ms == 0 {
            return Err(ConfigLoadError::Invalid {
                message: "standard.timeout_ms must be greater than 0".to_string(),
            });
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigLoadError::Invalid {
                message: format!(
                    "logging.level must be one of: {:?}, got: {}",
                    valid_levels, self.logging.level
                ),
            });
        }

        Ok(())
    }

    /// Options for the windowed strategy, using the default logger.
    pub fn standard_options(&self) -> StandardOptions {
        StandardOptions::default().with_timeout(Duration::from_millis(self.standard.timeout_ms))
    }

    /// Options for the immediate strategy, using the default logger.
    pub fn once_options(&self) -> OnceOptions {
        OnceOptions::default().with_detached(self.once.detached)
    }

    /// Installs the global subscriber described by the `logging` section.
    ///
    /// Returns false if a global subscriber was already installed.
    pub fn init_logging(&self) -> bool {
        init_logging(&self.logging_config())
    }

    /// Subscriber configuration for the `logging` section.
    pub fn logging_config(&self) -> LoggingConfig {
        let level = self
            .logging
            .level
            .to_lowercase()
            .parse()
            .unwrap_or(Level::INFO);
        let config = if self.logging.json {
            LoggingConfig::json()
        } else {
            LoggingConfig::text()
        };
        config.with_level(level)
    }
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
}
