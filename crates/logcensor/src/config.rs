//! Configuration management for logcensor.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::redact::{CensoringConfig, DEFAULT_CONCURRENCY};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default configuration directory name.
const CONFIG_DIR_NAME: &str = "logcensor";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `LOGCENSOR_`, nested with `__`)
/// 2. TOML config file at `~/.config/logcensor/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// What to censor.
    pub targets: TargetsConfig,
    /// Where secrets come from.
    pub secrets: SecretsConfig,
    /// How censoring runs.
    pub censor: CensorConfig,
}

/// Censoring targets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetsConfig {
    /// Artifact files or directories; directories are walked recursively.
    pub artifacts: Vec<PathBuf>,
    /// Individual process log files.
    pub process_logs: Vec<PathBuf>,
}

/// Secret sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecretsConfig {
    /// Directories holding one secret per file.
    pub directories: Vec<PathBuf>,
    /// Also censor the base64 encoding of each secret.
    pub include_base64: bool,
}

/// Censoring engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CensorConfig {
    /// Read buffer size in bytes. Never smaller than the longest secret in practice.
    pub buffer_size: Option<usize>,
    /// Number of files censored at once.
    pub concurrency: usize,
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            directories: Vec::new(),
            include_base64: true,
        }
    }
}

impl Default for CensorConfig {
    fn default() -> Self {
        Self {
            buffer_size: None, // Engine default
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl Config {
    /// Load configuration from all sources, reading the TOML layer from
    /// `config_path` or the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("LOGCENSOR_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.censor.buffer_size == Some(0) {
            return Err(Error::ConfigValidation {
                message: "buffer_size must be greater than 0".to_string(),
            });
        }

        if self.censor.concurrency == 0 {
            return Err(Error::ConfigValidation {
                message: "concurrency must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// All target locations, artifacts first.
    #[must_use]
    pub fn target_paths(&self) -> Vec<PathBuf> {
        self.targets
            .artifacts
            .iter()
            .chain(&self.targets.process_logs)
            .cloned()
            .collect()
    }

    /// Build the orchestrator's run configuration.
    #[must_use]
    pub fn censoring_config(&self) -> CensoringConfig {
        CensoringConfig {
            targets: self.target_paths(),
            secret_directories: self.secrets.directories.clone(),
            include_base64: self.secrets.include_base64,
            buffer_size: self.censor.buffer_size,
            concurrency: self.censor.concurrency,
        }
    }
}
