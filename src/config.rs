//! Tracker configuration
//!
//! Storage key, debounce window and idle-scheduling behaviour. Every field
//! has a default so an empty or partial TOML file is valid.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

/// Key under which the profile is persisted
pub const DEFAULT_STORAGE_KEY: &str = "bga_trainer_learning_profile";

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Storage key for the serialized profile
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
    /// Quiescence window after the last recorded attempt, in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Directory for the file backend (platform data dir when unset)
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// How the host runs deferred writes once the window has elapsed
    #[serde(default)]
    pub idle: IdleSupport,
}

fn default_storage_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

fn default_debounce_ms() -> u64 {
    300
}

fn default_idle_timeout_ms() -> u64 {
    1000
}

fn default_fallback_delay_ms() -> u64 {
    250
}

/// Idle-time scheduling capability of the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum IdleSupport {
    /// Host reports idle periods; run then, or once `timeout_ms` has passed
    Available {
        #[serde(default = "default_idle_timeout_ms")]
        timeout_ms: u64,
    },
    /// No idle signal; run after a fixed short delay
    Unavailable {
        #[serde(default = "default_fallback_delay_ms")]
        fallback_delay_ms: u64,
    },
}

impl Default for IdleSupport {
    fn default() -> Self {
        IdleSupport::Available {
            timeout_ms: default_idle_timeout_ms(),
        }
    }
}

impl IdleSupport {
    /// Fixed-delay fallback with the default delay
    pub fn fallback() -> Self {
        IdleSupport::Unavailable {
            fallback_delay_ms: default_fallback_delay_ms(),
        }
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            storage_key: default_storage_key(),
            debounce_ms: default_debounce_ms(),
            data_dir: None,
            idle: IdleSupport::default(),
        }
    }
}

impl TrackerConfig {
    /// Load configuration from a TOML file, falling back to defaults when
    /// the file does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: TrackerConfig = toml::from_str(&contents)
            .context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    /// Write configuration as TOML
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }
        let contents = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;
        std::fs::write(path, contents)
            .context("Failed to write config file")?;
        Ok(())
    }

    /// Reject values the scheduler cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage_key.trim().is_empty() {
            return Err(ConfigError::EmptyStorageKey);
        }
        if self.debounce_ms == 0 {
            return Err(ConfigError::ZeroDebounce);
        }
        Ok(())
    }

    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Directory used by the file backend
    pub fn resolve_data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => data_dir(),
        }
    }
}

/// Platform data directory for the tracker
pub fn data_dir() -> Result<PathBuf> {
    let base = directories::ProjectDirs::from("com", "bga-trainer", "bga-trainer")
        .context("Failed to get project directories")?;
    Ok(base.data_dir().to_path_buf())
}
