//! # Configuration Management Module
//!
//! TOML-backed configuration for the voltbot state engine, with typed
//! sections, serde defaults, and validation on load.
//!
//! ## Configuration Structure
//!
//! - [`BotConfig`] - Bot identity and the admin allowlist
//! - [`StorageConfig`] - Data directory and autosave cadence
//! - [`BackupConfig`] - Snapshot backups of the data directory
//! - [`LoggingConfig`] - Log level and optional log file
//!
//! ## Configuration File Format
//!
//! ```toml
//! [bot]
//! name = "voltbot"
//! admin_user_ids = []
//!
//! [storage]
//! data_dir = "./data"
//! autosave_interval_secs = 60
//!
//! [backup]
//! enabled = false
//! dir = "./backups"
//! max_backups = 14
//!
//! [logging]
//! level = "info"
//! ```
//!
//! All values carry defaults, so a minimal file (or none at all, via
//! [`Config::default`]) is enough to run.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Display name used in logs and status output.
    #[serde(default = "default_bot_name")]
    pub name: String,
    /// User ids allowed to run admin commands regardless of platform roles.
    #[serde(default)]
    pub admin_user_ids: Vec<u64>,
}

fn default_bot_name() -> String {
    "voltbot".to_string()
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: default_bot_name(),
            admin_user_ids: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Seconds between periodic full-state flushes.
    #[serde(default = "default_autosave_interval")]
    pub autosave_interval_secs: u64,
}

fn default_data_dir() -> String {
    "./data".to_string()
}

fn default_autosave_interval() -> u64 {
    60
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            autosave_interval_secs: default_autosave_interval(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_backup_dir")]
    pub dir: String,
    /// Snapshots kept after pruning.
    #[serde(default = "default_max_backups")]
    pub max_backups: usize,
    /// Seconds between automatic snapshots when enabled.
    #[serde(default = "default_backup_interval")]
    pub interval_secs: u64,
}

fn default_backup_dir() -> String {
    "./backups".to_string()
}

fn default_max_backups() -> usize {
    14
}

fn default_backup_interval() -> u64 {
    86_400
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dir: default_backup_dir(),
            max_backups: default_max_backups(),
            interval_secs: default_backup_interval(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// One of: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Optional log file; console-only when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub backup: BackupConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load and validate a configuration file.
    pub async fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;
        let config: Config = toml::from_str(&contents)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;
        config.validate()?;
        Ok(config)
    }

    /// Write a default configuration file.
    pub async fn create_default(path: &str) -> Result<()> {
        let serialized = toml::to_string_pretty(&Config::default())?;
        fs::write(path, serialized)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.storage.data_dir.trim().is_empty() {
            return Err(anyhow!("storage.data_dir must not be empty"));
        }
        if self.storage.autosave_interval_secs == 0 {
            return Err(anyhow!("storage.autosave_interval_secs must be at least 1"));
        }
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => return Err(anyhow!("unknown logging.level {:?}", other)),
        }
        if self.backup.enabled {
            if self.backup.dir.trim().is_empty() {
                return Err(anyhow!(
                    "backup.dir must not be empty when backups are enabled"
                ));
            }
            if self.backup.max_backups == 0 {
                return Err(anyhow!("backup.max_backups must be at least 1"));
            }
        }
        Ok(())
    }
}
