//! Manager Configuration
//!
//! Tool locations, status decoding mode and the per-command timeout.
//! Values come from defaults, an optional YAML file, then CLI flags.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// How `zpool status` output is requested and decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StatusMode {
    /// Ask `zpool version` and pick JSON when the tool supports it
    Auto,
    /// `zpool status -p -j`
    Json,
    /// Plain `zpool status` text
    Text,
}

impl Default for StatusMode {
    fn default() -> Self {
        StatusMode::Auto
    }
}

impl std::fmt::Display for StatusMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusMode::Auto => write!(f, "auto"),
            StatusMode::Json => write!(f, "json"),
            StatusMode::Text => write!(f, "text"),
        }
    }
}

/// Configuration for the pool manager
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Path or name of the `zpool` binary
    pub zpool_path: String,
    /// Path or name of the `zfs` binary
    pub zfs_path: String,
    /// Status decoding strategy
    pub status_mode: StatusMode,
    /// Caller-level timeout applied to every command
    pub command_timeout_secs: u64,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            zpool_path: "zpool".to_string(),
            zfs_path: "zfs".to_string(),
            status_mode: StatusMode::Auto,
            command_timeout_secs: 30,
        }
    }
}

impl ManagerConfig {
    /// Load configuration from a YAML file; missing keys keep their defaults
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&contents)
            .map_err(|e| Error::Configuration(format!("{}: {}", path.display(), e)))
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        let config: ManagerConfig = serde_yaml::from_str(contents)
            .map_err(|e| Error::Configuration(format!("invalid YAML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.zpool_path.trim().is_empty() || self.zfs_path.trim().is_empty() {
            return Err(Error::Configuration("tool paths must not be empty".into()));
        }
        if self.command_timeout_secs == 0 {
            return Err(Error::Configuration(
                "command_timeout_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }
}
