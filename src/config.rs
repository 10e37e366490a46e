//! Configuration Management
//!
//! Persistent settings for gcp-plane, stored as JSON in the user config dir.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::gcp::operation::ComputeOperationWaiter;

fn default_operation_timeout_secs() -> u64 {
    20 * 60
}

fn default_poll_interval_ms() -> u64 {
    1000
}

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Default project ID
    #[serde(default)]
    pub project: Option<String>,
    /// Default region
    #[serde(default)]
    pub region: Option<String>,
    /// Default zone
    #[serde(default)]
    pub zone: Option<String>,
    /// Compute Engine endpoint override
    #[serde(default)]
    pub compute_endpoint: Option<String>,
    /// Wall-clock limit on waiting for one operation
    #[serde(default = "default_operation_timeout_secs")]
    pub operation_timeout_secs: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project: None,
            region: None,
            zone: None,
            compute_endpoint: None,
            operation_timeout_secs: default_operation_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("gcp-plane").join("config.json"))
    }

    /// Load configuration from the default location; missing file gives defaults
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("Invalid config in {}", path.display()))
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Get effective project (CLI > config > environment/gcloud default)
    pub fn effective_project(&self, cli: Option<&str>) -> Option<String> {
        cli.map(str::to_string)
            .or_else(|| self.project.clone())
            .or_else(crate::gcp::auth::get_default_project)
    }

    /// Get effective region (CLI > config > environment/gcloud default)
    pub fn effective_region(&self, cli: Option<&str>) -> String {
        cli.map(str::to_string)
            .or_else(|| self.region.clone())
            .or_else(crate::gcp::auth::get_default_region)
            .unwrap_or_else(|| "us-central1".to_string())
    }

    pub fn operation_waiter(&self) -> ComputeOperationWaiter {
        ComputeOperationWaiter::new(
            Duration::from_secs(self.operation_timeout_secs),
            Duration::from_millis(self.poll_interval_ms),
        )
    }
}
