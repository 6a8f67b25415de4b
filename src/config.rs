//! Application configuration loaded from `~/.audit-desk/config.yaml`.

use crate::domain::services::CapacityDefaults;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Snapshot the plan aggregate after every N events.
    #[serde(default = "default_snapshot_every")]
    pub snapshot_every: u64,
    /// Fallback capacity profile for plans without a persisted one.
    #[serde(default)]
    pub capacity: CapacityDefaults,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            snapshot_every: default_snapshot_every(),
            capacity: CapacityDefaults::default(),
        }
    }
}

fn default_snapshot_every() -> u64 {
    50
}

impl AppConfig {
    /// Loads the configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    /// Loads the configuration, falling back to defaults when the file does
    /// not exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}
