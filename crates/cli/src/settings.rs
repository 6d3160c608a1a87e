//! Settings file (`<storage>/config.json`).

use std::path::Path;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use studyplan_planner::PlannerConfig;
use studyplan_progress::TrackerConfig;

/// File name looked up inside the storage directory.
pub const SETTINGS_FILE: &str = "config.json";

/// Everything configurable from disk. Missing sections use defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub planner: PlannerConfig,
    pub progress: TrackerConfig,
}

impl Settings {
    /// Load settings from `root`, falling back to defaults when the file is absent.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(SETTINGS_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read settings from {:?}", path))?;
        serde_json::from_str(&raw).with_context(|| format!("Invalid settings in {:?}", path))
    }
}
