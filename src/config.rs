// src/config.rs
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Geometric thresholds and timing constants used by the evaluators.
///
/// Angles are in degrees, distances in normalized image units and times in
/// milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub stability_delay_ms: u64,
    pub rep_cooldown_ms: u64,

    pub squat_down_angle: f64,
    pub squat_up_angle: f64,
    pub squat_display_angle: f64,

    pub plank_body_min: f64,
    pub plank_body_max: f64,
    pub plank_torso_flat_max: f64,
    pub plank_torso_flat_min_reversed: f64,
    pub plank_arm_min: f64,
    pub plank_arm_max: f64,

    pub side_plank_body_min: f64,
    pub side_plank_body_max: f64,
    pub side_plank_elbow_offset_max: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            stability_delay_ms: 200,
            rep_cooldown_ms: 1000,
            squat_down_angle: 90.0,
            squat_up_angle: 160.0,
            squat_display_angle: 150.0,
            plank_body_min: 165.0,
            plank_body_max: 195.0,
            plank_torso_flat_max: 35.0,
            plank_torso_flat_min_reversed: 145.0,
            plank_arm_min: 70.0,
            plank_arm_max: 110.0,
            side_plank_body_min: 160.0,
            side_plank_body_max: 200.0,
            side_plank_elbow_offset_max: 0.15,
        }
    }
}

impl ClassifierConfig {
    /// Reads a config file, falling back to defaults for any field it omits.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let cfg = serde_json::from_slice(&bytes)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(cfg)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(self)?;
        fs::write(path, data).with_context(|| format!("Failed to write {}", path.display()))
    }

    /// Location of the per-user config file.
    pub fn default_path() -> PathBuf {
        if let Some(pd) = ProjectDirs::from("", "", "rep_tracker") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("rep_tracker_config.json")
        }
    }

    /// Loads `path`, or the per-user file when none is given. A missing or
    /// unreadable file yields the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let path = path.map(Path::to_path_buf).unwrap_or_else(Self::default_path);
        if !path.exists() {
            return Self::default();
        }
        match Self::load(&path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!("{:#}; using default thresholds", e);
                Self::default()
            }
        }
    }
}
