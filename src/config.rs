// SPDX-License-Identifier: GPL-3.0-only

//! Persistent user settings
//!
//! Stored as pretty-printed JSON under the user's config directory
//! (`$XDG_CONFIG_HOME/filtercam/config.json`). Missing fields fall back to
//! their defaults so older files keep loading.

use crate::backends::camera::types::FacingMode;
use crate::constants::{BitratePreset, DEFAULT_FRAMERATE};
use crate::errors::{AppError, AppResult};
use crate::media::filters::FilterType;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Directory name used under the config and pictures directories
pub const APP_DIR: &str = "filtercam";

const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Camera facing requested on startup
    pub facing: FacingMode,
    /// Filter active on startup
    pub filter: FilterType,
    /// Compositor cadence while recording
    pub framerate: u32,
    /// Video encoder bitrate preset
    pub bitrate_preset: BitratePreset,
    /// Open the microphone alongside the camera
    pub record_audio: bool,
    /// Where downloads are written; `None` uses the pictures directory
    pub download_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            facing: FacingMode::default(),
            filter: FilterType::default(),
            framerate: DEFAULT_FRAMERATE,
            bitrate_preset: BitratePreset::default(),
            record_audio: true,
            download_dir: None,
        }
    }
}

impl Config {
    /// Load from the default location, writing defaults if the file is missing
    pub fn load() -> AppResult<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            info!(path = %path.display(), "Config file not found, creating default config");
            let config = Self::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        config.validate()?;

        debug!(path = %path.display(), ?config, "Loaded config");
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        info!(path = %path.display(), "Saved config");
        Ok(())
    }

    pub fn validate(&self) -> AppResult<()> {
        if !(1..=120).contains(&self.framerate) {
            return Err(AppError::Config(format!(
                "framerate must be between 1 and 120, got {}",
                self.framerate
            )));
        }
        Ok(())
    }

    /// Directory downloads are written to
    pub fn resolved_download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .unwrap_or_else(crate::storage::default_download_dir)
    }

    fn config_path() -> AppResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
            .ok_or_else(|| AppError::Config("No config directory for this user".to_string()))
    }
}
