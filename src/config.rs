// SPDX-License-Identifier: GPL-3.0-only

use crate::backends::camera::{DeviceMap, Facing, FlashMode};
use crate::backends::permission::PermissionStrategy;
use crate::constants::{APP_NAME, DEFAULT_PHOTO_QUALITY, MAX_RECORDING_DURATION, VideoQuality};
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where saved media goes (default: the XDG pictures directory)
    pub gallery_dir: Option<PathBuf>,
    /// Camera the viewfinder starts with
    pub default_facing: Facing,
    /// V4L2 device per facing
    pub devices: DeviceMap,
    /// Storage permission flow
    pub permission_strategy: PermissionStrategy,
    /// Still quality, 0.0..=1.0
    pub photo_quality: f32,
    /// Recording length cap in seconds (never above 60)
    pub max_recording_secs: u64,
    /// Recording resolution profile
    pub video_quality: VideoQuality,
    /// Flash mode requested from the camera
    pub flash_mode: FlashMode,
    /// Fallback log filter when RUST_LOG is unset
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gallery_dir: None,
            default_facing: Facing::Back,
            devices: DeviceMap::default(),
            permission_strategy: PermissionStrategy::default(),
            photo_quality: DEFAULT_PHOTO_QUALITY,
            max_recording_secs: MAX_RECORDING_DURATION.as_secs(),
            video_quality: VideoQuality::default(),
            flash_mode: FlashMode::default(),
            log_filter: "warn".to_string(),
        }
    }
}

impl Config {
    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_NAME).join("config.json"))
    }

    /// Load config from `path`; a missing file yields defaults
    pub fn load(path: &Path) -> AppResult<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                let config: Config = serde_json::from_str(&contents).map_err(|e| {
                    AppError::Config(format!("{}: {}", path.display(), e))
                })?;
                debug!(path = %path.display(), "Loaded config");
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(AppError::Config(format!("{}: {}", path.display(), e))),
        }
    }

    /// Load from `path` or the default location
    pub fn load_or_default(path: Option<&Path>) -> AppResult<Self> {
        match path.map(Path::to_path_buf).or_else(Self::default_path) {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    /// Write config as pretty JSON, creating parent directories
    pub fn save(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AppError::Config(format!("{}: {}", parent.display(), e)))?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(path, json)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;
        info!(path = %path.display(), "Config saved");
        Ok(())
    }

    /// Gallery directory, resolved against the system default
    pub fn gallery_dir(&self) -> PathBuf {
        self.gallery_dir
            .clone()
            .unwrap_or_else(crate::storage::pictures_directory)
    }

    /// Recording cap, clamped to the hard limit
    pub fn max_recording_duration(&self) -> Duration {
        Duration::from_secs(self.max_recording_secs).min(MAX_RECORDING_DURATION)
    }
}
