// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Still-capture quality in the `0.0..=1.0` range
pub const DEFAULT_PHOTO_QUALITY: f32 = 0.5;

/// Hard upper bound for a single recording
pub const MAX_RECORDING_DURATION: Duration = Duration::from_secs(60);

/// Prefix of every file written to the gallery
pub const MEDIA_FILE_PREFIX: &str = "media_";

/// Directory name (under the system temp dir) for captures awaiting save
pub const CAPTURE_TEMP_DIR: &str = "camera-session";

/// Application name used for config and cache directories
pub const APP_NAME: &str = "camera-session";

/// Recording resolution profiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VideoQuality {
    /// 640x480
    Sd480,
    /// 1280x720
    Hd720,
    /// 1920x1080
    #[default]
    P1080,
    /// 3840x2160
    Uhd2160,
}

impl VideoQuality {
    pub const ALL: [VideoQuality; 4] = [
        VideoQuality::Sd480,
        VideoQuality::Hd720,
        VideoQuality::P1080,
        VideoQuality::Uhd2160,
    ];

    /// Output frame size (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            VideoQuality::Sd480 => (640, 480),
            VideoQuality::Hd720 => (1280, 720),
            VideoQuality::P1080 => (1920, 1080),
            VideoQuality::Uhd2160 => (3840, 2160),
        }
    }

    /// Encoder bitrate in kbps
    pub fn bitrate_kbps(&self) -> u32 {
        match self {
            VideoQuality::Sd480 => 2_000,
            VideoQuality::Hd720 => 5_000,
            VideoQuality::P1080 => 8_000,
            VideoQuality::Uhd2160 => 30_000,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            VideoQuality::Sd480 => "480p",
            VideoQuality::Hd720 => "720p",
            VideoQuality::P1080 => "1080p",
            VideoQuality::Uhd2160 => "4K",
        }
    }
}

/// GStreamer timing knobs
pub mod pipeline {
    use std::time::Duration;

    /// Bus poll interval while a recording is running
    pub const BUS_POLL_INTERVAL_MS: u64 = 100;

    /// How long to wait for the muxer to finish after EOS
    pub const EOS_TIMEOUT: Duration = Duration::from_secs(5);

    /// Max queued preview buffers before old ones are dropped
    pub const MAX_BUFFERS: u32 = 2;
}

/// Terminal viewer timing
pub mod timing {
    use std::time::Duration;

    /// Input poll timeout; also bounds the redraw rate
    pub const FRAME_POLL: Duration = Duration::from_millis(16);

    /// Time the headless photo command waits for the sensor to settle
    pub const CAMERA_WARMUP: Duration = Duration::from_millis(500);

    /// Give up waiting for a first frame after this long
    pub const FIRST_FRAME_TIMEOUT: Duration = Duration::from_secs(5);
}

/// Application information utilities
pub mod app_info {
    /// Get the application version from build-time environment
    pub fn version() -> &'static str {
        env!("GIT_VERSION")
    }
}
