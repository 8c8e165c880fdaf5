// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera backend abstraction

//! Shared types for camera backends

use crate::constants::{DEFAULT_PHOTO_QUALITY, MAX_RECORDING_DURATION, VideoQuality};
use crate::errors::CameraError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Result type for camera backend operations
pub type BackendResult<T> = Result<T, CameraError>;

/// Which physical camera feeds the viewfinder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Facing {
    Front,
    #[default]
    Back,
}

impl Facing {
    /// The other camera
    pub fn toggled(self) -> Self {
        match self {
            Facing::Front => Facing::Back,
            Facing::Back => Facing::Front,
        }
    }
}

impl std::fmt::Display for Facing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Facing::Front => write!(f, "front"),
            Facing::Back => write!(f, "back"),
        }
    }
}

impl std::str::FromStr for Facing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "front" => Ok(Facing::Front),
            "back" | "rear" => Ok(Facing::Back),
            other => Err(format!("unknown facing '{}' (expected front or back)", other)),
        }
    }
}

/// Flash behaviour requested for the live preview
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FlashMode {
    #[default]
    Off,
    On,
    Auto,
    Torch,
}

/// Kind of captured media; selects the gallery file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Photo,
    Video,
}

impl MediaKind {
    /// File extension used for the gallery copy
    pub fn extension(&self) -> &'static str {
        match self {
            MediaKind::Photo => "jpg",
            MediaKind::Video => "mp4",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Photo => write!(f, "photo"),
            MediaKind::Video => write!(f, "video"),
        }
    }
}

/// Opaque reference to a captured file that has not been saved yet
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaHandle(PathBuf);

impl MediaHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl std::fmt::Display for MediaHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Still capture request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhotoOptions {
    /// JPEG quality, 0.0..=1.0
    pub quality: f32,
    /// Also return the encoded image inline
    pub base64: bool,
}

impl Default for PhotoOptions {
    fn default() -> Self {
        Self {
            quality: DEFAULT_PHOTO_QUALITY,
            base64: true,
        }
    }
}

impl PhotoOptions {
    /// Quality mapped onto the 1..=100 JPEG scale
    pub fn jpeg_quality(&self) -> u8 {
        (self.quality.clamp(0.01, 1.0) * 100.0).round() as u8
    }
}

/// Video capture request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoOptions {
    /// Recording stops by itself after this long
    pub max_duration: Duration,
    pub quality: VideoQuality,
}

impl Default for VideoOptions {
    fn default() -> Self {
        Self {
            max_duration: MAX_RECORDING_DURATION,
            quality: VideoQuality::P1080,
        }
    }
}

/// Result of a still capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StillCapture {
    pub handle: MediaHandle,
    /// Base64 JPEG payload, present when requested
    pub base64: Option<String>,
}

/// Packed RGB24 frame from the live preview
#[derive(Debug, Clone)]
pub struct PreviewFrame {
    pub width: u32,
    pub height: u32,
    /// Bytes per row
    pub stride: u32,
    pub data: Arc<[u8]>,
}

impl PreviewFrame {
    /// Pixel at (x, y), clamped to the frame
    pub fn rgb_at(&self, x: u32, y: u32) -> (u8, u8, u8) {
        if self.width == 0 || self.height == 0 {
            return (0, 0, 0);
        }
        let x = x.min(self.width - 1);
        let y = y.min(self.height - 1);
        let idx = (y * self.stride + x * 3) as usize;
        match self.data.get(idx..idx + 3) {
            Some(px) => (px[0], px[1], px[2]),
            None => (0, 0, 0),
        }
    }

    /// Copy into a tightly packed image buffer
    pub fn to_rgb_image(&self) -> Option<image::RgbImage> {
        let row = (self.width * 3) as usize;
        let mut packed = Vec::with_capacity(row * self.height as usize);
        for y in 0..self.height as usize {
            let start = y * self.stride as usize;
            packed.extend_from_slice(self.data.get(start..start + row)?);
        }
        image::RgbImage::from_raw(self.width, self.height, packed)
    }
}
