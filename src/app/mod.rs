// SPDX-License-Identifier: MPL-2.0

//! Application core
//!
//! - `state`: session state types (Mode, PreviewState, RecordingState)
//! - `session`: the `CaptureSession` view-model and its lifecycle operations
//!
//! Front ends (the terminal viewer and the CLI) only talk to
//! [`CaptureSession`]; they never reach the collaborators directly.

pub mod session;
pub mod state;

pub use session::CaptureSession;
pub use state::{Mode, PreviewState, RecordingState, SessionSnapshot, SessionState};

use crate::backends::camera::{GstCamera, PhotoOptions, VideoOptions};
use crate::backends::permission::{DirectoryBroker, storage_permission};
use crate::config::Config;
use crate::constants::CAPTURE_TEMP_DIR;
use crate::errors::AppResult;
use crate::storage::LocalFilesystem;
use std::sync::Arc;
use tracing::info;

/// Wire a session to the desktop collaborators described by `config`
///
/// The GStreamer camera is created but not attached; callers attach it
/// when their viewfinder is ready to show frames.
pub fn desktop_session(config: &Config) -> AppResult<(CaptureSession, Arc<GstCamera>)> {
    let gallery_dir = config.gallery_dir();
    let broker = Arc::new(DirectoryBroker::new(gallery_dir.clone()));
    let permission = storage_permission(config.permission_strategy, broker);

    let session = CaptureSession::new(permission, Arc::new(LocalFilesystem), gallery_dir.clone())
        .with_facing(config.default_facing)
        .with_photo_options(PhotoOptions {
            quality: config.photo_quality,
            ..PhotoOptions::default()
        })
        .with_video_options(VideoOptions {
            max_duration: config.max_recording_duration(),
            quality: config.video_quality,
        })
        .with_flash(config.flash_mode);

    let temp_dir = std::env::temp_dir().join(CAPTURE_TEMP_DIR);
    let camera = Arc::new(GstCamera::new(config.devices.clone(), temp_dir)?);

    info!(gallery = %gallery_dir.display(), "Desktop session ready");
    Ok((session, camera))
}
