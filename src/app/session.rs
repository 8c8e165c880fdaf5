// SPDX-License-Identifier: GPL-3.0-only

//! Capture session: live viewfinder, capture, preview, save, cancel
//!
//! ```text
//! Live --capture_photo--> PhotoPreview --save_media / cancel_media--> Live
//! Live --start_recording--> VideoPreview --save_media / cancel_media--> Live
//! ```
//!
//! Failures never move the state machine. `capture_photo`, `start_recording`
//! and `save_media` are single-flight: while one runs, the others (and
//! repeats of itself) return [`SessionError::Busy`].

use crate::app::state::{Mode, PreviewState, RecordingState, SessionSnapshot, SessionState};
use crate::backends::camera::{
    CameraBackend, Facing, FlashMode, MediaHandle, MediaKind, PhotoOptions, StillCapture,
    VideoOptions,
};
use crate::backends::permission::StoragePermission;
use crate::errors::{SessionError, SessionResult};
use crate::storage::{Filesystem, destination_path, epoch_millis};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info, warn};

/// Clears the busy flag when the guarded operation ends, however it ends
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> SessionResult<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| Self(flag))
            .map_err(|_| SessionError::Busy)
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// View-model owning the session state and its collaborators
///
/// All methods take `&self`; share it through an `Arc` between the UI loop
/// and the tasks running its async operations.
pub struct CaptureSession {
    state: Mutex<SessionState>,
    camera: Mutex<Option<Arc<dyn CameraBackend>>>,
    permission: Arc<dyn StoragePermission>,
    filesystem: Arc<dyn Filesystem>,
    gallery_dir: PathBuf,
    photo_options: PhotoOptions,
    video_options: VideoOptions,
    flash: FlashMode,
    busy: AtomicBool,
    clock: fn() -> i64,
}

impl CaptureSession {
    /// Create a session in live mode with the back camera and no camera attached
    pub fn new(
        permission: Arc<dyn StoragePermission>,
        filesystem: Arc<dyn Filesystem>,
        gallery_dir: PathBuf,
    ) -> Self {
        Self {
            state: Mutex::new(SessionState::new(Facing::Back)),
            camera: Mutex::new(None),
            permission,
            filesystem,
            gallery_dir,
            photo_options: PhotoOptions::default(),
            video_options: VideoOptions::default(),
            flash: FlashMode::Off,
            busy: AtomicBool::new(false),
            clock: epoch_millis,
        }
    }

    pub fn with_facing(self, facing: Facing) -> Self {
        self.state().facing = facing;
        self
    }

    pub fn with_photo_options(mut self, options: PhotoOptions) -> Self {
        self.photo_options = options;
        self
    }

    pub fn with_video_options(mut self, options: VideoOptions) -> Self {
        self.video_options = options;
        self
    }

    /// Flash mode passed to the camera whenever the preview starts
    pub fn with_flash(mut self, flash: FlashMode) -> Self {
        self.flash = flash;
        self
    }

    /// Replace the millisecond clock used for gallery file names
    pub fn with_clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = clock;
        self
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn camera(&self) -> Option<Arc<dyn CameraBackend>> {
        self.camera
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn ready_camera(&self) -> Option<Arc<dyn CameraBackend>> {
        self.camera().filter(|camera| camera.is_ready())
    }

    /// Mount the camera and start its live preview with the current facing
    pub fn attach_camera(&self, camera: Arc<dyn CameraBackend>) -> SessionResult<()> {
        let facing = self.state().facing;
        camera.render_preview(facing, self.flash)?;
        *self.camera.lock().unwrap_or_else(PoisonError::into_inner) = Some(camera);
        info!(%facing, "Camera attached");
        Ok(())
    }

    /// Unmount the camera; captures become no-ops until one is attached again
    pub fn detach_camera(&self) -> Option<Arc<dyn CameraBackend>> {
        self.camera
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    pub fn gallery_dir(&self) -> &Path {
        &self.gallery_dir
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::from(&*self.state())
    }

    pub fn mode(&self) -> Mode {
        self.state().mode()
    }

    pub fn facing(&self) -> Facing {
        self.state().facing
    }

    pub fn is_recording(&self) -> bool {
        self.state().is_recording()
    }

    pub fn captured_uri(&self) -> Option<MediaHandle> {
        self.state().captured_uri().cloned()
    }

    fn ensure_live_idle(&self, what: &'static str) -> SessionResult<()> {
        let state = self.state();
        if state.mode() != Mode::Live || state.is_recording() {
            debug!(mode = ?state.mode(), recording = state.is_recording(), what, "Rejected");
            return Err(SessionError::InvalidState(what));
        }
        Ok(())
    }

    /// Capture a still into a temp file and switch to photo preview
    ///
    /// Returns `Ok(None)` without touching anything when no ready camera is
    /// attached.
    pub async fn capture_photo(&self) -> SessionResult<Option<StillCapture>> {
        let Some(camera) = self.ready_camera() else {
            debug!("Camera not ready, ignoring photo capture");
            return Ok(None);
        };
        let _busy = BusyGuard::acquire(&self.busy)?;
        self.ensure_live_idle("photo capture needs the live viewfinder")?;

        info!(quality = self.photo_options.quality, "Capturing photo...");
        let capture = camera
            .capture_still(&self.photo_options)
            .await
            .inspect_err(|e| error!(error = %e, "Photo capture failed"))?;

        self.state().preview = PreviewState::Photo(capture.handle.clone());
        info!(uri = %capture.handle, "Photo captured");
        Ok(Some(capture))
    }

    /// Record until stopped or the duration cap, then switch to video preview
    ///
    /// Suspends for the whole recording. Returns `Ok(None)` when no ready
    /// camera is attached.
    pub async fn start_recording(&self) -> SessionResult<Option<MediaHandle>> {
        let Some(camera) = self.ready_camera() else {
            debug!("Camera not ready, ignoring record request");
            return Ok(None);
        };
        let _busy = BusyGuard::acquire(&self.busy)?;
        self.ensure_live_idle("recording needs the live viewfinder")?;

        let recording = RecordingState::start();
        if let RecordingState::Recording { session_id, .. } = recording {
            info!(
                %session_id,
                max_secs = self.video_options.max_duration.as_secs(),
                quality = self.video_options.quality.display_name(),
                "Starting video recording"
            );
        }
        self.state().recording = recording;

        let result = camera.capture_video(&self.video_options).await;

        let mut state = self.state();
        let finished = state.recording.stop();
        match result {
            Ok(handle) => {
                info!(
                    uri = %handle,
                    secs = finished.elapsed_duration(),
                    "Recording finished"
                );
                state.preview = PreviewState::Video(handle.clone());
                Ok(Some(handle))
            }
            Err(e) => {
                error!(error = %e, "Recording failed");
                Err(e.into())
            }
        }
    }

    /// Ask the camera to end the current recording early
    ///
    /// The pending [`CaptureSession::start_recording`] resolves once the
    /// camera has flushed the file. Returns whether a stop was signalled.
    pub fn stop_recording(&self) -> bool {
        if !self.is_recording() {
            debug!("Stop requested while not recording");
            return false;
        }
        match self.camera() {
            Some(camera) => camera.stop_video(),
            None => {
                warn!("Recording without an attached camera");
                false
            }
        }
    }

    /// Switch between front and back camera
    ///
    /// Ignored outside the live viewfinder and while recording.
    pub fn toggle_facing(&self) -> Facing {
        let facing = {
            let mut state = self.state();
            if state.mode() != Mode::Live || state.is_recording() {
                debug!(mode = ?state.mode(), "Ignoring facing toggle");
                return state.facing;
            }
            state.facing = state.facing.toggled();
            state.facing
        };

        info!(%facing, "Switched camera");
        if let Some(camera) = self.camera()
            && let Err(e) = camera.render_preview(facing, self.flash)
        {
            warn!(error = %e, %facing, "Failed to restart preview");
        }
        facing
    }

    /// Ask for gallery write access; never cached
    pub async fn request_storage_permission(&self) -> bool {
        self.permission.request_storage_permission().await
    }

    /// Move captured media into the gallery and return to live mode
    ///
    /// The permission check always runs before the move. On denial or a
    /// failed move the preview stays as it was so the user can retry or
    /// cancel.
    pub async fn save_media(&self, handle: &MediaHandle, kind: MediaKind) -> SessionResult<PathBuf> {
        let _busy = BusyGuard::acquire(&self.busy)?;

        if !self.request_storage_permission().await {
            error!(%kind, "Permission denied");
            return Err(SessionError::PermissionDenied);
        }

        let destination = destination_path(&self.gallery_dir, kind, (self.clock)());
        if let Err(e) = self.filesystem.move_file(handle.path(), &destination).await {
            error!(%kind, error = %e, "Error saving media");
            return Err(e.into());
        }

        info!(%kind, path = %destination.display(), "Saved to gallery");
        let mut state = self.state();
        if state.preview.kind() == Some(kind) {
            state.preview = PreviewState::None;
        }
        Ok(destination)
    }

    /// Save whatever is currently previewed
    pub async fn save_preview(&self) -> SessionResult<PathBuf> {
        let (handle, kind) = {
            let state = self.state();
            match (state.preview.handle(), state.preview.kind()) {
                (Some(handle), Some(kind)) => (handle.clone(), kind),
                _ => return Err(SessionError::InvalidState("nothing to save")),
            }
        };
        self.save_media(&handle, kind).await
    }

    /// Drop the preview of `kind` and return to live mode
    ///
    /// The temp file is left where it is.
    pub fn cancel_media(&self, kind: MediaKind) {
        let mut state = self.state();
        if state.preview.kind() == Some(kind) {
            debug!(%kind, uri = ?state.preview.handle(), "Discarding preview");
            state.preview = PreviewState::None;
        }
    }

    /// Cancel whatever is currently previewed
    pub fn cancel_preview(&self) {
        let kind = self.state().preview.kind();
        if let Some(kind) = kind {
            self.cancel_media(kind);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_guard_is_exclusive_and_released() {
        let flag = AtomicBool::new(false);
        let guard = BusyGuard::acquire(&flag).unwrap();
        assert_eq!(BusyGuard::acquire(&flag).err(), Some(SessionError::Busy));
        drop(guard);
        assert!(BusyGuard::acquire(&flag).is_ok());
    }
}
