// SPDX-License-Identifier: MPL-2.0

//! Camera backend abstraction
//!
//! ```text
//! ┌─────────────────────┐
//! │   CaptureSession    │
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │ CameraBackend Trait │  ← capture, record, preview
//! └──────────┬──────────┘
//!            │
//!            ▼
//!      ┌───────────┐
//!      │ GstCamera │  ← GStreamer / V4L2
//!      └───────────┘
//! ```

pub mod v4l2;
pub mod types;

pub use v4l2::{DeviceMap, GstCamera};
pub use types::*;

use async_trait::async_trait;

/// Camera collaborator used by the capture session
///
/// The session never talks to hardware directly; it only awaits these calls.
#[async_trait]
pub trait CameraBackend: Send + Sync {
    /// Whether the preview is streaming and captures can be served
    fn is_ready(&self) -> bool;

    /// Capture a single still frame into a temporary file
    async fn capture_still(&self, options: &PhotoOptions) -> BackendResult<StillCapture>;

    /// Record video into a temporary file
    ///
    /// Resolves when the recording ends, either because `options.max_duration`
    /// elapsed or because [`CameraBackend::stop_video`] was called.
    async fn capture_video(&self, options: &VideoOptions) -> BackendResult<MediaHandle>;

    /// Ask an in-flight recording to finish
    ///
    /// Returns `false` if nothing was recording. The pending
    /// `capture_video` resolves once the file has been flushed.
    fn stop_video(&self) -> bool;

    /// (Re)start the live preview for the given camera
    fn render_preview(&self, facing: Facing, flash: FlashMode) -> BackendResult<()>;

    /// Most recent live preview frame
    fn latest_frame(&self) -> Option<PreviewFrame>;
}
