// SPDX-License-Identifier: GPL-3.0-only

//! Capture session state

use crate::backends::camera::{Facing, MediaHandle, MediaKind};
use std::time::Instant;
use uuid::Uuid;

/// Which UI the session is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Live viewfinder
    Live,
    /// Reviewing a captured photo
    PhotoPreview,
    /// Reviewing a recorded video
    VideoPreview,
}

/// Captured media waiting for save or cancel
///
/// A single variant, so a photo and a video can never both be pending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PreviewState {
    #[default]
    None,
    Photo(MediaHandle),
    Video(MediaHandle),
}

impl PreviewState {
    pub fn mode(&self) -> Mode {
        match self {
            PreviewState::None => Mode::Live,
            PreviewState::Photo(_) => Mode::PhotoPreview,
            PreviewState::Video(_) => Mode::VideoPreview,
        }
    }

    pub fn handle(&self) -> Option<&MediaHandle> {
        match self {
            PreviewState::None => None,
            PreviewState::Photo(handle) | PreviewState::Video(handle) => Some(handle),
        }
    }

    pub fn kind(&self) -> Option<MediaKind> {
        match self {
            PreviewState::None => None,
            PreviewState::Photo(_) => Some(MediaKind::Photo),
            PreviewState::Video(_) => Some(MediaKind::Video),
        }
    }
}

/// Recording state machine
///
/// Simple two-state design: either recording or not.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RecordingState {
    /// Not recording
    #[default]
    Idle,
    /// Actively recording
    Recording {
        /// When recording started
        started_at: Instant,
        /// Correlates log lines of one recording
        session_id: Uuid,
    },
}

impl RecordingState {
    /// Check if currently recording
    pub fn is_recording(&self) -> bool {
        matches!(self, RecordingState::Recording { .. })
    }

    /// Elapsed recording time in whole seconds
    pub fn elapsed_duration(&self) -> u64 {
        match self {
            RecordingState::Idle => 0,
            RecordingState::Recording { started_at, .. } => started_at.elapsed().as_secs(),
        }
    }

    /// Start recording
    pub fn start() -> Self {
        RecordingState::Recording {
            started_at: Instant::now(),
            session_id: Uuid::new_v4(),
        }
    }

    /// Stop recording, returning the previous state
    pub fn stop(&mut self) -> Self {
        std::mem::replace(self, RecordingState::Idle)
    }
}

/// In-memory state of one capture session
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub facing: Facing,
    pub recording: RecordingState,
    pub preview: PreviewState,
}

impl SessionState {
    pub fn new(facing: Facing) -> Self {
        Self {
            facing,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> Mode {
        self.preview.mode()
    }

    pub fn is_recording(&self) -> bool {
        self.recording.is_recording()
    }

    pub fn captured_uri(&self) -> Option<&MediaHandle> {
        self.preview.handle()
    }
}

/// Read-only copy of the session state for renderers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub mode: Mode,
    pub facing: Facing,
    pub is_recording: bool,
    /// Whole seconds since the current recording started
    pub recording_secs: u64,
    pub captured_uri: Option<MediaHandle>,
}

impl From<&SessionState> for SessionSnapshot {
    fn from(state: &SessionState) -> Self {
        Self {
            mode: state.mode(),
            facing: state.facing,
            is_recording: state.is_recording(),
            recording_secs: state.recording.elapsed_duration(),
            captured_uri: state.captured_uri().cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_follows_preview() {
        let mut state = SessionState::new(Facing::Back);
        assert_eq!(state.mode(), Mode::Live);
        assert!(state.captured_uri().is_none());

        state.preview = PreviewState::Photo(MediaHandle::new("/tmp/a.jpg"));
        assert_eq!(state.mode(), Mode::PhotoPreview);
        assert_eq!(state.preview.kind(), Some(MediaKind::Photo));

        state.preview = PreviewState::Video(MediaHandle::new("/tmp/a.mp4"));
        assert_eq!(state.mode(), Mode::VideoPreview);
        assert_eq!(
            state.captured_uri(),
            Some(&MediaHandle::new("/tmp/a.mp4"))
        );
    }

    #[test]
    fn test_recording_start_stop() {
        let mut recording = RecordingState::start();
        assert!(recording.is_recording());
        let previous = recording.stop();
        assert!(previous.is_recording());
        assert_eq!(recording, RecordingState::Idle);
        assert_eq!(recording.elapsed_duration(), 0);
    }
}
