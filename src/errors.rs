// SPDX-License-Identifier: MPL-2.0

//! Error types for the camera session

use std::fmt;
use std::path::PathBuf;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Result type for capture session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Top-level error used by the binary entry points
#[derive(Debug)]
pub enum AppError {
    /// Configuration could not be read or written
    Config(String),
    /// Camera could not be set up
    Camera(CameraError),
    /// A session operation failed
    Session(SessionError),
}

/// Camera collaborator errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    /// No preview frame has arrived yet
    NoFrameAvailable,
    /// GStreamer pipeline failure
    Pipeline(String),
    /// Still image encoding failed
    Encoding(String),
    /// Temp file could not be written
    Io(String),
    /// A recording is already running
    RecordingInProgress,
}

/// Filesystem collaborator errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Source file does not exist
    MissingSource(PathBuf),
    /// Move failed
    Io {
        source: PathBuf,
        destination: PathBuf,
        message: String,
    },
}

/// Capture session errors
///
/// None of these change session state; the operation that produced one
/// left the session where it was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Another capture or save is in flight
    Busy,
    /// Operation not legal in the current mode
    InvalidState(&'static str),
    /// Storage permission was not granted
    PermissionDenied,
    /// Camera collaborator failed
    Camera(CameraError),
    /// Filesystem collaborator failed
    Storage(StorageError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Camera(e) => write!(f, "Camera error: {}", e),
            AppError::Session(e) => write!(f, "{}", e),
        }
    }
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::NoFrameAvailable => write!(f, "No frame available for capture"),
            CameraError::Pipeline(msg) => write!(f, "Pipeline error: {}", msg),
            CameraError::Encoding(msg) => write!(f, "Encoding failed: {}", msg),
            CameraError::Io(msg) => write!(f, "I/O error: {}", msg),
            CameraError::RecordingInProgress => write!(f, "Recording already in progress"),
        }
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::MissingSource(path) => {
                write!(f, "Source file not found: {}", path.display())
            }
            StorageError::Io {
                source,
                destination,
                message,
            } => write!(
                f,
                "Failed to move {} to {}: {}",
                source.display(),
                destination.display(),
                message
            ),
        }
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Busy => write!(f, "Another operation is in progress"),
            SessionError::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            SessionError::PermissionDenied => write!(f, "Permission denied"),
            SessionError::Camera(e) => write!(f, "Camera error: {}", e),
            SessionError::Storage(e) => write!(f, "Storage error: {}", e),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for CameraError {}
impl std::error::Error for StorageError {}
impl std::error::Error for SessionError {}

impl From<CameraError> for AppError {
    fn from(err: CameraError) -> Self {
        AppError::Camera(err)
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        AppError::Session(err)
    }
}

impl From<CameraError> for SessionError {
    fn from(err: CameraError) -> Self {
        SessionError::Camera(err)
    }
}

impl From<StorageError> for SessionError {
    fn from(err: StorageError) -> Self {
        SessionError::Storage(err)
    }
}

impl From<std::io::Error> for CameraError {
    fn from(err: std::io::Error) -> Self {
        CameraError::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_becomes_camera_error() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        assert_eq!(CameraError::from(io), CameraError::Io("read-only".to_string()));
    }

    #[test]
    fn test_errors_wrap_upwards() {
        let session: SessionError = CameraError::NoFrameAvailable.into();
        assert_eq!(session, SessionError::Camera(CameraError::NoFrameAvailable));

        let app: AppError = session.into();
        assert_eq!(app.to_string(), "Camera error: No frame available for capture");
        assert!(matches!(
            AppError::from(CameraError::RecordingInProgress),
            AppError::Camera(CameraError::RecordingInProgress)
        ));
    }
}
