// SPDX-License-Identifier: MPL-2.0

//! Camera session - live viewfinder, capture, preview and gallery save
//!
//! # Architecture
//!
//! - [`app`]: the `CaptureSession` view-model and its state
//! - [`backends`]: camera and permission collaborators
//! - [`storage`]: filesystem collaborator and gallery paths
//! - [`config`]: user configuration
//! - [`terminal`]: terminal viewfinder front end
//!
//! # Example
//!
//! ```ignore
//! let (session, camera) = camera_session::app::desktop_session(&config)?;
//! session.attach_camera(camera)?;
//! session.capture_photo().await?;
//! session.save_preview().await?;
//! ```

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod storage;
pub mod terminal;

// Re-export commonly used types
pub use app::{CaptureSession, Mode, PreviewState, SessionSnapshot};
pub use backends::camera::{CameraBackend, Facing, MediaHandle, MediaKind};
pub use config::Config;
pub use errors::{AppError, SessionError};
