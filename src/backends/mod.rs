// SPDX-License-Identifier: MPL-2.0

//! Collaborators reached by the capture session
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               CaptureSession                │
//! └────────────────────┬────────────────────────┘
//!                      │
//! ┌────────────────────┴────────────────────────┐
//! │              Backend Layer                  │
//! │  ┌─────────────┐    ┌──────────────────┐    │
//! │  │   Camera    │    │   Permission     │    │
//! │  │ (GStreamer) │    │   (directory)    │    │
//! │  └─────────────┘    └──────────────────┘    │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! The filesystem collaborator lives in [`crate::storage`].

pub mod camera;
pub mod permission;
