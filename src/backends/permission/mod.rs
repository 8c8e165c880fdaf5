// SPDX-License-Identifier: MPL-2.0

//! Storage permission abstraction
//!
//! Two layers:
//! - [`PermissionBroker`]: the raw check/request capability of the platform
//! - [`StoragePermission`]: "may I write to the gallery?", answered by one of
//!   two strategies chosen once at startup
//!
//! The answer is never cached; every save asks again.

pub mod directory;

pub use directory::DirectoryBroker;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Platform permission identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PermissionId {
    /// Write access to shared external storage
    WriteExternalStorage,
    /// Access to the photo library
    PhotoLibrary,
}

/// Broker answer for a permission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
    /// Denied and the broker will not ask again
    Blocked,
    /// Not supported here
    Unavailable,
}

impl PermissionStatus {
    pub fn is_granted(&self) -> bool {
        matches!(self, PermissionStatus::Granted)
    }
}

/// Copy shown to the user when a permission is requested
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptCopy {
    pub title: String,
    pub message: String,
    pub button_positive: String,
    pub button_negative: String,
}

impl PromptCopy {
    /// Prompt used before saving captured media
    pub fn save_media() -> Self {
        Self {
            title: "Permission to save media".to_string(),
            message: "We need your permission to save the media to your gallery".to_string(),
            button_positive: "OK".to_string(),
            button_negative: "Cancel".to_string(),
        }
    }
}

/// Raw platform permission capability
#[async_trait]
pub trait PermissionBroker: Send + Sync {
    /// Current status without prompting
    async fn check(&self, id: PermissionId) -> PermissionStatus;

    /// Ask the user (or the platform) for the permission
    async fn request(&self, id: PermissionId, prompt: &PromptCopy) -> PermissionStatus;
}

/// "May captured media be written to the gallery?"
#[async_trait]
pub trait StoragePermission: Send + Sync {
    async fn request_storage_permission(&self) -> bool;
}

/// Which storage permission flow to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PermissionStrategy {
    /// Always prompt for write access to external storage
    Prompt,
    /// Check photo library access first, prompt only if missing
    #[default]
    CheckThenRequest,
}

/// Prompt for external storage write access on every save
pub struct PromptStrategy {
    broker: Arc<dyn PermissionBroker>,
    prompt: PromptCopy,
}

impl PromptStrategy {
    pub fn new(broker: Arc<dyn PermissionBroker>) -> Self {
        Self {
            broker,
            prompt: PromptCopy::save_media(),
        }
    }
}

#[async_trait]
impl StoragePermission for PromptStrategy {
    async fn request_storage_permission(&self) -> bool {
        let status = self
            .broker
            .request(PermissionId::WriteExternalStorage, &self.prompt)
            .await;
        debug!(?status, "Storage write permission requested");
        status.is_granted()
    }
}

/// Check photo library access, requesting it only when not yet granted
pub struct CheckThenRequestStrategy {
    broker: Arc<dyn PermissionBroker>,
    prompt: PromptCopy,
}

impl CheckThenRequestStrategy {
    pub fn new(broker: Arc<dyn PermissionBroker>) -> Self {
        Self {
            broker,
            prompt: PromptCopy::save_media(),
        }
    }
}

#[async_trait]
impl StoragePermission for CheckThenRequestStrategy {
    async fn request_storage_permission(&self) -> bool {
        let status = self.broker.check(PermissionId::PhotoLibrary).await;
        if status.is_granted() {
            return true;
        }
        debug!(?status, "Photo library not granted, requesting");
        let result = self
            .broker
            .request(PermissionId::PhotoLibrary, &self.prompt)
            .await;
        debug!(?result, "Photo library permission requested");
        result.is_granted()
    }
}

/// Build the storage permission flow for the configured strategy
pub fn storage_permission(
    strategy: PermissionStrategy,
    broker: Arc<dyn PermissionBroker>,
) -> Arc<dyn StoragePermission> {
    info!(?strategy, "Using storage permission strategy");
    match strategy {
        PermissionStrategy::Prompt => Arc::new(PromptStrategy::new(broker)),
        PermissionStrategy::CheckThenRequest => Arc::new(CheckThenRequestStrategy::new(broker)),
    }
}
