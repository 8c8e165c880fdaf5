// SPDX-License-Identifier: MPL-2.0

//! Desktop permission broker
//!
//! There is no OS prompt for the pictures directory on a desktop, so the
//! gallery directory itself is the permission: granted when it exists and is
//! writable, requested by creating it.

use super::{PermissionBroker, PermissionId, PermissionStatus, PromptCopy};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{info, warn};

/// Broker backed by a gallery directory
#[derive(Debug, Clone)]
pub struct DirectoryBroker {
    dir: PathBuf,
}

impl DirectoryBroker {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    async fn status(&self) -> PermissionStatus {
        match tokio::fs::metadata(&self.dir).await {
            Ok(meta) if meta.is_dir() && !meta.permissions().readonly() => {
                PermissionStatus::Granted
            }
            Ok(meta) if meta.is_dir() => PermissionStatus::Blocked,
            Ok(_) => PermissionStatus::Unavailable,
            Err(_) => PermissionStatus::Denied,
        }
    }
}

#[async_trait]
impl PermissionBroker for DirectoryBroker {
    async fn check(&self, _id: PermissionId) -> PermissionStatus {
        self.status().await
    }

    async fn request(&self, id: PermissionId, prompt: &PromptCopy) -> PermissionStatus {
        info!(
            ?id,
            title = %prompt.title,
            message = %prompt.message,
            dir = %self.dir.display(),
            "Requesting gallery access"
        );
        if self.status().await == PermissionStatus::Denied
            && let Err(e) = tokio::fs::create_dir_all(&self.dir).await
        {
            warn!(dir = %self.dir.display(), error = %e, "Failed to create gallery directory");
            return PermissionStatus::Denied;
        }
        self.status().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_directory_is_denied_until_requested() {
        let root = tempfile::tempdir().unwrap();
        let broker = DirectoryBroker::new(root.path().join("Pictures"));

        assert_eq!(
            broker.check(PermissionId::PhotoLibrary).await,
            PermissionStatus::Denied
        );
        assert_eq!(
            broker
                .request(PermissionId::PhotoLibrary, &PromptCopy::save_media())
                .await,
            PermissionStatus::Granted
        );
        assert!(root.path().join("Pictures").is_dir());
    }

    #[tokio::test]
    async fn test_file_in_place_of_directory_is_unavailable() {
        let root = tempfile::tempdir().unwrap();
        let path = root.path().join("Pictures");
        std::fs::write(&path, b"not a dir").unwrap();
        let broker = DirectoryBroker::new(path);

        assert_eq!(
            broker.check(PermissionId::WriteExternalStorage).await,
            PermissionStatus::Unavailable
        );
    }
}
