// SPDX-License-Identifier: MPL-2.0

//! Gallery storage: where saved media goes and how it gets there

use crate::backends::camera::MediaKind;
use crate::constants::MEDIA_FILE_PREFIX;
use crate::errors::StorageError;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Filesystem collaborator
#[async_trait]
pub trait Filesystem: Send + Sync {
    /// Move `source` to `destination`, replacing nothing on failure
    async fn move_file(&self, source: &Path, destination: &Path) -> Result<(), StorageError>;
}

/// Moves files on the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFilesystem;

#[async_trait]
impl Filesystem for LocalFilesystem {
    async fn move_file(&self, source: &Path, destination: &Path) -> Result<(), StorageError> {
        let io_err = |e: std::io::Error| StorageError::Io {
            source: source.to_path_buf(),
            destination: destination.to_path_buf(),
            message: e.to_string(),
        };

        if !tokio::fs::try_exists(source).await.unwrap_or(false) {
            return Err(StorageError::MissingSource(source.to_path_buf()));
        }
        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }

        match tokio::fs::rename(source, destination).await {
            Ok(()) => Ok(()),
            // Temp dir and gallery often live on different filesystems
            Err(e) if e.kind() == ErrorKind::CrossesDevices => {
                debug!(
                    source = %source.display(),
                    destination = %destination.display(),
                    "Rename crosses devices, copying instead"
                );
                if let Err(e) = tokio::fs::copy(source, destination).await {
                    let _ = tokio::fs::remove_file(destination).await;
                    return Err(io_err(e));
                }
                tokio::fs::remove_file(source).await.map_err(io_err)
            }
            Err(e) => Err(io_err(e)),
        }
    }
}

/// The user's pictures directory
///
/// Falls back to `$HOME/Pictures` when the XDG lookup fails.
pub fn pictures_directory() -> PathBuf {
    dirs::picture_dir().unwrap_or_else(|| {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        Path::new(&home).join("Pictures")
    })
}

/// Gallery path for a capture: `<dir>/media_<epoch_ms>.<jpg|mp4>`
pub fn destination_path(dir: &Path, kind: MediaKind, epoch_ms: i64) -> PathBuf {
    dir.join(format!(
        "{}{}.{}",
        MEDIA_FILE_PREFIX,
        epoch_ms,
        kind.extension()
    ))
}

/// Milliseconds since the Unix epoch
pub fn epoch_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
