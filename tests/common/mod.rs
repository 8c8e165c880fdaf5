// SPDX-License-Identifier: MPL-2.0

//! Fake collaborators shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use camera_session::CaptureSession;
use camera_session::backends::camera::{
    BackendResult, CameraBackend, Facing, FlashMode, MediaHandle, PhotoOptions, PreviewFrame,
    StillCapture, VideoOptions,
};
use camera_session::backends::permission::StoragePermission;
use camera_session::errors::{CameraError, StorageError};
use camera_session::storage::Filesystem;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

pub const FIXED_EPOCH_MS: i64 = 1_700_000_000_000;

pub fn fixed_clock() -> i64 {
    FIXED_EPOCH_MS
}

/// Camera that writes small placeholder files into `dir`
pub struct FakeCamera {
    dir: PathBuf,
    pub ready: AtomicBool,
    /// Hold captures until `gate` is notified
    pub gated: AtomicBool,
    pub gate: Notify,
    /// Notified when a gated still capture or a recording starts
    pub entered: Notify,
    pub fail_still: AtomicBool,
    stop: Notify,
    recording: AtomicBool,
    pub previews: Mutex<Vec<Facing>>,
    pub flashes: Mutex<Vec<FlashMode>>,
    pub still_options: Mutex<Vec<PhotoOptions>>,
    pub video_options: Mutex<Vec<VideoOptions>>,
    counter: AtomicUsize,
}

impl FakeCamera {
    pub fn new(dir: &Path) -> Arc<Self> {
        Arc::new(Self {
            dir: dir.to_path_buf(),
            ready: AtomicBool::new(true),
            gated: AtomicBool::new(false),
            gate: Notify::new(),
            entered: Notify::new(),
            fail_still: AtomicBool::new(false),
            stop: Notify::new(),
            recording: AtomicBool::new(false),
            previews: Mutex::new(Vec::new()),
            flashes: Mutex::new(Vec::new()),
            still_options: Mutex::new(Vec::new()),
            video_options: Mutex::new(Vec::new()),
            counter: AtomicUsize::new(0),
        })
    }

    fn next_path(&self, ext: &str) -> PathBuf {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        self.dir.join(format!("capture_{}.{}", n, ext))
    }

    async fn wait_gate(&self) {
        if self.gated.load(Ordering::SeqCst) {
            self.entered.notify_one();
            self.gate.notified().await;
        }
    }

    pub fn previews(&self) -> Vec<Facing> {
        self.previews.lock().unwrap().clone()
    }
}

#[async_trait]
impl CameraBackend for FakeCamera {
    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    async fn capture_still(&self, options: &PhotoOptions) -> BackendResult<StillCapture> {
        self.still_options.lock().unwrap().push(*options);
        self.wait_gate().await;
        if self.fail_still.load(Ordering::SeqCst) {
            return Err(CameraError::NoFrameAvailable);
        }
        let path = self.next_path("jpg");
        std::fs::write(&path, b"jpeg")?;
        Ok(StillCapture {
            handle: MediaHandle::new(path),
            base64: None,
        })
    }

    async fn capture_video(&self, options: &VideoOptions) -> BackendResult<MediaHandle> {
        self.video_options.lock().unwrap().push(*options);
        self.recording.store(true, Ordering::SeqCst);
        self.entered.notify_one();
        let _ = tokio::time::timeout(options.max_duration, self.stop.notified()).await;
        self.recording.store(false, Ordering::SeqCst);
        let path = self.next_path("mp4");
        std::fs::write(&path, b"mp4")?;
        Ok(MediaHandle::new(path))
    }

    fn stop_video(&self) -> bool {
        if !self.recording.load(Ordering::SeqCst) {
            return false;
        }
        self.stop.notify_one();
        true
    }

    fn render_preview(&self, facing: Facing, flash: FlashMode) -> BackendResult<()> {
        self.previews.lock().unwrap().push(facing);
        self.flashes.lock().unwrap().push(flash);
        Ok(())
    }

    fn latest_frame(&self) -> Option<PreviewFrame> {
        None
    }
}

/// Permission with a fixed answer that counts how often it was asked
pub struct FakePermission {
    granted: AtomicBool,
    pub calls: AtomicUsize,
}

impl FakePermission {
    pub fn new(granted: bool) -> Arc<Self> {
        Arc::new(Self {
            granted: AtomicBool::new(granted),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn set_granted(&self, granted: bool) {
        self.granted.store(granted, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StoragePermission for FakePermission {
    async fn request_storage_permission(&self) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.granted.load(Ordering::SeqCst)
    }
}

/// Filesystem that records moves instead of performing them
#[derive(Default)]
pub struct FakeFilesystem {
    pub fail: AtomicBool,
    pub moves: Mutex<Vec<(PathBuf, PathBuf)>>,
}

impl FakeFilesystem {
    pub fn new(fail: bool) -> Arc<Self> {
        Arc::new(Self {
            fail: AtomicBool::new(fail),
            moves: Mutex::new(Vec::new()),
        })
    }

    pub fn moves(&self) -> Vec<(PathBuf, PathBuf)> {
        self.moves.lock().unwrap().clone()
    }
}

#[async_trait]
impl Filesystem for FakeFilesystem {
    async fn move_file(&self, source: &Path, destination: &Path) -> Result<(), StorageError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(StorageError::Io {
                source: source.to_path_buf(),
                destination: destination.to_path_buf(),
                message: "disk full".to_string(),
            });
        }
        self.moves
            .lock()
            .unwrap()
            .push((source.to_path_buf(), destination.to_path_buf()));
        Ok(())
    }
}

/// Log output captured from the current thread's tracing dispatcher
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    /// Route this thread's tracing output into the buffer until the guard drops
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Session wired to fakes with a camera already attached
pub struct Harness {
    pub session: Arc<CaptureSession>,
    pub camera: Arc<FakeCamera>,
    pub permission: Arc<FakePermission>,
    pub filesystem: Arc<FakeFilesystem>,
    pub gallery: PathBuf,
    _temp: tempfile::TempDir,
}

impl Harness {
    pub fn new(granted: bool, move_fails: bool) -> Self {
        let temp = tempfile::tempdir().unwrap();
        let gallery = temp.path().join("Pictures");
        let camera = FakeCamera::new(temp.path());
        let permission = FakePermission::new(granted);
        let filesystem = FakeFilesystem::new(move_fails);

        let session = CaptureSession::new(permission.clone(), filesystem.clone(), gallery.clone())
            .with_clock(fixed_clock);
        session.attach_camera(camera.clone()).unwrap();

        Self {
            session: Arc::new(session),
            camera,
            permission,
            filesystem,
            gallery,
            _temp: temp,
        }
    }
}
