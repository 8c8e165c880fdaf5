// SPDX-License-Identifier: MPL-2.0

//! GStreamer camera backed by V4L2 devices
//!
//! The live preview runs as `v4l2src ! videoconvert ! appsink` and keeps the
//! most recent RGB frame around. Stills are encoded from that frame. A
//! recording takes the device over: the preview pipeline is torn down, an
//! encoding pipeline writes an MP4, and the preview comes back afterwards.

use super::CameraBackend;
use super::types::*;
use crate::constants::pipeline;
use crate::errors::CameraError;
use async_trait::async_trait;
use base64::Engine;
use gstreamer as gst;
use gstreamer::prelude::*;
use gstreamer_app::AppSink;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

/// V4L2 device path per facing
///
/// `None` lets `v4l2src` pick its default device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceMap {
    pub front: Option<String>,
    pub back: Option<String>,
}

impl DeviceMap {
    pub fn device_for(&self, facing: Facing) -> Option<&str> {
        match facing {
            Facing::Front => self.front.as_deref(),
            Facing::Back => self.back.as_deref(),
        }
    }
}

#[derive(Default)]
struct StopState {
    sender: Option<oneshot::Sender<()>>,
    pending: bool,
}

/// Stop channel of the running recording
///
/// A stop that lands before the recording has armed the channel is held
/// and delivered on [`StopSignal::arm`].
#[derive(Default)]
struct StopSignal(Mutex<StopState>);

impl StopSignal {
    fn state(&self) -> MutexGuard<'_, StopState> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn arm(&self) -> oneshot::Receiver<()> {
        let (tx, rx) = oneshot::channel();
        let mut state = self.state();
        if std::mem::take(&mut state.pending) {
            debug!("Stop arrived before recording started");
            let _ = tx.send(());
        } else {
            state.sender = Some(tx);
        }
        rx
    }

    fn fire(&self) -> bool {
        let mut state = self.state();
        match state.sender.take() {
            Some(tx) => tx.send(()).is_ok(),
            None => {
                state.pending = true;
                true
            }
        }
    }

    fn disarm(&self) {
        *self.state() = StopState::default();
    }
}

#[derive(Default)]
struct Inner {
    preview: Option<gst::Pipeline>,
    facing: Facing,
    recording: bool,
}

/// Camera collaborator built on GStreamer
pub struct GstCamera {
    devices: DeviceMap,
    temp_dir: PathBuf,
    inner: Mutex<Inner>,
    latest: Arc<Mutex<Option<PreviewFrame>>>,
    stop: StopSignal,
}

impl GstCamera {
    /// Initialize GStreamer and create an idle camera
    ///
    /// Nothing streams until [`CameraBackend::render_preview`] is called.
    pub fn new(devices: DeviceMap, temp_dir: PathBuf) -> BackendResult<Self> {
        gst::init().map_err(|e| CameraError::Pipeline(format!("GStreamer init failed: {}", e)))?;
        info!(?devices, temp_dir = %temp_dir.display(), "Camera backend created");
        Ok(Self {
            devices,
            temp_dir,
            inner: Mutex::new(Inner::default()),
            latest: Arc::new(Mutex::new(None)),
            stop: StopSignal::default(),
        })
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn temp_path(&self, kind: MediaKind) -> BackendResult<PathBuf> {
        std::fs::create_dir_all(&self.temp_dir)?;
        Ok(self
            .temp_dir
            .join(format!("{}.{}", uuid::Uuid::new_v4(), kind.extension())))
    }

    fn stop_preview(inner: &mut Inner) {
        if let Some(preview) = inner.preview.take() {
            debug!("Stopping preview pipeline");
            let _ = preview.set_state(gst::State::Null);
        }
    }

    fn start_preview(&self, inner: &mut Inner) -> BackendResult<()> {
        Self::stop_preview(inner);
        store_frame(&self.latest, None);

        let device = self.devices.device_for(inner.facing);
        let description = format!(
            "{} ! videoconvert ! video/x-raw,format=RGB ! appsink name=sink",
            source_element(device)
        );
        info!(facing = %inner.facing, ?device, "Starting preview pipeline");

        let preview = launch(&description)?;
        let appsink = preview
            .by_name("sink")
            .ok_or_else(|| CameraError::Pipeline("Failed to get appsink".to_string()))?
            .dynamic_cast::<AppSink>()
            .map_err(|_| CameraError::Pipeline("Failed to cast appsink".to_string()))?;

        appsink.set_property("sync", false);
        appsink.set_property("max-buffers", pipeline::MAX_BUFFERS);
        appsink.set_property("drop", true);

        let latest = Arc::clone(&self.latest);
        appsink.set_callbacks(
            gstreamer_app::AppSinkCallbacks::builder()
                .new_sample(move |sink| {
                    let sample = sink.pull_sample().map_err(|_| gst::FlowError::Eos)?;
                    match frame_from_sample(&sample) {
                        Some(frame) => store_frame(&latest, Some(frame)),
                        None => debug!("Dropping malformed preview sample"),
                    }
                    Ok(gst::FlowSuccess::Ok)
                })
                .build(),
        );

        preview
            .set_state(gst::State::Playing)
            .map_err(|e| CameraError::Pipeline(format!("Failed to start preview: {}", e)))?;
        inner.preview = Some(preview);
        Ok(())
    }

    fn recording_description(&self, facing: Facing, options: &VideoOptions, output: &Path) -> String {
        let (width, height) = options.quality.dimensions();
        format!(
            "{} ! videoconvert ! videoscale ! video/x-raw,width={},height={} \
             ! x264enc tune=zerolatency bitrate={} ! h264parse ! mp4mux \
             ! filesink location=\"{}\"",
            source_element(self.devices.device_for(facing)),
            width,
            height,
            options.quality.bitrate_kbps(),
            output.display()
        )
    }

    fn finish_recording(&self) {
        self.stop.disarm();
        let mut inner = self.inner();
        inner.recording = false;
        if let Err(e) = self.start_preview(&mut inner) {
            warn!(error = %e, "Failed to resume preview after recording");
        }
    }
}

#[async_trait]
impl CameraBackend for GstCamera {
    fn is_ready(&self) -> bool {
        let inner = self.inner();
        inner.preview.is_some() && !inner.recording
    }

    async fn capture_still(&self, options: &PhotoOptions) -> BackendResult<StillCapture> {
        let frame = self.latest_frame().ok_or(CameraError::NoFrameAvailable)?;
        let path = self.temp_path(MediaKind::Photo)?;
        let quality = options.jpeg_quality();

        info!(width = frame.width, height = frame.height, quality, "Capturing still");

        let bytes = tokio::task::spawn_blocking(move || encode_jpeg(&frame, quality))
            .await
            .map_err(|e| CameraError::Encoding(e.to_string()))??;
        tokio::fs::write(&path, &bytes).await?;

        let base64 = options
            .base64
            .then(|| base64::engine::general_purpose::STANDARD.encode(&bytes));

        debug!(path = %path.display(), size = bytes.len(), "Still written");
        Ok(StillCapture {
            handle: MediaHandle::new(path),
            base64,
        })
    }

    async fn capture_video(&self, options: &VideoOptions) -> BackendResult<MediaHandle> {
        let facing = {
            let mut inner = self.inner();
            if inner.recording {
                return Err(CameraError::RecordingInProgress);
            }
            inner.recording = true;
            Self::stop_preview(&mut inner);
            inner.facing
        };
        let stop_rx = self.stop.arm();

        let result: BackendResult<MediaHandle> = async {
            let output = self.temp_path(MediaKind::Video)?;
            let recorder = launch(&self.recording_description(facing, options, &output))?;
            let max_duration = options.max_duration;

            info!(
                output = %output.display(),
                quality = options.quality.display_name(),
                max_secs = max_duration.as_secs(),
                "Recording started"
            );

            tokio::task::spawn_blocking(move || run_recording(recorder, stop_rx, max_duration))
                .await
                .map_err(|e| CameraError::Pipeline(e.to_string()))??;

            info!(output = %output.display(), "Recording finished");
            Ok(MediaHandle::new(output))
        }
        .await;

        self.finish_recording();
        result
    }

    /// Signal the recording to stop
    ///
    /// Only call this while a recording is running or about to start; a stop
    /// issued before `capture_video` has armed its channel ends that
    /// recording as soon as it begins.
    fn stop_video(&self) -> bool {
        info!("Stop requested for recording");
        self.stop.fire()
    }

    fn render_preview(&self, facing: Facing, flash: FlashMode) -> BackendResult<()> {
        if flash != FlashMode::Off {
            debug!(?flash, "No flash hardware, ignoring flash mode");
        }
        let mut inner = self.inner();
        inner.facing = facing;
        if inner.recording {
            // Preview restarts with the new facing once recording ends
            return Ok(());
        }
        self.start_preview(&mut inner)
    }

    fn latest_frame(&self) -> Option<PreviewFrame> {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Drop for GstCamera {
    fn drop(&mut self) {
        Self::stop_preview(&mut self.inner());
    }
}

fn source_element(device: Option<&str>) -> String {
    match device {
        Some(path) => format!("v4l2src device=\"{}\"", path),
        None => "v4l2src".to_string(),
    }
}

fn launch(description: &str) -> BackendResult<gst::Pipeline> {
    debug!(description, "Launching pipeline");
    gst::parse::launch(description)
        .map_err(|e| CameraError::Pipeline(format!("Failed to create pipeline: {}", e)))?
        .downcast::<gst::Pipeline>()
        .map_err(|_| CameraError::Pipeline("Failed to downcast to Pipeline".to_string()))
}

fn store_frame(slot: &Mutex<Option<PreviewFrame>>, frame: Option<PreviewFrame>) {
    *slot.lock().unwrap_or_else(PoisonError::into_inner) = frame;
}

/// Copy an RGB sample out of the appsink
fn frame_from_sample(sample: &gst::Sample) -> Option<PreviewFrame> {
    let structure = sample.caps()?.structure(0)?;
    let width = structure.get::<i32>("width").ok()? as u32;
    let height = structure.get::<i32>("height").ok()? as u32;
    let buffer = sample.buffer()?;
    let map = buffer.map_readable().ok()?;

    // GStreamer pads RGB rows to 4 bytes
    let stride = (width * 3 + 3) & !3;
    if (map.len() as u64) < stride as u64 * height as u64 {
        return None;
    }

    Some(PreviewFrame {
        width,
        height,
        stride,
        data: Arc::from(map.as_slice()),
    })
}

fn encode_jpeg(frame: &PreviewFrame, quality: u8) -> BackendResult<Vec<u8>> {
    let img = frame
        .to_rgb_image()
        .ok_or_else(|| CameraError::Encoding("Frame buffer too small".to_string()))?;
    let mut bytes = Vec::new();
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut bytes, quality)
        .encode_image(&img)
        .map_err(|e| CameraError::Encoding(e.to_string()))?;
    Ok(bytes)
}

/// Drive a recording pipeline until stopped or the duration cap is hit
///
/// Blocking; run on a blocking thread.
fn run_recording(
    recorder: gst::Pipeline,
    mut stop_rx: oneshot::Receiver<()>,
    max_duration: std::time::Duration,
) -> BackendResult<()> {
    recorder
        .set_state(gst::State::Playing)
        .map_err(|e| CameraError::Pipeline(format!("Failed to start recording: {}", e)))?;

    let bus = recorder
        .bus()
        .ok_or_else(|| CameraError::Pipeline("No bus available".to_string()))?;
    let started = Instant::now();

    loop {
        if !matches!(stop_rx.try_recv(), Err(oneshot::error::TryRecvError::Empty)) {
            debug!("Stop signal received");
            break;
        }
        if started.elapsed() >= max_duration {
            info!(secs = max_duration.as_secs(), "Recording hit duration cap");
            break;
        }
        if let Some(msg) = bus.timed_pop_filtered(
            gst::ClockTime::from_mseconds(pipeline::BUS_POLL_INTERVAL_MS),
            &[gst::MessageType::Error, gst::MessageType::Eos],
        ) {
            match msg.view() {
                gst::MessageView::Error(err) => {
                    error!(
                        error = %err.error(),
                        debug = ?err.debug(),
                        source = ?err.src().map(|s| s.name()),
                        "GStreamer error during recording"
                    );
                    let _ = recorder.set_state(gst::State::Null);
                    return Err(CameraError::Pipeline(err.error().to_string()));
                }
                gst::MessageView::Eos(_) => {
                    warn!("Source ended recording early");
                    let _ = recorder.set_state(gst::State::Null);
                    return Ok(());
                }
                _ => {}
            }
        }
    }

    // EOS lets mp4mux write the moov atom
    if !recorder.send_event(gst::event::Eos::new()) {
        warn!("Failed to send EOS event to pipeline");
    }
    let timeout = gst::ClockTime::from_mseconds(pipeline::EOS_TIMEOUT.as_millis() as u64);
    if bus
        .timed_pop_filtered(timeout, &[gst::MessageType::Eos, gst::MessageType::Error])
        .is_none()
    {
        warn!("Timed out waiting for EOS, file may be truncated");
    }

    recorder
        .set_state(gst::State::Null)
        .map_err(|e| CameraError::Pipeline(format!("Failed to stop pipeline: {}", e)))?;
    Ok(())
}
