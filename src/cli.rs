// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for camera operations
//!
//! Headless counterparts of the terminal viewer. Both commands drive a
//! regular capture session, so saving goes through the same permission
//! check and gallery naming as the interactive viewer.

use camera_session::app::{CaptureSession, desktop_session};
use camera_session::backends::camera::{CameraBackend, Facing, GstCamera};
use camera_session::config::Config;
use camera_session::constants::timing;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Build a session for `facing` (or the configured default) and attach the camera
fn open_session(
    config: &Config,
    facing: Option<Facing>,
) -> Result<(Arc<CaptureSession>, Arc<GstCamera>), Box<dyn std::error::Error>> {
    let config = Config {
        default_facing: facing.unwrap_or(config.default_facing),
        ..config.clone()
    };
    let (session, camera) = desktop_session(&config)?;
    let session = Arc::new(session);
    session.attach_camera(camera.clone())?;
    println!("Using {} camera", session.facing());
    Ok((session, camera))
}

/// Wait for the first frames so exposure can settle
async fn wait_for_camera(camera: &GstCamera) -> Result<(), Box<dyn std::error::Error>> {
    let start = Instant::now();
    while start.elapsed() < timing::FIRST_FRAME_TIMEOUT {
        if camera.latest_frame().is_some() && start.elapsed() > timing::CAMERA_WARMUP {
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(16)).await;
    }
    Err("Failed to capture frame from camera".into())
}

/// Take a photo and save it to the gallery
pub fn take_photo(config: &Config, facing: Option<Facing>) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Runtime::new()?;
    let (session, camera) = open_session(config, facing)?;

    runtime.block_on(async {
        println!("Capturing...");
        wait_for_camera(&camera).await?;

        let capture = session
            .capture_photo()
            .await?
            .ok_or("Camera not ready")?;
        println!("Captured: {}", capture.handle);

        let path = session.save_preview().await?;
        println!("Photo saved: {}", path.display());
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}

/// Record a video and save it to the gallery
pub fn record_video(
    config: &Config,
    facing: Option<Facing>,
    duration: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Runtime::new()?;
    let (session, camera) = open_session(config, facing)?;
    let target_duration = Duration::from_secs(duration).min(config.max_recording_duration());

    // Set up Ctrl+C handler
    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop_flag_clone = stop_flag.clone();
    ctrlc::set_handler(move || {
        stop_flag_clone.store(true, Ordering::SeqCst);
    })?;

    runtime.block_on(async {
        wait_for_camera(&camera).await?;

        println!("Duration: {} seconds", target_duration.as_secs());
        println!();
        if stop_flag.load(Ordering::SeqCst) {
            println!("Cancelled before recording started");
            return Ok(());
        }
        println!("Recording... (press Ctrl+C to stop early)");

        let recording = tokio::spawn({
            let session = Arc::clone(&session);
            async move { session.start_recording().await }
        });

        // A stop sent before the session is recording would be dropped
        while !session.is_recording() && !recording.is_finished() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        // Wait for duration or Ctrl+C
        let start = Instant::now();
        while start.elapsed() < target_duration && !recording.is_finished() {
            if stop_flag.load(Ordering::SeqCst) {
                println!();
                println!("Stopping early...");
                break;
            }

            let elapsed = start.elapsed().as_secs();
            print!("\rRecording: {:02}:{:02}", elapsed / 60, elapsed % 60);
            std::io::Write::flush(&mut std::io::stdout())?;

            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        println!();

        session.stop_recording();
        let handle = recording.await??.ok_or("Camera not ready")?;
        println!("Recorded: {}", handle);

        let path = session.save_preview().await?;
        println!("Video saved: {}", path.display());
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}
