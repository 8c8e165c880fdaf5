// SPDX-License-Identifier: GPL-3.0-only

//! Terminal-based camera viewer
//!
//! Renders the live feed and photo previews with Unicode half-block
//! characters for improved vertical resolution. Every action goes through
//! the [`CaptureSession`]; async operations run on a tokio runtime and report
//! back over a channel so the draw loop never blocks on the camera.

use crate::app::{CaptureSession, Mode, SessionSnapshot, desktop_session};
use crate::backends::camera::{
    CameraBackend, Facing, GstCamera, MediaHandle, PreviewFrame, StillCapture,
};
use crate::config::Config;
use crate::constants::timing;
use crate::errors::SessionResult;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::channel::mpsc;
use ratatui::{
    Terminal, backend::CrosstermBackend, buffer::Buffer, layout::Rect, style::Color,
    style::Style, widgets::Widget,
};
use std::io::{self, stdout};
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Run the terminal camera viewer
pub fn run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Runtime::new()?;
    let (session, camera) = desktop_session(config)?;
    let session = Arc::new(session);
    session.attach_camera(camera.clone())?;

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let result = run_app(&mut terminal, &runtime, &session, &camera);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    session.detach_camera();
    result
}

/// Completion of an operation spawned on the runtime
enum Outcome {
    Captured(SessionResult<Option<StillCapture>>),
    Recorded(SessionResult<Option<MediaHandle>>),
    Saved(SessionResult<PathBuf>),
}

impl Outcome {
    fn status(&self) -> Option<String> {
        match self {
            Outcome::Captured(Ok(Some(_))) => Some("Photo captured".to_string()),
            Outcome::Recorded(Ok(Some(_))) => Some("Recording finished".to_string()),
            Outcome::Saved(Ok(path)) => Some(format!("Saved: {}", path.display())),
            Outcome::Captured(Ok(None)) | Outcome::Recorded(Ok(None)) => {
                Some("Camera not ready".to_string())
            }
            Outcome::Captured(Err(e)) | Outcome::Recorded(Err(e)) | Outcome::Saved(Err(e)) => {
                Some(format!("Error: {}", e))
            }
        }
    }
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    runtime: &tokio::runtime::Runtime,
    session: &Arc<CaptureSession>,
    camera: &Arc<GstCamera>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (outcome_tx, mut outcome_rx) = mpsc::unbounded::<Outcome>();
    let spawn = |fut: Pin<Box<dyn Future<Output = Outcome> + Send>>| {
        let tx = outcome_tx.clone();
        runtime.spawn(async move {
            let _ = tx.unbounded_send(fut.await);
        });
    };

    let mut still = StillCache::default();
    let mut show_help = false;
    let mut status_message: Option<String> = None;

    loop {
        while let Ok(outcome) = outcome_rx.try_recv() {
            status_message = outcome.status();
        }

        let snapshot = session.snapshot();
        let frame = match snapshot.mode {
            Mode::Live => camera.latest_frame(),
            Mode::PhotoPreview => snapshot
                .captured_uri
                .as_ref()
                .and_then(|handle| still.get(handle)),
            Mode::VideoPreview => None,
        };

        // Draw
        terminal.draw(|f| {
            let area = f.area();

            // Reserve bottom line for status
            let main_area = Rect {
                height: area.height.saturating_sub(1),
                ..area
            };

            match (snapshot.mode, &snapshot.captured_uri) {
                (Mode::VideoPreview, Some(handle)) => {
                    f.render_widget(VideoCard { handle }, main_area)
                }
                _ => f.render_widget(FrameWidget { frame: frame.as_ref() }, main_area),
            }

            let status_area = Rect {
                y: area.height.saturating_sub(1),
                height: 1,
                ..area
            };
            let message = status_message
                .clone()
                .unwrap_or_else(|| build_status_message(&snapshot, show_help));
            f.render_widget(
                StatusBar {
                    message: &message,
                    recording: snapshot.is_recording,
                },
                status_area,
            );
        })?;

        // Handle input with timeout for frame updates
        if !event::poll(timing::FRAME_POLL)? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        if key.code == KeyCode::Char('q')
            || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
        {
            if session.stop_recording() {
                info!("Stopped recording on quit");
            }
            break;
        }
        if key.code == KeyCode::Char('h') {
            show_help = !show_help;
            status_message = None;
            continue;
        }

        status_message = None;
        match (snapshot.mode, key.code) {
            (Mode::Live, KeyCode::Char('p')) => {
                let s = Arc::clone(session);
                spawn(Box::pin(async move { Outcome::Captured(s.capture_photo().await) }));
            }
            (Mode::Live, KeyCode::Char('r')) if snapshot.is_recording => {
                session.stop_recording();
                status_message = Some("Finishing recording...".to_string());
            }
            (Mode::Live, KeyCode::Char('r')) => {
                let s = Arc::clone(session);
                spawn(Box::pin(async move { Outcome::Recorded(s.start_recording().await) }));
            }
            (Mode::Live, KeyCode::Char('s')) => {
                let before = session.facing();
                status_message = Some(switch_status(before, session.toggle_facing()));
            }
            (Mode::PhotoPreview | Mode::VideoPreview, KeyCode::Enter | KeyCode::Char('y')) => {
                status_message = Some("Saving...".to_string());
                let s = Arc::clone(session);
                spawn(Box::pin(async move { Outcome::Saved(s.save_preview().await) }));
            }
            (Mode::PhotoPreview | Mode::VideoPreview, KeyCode::Esc | KeyCode::Char('x')) => {
                session.cancel_preview();
            }
            (Mode::PhotoPreview | Mode::VideoPreview, KeyCode::Char('o')) => {
                if let Some(handle) = &snapshot.captured_uri {
                    status_message = Some(open_external(handle));
                }
            }
            _ => {}
        }
    }

    Ok(())
}

fn switch_status(before: Facing, after: Facing) -> String {
    if before == after {
        "Cannot switch camera while recording".to_string()
    } else {
        format!("Camera: {}", after)
    }
}

/// Hand the captured file to the desktop's default viewer or player
fn open_external(handle: &MediaHandle) -> String {
    match open::that_detached(handle.path()) {
        Ok(()) => {
            info!(uri = %handle, "Opened preview externally");
            format!("Opened {}", handle)
        }
        Err(e) => {
            warn!(uri = %handle, error = %e, "Failed to open preview");
            format!("Error: {}", e)
        }
    }
}

fn build_status_message(snapshot: &SessionSnapshot, show_help: bool) -> String {
    match (snapshot.mode, show_help) {
        (Mode::Live, false) if snapshot.is_recording => format!(
            "REC {:02}:{:02} | 'r' stop | 'q' quit",
            snapshot.recording_secs / 60,
            snapshot.recording_secs % 60
        ),
        (Mode::Live, false) => format!(
            "[{}] 'p' picture | 'r' record | 's' switch camera | 'h' help | 'q' quit",
            snapshot.facing
        ),
        (Mode::Live, true) => {
            "p: Take picture | r: Start/stop recording | s: Switch front/back | h: Toggle help | q/Ctrl+C: Quit"
                .to_string()
        }
        (_, false) => "Enter save | Esc cancel | 'o' open | 'q' quit".to_string(),
        (_, true) => {
            "Enter/y: Save to gallery | Esc/x: Discard | o: Open in viewer | h: Toggle help | q/Ctrl+C: Quit"
                .to_string()
        }
    }
}

/// Decoded photo preview, cached per handle
#[derive(Default)]
struct StillCache {
    handle: Option<MediaHandle>,
    frame: Option<PreviewFrame>,
}

impl StillCache {
    fn get(&mut self, handle: &MediaHandle) -> Option<PreviewFrame> {
        if self.handle.as_ref() != Some(handle) {
            self.frame = decode_still(handle);
            self.handle = Some(handle.clone());
        }
        self.frame.clone()
    }
}

fn decode_still(handle: &MediaHandle) -> Option<PreviewFrame> {
    match image::open(handle.path()) {
        Ok(img) => {
            let rgb = img.to_rgb8();
            let (width, height) = rgb.dimensions();
            Some(PreviewFrame {
                width,
                height,
                stride: width * 3,
                data: rgb.into_raw().into(),
            })
        }
        Err(e) => {
            error!(uri = %handle, error = %e, "Failed to decode photo preview");
            None
        }
    }
}

/// Widget that renders a frame using half-block characters
struct FrameWidget<'a> {
    frame: Option<&'a PreviewFrame>,
}

impl Widget for FrameWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(frame) = self.frame.filter(|f| f.width > 0 && f.height > 0) else {
            // No frame yet - show placeholder
            centered_line(area, buf, "Waiting for camera...", Style::default());
            return;
        };

        // Calculate display dimensions maintaining aspect ratio
        // Each terminal cell displays 2 vertical pixels using half-block characters
        let frame_aspect = frame.width as f64 / frame.height as f64;
        let term_width = area.width as f64;
        let term_height = (area.height * 2) as f64;

        let (display_width, display_height) = if term_width / term_height > frame_aspect {
            // Terminal is wider - fit to height
            let w = term_height * frame_aspect;
            (w as u16, (term_height / 2.0) as u16)
        } else {
            // Terminal is taller - fit to width
            let h = term_width / frame_aspect;
            (term_width as u16, (h / 2.0) as u16)
        };
        if display_width == 0 || display_height == 0 {
            return;
        }

        // Center the image
        let x_offset = area.x + (area.width.saturating_sub(display_width)) / 2;
        let y_offset = area.y + (area.height.saturating_sub(display_height)) / 2;

        let x_scale = frame.width as f64 / display_width as f64;
        let y_scale = frame.height as f64 / (display_height * 2) as f64;

        // Upper half (▀) colored with fg, lower half with bg
        for ty in 0..display_height {
            for tx in 0..display_width {
                let src_x = (tx as f64 * x_scale) as u32;
                let src_y_top = (ty as f64 * 2.0 * y_scale) as u32;
                let src_y_bottom = ((ty as f64 * 2.0 + 1.0) * y_scale) as u32;

                let (r, g, b) = frame.rgb_at(src_x, src_y_top);
                let top = Color::Rgb(r, g, b);
                let (r, g, b) = frame.rgb_at(src_x, src_y_bottom);
                let bottom = Color::Rgb(r, g, b);

                if let Some(cell) = buf.cell_mut((x_offset + tx, y_offset + ty)) {
                    cell.set_char('▀');
                    cell.set_fg(top);
                    cell.set_bg(bottom);
                }
            }
        }
    }
}

/// Stand-in for an inline player: shows the clip and how to play it
struct VideoCard<'a> {
    handle: &'a MediaHandle,
}

impl Widget for VideoCard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let style = Style::default().fg(Color::White);
        let middle = area.y + area.height / 2;
        let lines = [
            "Video recorded".to_string(),
            self.handle.to_string(),
            "Press 'o' to play it in your video player".to_string(),
        ];
        for (i, line) in lines.iter().enumerate() {
            let row = Rect {
                y: (middle + i as u16).saturating_sub(1),
                height: 1,
                ..area
            };
            if row.y < area.y + area.height {
                centered_line(row, buf, line, style);
            }
        }
    }
}

fn centered_line(area: Rect, buf: &mut Buffer, text: &str, style: Style) {
    let width = text.chars().count() as u16;
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height / 2;
    if y < area.y + area.height && x < area.x + area.width {
        buf.set_stringn(x, y, text, area.width as usize, style);
    }
}

/// Status bar widget
struct StatusBar<'a> {
    message: &'a str,
    recording: bool,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bg = if self.recording {
            Color::Red
        } else {
            Color::DarkGray
        };

        // Fill background
        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(bg);
            }
        }

        buf.set_stringn(
            area.x,
            area.y,
            self.message,
            area.width as usize,
            Style::default().fg(Color::White).bg(bg),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(mode: Mode, is_recording: bool) -> SessionSnapshot {
        SessionSnapshot {
            mode,
            facing: Facing::Back,
            is_recording,
            recording_secs: 75,
            captured_uri: None,
        }
    }

    #[test]
    fn test_status_message_per_mode() {
        assert!(build_status_message(&snapshot(Mode::Live, false), false).starts_with("[back]"));
        assert!(build_status_message(&snapshot(Mode::Live, true), false).starts_with("REC 01:15"));
        assert!(build_status_message(&snapshot(Mode::PhotoPreview, false), false)
            .starts_with("Enter save"));
    }

    #[test]
    fn test_switch_status_reports_ignored_toggle() {
        assert_eq!(switch_status(Facing::Back, Facing::Front), "Camera: front");
        assert_eq!(
            switch_status(Facing::Back, Facing::Back),
            "Cannot switch camera while recording"
        );
    }

    #[test]
    fn test_frame_widget_fills_cells() {
        let frame = PreviewFrame {
            width: 2,
            height: 2,
            stride: 6,
            data: vec![255u8; 12].into(),
        };
        let area = Rect::new(0, 0, 4, 2);
        let mut buf = Buffer::empty(area);
        FrameWidget {
            frame: Some(&frame),
        }
        .render(area, &mut buf);

        let cell = buf.cell((1, 0)).unwrap();
        assert_eq!(cell.symbol(), "▀");
        assert_eq!(cell.fg, Color::Rgb(255, 255, 255));
    }

    #[test]
    fn test_outcome_status_reports_errors() {
        let outcome = Outcome::Saved(Err(crate::errors::SessionError::PermissionDenied));
        assert_eq!(outcome.status().as_deref(), Some("Error: Permission denied"));
    }
}
