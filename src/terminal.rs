// SPDX-License-Identifier: GPL-3.0-only

//! Terminal user interface
//!
//! Renders the preview with Unicode half-block characters (two pixels per
//! cell) and maps keys to application messages. All state lives in the
//! [`AppModel`]; this module only draws it and forwards input.

use crate::app::{
    AppModel, CaptureMode, Message, Preview, RecordingPhase, Runtime, format_elapsed,
};
use crate::backends::camera::CameraBackend;
use crate::config::Config;
use crate::constants::format_bitrate;
use crate::media::compose_image;
use crate::media::encoders::log_available_encoders;
use crate::pipelines::video::MediaEncoder;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use image::{RgbaImage, imageops};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};
use std::io::{self, stdout};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Run the terminal interface until the user quits
pub fn run(
    config: Config,
    backend: Arc<dyn CameraBackend>,
    encoder: Arc<dyn MediaEncoder>,
) -> Result<(), Box<dyn std::error::Error>> {
    log_available_encoders();

    let rt = tokio::runtime::Runtime::new()?;
    let _guard = rt.enter();

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend_term = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend_term)?;

    let mut runtime = Runtime::new(AppModel::new(config, backend, encoder));
    runtime.dispatch(Message::StartCamera);

    let result = run_app(&mut terminal, &mut runtime);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    runtime.into_model();
    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    runtime: &mut Runtime,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        runtime.drain();
        terminal.draw(|f| draw(f, runtime.model()))?;

        // Handle input with timeout for frame updates
        if event::poll(Duration::from_millis(16))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            match map_key(runtime.model(), key) {
                KeyAction::Quit => {
                    info!("Quit requested");
                    return Ok(());
                }
                KeyAction::Send(message) => runtime.dispatch(message),
                KeyAction::Ignore => {}
            }
        }
    }
}

enum KeyAction {
    Quit,
    Send(Message),
    Ignore,
}

fn map_key(model: &AppModel, key: KeyEvent) -> KeyAction {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return KeyAction::Quit;
    }

    // Notifications are modal
    if model.notification().is_some() {
        return match key.code {
            KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ') => {
                KeyAction::Send(Message::DismissNotification)
            }
            KeyCode::Char('q') => KeyAction::Quit,
            _ => KeyAction::Ignore,
        };
    }

    let message = match key.code {
        KeyCode::Char('q') => return KeyAction::Quit,
        KeyCode::Tab | KeyCode::Char('m') => Message::ToggleMode,
        KeyCode::Char('f') | KeyCode::Right => Message::NextFilter,
        KeyCode::Char('F') | KeyCode::Left => Message::PreviousFilter,
        KeyCode::Char('s') => Message::SwitchCamera,
        KeyCode::Char('o') if model.stream.is_none() && !model.is_acquiring() => {
            Message::StartCamera
        }
        KeyCode::Char(' ') | KeyCode::Enter => match model.mode {
            CaptureMode::Photo => Message::Capture,
            CaptureMode::Video if model.can_stop() => Message::StopRecording,
            CaptureMode::Video => Message::StartRecording,
        },
        KeyCode::Char('p') => Message::PauseResume,
        KeyCode::Char('x') => Message::StopRecording,
        KeyCode::Char('r') => match model.preview {
            Preview::Photo(_) => Message::Retake,
            Preview::Video(_) => Message::CloseVideoPreview,
            Preview::Live => return KeyAction::Ignore,
        },
        KeyCode::Char('d') => match model.preview {
            Preview::Photo(_) => Message::DownloadPhoto,
            Preview::Video(_) => Message::DownloadVideo,
            Preview::Live => return KeyAction::Ignore,
        },
        _ => return KeyAction::Ignore,
    };
    KeyAction::Send(message)
}

fn draw(f: &mut Frame, model: &AppModel) {
    let [preview_area, status_area, hint_area] = Layout::vertical([
        Constraint::Min(1),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(f.area());

    draw_preview(f, model, preview_area);
    draw_recording_overlay(f, model, preview_area);

    f.render_widget(
        StatusBar {
            message: &status_line(model),
        },
        status_area,
    );
    f.render_widget(
        Paragraph::new(hint_line(model)).style(Style::default().fg(Color::Gray)),
        hint_area,
    );

    if let Some(notification) = model.notification() {
        draw_notification(f, &notification.title, &notification.body, preview_area);
    }
}

fn draw_preview(f: &mut Frame, model: &AppModel, area: Rect) {
    match &model.preview {
        Preview::Live => {
            let image = model
                .stream
                .as_ref()
                .and_then(|stream| stream.latest_frame())
                .and_then(|frame| frame.to_image())
                .map(|image| {
                    // Filter at display size, the preview doesn't need full resolution
                    let (w, h) = fit(
                        image.width(),
                        image.height(),
                        area.width as u32,
                        area.height as u32 * 2,
                    );
                    let small = imageops::thumbnail(&image, w.max(1), h.max(1));
                    compose_image(small, model.facing, model.filter())
                });
            let placeholder = if model.is_acquiring() {
                "Opening camera..."
            } else {
                "No camera"
            };
            f.render_widget(
                ImageWidget {
                    image: image.as_ref(),
                    placeholder,
                },
                area,
            );
        }
        Preview::Photo(photo) => {
            f.render_widget(
                ImageWidget {
                    image: Some(photo.image.as_ref()),
                    placeholder: "",
                },
                area,
            );
        }
        Preview::Video(video) => {
            let text = vec![
                Line::from("Recorded video"),
                Line::from(format!(
                    "{}  ·  {}  ·  {} KiB",
                    format_elapsed(video.duration_secs),
                    video.mime_type,
                    video.data.len() / 1024
                )),
                Line::from(""),
                Line::from("d download video.webm  ·  r close"),
            ];
            let block = Block::default().borders(Borders::ALL).title(" Video ");
            f.render_widget(
                Paragraph::new(text)
                    .block(block)
                    .centered()
                    .wrap(Wrap { trim: true }),
                centered(area, 48, 6),
            );
        }
    }
}

fn draw_recording_overlay(f: &mut Frame, model: &AppModel, area: Rect) {
    let label = match model.recording.phase() {
        RecordingPhase::Idle => return,
        RecordingPhase::CountingDown => {
            let remaining = model.recording.countdown().unwrap_or_default();
            let box_area = centered(area, 9, 3);
            f.render_widget(Clear, box_area);
            f.render_widget(
                Paragraph::new(remaining.to_string())
                    .centered()
                    .style(Style::default().add_modifier(Modifier::BOLD))
                    .block(Block::default().borders(Borders::ALL)),
                box_area,
            );
            return;
        }
        RecordingPhase::Recording => format!(
            " ● REC {}  {} KiB ",
            format_elapsed(model.recording.elapsed_secs()),
            recorded_kib(model)
        ),
        RecordingPhase::Paused => format!(
            " ❚❚ PAUSED {}  {} KiB ",
            format_elapsed(model.recording.elapsed_secs()),
            recorded_kib(model)
        ),
        RecordingPhase::Stopping => " Finishing... ".to_string(),
    };

    let width = (label.chars().count() as u16).min(area.width);
    let badge = Rect {
        x: area.x,
        y: area.y,
        width,
        height: 1.min(area.height),
    };
    f.render_widget(
        Paragraph::new(label).style(Style::default().fg(Color::White).bg(Color::Red)),
        badge,
    );
}

fn recorded_kib(model: &AppModel) -> usize {
    model
        .recording
        .active()
        .map_or(0, |active| active.recorded_bytes() / 1024)
}

fn draw_notification(f: &mut Frame, title: &str, body: &str, area: Rect) {
    let popup = centered(area, 56, 7);
    f.render_widget(Clear, popup);
    f.render_widget(
        Paragraph::new(vec![
            Line::from(body.to_string()),
            Line::from(""),
            Line::from("Enter to dismiss"),
        ])
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red))
                .title(format!(" {} ", title)),
        ),
        popup,
    );
}

fn status_line(model: &AppModel) -> String {
    let device = model
        .stream
        .as_ref()
        .map_or("no camera", |stream| stream.device.name.as_str());
    let mut status = format!(
        "{} | {} ({}) | filter: {}",
        model.mode,
        device,
        model.facing,
        model.filter().display_name()
    );
    if model.mode == CaptureMode::Video
        && let Some(frame) = model.stream.as_ref().and_then(|stream| stream.latest_frame())
    {
        status.push_str(&format!(
            " | {}x{} {}",
            frame.width,
            frame.height,
            format_bitrate(model.config.bitrate_preset.bitrate_kbps(frame.width))
        ));
    }
    if let Some(path) = &model.last_download {
        status.push_str(&format!(" | saved {}", path.display()));
    }
    status
}

fn hint_line(model: &AppModel) -> String {
    let mut hints = Vec::new();
    match (&model.preview, model.mode) {
        (Preview::Photo(_), _) => hints.extend(["d download", "r retake"]),
        (Preview::Video(_), _) => hints.extend(["d download", "r close"]),
        (Preview::Live, CaptureMode::Photo) if model.can_capture() => hints.push("space capture"),
        (Preview::Live, CaptureMode::Video) if model.can_record() => hints.push("space record"),
        _ => {}
    }
    if model.can_pause() {
        hints.push(if model.recording.phase() == RecordingPhase::Paused {
            "p resume"
        } else {
            "p pause"
        });
    }
    if model.can_stop() {
        hints.push("x stop");
    }
    if model.can_switch_mode() {
        hints.push("tab mode");
    }
    if model.stream.is_none() && !model.is_acquiring() {
        hints.push("o open camera");
    }
    if model.can_switch_camera() {
        hints.push("s switch camera");
    }
    hints.extend(["f/F filter", "q quit"]);
    hints.join(" · ")
}

/// Largest size with the image's aspect ratio that fits the bounds
fn fit(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width == 0 || height == 0 || max_width == 0 || max_height == 0 {
        return (0, 0);
    }
    let scale = (max_width as f64 / width as f64).min(max_height as f64 / height as f64);
    (
        ((width as f64 * scale) as u32).min(max_width),
        ((height as f64 * scale) as u32).min(max_height),
    )
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

/// Widget that renders an image using half-block characters
struct ImageWidget<'a> {
    image: Option<&'a RgbaImage>,
    placeholder: &'a str,
}

impl Widget for ImageWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(image) = self.image.filter(|image| image.width() > 0 && image.height() > 0) else {
            let msg = self.placeholder;
            let x = area.x + (area.width.saturating_sub(msg.len() as u16)) / 2;
            let y = area.y + area.height / 2;
            if y < area.y + area.height && x < area.x + area.width {
                buf.set_string(x, y, msg, Style::default());
            }
            return;
        };

        // Each terminal cell displays 2 vertical pixels
        let (display_width, pixel_height) = fit(
            image.width(),
            image.height(),
            area.width as u32,
            area.height as u32 * 2,
        );
        let display_height = pixel_height / 2;
        if display_width == 0 || display_height == 0 {
            return;
        }

        let x_offset = area.x + (area.width.saturating_sub(display_width as u16)) / 2;
        let y_offset = area.y + (area.height.saturating_sub(display_height as u16)) / 2;

        let x_scale = image.width() as f64 / display_width as f64;
        let y_scale = image.height() as f64 / (display_height * 2) as f64;

        for ty in 0..display_height {
            for tx in 0..display_width {
                let src_x = (tx as f64 * x_scale) as u32;
                let src_y_top = (ty as f64 * 2.0 * y_scale) as u32;
                let src_y_bottom = ((ty as f64 * 2.0 + 1.0) * y_scale) as u32;

                let top = sample_pixel(image, src_x, src_y_top);
                let bottom = sample_pixel(image, src_x, src_y_bottom);

                if let Some(cell) = buf.cell_mut((x_offset + tx as u16, y_offset + ty as u16)) {
                    cell.set_char('▀');
                    cell.set_fg(top);
                    cell.set_bg(bottom);
                }
            }
        }
    }
}

fn sample_pixel(image: &RgbaImage, x: u32, y: u32) -> Color {
    let x = x.min(image.width() - 1);
    let y = y.min(image.height() - 1);
    let [r, g, b, _] = image.get_pixel(x, y).0;
    Color::Rgb(r, g, b)
}

/// Status bar widget
struct StatusBar<'a> {
    message: &'a str,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Fill background
        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(Color::DarkGray);
            }
        }

        let text: String = self.message.chars().take(area.width as usize).collect();
        buf.set_string(
            area.x,
            area.y,
            text,
            Style::default().fg(Color::White).bg(Color::DarkGray),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_keeps_aspect() {
        assert_eq!(fit(640, 480, 80, 80), (80, 60));
        assert_eq!(fit(640, 480, 200, 60), (80, 60));
        assert_eq!(fit(0, 480, 80, 80), (0, 0));
    }

    #[test]
    fn test_centered_clamps() {
        let area = Rect::new(0, 0, 10, 4);
        assert_eq!(centered(area, 20, 2), Rect::new(0, 1, 10, 2));
    }

    fn idle_model() -> AppModel {
        AppModel::new(
            Config::default(),
            Arc::new(crate::backends::virtual_camera::VirtualBackend::new()),
            Arc::new(crate::pipelines::video::GStreamerEncoder::new()),
        )
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_open_key_restarts_camera_without_stream() {
        let mut model = idle_model();
        assert!(matches!(
            map_key(&model, press(KeyCode::Char('o'))),
            KeyAction::Send(Message::StartCamera)
        ));
        assert!(hint_line(&model).contains("o open camera"));

        // Modal notification comes first, then the retry is available again
        model.notify(crate::errors::CameraError::PermissionDenied);
        assert!(matches!(
            map_key(&model, press(KeyCode::Char('o'))),
            KeyAction::Ignore
        ));
        let _ = model.handle_dismiss_notification();
        assert!(matches!(
            map_key(&model, press(KeyCode::Char('o'))),
            KeyAction::Send(Message::StartCamera)
        ));
    }

    #[test]
    fn test_image_widget_draws_half_blocks() {
        let mut image = RgbaImage::new(2, 2);
        image.put_pixel(0, 0, image::Rgba([255, 0, 0, 255]));
        image.put_pixel(0, 1, image::Rgba([0, 0, 255, 255]));

        let area = Rect::new(0, 0, 2, 1);
        let mut buf = Buffer::empty(area);
        ImageWidget {
            image: Some(&image),
            placeholder: "",
        }
        .render(area, &mut buf);

        let cell = &buf[(0, 0)];
        assert_eq!(cell.symbol(), "▀");
        assert_eq!(cell.fg, Color::Rgb(255, 0, 0));
        assert_eq!(cell.bg, Color::Rgb(0, 0, 255));
    }
}
