// SPDX-License-Identifier: GPL-3.0-only

//! Application state types

use crate::backends::camera::CameraBackend;
use crate::backends::camera::types::{FacingMode, LiveStream};
use crate::config::Config;
use crate::constants::VIDEO_FILENAME;
use crate::errors::{AppError, CameraError, PhotoError};
use crate::media::FilterType;
use crate::media::encoders::EncodingProfile;
use crate::pipelines::photo::CapturedPhoto;
use crate::pipelines::video::{EncoderEvent, EncoderSession, FrameCompositor, MediaEncoder};
use chrono::{DateTime, Local};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::info;
use uuid::Uuid;

/// Capture mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CaptureMode {
    #[default]
    Photo,
    Video,
}

impl CaptureMode {
    pub fn toggled(self) -> Self {
        match self {
            CaptureMode::Photo => CaptureMode::Video,
            CaptureMode::Video => CaptureMode::Photo,
        }
    }
}

impl std::fmt::Display for CaptureMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureMode::Photo => write!(f, "Photo"),
            CaptureMode::Video => write!(f, "Video"),
        }
    }
}

/// Recording state without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingPhase {
    Idle,
    CountingDown,
    Recording,
    Paused,
    Stopping,
}

/// An encoder session and everything it produced so far
pub struct ActiveRecording {
    pub session: Uuid,
    pub encoder: Box<dyn EncoderSession>,
    /// Render loop feeding the encoder; `None` once cancelled
    pub compositor: Option<FrameCompositor>,
    /// Non-empty chunks in arrival order
    pub chunks: Vec<Vec<u8>>,
    pub elapsed_secs: u64,
    pub profile: EncodingProfile,
    /// An error was already reported for this session
    pub failed: bool,
}

impl ActiveRecording {
    /// Stop the render loop if it is still running
    pub fn cancel_compositor(&mut self) {
        if let Some(compositor) = self.compositor.take() {
            compositor.cancel();
        }
    }

    pub fn recorded_bytes(&self) -> usize {
        self.chunks.iter().map(Vec::len).sum()
    }
}

impl std::fmt::Debug for ActiveRecording {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveRecording")
            .field("session", &self.session)
            .field("profile", &self.profile.mime_type)
            .field("chunks", &self.chunks.len())
            .field("elapsed_secs", &self.elapsed_secs)
            .field("compositor", &self.compositor.is_some())
            .finish()
    }
}

/// Recording state machine
///
/// `Idle → CountingDown → Recording ⇄ Paused → Stopping → Idle`
#[derive(Debug, Default)]
pub enum RecordingState {
    #[default]
    Idle,
    CountingDown {
        session: Uuid,
        remaining: u32,
    },
    Recording(ActiveRecording),
    Paused(ActiveRecording),
    Stopping(ActiveRecording),
}

impl RecordingState {
    pub fn phase(&self) -> RecordingPhase {
        match self {
            RecordingState::Idle => RecordingPhase::Idle,
            RecordingState::CountingDown { .. } => RecordingPhase::CountingDown,
            RecordingState::Recording(_) => RecordingPhase::Recording,
            RecordingState::Paused(_) => RecordingPhase::Paused,
            RecordingState::Stopping(_) => RecordingPhase::Stopping,
        }
    }

    /// Anything other than Idle
    pub fn is_active(&self) -> bool {
        !matches!(self, RecordingState::Idle)
    }

    pub fn session_id(&self) -> Option<Uuid> {
        match self {
            RecordingState::Idle => None,
            RecordingState::CountingDown { session, .. } => Some(*session),
            RecordingState::Recording(active)
            | RecordingState::Paused(active)
            | RecordingState::Stopping(active) => Some(active.session),
        }
    }

    pub fn active(&self) -> Option<&ActiveRecording> {
        match self {
            RecordingState::Recording(active)
            | RecordingState::Paused(active)
            | RecordingState::Stopping(active) => Some(active),
            _ => None,
        }
    }

    pub fn active_mut(&mut self) -> Option<&mut ActiveRecording> {
        match self {
            RecordingState::Recording(active)
            | RecordingState::Paused(active)
            | RecordingState::Stopping(active) => Some(active),
            _ => None,
        }
    }

    /// Countdown step still to go
    pub fn countdown(&self) -> Option<u32> {
        match self {
            RecordingState::CountingDown { remaining, .. } => Some(*remaining),
            _ => None,
        }
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.active().map_or(0, |active| active.elapsed_secs)
    }

    /// Leave the current state, returning it (state becomes Idle)
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }
}

/// A finished recording held in memory
#[derive(Debug, Clone)]
pub struct RecordedVideo {
    pub data: Arc<Vec<u8>>,
    pub mime_type: &'static str,
    pub duration_secs: u64,
    pub chunk_count: usize,
    pub recorded_at: DateTime<Local>,
}

impl RecordedVideo {
    /// Concatenate the chunks of a finished session
    ///
    /// `None` when the session produced no data.
    pub fn assemble(active: ActiveRecording) -> Option<Self> {
        if active.chunks.is_empty() {
            return None;
        }
        let chunk_count = active.chunks.len();
        let data = active.chunks.concat();
        info!(
            session = %active.session,
            chunks = chunk_count,
            size = data.len(),
            duration_secs = active.elapsed_secs,
            "Recording assembled"
        );
        Some(Self {
            data: Arc::new(data),
            mime_type: active.profile.mime_type,
            duration_secs: active.elapsed_secs,
            chunk_count,
            recorded_at: Local::now(),
        })
    }

    /// Download filename, independent of the negotiated codec
    pub fn filename(&self) -> &'static str {
        VIDEO_FILENAME
    }
}

/// What the preview pane shows
#[derive(Debug, Clone, Default)]
pub enum Preview {
    #[default]
    Live,
    Photo(CapturedPhoto),
    Video(RecordedVideo),
}

impl Preview {
    pub fn is_live(&self) -> bool {
        matches!(self, Preview::Live)
    }
}

/// A blocking message shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

impl From<&AppError> for Notification {
    fn from(error: &AppError) -> Self {
        Self {
            title: error.title().to_string(),
            body: error.to_string(),
        }
    }
}

/// Format seconds as `MM:SS`
pub fn format_elapsed(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Messages for the application
#[derive(Debug)]
pub enum Message {
    // ===== Camera =====
    /// Open the camera for the current facing
    StartCamera,
    /// Toggle front/rear
    SwitchCamera,
    /// Result of an acquisition request
    CameraAcquired {
        request: u64,
        facing: FacingMode,
        result: Result<LiveStream, CameraError>,
    },

    // ===== Filters =====
    SetFilter(FilterType),
    NextFilter,
    PreviousFilter,

    // ===== Mode =====
    SwitchMode(CaptureMode),
    ToggleMode,

    // ===== Photo =====
    Capture,
    PhotoCaptured(Result<CapturedPhoto, PhotoError>),
    Retake,
    DownloadPhoto,

    // ===== Video =====
    StartRecording,
    CountdownTick(Uuid),
    RecordingTick(Uuid),
    PauseResume,
    StopRecording,
    Encoder(Uuid, EncoderEvent),
    CloseVideoPreview,
    DownloadVideo,

    // ===== System =====
    Downloaded(Result<PathBuf, AppError>),
    DismissNotification,
}

/// The application model
///
/// Sole owner and mutator of all session state. Handlers live in
/// `app::handlers`, grouped by domain.
pub struct AppModel {
    pub config: Config,
    pub(crate) backend: Arc<dyn CameraBackend>,
    pub(crate) encoder: Arc<dyn MediaEncoder>,
    pub mode: CaptureMode,
    /// Facing of the current (or last successfully opened) stream
    pub facing: FacingMode,
    pub(crate) filter: watch::Sender<FilterType>,
    pub stream: Option<LiveStream>,
    /// Request id of the acquisition in flight
    pub(crate) pending_acquire: Option<u64>,
    pub(crate) acquire_counter: u64,
    pub(crate) capturing: bool,
    pub recording: RecordingState,
    pub preview: Preview,
    pub notifications: VecDeque<Notification>,
    pub last_download: Option<PathBuf>,
    /// Countdown and elapsed-timer cadence
    pub tick_interval: Duration,
}

impl std::fmt::Debug for AppModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppModel")
            .field("mode", &self.mode)
            .field("facing", &self.facing)
            .field("filter", &self.filter())
            .field("stream", &self.stream)
            .field("recording", &self.recording)
            .field("preview", &self.preview)
            .finish()
    }
}
