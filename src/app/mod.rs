// SPDX-License-Identifier: MPL-2.0

//! Application model for the camera
//!
//! # Architecture
//!
//! - `state`: State types (AppModel, Message, CaptureMode, RecordingState, ...)
//! - `update`: Message dispatcher
//! - `handlers`: Message handlers grouped by domain
//! - `task`: Deferred work returned by handlers
//! - `runtime`: Feeds task results back into the model, one message at a time
//!
//! The model never blocks and never awaits. Camera acquisition, timers,
//! photo encoding and encoder events all run as tasks whose results arrive
//! as [`Message`]s, so the model is the only thing that mutates state.

mod handlers;
pub mod runtime;
mod state;
pub mod task;
mod update;

pub use runtime::Runtime;
pub use state::{
    ActiveRecording, AppModel, CaptureMode, Message, Notification, Preview, RecordedVideo,
    RecordingPhase, RecordingState, format_elapsed,
};
pub use task::{Task, delay_task};

use crate::backends::camera::CameraBackend;
use crate::config::Config;
use crate::constants::TICK_INTERVAL;
use crate::errors::AppError;
use crate::media::FilterType;
use crate::pipelines::video::MediaEncoder;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info};

impl AppModel {
    pub fn new(
        config: Config,
        backend: Arc<dyn CameraBackend>,
        encoder: Arc<dyn MediaEncoder>,
    ) -> Self {
        info!(
            backend = %backend.backend_type(),
            facing = %config.facing,
            filter = %config.filter,
            "Creating application model"
        );
        let (filter, _) = watch::channel(config.filter);

        Self {
            mode: CaptureMode::Photo,
            facing: config.facing,
            filter,
            config,
            backend,
            encoder,
            stream: None,
            pending_acquire: None,
            acquire_counter: 0,
            capturing: false,
            recording: RecordingState::Idle,
            preview: Preview::Live,
            notifications: VecDeque::new(),
            last_download: None,
            tick_interval: TICK_INTERVAL,
        }
    }

    /// Current filter
    pub fn filter(&self) -> FilterType {
        *self.filter.borrow()
    }

    /// Receiver that observes every filter change
    pub fn filter_receiver(&self) -> watch::Receiver<FilterType> {
        self.filter.subscribe()
    }

    pub fn is_acquiring(&self) -> bool {
        self.pending_acquire.is_some()
    }

    pub fn has_live_stream(&self) -> bool {
        self.stream.as_ref().is_some_and(|stream| stream.is_live())
    }

    // =========================================================================
    // Affordances
    // =========================================================================

    pub fn can_switch_camera(&self) -> bool {
        !self.recording.is_active() && !self.is_acquiring()
    }

    pub fn can_switch_mode(&self) -> bool {
        !self.recording.is_active()
    }

    pub fn can_capture(&self) -> bool {
        self.mode == CaptureMode::Photo
            && self.has_live_stream()
            && self.preview.is_live()
            && !self.capturing
    }

    pub fn can_record(&self) -> bool {
        self.mode == CaptureMode::Video
            && self.has_live_stream()
            && self.preview.is_live()
            && !self.recording.is_active()
    }

    pub fn can_pause(&self) -> bool {
        matches!(
            self.recording.phase(),
            RecordingPhase::Recording | RecordingPhase::Paused
        )
    }

    pub fn can_stop(&self) -> bool {
        matches!(
            self.recording.phase(),
            RecordingPhase::CountingDown | RecordingPhase::Recording | RecordingPhase::Paused
        )
    }

    // =========================================================================
    // Notifications
    // =========================================================================

    pub(crate) fn notify(&mut self, error: impl Into<AppError>) {
        let error = error.into();
        error!(error = %error, "{}", error.title());
        self.notifications.push_back((&error).into());
    }

    /// Notification currently shown, if any
    pub fn notification(&self) -> Option<&Notification> {
        self.notifications.front()
    }

    /// Tear everything down: recording first, then the camera
    pub fn shutdown(&mut self) {
        if let Some(mut active) = match self.recording.take() {
            RecordingState::Recording(active)
            | RecordingState::Paused(active)
            | RecordingState::Stopping(active) => Some(active),
            _ => None,
        } {
            info!(session = %active.session, "Abandoning recording on shutdown");
            active.encoder.stop();
            active.cancel_compositor();
        }
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
        }
    }
}
