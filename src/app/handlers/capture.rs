// SPDX-License-Identifier: GPL-3.0-only

//! Photo capture and video recording handlers
//!
//! Recording is a state machine driven entirely by messages:
//!
//! ```text
//! StartRecording ─▶ CountingDown ─(3 ticks)─▶ Recording ⇄ Paused
//!                        │                        │
//!                        └── StopRecording ─▶ Idle │ StopRecording / encoder error
//!                                                  ▼
//!                                   Stopping ─(Encoder Stopped)─▶ Idle
//! ```
//!
//! Every timer and encoder message carries the session id it was created
//! for; messages from an earlier session are dropped.

use crate::app::state::{
    ActiveRecording, AppModel, CaptureMode, Message, Preview, RecordedVideo, RecordingState,
};
use crate::app::task::{Task, delay_task};
use crate::constants::{COUNTDOWN_STEPS, PHOTO_FILENAME, VIDEO_FILENAME};
use crate::errors::{AppError, CameraError, PhotoError, RecordingError};
use crate::pipelines::photo::{self, CapturedPhoto};
use crate::pipelines::video::{
    DerivedStream, EncoderConfig, EncoderEvent, FrameCompositor, select_profile,
};
use crate::storage::save_artifact;
use std::path::PathBuf;
use tracing::{debug, info, warn};
use uuid::Uuid;

impl AppModel {
    fn tick(&self, message: Message) -> Task<Message> {
        delay_task(self.tick_interval, message)
    }

    // =========================================================================
    // Photo
    // =========================================================================

    pub(crate) fn handle_capture(&mut self) -> Task<Message> {
        if !self.can_capture() {
            debug!(mode = %self.mode, "Capture not available");
            return Task::none();
        }

        let frame = self.stream.as_ref().and_then(|stream| stream.latest_frame());
        let facing = self.facing;
        let filter = self.filter();
        self.capturing = true;
        info!(%facing, %filter, "Capturing photo");

        Task::perform(photo::capture(frame, facing, filter), Message::PhotoCaptured)
    }

    pub(crate) fn handle_photo_captured(
        &mut self,
        result: Result<CapturedPhoto, PhotoError>,
    ) -> Task<Message> {
        self.capturing = false;
        match result {
            Ok(photo) => {
                if self.mode != CaptureMode::Photo || !self.preview.is_live() {
                    debug!("Discarding photo captured before a mode or preview change");
                    return Task::none();
                }
                info!(size = photo.data.len(), "Showing photo preview");
                self.preview = Preview::Photo(photo);
            }
            Err(e) => self.notify(e),
        }
        Task::none()
    }

    pub(crate) fn handle_retake(&mut self) -> Task<Message> {
        if matches!(self.preview, Preview::Photo(_)) {
            info!("Retake: returning to live view");
            self.preview = Preview::Live;
        }
        Task::none()
    }

    pub(crate) fn handle_download_photo(&mut self) -> Task<Message> {
        let Preview::Photo(photo) = &self.preview else {
            return Task::none();
        };
        self.download(PHOTO_FILENAME, photo.data.as_ref().clone())
    }

    // =========================================================================
    // Recording
    // =========================================================================

    pub(crate) fn handle_start_recording(&mut self) -> Task<Message> {
        if !self.can_record() {
            debug!(
                mode = %self.mode,
                phase = ?self.recording.phase(),
                "Recording not available"
            );
            return Task::none();
        }

        let session = Uuid::new_v4();
        info!(%session, "Recording countdown started");
        self.recording = RecordingState::CountingDown {
            session,
            remaining: COUNTDOWN_STEPS,
        };
        self.tick(Message::CountdownTick(session))
    }

    pub(crate) fn handle_countdown_tick(&mut self, id: Uuid) -> Task<Message> {
        let RecordingState::CountingDown { session, remaining } = &mut self.recording else {
            return Task::none();
        };
        if *session != id {
            debug!(%id, "Ignoring stale countdown tick");
            return Task::none();
        }

        if *remaining > 1 {
            *remaining -= 1;
            debug!(remaining = *remaining, "Countdown");
            return self.tick(Message::CountdownTick(id));
        }
        self.begin_recording(id)
    }

    /// Countdown finished: start the compositor and the encoder
    fn begin_recording(&mut self, session: Uuid) -> Task<Message> {
        self.recording = RecordingState::Idle;

        let Some(stream) = self.stream.as_ref().filter(|stream| stream.is_live()) else {
            self.notify(CameraError::DeviceUnavailable(
                "camera stream ended before recording".to_string(),
            ));
            return Task::none();
        };

        let profile = match select_profile(self.encoder.as_ref()) {
            Ok(profile) => profile,
            Err(e) => {
                self.notify(e);
                return Task::none();
            }
        };

        let compositor = FrameCompositor::start(
            stream.frames(),
            self.filter_receiver(),
            self.facing,
            self.config.framerate,
        );
        let derived = DerivedStream {
            video: compositor.surface(),
            audio: if self.config.record_audio {
                stream.audio().cloned()
            } else {
                None
            },
        };
        let encoder_config = EncoderConfig {
            bitrate_preset: self.config.bitrate_preset,
            framerate: self.config.framerate,
        };

        let mut encoder = match self.encoder.start(derived, &profile, &encoder_config) {
            Ok(encoder) => encoder,
            Err(e) => {
                compositor.cancel();
                self.notify(e);
                return Task::none();
            }
        };

        let Some(events) = encoder.take_events() else {
            encoder.stop();
            compositor.cancel();
            self.notify(RecordingError::RecorderInitFailed(
                "encoder has no event stream".to_string(),
            ));
            return Task::none();
        };

        info!(%session, profile = %profile, "Recording started");
        self.recording = RecordingState::Recording(ActiveRecording {
            session,
            encoder,
            compositor: Some(compositor),
            chunks: Vec::new(),
            elapsed_secs: 0,
            profile,
            failed: false,
        });

        Task::batch([
            Task::run(events, move |event| Message::Encoder(session, event)),
            self.tick(Message::RecordingTick(session)),
        ])
    }

    pub(crate) fn handle_recording_tick(&mut self, id: Uuid) -> Task<Message> {
        match &mut self.recording {
            RecordingState::Recording(active) if active.session == id => {
                active.elapsed_secs += 1;
            }
            // Keep ticking so the timer picks up again on resume. The chain keeps
            // its phase across a pause, so each pause may drop up to a second.
            RecordingState::Paused(active) if active.session == id => {}
            _ => return Task::none(),
        }
        self.tick(Message::RecordingTick(id))
    }

    pub(crate) fn handle_pause_resume(&mut self) -> Task<Message> {
        self.recording = match self.recording.take() {
            RecordingState::Recording(mut active) => {
                active.encoder.pause();
                info!(elapsed = active.elapsed_secs, "Recording paused");
                RecordingState::Paused(active)
            }
            RecordingState::Paused(mut active) => {
                active.encoder.resume();
                info!(elapsed = active.elapsed_secs, "Recording resumed");
                RecordingState::Recording(active)
            }
            other => {
                debug!(phase = ?other.phase(), "Pause/resume ignored");
                other
            }
        };
        Task::none()
    }

    pub(crate) fn handle_stop_recording(&mut self) -> Task<Message> {
        self.recording = match self.recording.take() {
            RecordingState::CountingDown { session, .. } => {
                info!(%session, "Countdown cancelled");
                RecordingState::Idle
            }
            RecordingState::Recording(active) | RecordingState::Paused(active) => {
                info!(session = %active.session, "Stopping recording");
                Self::begin_stopping(active)
            }
            other => other,
        };
        Task::none()
    }

    fn begin_stopping(mut active: ActiveRecording) -> RecordingState {
        active.encoder.stop();
        active.cancel_compositor();
        RecordingState::Stopping(active)
    }

    pub(crate) fn handle_encoder_event(&mut self, id: Uuid, event: EncoderEvent) -> Task<Message> {
        if self.recording.session_id() != Some(id) {
            debug!(%id, "Ignoring event from a finished encoder session");
            return Task::none();
        }

        match event {
            EncoderEvent::Chunk(data) => {
                if let Some(active) = self.recording.active_mut()
                    && !data.is_empty()
                {
                    debug!(size = data.len(), chunk = active.chunks.len(), "Recording chunk");
                    active.chunks.push(data);
                }
            }
            EncoderEvent::Error(message) => {
                warn!(error = %message, "Encoder error during recording");
                self.notify(RecordingError::EncoderFailed(message));
                self.recording = match self.recording.take() {
                    RecordingState::Recording(mut active) | RecordingState::Paused(mut active) => {
                        active.failed = true;
                        Self::begin_stopping(active)
                    }
                    RecordingState::Stopping(mut active) => {
                        active.failed = true;
                        RecordingState::Stopping(active)
                    }
                    other => other,
                };
            }
            EncoderEvent::Stopped => self.finish_recording(),
        }
        Task::none()
    }

    /// The encoder delivered its last chunk: build the artifact and go Idle
    fn finish_recording(&mut self) {
        let mut active = match self.recording.take() {
            RecordingState::Recording(active)
            | RecordingState::Paused(active)
            | RecordingState::Stopping(active) => active,
            other => {
                self.recording = other;
                return;
            }
        };
        active.cancel_compositor();

        let session = active.session;
        let failed = active.failed;
        match RecordedVideo::assemble(active) {
            Some(video) => {
                info!(%session, size = video.data.len(), failed, "Showing recorded video");
                self.preview = Preview::Video(video);
            }
            // A failed session has already been reported
            None if failed => {}
            None => self.notify(RecordingError::EmptyRecording),
        }
    }

    pub(crate) fn handle_close_video_preview(&mut self) -> Task<Message> {
        if matches!(self.preview, Preview::Video(_)) {
            info!("Closing video preview");
            self.preview = Preview::Live;
        }
        Task::none()
    }

    pub(crate) fn handle_download_video(&mut self) -> Task<Message> {
        let Preview::Video(video) = &self.preview else {
            return Task::none();
        };
        self.download(VIDEO_FILENAME, video.data.as_ref().clone())
    }

    // =========================================================================
    // Download
    // =========================================================================

    fn download(&self, filename: &str, data: Vec<u8>) -> Task<Message> {
        let dir = self.config.resolved_download_dir();
        info!(dir = %dir.display(), filename, size = data.len(), "Downloading");
        Task::perform(
            save_artifact(dir, filename.to_string(), data),
            Message::Downloaded,
        )
    }

    pub(crate) fn handle_downloaded(&mut self, result: Result<PathBuf, AppError>) -> Task<Message> {
        match result {
            Ok(path) => {
                info!(path = %path.display(), "Download saved");
                self.last_download = Some(path);
            }
            Err(e) => self.notify(e),
        }
        Task::none()
    }
}
