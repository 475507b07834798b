// SPDX-License-Identifier: GPL-3.0-only

//! Message update handling
//!
//! The `update()` function is a dispatcher; the handling code lives in the
//! `handlers` submodules:
//!
//! - `handlers::camera`: Acquisition and front/rear switching
//! - `handlers::capture`: Photo capture and the recording state machine
//! - `handlers::ui`: Filters, mode switching, notifications

use crate::app::state::{AppModel, Message};
use crate::app::task::Task;

impl AppModel {
    /// Apply one message and return the work it started
    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            // ===== Camera =====
            Message::StartCamera => self.handle_start_camera(),
            Message::SwitchCamera => self.handle_switch_camera(),
            Message::CameraAcquired {
                request,
                facing,
                result,
            } => self.handle_camera_acquired(request, facing, result),

            // ===== Filters =====
            Message::SetFilter(filter) => self.handle_set_filter(filter),
            Message::NextFilter => self.handle_set_filter(self.filter().next()),
            Message::PreviousFilter => self.handle_set_filter(self.filter().previous()),

            // ===== Mode =====
            Message::SwitchMode(mode) => self.handle_switch_mode(mode),
            Message::ToggleMode => self.handle_switch_mode(self.mode.toggled()),

            // ===== Photo =====
            Message::Capture => self.handle_capture(),
            Message::PhotoCaptured(result) => self.handle_photo_captured(result),
            Message::Retake => self.handle_retake(),
            Message::DownloadPhoto => self.handle_download_photo(),

            // ===== Video =====
            Message::StartRecording => self.handle_start_recording(),
            Message::CountdownTick(session) => self.handle_countdown_tick(session),
            Message::RecordingTick(session) => self.handle_recording_tick(session),
            Message::PauseResume => self.handle_pause_resume(),
            Message::StopRecording => self.handle_stop_recording(),
            Message::Encoder(session, event) => self.handle_encoder_event(session, event),
            Message::CloseVideoPreview => self.handle_close_video_preview(),
            Message::DownloadVideo => self.handle_download_video(),

            // ===== System =====
            Message::Downloaded(result) => self.handle_downloaded(result),
            Message::DismissNotification => self.handle_dismiss_notification(),
        }
    }
}
