// SPDX-License-Identifier: GPL-3.0-only

//! Filter, mode and notification handlers

use crate::app::state::{AppModel, CaptureMode, Message, Preview};
use crate::app::task::Task;
use crate::media::FilterType;
use tracing::{debug, info, warn};

impl AppModel {
    pub(crate) fn handle_set_filter(&mut self, filter: FilterType) -> Task<Message> {
        let previous = self.filter.send_replace(filter);
        if previous != filter {
            info!(from = %previous, to = %filter, "Filter changed");
        }
        Task::none()
    }

    /// Switch between photo and video controls
    ///
    /// Clears any photo or video preview and returns to the live view.
    pub(crate) fn handle_switch_mode(&mut self, mode: CaptureMode) -> Task<Message> {
        if !self.can_switch_mode() {
            warn!(phase = ?self.recording.phase(), "Mode switch rejected while recording");
            return Task::none();
        }
        if mode != self.mode {
            info!(from = %self.mode, to = %mode, "Capture mode changed");
        }
        self.mode = mode;
        if !self.preview.is_live() {
            debug!("Clearing preview");
            self.preview = Preview::Live;
        }
        Task::none()
    }

    pub(crate) fn handle_dismiss_notification(&mut self) -> Task<Message> {
        self.notifications.pop_front();
        Task::none()
    }
}
