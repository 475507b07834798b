// SPDX-License-Identifier: GPL-3.0-only

//! Camera acquisition handlers
//!
//! Opening a device can take a while, so it runs on the blocking pool and
//! reports back with the request id it was started under. Only the latest
//! request is honored; a stream from an older one is released on arrival.

use crate::app::state::{AppModel, Message};
use crate::app::task::Task;
use crate::backends::camera::acquire_stream;
use crate::backends::camera::types::{FacingMode, LiveStream};
use crate::errors::CameraError;
use std::sync::Arc;
use tracing::{debug, info, warn};

impl AppModel {
    pub(crate) fn handle_start_camera(&mut self) -> Task<Message> {
        if self.has_live_stream() || self.is_acquiring() {
            debug!("Camera already started");
            return Task::none();
        }
        self.acquire(self.facing)
    }

    pub(crate) fn handle_switch_camera(&mut self) -> Task<Message> {
        if !self.can_switch_camera() {
            warn!(
                phase = ?self.recording.phase(),
                acquiring = self.is_acquiring(),
                "Camera switch rejected"
            );
            return Task::none();
        }
        let target = self.facing.toggled();
        info!(from = %self.facing, to = %target, "Switching camera");
        self.acquire(target)
    }

    /// Release the current stream and request one for `facing`
    fn acquire(&mut self, facing: FacingMode) -> Task<Message> {
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
        }

        self.acquire_counter += 1;
        let request = self.acquire_counter;
        self.pending_acquire = Some(request);

        let backend = Arc::clone(&self.backend);
        let with_audio = self.config.record_audio;
        info!(request, %facing, with_audio, "Acquiring camera");

        Task::perform(
            async move {
                tokio::task::spawn_blocking(move || {
                    acquire_stream(backend.as_ref(), facing, with_audio)
                })
                .await
                .unwrap_or_else(|e| {
                    Err(CameraError::DeviceUnavailable(format!(
                        "acquisition task failed: {}",
                        e
                    )))
                })
            },
            move |result| Message::CameraAcquired {
                request,
                facing,
                result,
            },
        )
    }

    pub(crate) fn handle_camera_acquired(
        &mut self,
        request: u64,
        facing: FacingMode,
        result: Result<LiveStream, CameraError>,
    ) -> Task<Message> {
        if self.pending_acquire != Some(request) {
            debug!(request, "Ignoring stale camera acquisition");
            // A stale stream is released when dropped here
            return Task::none();
        }
        self.pending_acquire = None;

        match result {
            Ok(stream) => {
                // A fallback device reports its own facing
                let facing = stream.device.facing().unwrap_or(facing);
                info!(
                    device = %stream.device.name,
                    %facing,
                    audio = stream.audio().is_some(),
                    "Camera ready"
                );
                self.facing = facing;
                self.stream = Some(stream);
            }
            Err(e) => {
                warn!(%facing, error = %e, "Camera acquisition failed, facing unchanged");
                self.notify(e);
            }
        }
        Task::none()
    }
}
