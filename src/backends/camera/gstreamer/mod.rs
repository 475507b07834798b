// SPDX-License-Identifier: GPL-3.0-only

//! GStreamer camera backend
//!
//! Devices come from a `DeviceMonitor` (PipeWire, V4L2 or whatever provider
//! the system has). Each opened device runs its own capture pipeline that
//! converts to RGBA and publishes the newest frame on a watch channel. The
//! microphone runs in a separate pipeline so a missing or busy microphone
//! never takes the camera down with it.

mod enumeration;
mod pipeline;

pub use enumeration::enumerate_devices;
pub use pipeline::{CapturePipeline, MicrophonePipeline, audio_caps};

use super::types::*;
use tracing::{info, warn};

pub struct GStreamerBackend;

impl GStreamerBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GStreamerBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Both pipelines of an open GStreamer stream
struct GStreamerTracks {
    video: Option<CapturePipeline>,
    audio: Option<MicrophonePipeline>,
}

impl StreamTracks for GStreamerTracks {
    fn stop(&mut self) {
        if let Some(audio) = self.audio.take() {
            audio.stop();
        }
        if let Some(video) = self.video.take() {
            video.stop();
        }
    }
}

impl super::CameraBackend for GStreamerBackend {
    fn enumerate_cameras(&self) -> BackendResult<Vec<CameraDevice>> {
        Ok(enumerate_devices()?
            .into_iter()
            .map(|(camera, _)| camera)
            .collect())
    }

    fn open(&self, device: &CameraDevice, with_audio: bool) -> BackendResult<LiveStream> {
        let source = enumerate_devices()?
            .into_iter()
            .find(|(camera, _)| camera.path == device.path)
            .map(|(_, gst_device)| gst_device)
            .ok_or_else(|| BackendError::DeviceNotFound(device.name.clone()))?;

        let (frame_sender, frame_receiver) = frame_channel();
        let video = CapturePipeline::new(&source, device, frame_sender)?;

        let mut audio_track = None;
        let mut microphone = None;
        if with_audio {
            let track = AudioTrack::new(AudioFormat::default());
            match MicrophonePipeline::new(track.clone()) {
                Ok(pipeline) => {
                    microphone = Some(pipeline);
                    audio_track = Some(track);
                }
                Err(e) => warn!(error = %e, "Microphone unavailable, continuing without audio"),
            }
        }

        info!(device = %device.name, audio = audio_track.is_some(), "GStreamer stream open");

        Ok(LiveStream::new(
            device.clone(),
            frame_receiver,
            audio_track,
            Box::new(GStreamerTracks {
                video: Some(video),
                audio: microphone,
            }),
        ))
    }

    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::GStreamer
    }
}
