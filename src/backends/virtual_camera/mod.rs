// SPDX-License-Identifier: GPL-3.0-only

//! Virtual camera backend
//!
//! An in-process camera pair (front and rear) and microphone for running
//! without hardware. Frames are either synthetic color bars or a still image
//! loaded from disk; the microphone plays a steady tone.
//!
//! ```text
//! FrameLoop (30 fps) ──▶ color bars / still ──▶ watch channel
//! FrameLoop (20 ms)  ──▶ sine tone (S16LE)  ──▶ AudioTrack
//! ```

mod file_source;
mod pattern;

pub use file_source::load_image_as_frame;
pub use pattern::{color_bars, sine_tone};

use crate::backends::camera::frame_loop::{FrameLoop, LoopAction};
use crate::backends::camera::types::*;
use crate::backends::camera::CameraBackend;
use crate::constants::{DEFAULT_FRAMERATE, virtual_camera as vc};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const FRONT_PATH: &str = "virtual:front";
const REAR_PATH: &str = "virtual:rear";

/// Synthetic camera backend
#[derive(Debug, Clone, Default)]
pub struct VirtualBackend {
    image: Option<PathBuf>,
}

impl VirtualBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show a still image instead of color bars
    pub fn with_image(path: impl Into<PathBuf>) -> Self {
        Self {
            image: Some(path.into()),
        }
    }

    fn video_source(&self) -> BackendResult<VideoSource> {
        match &self.image {
            Some(path) => Ok(VideoSource::Still(Arc::new(load_image_as_frame(path)?))),
            None => Ok(VideoSource::Bars),
        }
    }
}

enum VideoSource {
    Bars,
    Still(Arc<CameraFrame>),
}

/// Generator threads of an open virtual stream
struct VirtualTracks {
    video: Option<FrameLoop>,
    audio: Option<FrameLoop>,
}

impl StreamTracks for VirtualTracks {
    fn stop(&mut self) {
        if let Some(audio) = self.audio.take() {
            audio.cancel();
        }
        if let Some(video) = self.video.take() {
            video.cancel();
        }
    }
}

impl CameraBackend for VirtualBackend {
    fn enumerate_cameras(&self) -> BackendResult<Vec<CameraDevice>> {
        Ok(vec![
            CameraDevice {
                name: "Virtual Front Camera".to_string(),
                path: FRONT_PATH.to_string(),
                camera_location: Some("front".to_string()),
            },
            CameraDevice {
                name: "Virtual Rear Camera".to_string(),
                path: REAR_PATH.to_string(),
                camera_location: Some("back".to_string()),
            },
        ])
    }

    fn open(&self, device: &CameraDevice, with_audio: bool) -> BackendResult<LiveStream> {
        if device.path != FRONT_PATH && device.path != REAR_PATH {
            return Err(BackendError::DeviceNotFound(device.name.clone()));
        }

        let source = self.video_source()?;
        let (frame_sender, frame_receiver) = frame_channel();
        let interval = Duration::from_secs(1) / DEFAULT_FRAMERATE;

        let mut tick: u64 = 0;
        let video = FrameLoop::start("virtual-camera", interval, move || {
            let frame = match &source {
                VideoSource::Bars => Arc::new(CameraFrame::from_image(color_bars(
                    vc::WIDTH,
                    vc::HEIGHT,
                    tick,
                ))),
                VideoSource::Still(frame) => Arc::clone(frame),
            };
            tick += 1;
            frame_sender.send_replace(Some(frame));
            LoopAction::Continue
        });

        let (audio_track, audio) = if with_audio {
            let track = AudioTrack::new(AudioFormat::default());
            let generator = spawn_tone(track.clone());
            (Some(track), Some(generator))
        } else {
            (None, None)
        };

        info!(device = %device.name, audio = with_audio, "Virtual stream open");

        Ok(LiveStream::new(
            device.clone(),
            frame_receiver,
            audio_track,
            Box::new(VirtualTracks {
                video: Some(video),
                audio,
            }),
        ))
    }

    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::Virtual
    }
}

fn spawn_tone(track: AudioTrack) -> FrameLoop {
    let format = track.format;
    let interval = Duration::from_secs(vc::AUDIO_CHUNK_FRAMES as u64) / format.rate.max(1);
    let mut offset: u64 = 0;

    debug!(rate = format.rate, channels = format.channels, "Starting virtual microphone");

    FrameLoop::start("virtual-microphone", interval, move || {
        let data = sine_tone(format, vc::AUDIO_CHUNK_FRAMES, offset, vc::TONE_HZ);
        offset += vc::AUDIO_CHUNK_FRAMES as u64;
        track.push(AudioChunk {
            data: Arc::from(data.into_boxed_slice()),
        });
        LoopAction::Continue
    })
}
