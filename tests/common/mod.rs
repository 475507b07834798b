// SPDX-License-Identifier: GPL-3.0-only

//! Shared fakes for integration tests
#![allow(dead_code)]

use filtercam::app::{AppModel, Message, Runtime};
use filtercam::backends::camera::CameraBackend;
use filtercam::backends::camera::types::*;
use filtercam::config::Config;
use filtercam::media::encoders::EncodingProfile;
use filtercam::pipelines::video::{
    DerivedStream, EncoderConfig, EncoderEvent, EncoderEvents, EncoderSession, MediaEncoder,
    event_stream,
};
use filtercam::errors::RecordingError;
use image::{Rgba, RgbaImage};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

pub const WAIT: Duration = Duration::from_secs(5);

pub const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
pub const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);
pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// 4x2 frame: left half in `color`, right half white
pub fn half_frame(color: Rgba<u8>) -> CameraFrame {
    CameraFrame::from_image(RgbaImage::from_fn(4, 2, |x, _| if x < 2 { color } else { WHITE }))
}

pub fn device(name: &str, path: &str, location: Option<&str>) -> CameraDevice {
    CameraDevice {
        name: name.to_string(),
        path: path.to_string(),
        camera_location: location.map(str::to_string),
    }
}

/// In-memory camera backend
///
/// The front camera shows red on the left, the rear camera blue.
pub struct FakeBackend {
    pub cameras: Vec<CameraDevice>,
    /// Every open attempt is refused by the "platform"
    pub deny: bool,
    /// Paths that fail to open
    pub failing: Vec<String>,
    pub with_microphone: bool,
    pub opened: Arc<Mutex<Vec<String>>>,
    pub released: Arc<AtomicUsize>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            cameras: vec![
                device("Front", "fake:front", Some("front")),
                device("Rear", "fake:rear", Some("back")),
            ],
            deny: false,
            failing: Vec::new(),
            with_microphone: false,
            opened: Arc::new(Mutex::new(Vec::new())),
            released: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn denied() -> Self {
        Self {
            deny: true,
            ..Self::new()
        }
    }

    pub fn failing(paths: &[&str]) -> Self {
        Self {
            failing: paths.iter().map(|p| p.to_string()).collect(),
            ..Self::new()
        }
    }

    pub fn with_cameras(cameras: Vec<CameraDevice>) -> Self {
        Self {
            cameras,
            ..Self::new()
        }
    }

    pub fn opened(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.opened)
    }

    pub fn released(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.released)
    }
}

struct FakeTracks {
    // Keeps the frame channel open while the stream is live
    sender: Option<FrameSender>,
    released: Arc<AtomicUsize>,
}

impl StreamTracks for FakeTracks {
    fn stop(&mut self) {
        self.sender = None;
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

impl CameraBackend for FakeBackend {
    fn enumerate_cameras(&self) -> BackendResult<Vec<CameraDevice>> {
        Ok(self.cameras.clone())
    }

    fn open(&self, device: &CameraDevice, with_audio: bool) -> BackendResult<LiveStream> {
        self.opened.lock().unwrap().push(device.path.clone());
        if self.deny {
            return Err(BackendError::PermissionDenied(device.name.clone()));
        }
        if self.failing.contains(&device.path) {
            return Err(BackendError::InitializationFailed(device.name.clone()));
        }

        let color = if device.facing() == Some(FacingMode::Rear) {
            BLUE
        } else {
            RED
        };
        let (sender, receiver) = frame_channel();
        sender.send_replace(Some(Arc::new(half_frame(color))));

        let audio = (with_audio && self.with_microphone).then(|| AudioTrack::new(AudioFormat::default()));

        Ok(LiveStream::new(
            device.clone(),
            receiver,
            audio,
            Box::new(FakeTracks {
                sender: Some(sender),
                released: Arc::clone(&self.released),
            }),
        ))
    }

    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::Virtual
    }
}

/// How a fake encoder session behaves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncoderBehavior {
    /// Header, one chunk per tick while not paused, trailer
    Normal,
    /// Never produces data
    Empty,
    /// Header, then an error
    FailMidway,
}

/// Observations shared between a fake encoder and the test
#[derive(Debug, Default)]
pub struct EncoderLog {
    pub calls: Mutex<Vec<&'static str>>,
    pub profile: Mutex<Option<&'static str>>,
    pub last_frame: Mutex<Option<Arc<CameraFrame>>>,
    pub had_audio: AtomicBool,
}

impl EncoderLog {
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }
}

pub struct FakeEncoder {
    pub available: bool,
    pub supported: Vec<&'static str>,
    pub fail_start: bool,
    pub behavior: EncoderBehavior,
    pub log: Arc<EncoderLog>,
}

impl FakeEncoder {
    pub fn new() -> Self {
        Self {
            available: true,
            supported: vec!["video/webm;codecs=vp9", "video/webm;codecs=vp8", "video/webm"],
            fail_start: false,
            behavior: EncoderBehavior::Normal,
            log: Arc::new(EncoderLog::default()),
        }
    }

    pub fn with_behavior(behavior: EncoderBehavior) -> Self {
        Self {
            behavior,
            ..Self::new()
        }
    }

    pub fn unsupported() -> Self {
        Self {
            supported: Vec::new(),
            ..Self::new()
        }
    }

    pub fn log(&self) -> Arc<EncoderLog> {
        Arc::clone(&self.log)
    }
}

pub const HEADER: &[u8] = b"HDR";
pub const TRAILER: &[u8] = b"END";

impl MediaEncoder for FakeEncoder {
    fn is_available(&self) -> bool {
        self.available
    }

    fn is_type_supported(&self, profile: &EncodingProfile) -> bool {
        self.supported.contains(&profile.mime_type)
    }

    fn start(
        &self,
        stream: DerivedStream,
        profile: &EncodingProfile,
        _config: &EncoderConfig,
    ) -> Result<Box<dyn EncoderSession>, RecordingError> {
        self.log.calls.lock().unwrap().push("start");
        if self.fail_start {
            return Err(RecordingError::RecorderInitFailed("fake refused".to_string()));
        }
        *self.log.profile.lock().unwrap() = Some(profile.mime_type);
        self.log
            .had_audio
            .store(stream.audio.is_some(), Ordering::SeqCst);

        let (sender, receiver) = mpsc::unbounded_channel();
        let paused = Arc::new(AtomicBool::new(false));
        let stopped = Arc::new(AtomicBool::new(false));

        let behavior = self.behavior;
        let log = Arc::clone(&self.log);
        let task_paused = Arc::clone(&paused);
        let task_stopped = Arc::clone(&stopped);
        let video = stream.video;
        tokio::spawn(async move {
            if behavior != EncoderBehavior::Empty {
                let _ = sender.send(EncoderEvent::Chunk(HEADER.to_vec()));
            }
            if behavior == EncoderBehavior::FailMidway {
                let _ = sender.send(EncoderEvent::Error("fake encoder failure".to_string()));
            }
            while !task_stopped.load(Ordering::SeqCst) {
                tokio::time::sleep(Duration::from_millis(5)).await;
                if let Some(frame) = video.borrow().clone() {
                    *log.last_frame.lock().unwrap() = Some(frame);
                }
                if behavior == EncoderBehavior::Normal && !task_paused.load(Ordering::SeqCst) {
                    let _ = sender.send(EncoderEvent::Chunk(vec![b'.']));
                }
            }
            if behavior == EncoderBehavior::Normal {
                let _ = sender.send(EncoderEvent::Chunk(TRAILER.to_vec()));
            }
            let _ = sender.send(EncoderEvent::Stopped);
        });

        Ok(Box::new(FakeSession {
            events: Some(event_stream(receiver)),
            paused,
            stopped,
            log: Arc::clone(&self.log),
        }))
    }
}

struct FakeSession {
    events: Option<EncoderEvents>,
    paused: Arc<AtomicBool>,
    stopped: Arc<AtomicBool>,
    log: Arc<EncoderLog>,
}

impl EncoderSession for FakeSession {
    fn take_events(&mut self) -> Option<EncoderEvents> {
        self.events.take()
    }

    fn pause(&mut self) {
        self.log.calls.lock().unwrap().push("pause");
        self.paused.store(true, Ordering::SeqCst);
    }

    fn resume(&mut self) {
        self.log.calls.lock().unwrap().push("resume");
        self.paused.store(false, Ordering::SeqCst);
    }

    fn stop(&mut self) {
        if !self.stopped.swap(true, Ordering::SeqCst) {
            self.log.calls.lock().unwrap().push("stop");
        }
    }
}

pub fn test_config(download_dir: &Path) -> Config {
    Config {
        record_audio: false,
        download_dir: Some(download_dir.to_path_buf()),
        ..Config::default()
    }
}

/// Runtime over fakes with a fast tick; must be called inside a tokio runtime
pub fn runtime(config: Config, backend: FakeBackend, encoder: FakeEncoder) -> Runtime {
    let mut model = AppModel::new(config, Arc::new(backend), Arc::new(encoder));
    model.tick_interval = Duration::from_millis(10);
    Runtime::new(model)
}

/// Start the camera and wait until it is open (or failed)
pub async fn start_camera(runtime: &mut Runtime) -> bool {
    runtime.dispatch(Message::StartCamera);
    runtime
        .run_until(|model| !model.is_acquiring(), WAIT)
        .await
}
