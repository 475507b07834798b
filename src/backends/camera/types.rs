// SPDX-License-Identifier: GPL-3.0-only

//! Shared types for camera backends

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info};

/// Which way the camera points
///
/// Front cameras face the user and are shown mirrored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    #[default]
    Front,
    Rear,
}

impl FacingMode {
    pub fn toggled(self) -> Self {
        match self {
            FacingMode::Front => FacingMode::Rear,
            FacingMode::Rear => FacingMode::Front,
        }
    }

    /// Front-facing output is flipped horizontally before filtering
    pub fn is_mirrored(self) -> bool {
        self == FacingMode::Front
    }

    /// Map a device location property to a facing mode
    ///
    /// Accepts libcamera's `front`/`back`, the `user`/`environment` pair used
    /// by web cameras, and `rear`. External or unknown locations have no facing.
    pub fn from_location(location: &str) -> Option<Self> {
        match location.trim().to_ascii_lowercase().as_str() {
            "front" | "user" => Some(FacingMode::Front),
            "back" | "rear" | "environment" => Some(FacingMode::Rear),
            _ => None,
        }
    }
}

impl std::fmt::Display for FacingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FacingMode::Front => write!(f, "front"),
            FacingMode::Rear => write!(f, "rear"),
        }
    }
}

impl std::str::FromStr for FacingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FacingMode::from_location(s).ok_or_else(|| format!("unknown facing mode '{}'", s))
    }
}

/// Camera backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CameraBackendType {
    /// GStreamer device monitor and capture pipelines
    #[default]
    GStreamer,
    /// In-process synthetic camera and microphone
    Virtual,
}

impl std::fmt::Display for CameraBackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraBackendType::GStreamer => write!(f, "GStreamer"),
            CameraBackendType::Virtual => write!(f, "virtual"),
        }
    }
}

/// Represents a camera device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDevice {
    pub name: String,
    /// Backend-specific identifier used to open the device
    pub path: String,
    /// Raw location property: "front", "back", "external", ...
    pub camera_location: Option<String>,
}

impl CameraDevice {
    pub fn facing(&self) -> Option<FacingMode> {
        self.camera_location
            .as_deref()
            .and_then(FacingMode::from_location)
    }

    /// Location for display, `unknown` when the device doesn't report one
    pub fn location_label(&self) -> &str {
        self.camera_location.as_deref().unwrap_or("unknown")
    }
}

/// A single video frame, tightly packed RGBA
#[derive(Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    pub data: Arc<[u8]>,
    pub captured_at: Instant,
}

impl CameraFrame {
    pub fn from_image(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            data: Arc::from(image.into_raw().into_boxed_slice()),
            captured_at: Instant::now(),
        }
    }

    /// Copy the pixels into an owned image buffer
    pub fn to_image(&self) -> Option<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.data.to_vec())
    }
}

impl std::fmt::Debug for CameraFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// Latest-frame channel: receivers always see the most recent frame only
pub type FrameSender = watch::Sender<Option<Arc<CameraFrame>>>;
pub type FrameReceiver = watch::Receiver<Option<Arc<CameraFrame>>>;

pub fn frame_channel() -> (FrameSender, FrameReceiver) {
    watch::channel(None)
}

/// Interleaved S16LE audio layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    pub rate: u32,
    pub channels: u32,
}

impl AudioFormat {
    pub fn bytes_per_frame(&self) -> usize {
        self.channels as usize * 2
    }
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self {
            rate: crate::constants::pipeline::AUDIO_RATE,
            channels: crate::constants::pipeline::AUDIO_CHANNELS,
        }
    }
}

/// A block of interleaved S16LE samples
#[derive(Debug, Clone)]
pub struct AudioChunk {
    pub data: Arc<[u8]>,
}

/// Microphone track of a live stream
///
/// Every subscriber gets its own copy of each chunk from the moment it subscribed.
#[derive(Debug, Clone)]
pub struct AudioTrack {
    pub format: AudioFormat,
    sender: broadcast::Sender<AudioChunk>,
}

impl AudioTrack {
    pub fn new(format: AudioFormat) -> Self {
        let (sender, _) = broadcast::channel(crate::constants::pipeline::AUDIO_CHANNEL_CAPACITY);
        Self { format, sender }
    }

    /// Publish a chunk; dropped silently when nobody is listening
    pub fn push(&self, chunk: AudioChunk) {
        let _ = self.sender.send(chunk);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AudioChunk> {
        self.sender.subscribe()
    }
}

/// Producer side of a live stream (pipeline, generator thread)
pub trait StreamTracks: Send {
    /// Stop producing and release the device
    fn stop(&mut self);
}

/// An open camera (and optionally microphone) stream
///
/// Dropping the stream releases its tracks.
pub struct LiveStream {
    pub device: CameraDevice,
    frames: FrameReceiver,
    audio: Option<AudioTrack>,
    tracks: Box<dyn StreamTracks>,
    stopped: bool,
}

impl LiveStream {
    pub fn new(
        device: CameraDevice,
        frames: FrameReceiver,
        audio: Option<AudioTrack>,
        tracks: Box<dyn StreamTracks>,
    ) -> Self {
        Self {
            device,
            frames,
            audio,
            tracks,
            stopped: false,
        }
    }

    /// New receiver for the video track
    pub fn frames(&self) -> FrameReceiver {
        self.frames.clone()
    }

    /// Most recent frame, if the camera has produced one
    pub fn latest_frame(&self) -> Option<Arc<CameraFrame>> {
        self.frames.borrow().clone()
    }

    pub fn audio(&self) -> Option<&AudioTrack> {
        self.audio.as_ref()
    }

    pub fn is_live(&self) -> bool {
        !self.stopped
    }

    /// Release every track; safe to call more than once
    pub fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        info!(device = %self.device.name, "Releasing camera stream");
        self.tracks.stop();
    }
}

impl Drop for LiveStream {
    fn drop(&mut self) {
        if self.is_live() {
            debug!(device = %self.device.name, "LiveStream dropped, stopping tracks");
            self.stop();
        }
    }
}

impl std::fmt::Debug for LiveStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveStream")
            .field("device", &self.device)
            .field("audio", &self.audio.is_some())
            .field("live", &self.is_live())
            .finish()
    }
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Error types for backend operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The platform refused access to the device
    PermissionDenied(String),
    /// Backend is not available on this system
    NotAvailable(String),
    /// Failed to start the capture pipeline
    InitializationFailed(String),
    /// Camera device not found
    DeviceNotFound(String),
    /// Other errors
    Other(String),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::PermissionDenied(msg) => write!(f, "Permission denied: {}", msg),
            BackendError::NotAvailable(msg) => write!(f, "Backend not available: {}", msg),
            BackendError::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            BackendError::DeviceNotFound(msg) => write!(f, "Device not found: {}", msg),
            BackendError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct CountingTracks(Arc<AtomicU32>);

    impl StreamTracks for CountingTracks {
        fn stop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn device() -> CameraDevice {
        CameraDevice {
            name: "Test".to_string(),
            path: "test:0".to_string(),
            camera_location: Some("back".to_string()),
        }
    }

    #[test]
    fn test_facing_from_location() {
        assert_eq!(FacingMode::from_location("front"), Some(FacingMode::Front));
        assert_eq!(FacingMode::from_location("user"), Some(FacingMode::Front));
        assert_eq!(FacingMode::from_location("Back"), Some(FacingMode::Rear));
        assert_eq!(FacingMode::from_location("environment"), Some(FacingMode::Rear));
        assert_eq!(FacingMode::from_location("external"), None);
        assert_eq!(device().facing(), Some(FacingMode::Rear));
    }

    #[test]
    fn test_facing_toggle_and_mirror() {
        assert_eq!(FacingMode::Front.toggled(), FacingMode::Rear);
        assert_eq!(FacingMode::Rear.toggled(), FacingMode::Front);
        assert!(FacingMode::Front.is_mirrored());
        assert!(!FacingMode::Rear.is_mirrored());
        assert_eq!("rear".parse::<FacingMode>(), Ok(FacingMode::Rear));
        assert!("sideways".parse::<FacingMode>().is_err());
    }

    #[test]
    fn test_stream_stop_is_idempotent() {
        let count = Arc::new(AtomicU32::new(0));
        let (_tx, rx) = frame_channel();
        let mut stream = LiveStream::new(device(), rx, None, Box::new(CountingTracks(count.clone())));

        assert!(stream.is_live());
        stream.stop();
        stream.stop();
        assert!(!stream.is_live());
        drop(stream);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_stream_drop_releases_tracks() {
        let count = Arc::new(AtomicU32::new(0));
        let (_tx, rx) = frame_channel();
        drop(LiveStream::new(device(), rx, None, Box::new(CountingTracks(count.clone()))));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_frame_image_conversion() {
        let image = RgbaImage::from_pixel(4, 2, image::Rgba([1, 2, 3, 255]));
        let frame = CameraFrame::from_image(image.clone());
        assert_eq!((frame.width, frame.height), (4, 2));
        assert_eq!(frame.to_image(), Some(image));
    }
}
