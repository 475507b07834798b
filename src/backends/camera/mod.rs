// SPDX-License-Identifier: MPL-2.0

//! Camera backend abstraction
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │   AppModel          │
//! └──────────┬──────────┘
//!            │ acquire_stream(facing)
//!            ▼
//! ┌─────────────────────┐
//! │  CameraBackend Trait│  ← Common interface
//! └──────────┬──────────┘
//!            │
//!       ┌────┴─────┐
//!       ▼          ▼
//!  ┌─────────┐ ┌─────────┐
//!  │GStreamer│ │ Virtual │
//!  └─────────┘ └─────────┘
//! ```
//!
//! A backend only knows how to list devices and open one. Choosing the
//! device for a requested facing, and falling back when that fails, lives in
//! [`acquire_stream`] so every backend gets the same policy.

pub mod frame_loop;
pub mod gstreamer;
pub mod types;

pub use frame_loop::{FrameLoop, LoopAction};
pub use types::*;

use crate::errors::CameraError;
use tracing::{info, warn};

/// Camera backend trait
///
/// Implementations must be usable from a blocking worker thread; opening a
/// device may take a while.
pub trait CameraBackend: Send + Sync {
    /// Enumerate available cameras on this backend
    fn enumerate_cameras(&self) -> BackendResult<Vec<CameraDevice>>;

    /// Open a camera, and the default microphone when `with_audio` is set
    ///
    /// A microphone that can't be opened is not an error: the stream is
    /// returned without an audio track.
    ///
    /// # Returns
    /// * `Ok(LiveStream)` - Frames are flowing (or about to)
    /// * `Err(BackendError::PermissionDenied)` - The platform refused access
    /// * `Err(BackendError)` - The device could not be started
    fn open(&self, device: &CameraDevice, with_audio: bool) -> BackendResult<LiveStream>;

    /// Get the backend type identifier
    fn backend_type(&self) -> CameraBackendType;
}

/// Create a backend of the given type
pub fn get_backend(backend_type: CameraBackendType) -> Box<dyn CameraBackend> {
    match backend_type {
        CameraBackendType::GStreamer => Box::new(gstreamer::GStreamerBackend::new()),
        CameraBackendType::Virtual => Box::new(crate::backends::virtual_camera::VirtualBackend::new()),
    }
}

/// Open a stream for the requested facing
///
/// Devices whose location matches `facing` are tried first, then every other
/// device in enumeration order. The first device that opens wins.
///
/// Fails with [`CameraError::PermissionDenied`] if any attempt was refused by
/// the platform and nothing else opened, otherwise with
/// [`CameraError::DeviceUnavailable`].
pub fn acquire_stream(
    backend: &dyn CameraBackend,
    facing: FacingMode,
    with_audio: bool,
) -> Result<LiveStream, CameraError> {
    let cameras = backend.enumerate_cameras().map_err(|e| match e {
        BackendError::PermissionDenied(_) => CameraError::PermissionDenied,
        other => CameraError::DeviceUnavailable(other.to_string()),
    })?;

    if cameras.is_empty() {
        return Err(CameraError::DeviceUnavailable("no cameras found".to_string()));
    }

    let (exact, fallback): (Vec<_>, Vec<_>) = cameras
        .iter()
        .partition(|camera| camera.facing() == Some(facing));

    if exact.is_empty() {
        info!(%facing, "No camera reports this facing, falling back to any camera");
    }

    let mut denied = false;
    let mut last_error = None;

    for device in exact.into_iter().chain(fallback) {
        match backend.open(device, with_audio) {
            Ok(stream) => {
                info!(
                    device = %device.name,
                    %facing,
                    exact = device.facing() == Some(facing),
                    audio = stream.audio().is_some(),
                    "Camera stream acquired"
                );
                return Ok(stream);
            }
            Err(e) => {
                warn!(device = %device.name, error = %e, "Failed to open camera");
                if matches!(e, BackendError::PermissionDenied(_)) {
                    denied = true;
                }
                last_error = Some(e);
            }
        }
    }

    if denied {
        Err(CameraError::PermissionDenied)
    } else {
        Err(CameraError::DeviceUnavailable(
            last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no camera could be opened".to_string()),
        ))
    }
}
