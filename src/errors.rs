// SPDX-License-Identifier: MPL-2.0

//! Error types for the camera application
//!
//! Every error is terminal to the operation that produced it only; the
//! application model surfaces it as a notification and keeps its state.

use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Camera-related errors
    Camera(CameraError),
    /// Recording-related errors
    Recording(RecordingError),
    /// Photo capture errors
    Photo(PhotoError),
    /// Configuration errors
    Config(String),
    /// Storage/filesystem errors
    Storage(String),
}

/// Camera and microphone acquisition errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    /// The platform refused access to the camera or microphone
    PermissionDenied,
    /// No camera could be opened (none present, busy, or failed to start)
    DeviceUnavailable(String),
}

/// Recording-specific errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordingError {
    /// No encoding profile is supported on this system
    RecordingUnsupported,
    /// The encoder rejected the chosen configuration
    RecorderInitFailed(String),
    /// The encoder failed while recording
    EncoderFailed(String),
    /// Finalization produced no media data
    EmptyRecording,
}

/// Photo capture errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhotoError {
    /// No live frame available for capture
    NoFrameAvailable,
    /// Encoding failed
    EncodingFailed(String),
}

impl AppError {
    /// Short title for a user-facing notification
    pub fn title(&self) -> &'static str {
        match self {
            AppError::Camera(CameraError::PermissionDenied) => "Camera access denied",
            AppError::Camera(_) => "Camera unavailable",
            AppError::Recording(_) => "Recording failed",
            AppError::Photo(_) => "Photo failed",
            AppError::Config(_) => "Configuration error",
            AppError::Storage(_) => "Download failed",
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Camera(e) => write!(f, "Camera error: {}", e),
            AppError::Recording(e) => write!(f, "Recording error: {}", e),
            AppError::Photo(e) => write!(f, "Photo error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Storage(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::PermissionDenied => write!(
                f,
                "Camera access failed. Allow camera and microphone permission and try again."
            ),
            CameraError::DeviceUnavailable(msg) => write!(f, "No usable camera: {}", msg),
        }
    }
}

impl fmt::Display for RecordingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordingError::RecordingUnsupported => {
                write!(f, "Recording is not supported on this system")
            }
            RecordingError::RecorderInitFailed(msg) => {
                write!(f, "Recording failed on this device: {}", msg)
            }
            RecordingError::EncoderFailed(msg) => write!(f, "Encoder error: {}", msg),
            RecordingError::EmptyRecording => write!(f, "The recording contains no data"),
        }
    }
}

impl fmt::Display for PhotoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhotoError::NoFrameAvailable => write!(f, "No frame available for capture"),
            PhotoError::EncodingFailed(msg) => write!(f, "Encoding failed: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for CameraError {}
impl std::error::Error for RecordingError {}
impl std::error::Error for PhotoError {}

impl From<CameraError> for AppError {
    fn from(err: CameraError) -> Self {
        AppError::Camera(err)
    }
}

impl From<RecordingError> for AppError {
    fn from(err: RecordingError) -> Self {
        AppError::Recording(err)
    }
}

impl From<PhotoError> for AppError {
    fn from(err: PhotoError) -> Self {
        AppError::Photo(err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<image::ImageError> for PhotoError {
    fn from(err: image::ImageError) -> Self {
        PhotoError::EncodingFailed(err.to_string())
    }
}
