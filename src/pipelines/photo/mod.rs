// SPDX-License-Identifier: MPL-2.0

//! Async photo capture pipeline
//!
//! ```text
//! latest frame → filter → mirror (front) → PNG encode → in-memory photo
//!       ↓
//! Preview continues uninterrupted
//! ```
//!
//! Composition and encoding run on the blocking pool; nothing touches disk
//! until the user downloads the photo.

pub mod encoding;

pub use encoding::{EncodingFormat, encode_image};

use crate::backends::camera::types::{CameraFrame, FacingMode};
use crate::errors::PhotoError;
use crate::media::{FilterType, compose_frame};
use chrono::{DateTime, Local};
use image::RgbaImage;
use std::sync::Arc;
use tracing::info;

/// A captured, encoded still held in memory
#[derive(Debug, Clone)]
pub struct CapturedPhoto {
    /// Composed pixels, for on-screen preview
    pub image: Arc<RgbaImage>,
    /// Encoded file contents
    pub data: Arc<Vec<u8>>,
    pub format: EncodingFormat,
    pub facing: FacingMode,
    pub filter: FilterType,
    pub captured_at: DateTime<Local>,
}

/// Compose and encode one frame
pub fn capture_frame(
    frame: &CameraFrame,
    facing: FacingMode,
    filter: FilterType,
) -> Result<CapturedPhoto, PhotoError> {
    let image = compose_frame(frame, facing, filter).ok_or_else(|| {
        PhotoError::EncodingFailed(format!(
            "frame buffer does not match {}x{}",
            frame.width, frame.height
        ))
    })?;
    let format = EncodingFormat::default();
    let data = encode_image(&image, format)?;

    info!(
        width = image.width(),
        height = image.height(),
        %facing,
        %filter,
        size = data.len(),
        "Photo captured"
    );

    Ok(CapturedPhoto {
        image: Arc::new(image),
        data: Arc::new(data),
        format,
        facing,
        filter,
        captured_at: Local::now(),
    })
}

/// [`capture_frame`] on the blocking pool
pub async fn capture(
    frame: Option<Arc<CameraFrame>>,
    facing: FacingMode,
    filter: FilterType,
) -> Result<CapturedPhoto, PhotoError> {
    let frame = frame.ok_or(PhotoError::NoFrameAvailable)?;
    tokio::task::spawn_blocking(move || capture_frame(&frame, facing, filter))
        .await
        .map_err(|e| PhotoError::EncodingFailed(format!("capture task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, imageops};

    fn asymmetric_frame() -> CameraFrame {
        let mut image = RgbaImage::from_pixel(8, 4, Rgba([30, 60, 90, 255]));
        image.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        CameraFrame::from_image(image)
    }

    #[tokio::test]
    async fn test_capture_without_frame_fails() {
        let result = capture(None, FacingMode::Front, FilterType::None).await;
        assert!(matches!(result, Err(PhotoError::NoFrameAvailable)));
    }

    #[tokio::test]
    async fn test_front_capture_is_mirror_of_rear() {
        let frame = Arc::new(asymmetric_frame());
        let front = capture(Some(frame.clone()), FacingMode::Front, FilterType::Sepia)
            .await
            .unwrap();
        let rear = capture(Some(frame), FacingMode::Rear, FilterType::Sepia)
            .await
            .unwrap();

        assert_eq!(*front.image, imageops::flip_horizontal(&*rear.image));
    }

    #[test]
    fn test_captured_data_decodes_to_preview() {
        let photo = capture_frame(&asymmetric_frame(), FacingMode::Rear, FilterType::Invert).unwrap();
        let decoded = image::load_from_memory(&photo.data).unwrap().to_rgba8();
        assert_eq!(decoded, *photo.image);
        assert_eq!(decoded.get_pixel(0, 0).0, [0, 255, 255, 255]);
    }
}
