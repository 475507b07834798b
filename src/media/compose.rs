// SPDX-License-Identifier: GPL-3.0-only

//! Frame composition: filter, then mirror for front cameras
//!
//! Preview, photo capture and the recording compositor all go through
//! [`compose_frame`], so what the user sees is what gets saved.
//!
//! Every filter commutes with a horizontal flip, so the flip is applied
//! last. That keeps a front-camera image an exact mirror of the rear-camera
//! image even for blur, whose rounding depends on scan direction.

use super::filters::{FilterType, apply_filter};
use crate::backends::camera::types::{CameraFrame, FacingMode};
use image::{RgbaImage, imageops};

/// Mirror (front-facing only) and filter an image
pub fn compose_image(image: RgbaImage, facing: FacingMode, filter: FilterType) -> RgbaImage {
    let filtered = apply_filter(image, filter);
    if facing.is_mirrored() {
        imageops::flip_horizontal(&filtered)
    } else {
        filtered
    }
}

/// Compose a camera frame; `None` if the frame's buffer doesn't match its size
pub fn compose_frame(frame: &CameraFrame, facing: FacingMode, filter: FilterType) -> Option<RgbaImage> {
    frame
        .to_image()
        .map(|image| compose_image(image, facing, filter))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn marker_image() -> RgbaImage {
        let mut image = RgbaImage::from_pixel(6, 3, Rgba([20, 20, 20, 255]));
        image.put_pixel(0, 1, Rgba([250, 10, 10, 255]));
        image
    }

    #[test]
    fn test_rear_is_not_mirrored() {
        let out = compose_image(marker_image(), FacingMode::Rear, FilterType::None);
        assert_eq!(out, marker_image());
    }

    #[test]
    fn test_front_is_mirror_of_rear_after_filter() {
        for filter in FilterType::ALL {
            let rear = compose_image(marker_image(), FacingMode::Rear, filter);
            let front = compose_image(marker_image(), FacingMode::Front, filter);
            assert_eq!(front, imageops::flip_horizontal(&rear), "filter {}", filter);
        }
    }

    #[test]
    fn test_compose_frame_rejects_truncated_data() {
        let mut frame = CameraFrame::from_image(marker_image());
        frame.data = std::sync::Arc::from(&frame.data[..8]);
        assert!(compose_frame(&frame, FacingMode::Rear, FilterType::None).is_none());
    }
}
