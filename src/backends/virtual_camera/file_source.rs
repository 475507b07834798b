// SPDX-License-Identifier: GPL-3.0-only

//! Still images as a virtual camera source

use crate::backends::camera::types::{BackendError, BackendResult, CameraFrame};
use std::path::Path;
use tracing::info;

/// Load an image file as a single RGBA frame
pub fn load_image_as_frame(path: &Path) -> BackendResult<CameraFrame> {
    info!(path = %path.display(), "Loading image file");

    let img = image::open(path).map_err(|e| {
        BackendError::DeviceNotFound(format!("Failed to load image '{}': {}", path.display(), e))
    })?;

    let rgba = img.to_rgba8();
    info!(width = rgba.width(), height = rgba.height(), "Image loaded successfully");

    Ok(CameraFrame::from_image(rgba))
}
