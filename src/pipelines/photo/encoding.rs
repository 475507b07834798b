// SPDX-License-Identifier: GPL-3.0-only

//! Photo encoding
//!
//! Stills are always PNG so the filtered pixels survive unchanged.

use crate::errors::PhotoError;
use image::{ImageFormat, RgbaImage};
use std::io::Cursor;
use tracing::debug;

/// Supported encoding formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncodingFormat {
    /// PNG format (lossless compression)
    #[default]
    Png,
}

impl EncodingFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            EncodingFormat::Png => "png",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            EncodingFormat::Png => "image/png",
        }
    }

    fn to_image_format(self) -> ImageFormat {
        match self {
            EncodingFormat::Png => ImageFormat::Png,
        }
    }
}

/// Encode an image into an in-memory file
pub fn encode_image(image: &RgbaImage, format: EncodingFormat) -> Result<Vec<u8>, PhotoError> {
    let mut bytes = Cursor::new(Vec::new());
    image.write_to(&mut bytes, format.to_image_format())?;
    let bytes = bytes.into_inner();
    debug!(
        width = image.width(),
        height = image.height(),
        size = bytes.len(),
        format = format.extension(),
        "Encoded photo"
    );
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_png_signature_and_decode() {
        let image = RgbaImage::from_pixel(3, 2, image::Rgba([9, 8, 7, 255]));
        let bytes = encode_image(&image, EncodingFormat::Png).unwrap();

        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded, image);
    }
}
