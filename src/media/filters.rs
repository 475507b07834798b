// SPDX-License-Identifier: MPL-2.0

//! CPU filter implementations shared by preview, photo and recording
//!
//! Each filter has fixed parameters modeled on the CSS filter functions
//! (`grayscale(100%)`, `hue-rotate(90deg)`, ...). Colour filters work per
//! pixel on linear 0..1 floats; blur works on the whole image.

use image::{Rgba, RgbaImage, imageops};
use serde::{Deserialize, Serialize};

/// Filter types for camera output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterType {
    /// No filter applied
    #[default]
    None,
    /// Fully desaturated
    Grayscale,
    /// Warm brownish tint
    Sepia,
    /// Inverted colors
    Invert,
    /// Gaussian-like blur
    Blur,
    /// Brighter image
    Brightness,
    /// Stretched contrast
    Contrast,
    /// Boosted saturation
    Saturate,
    /// Hue rotated by a quarter turn
    HueRotate,
    /// Faded sepia with darkened edges
    Vintage,
}

impl FilterType {
    pub const ALL: [FilterType; 10] = [
        FilterType::None,
        FilterType::Grayscale,
        FilterType::Sepia,
        FilterType::Invert,
        FilterType::Blur,
        FilterType::Brightness,
        FilterType::Contrast,
        FilterType::Saturate,
        FilterType::HueRotate,
        FilterType::Vintage,
    ];

    /// Stable identifier, also accepted by `FromStr`
    pub fn id(&self) -> &'static str {
        match self {
            FilterType::None => "none",
            FilterType::Grayscale => "grayscale",
            FilterType::Sepia => "sepia",
            FilterType::Invert => "invert",
            FilterType::Blur => "blur",
            FilterType::Brightness => "brightness",
            FilterType::Contrast => "contrast",
            FilterType::Saturate => "saturate",
            FilterType::HueRotate => "hue-rotate",
            FilterType::Vintage => "vintage",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            FilterType::None => "Original",
            FilterType::Grayscale => "Grayscale",
            FilterType::Sepia => "Sepia",
            FilterType::Invert => "Invert",
            FilterType::Blur => "Blur",
            FilterType::Brightness => "Bright",
            FilterType::Contrast => "Contrast",
            FilterType::Saturate => "Saturate",
            FilterType::HueRotate => "Hue",
            FilterType::Vintage => "Vintage",
        }
    }

    fn position(&self) -> usize {
        Self::ALL.iter().position(|f| f == self).unwrap_or(0)
    }

    pub fn next(&self) -> Self {
        Self::ALL[(self.position() + 1) % Self::ALL.len()]
    }

    pub fn previous(&self) -> Self {
        Self::ALL[(self.position() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl std::fmt::Display for FilterType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl std::str::FromStr for FilterType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|filter| filter.id() == wanted)
            .ok_or_else(|| {
                let known: Vec<_> = Self::ALL.iter().map(|f| f.id()).collect();
                format!("unknown filter '{}' (expected one of: {})", s, known.join(", "))
            })
    }
}

/// Blur radius of `FilterType::Blur`, in pixels
const BLUR_SIGMA: f32 = 3.0;

/// Apply `filter` to an image
pub fn apply_filter(image: RgbaImage, filter: FilterType) -> RgbaImage {
    match filter {
        FilterType::None => image,
        FilterType::Blur => imageops::fast_blur(&image, BLUR_SIGMA),
        _ => {
            let mut image = image;
            let (width, height) = image.dimensions();
            for (x, y, pixel) in image.enumerate_pixels_mut() {
                apply_filter_pixel(pixel, filter, x, y, width, height);
            }
            image
        }
    }
}

#[inline]
fn apply_filter_pixel(pixel: &mut Rgba<u8>, filter: FilterType, x: u32, y: u32, width: u32, height: u32) {
    let [r, g, b, a] = pixel.0;
    let (mut r, mut g, mut b) = (r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);

    match filter {
        FilterType::None | FilterType::Blur => {}

        FilterType::Grayscale => {
            let gray = luminance(r, g, b);
            (r, g, b) = (gray, gray, gray);
        }

        FilterType::Sepia => (r, g, b) = sepia(r, g, b, 1.0),

        FilterType::Invert => (r, g, b) = (1.0 - r, 1.0 - g, 1.0 - b),

        FilterType::Brightness => (r, g, b) = (r * 1.5, g * 1.5, b * 1.5),

        FilterType::Contrast => (r, g, b) = (contrast(r, 1.5), contrast(g, 1.5), contrast(b, 1.5)),

        FilterType::Saturate => (r, g, b) = saturate(r, g, b, 2.0),

        FilterType::HueRotate => (r, g, b) = hue_rotate(r, g, b, 90.0),

        FilterType::Vintage => {
            (r, g, b) = sepia(r, g, b, 0.6);
            (r, g, b) = (contrast(r, 1.1), contrast(g, 1.1), contrast(b, 1.1));
            // Pixel centers, so the falloff is symmetric under mirroring
            let tex_x = (x as f32 + 0.5) / width.max(1) as f32 - 0.5;
            let tex_y = (y as f32 + 0.5) / height.max(1) as f32 - 0.5;
            let dist = (tex_x * tex_x + tex_y * tex_y).sqrt();
            let vignette = 0.95 * (1.0 - 0.5 * smoothstep(0.35, 0.8, dist));
            (r, g, b) = (r * vignette, g * vignette, b * vignette);
        }
    }

    pixel.0 = [to_byte(r), to_byte(g), to_byte(b), a];
}

#[inline]
fn to_byte(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[inline]
fn luminance(r: f32, g: f32, b: f32) -> f32 {
    0.2126 * r + 0.7152 * g + 0.0722 * b
}

#[inline]
fn contrast(v: f32, amount: f32) -> f32 {
    (v - 0.5) * amount + 0.5
}

/// Sepia matrix blended with identity by `amount`
#[inline]
fn sepia(r: f32, g: f32, b: f32, amount: f32) -> (f32, f32, f32) {
    let inv = 1.0 - amount;
    (
        (0.393 + 0.607 * inv) * r + (0.769 - 0.769 * inv) * g + (0.189 - 0.189 * inv) * b,
        (0.349 - 0.349 * inv) * r + (0.686 + 0.314 * inv) * g + (0.168 - 0.168 * inv) * b,
        (0.272 - 0.272 * inv) * r + (0.534 - 0.534 * inv) * g + (0.131 + 0.869 * inv) * b,
    )
}

#[inline]
fn saturate(r: f32, g: f32, b: f32, s: f32) -> (f32, f32, f32) {
    (
        (0.213 + 0.787 * s) * r + (0.715 - 0.715 * s) * g + (0.072 - 0.072 * s) * b,
        (0.213 - 0.213 * s) * r + (0.715 + 0.285 * s) * g + (0.072 - 0.072 * s) * b,
        (0.213 - 0.213 * s) * r + (0.715 - 0.715 * s) * g + (0.072 + 0.928 * s) * b,
    )
}

#[inline]
fn hue_rotate(r: f32, g: f32, b: f32, degrees: f32) -> (f32, f32, f32) {
    let (sin, cos) = degrees.to_radians().sin_cos();
    (
        (0.213 + cos * 0.787 - sin * 0.213) * r
            + (0.715 - cos * 0.715 - sin * 0.715) * g
            + (0.072 - cos * 0.072 + sin * 0.928) * b,
        (0.213 - cos * 0.213 + sin * 0.143) * r
            + (0.715 + cos * 0.285 + sin * 0.140) * g
            + (0.072 - cos * 0.072 - sin * 0.283) * b,
        (0.213 - cos * 0.213 - sin * 0.787) * r
            + (0.715 - cos * 0.715 + sin * 0.715) * g
            + (0.072 + cos * 0.928 + sin * 0.072) * b,
    )
}

#[inline]
fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}
