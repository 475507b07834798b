// SPDX-License-Identifier: GPL-3.0-only

//! Synthetic test signals
//!
//! The video pattern is deliberately asymmetric: a white marker sits in the
//! top-left corner so a mirrored preview is obvious at a glance, and a bar
//! sweeps along the bottom edge so a frozen stream is too.

use crate::backends::camera::types::AudioFormat;
use image::{Rgba, RgbaImage};

const BARS: [[u8; 3]; 8] = [
    [192, 192, 192],
    [192, 192, 0],
    [0, 192, 192],
    [0, 192, 0],
    [192, 0, 192],
    [192, 0, 0],
    [0, 0, 192],
    [16, 16, 16],
];

/// Color bars for frame number `tick`
pub fn color_bars(width: u32, height: u32, tick: u64) -> RgbaImage {
    let width = width.max(1);
    let height = height.max(1);
    let marker = (width.min(height) / 8).max(1);
    let sweep_row = height - (height / 16).max(1);
    let sweep_x = (tick % width as u64) as u32;
    let sweep_len = (width / 10).max(1);

    RgbaImage::from_fn(width, height, |x, y| {
        if x < marker && y < marker {
            return Rgba([255, 255, 255, 255]);
        }
        if y >= sweep_row && x >= sweep_x && x < sweep_x + sweep_len {
            return Rgba([255, 255, 255, 255]);
        }
        let bar = BARS[(x as usize * BARS.len()) / width as usize];
        Rgba([bar[0], bar[1], bar[2], 255])
    })
}

/// Sine tone as interleaved S16LE, continuing from sample `offset`
pub fn sine_tone(format: AudioFormat, frames: usize, offset: u64, frequency: f32) -> Vec<u8> {
    let mut data = Vec::with_capacity(frames * format.bytes_per_frame());
    let rate = format.rate.max(1) as f64;

    for i in 0..frames as u64 {
        let t = (offset + i) as f64 / rate;
        let sample = ((t * frequency as f64 * std::f64::consts::TAU).sin() * 0.2 * i16::MAX as f64) as i16;
        for _ in 0..format.channels {
            data.extend_from_slice(&sample.to_le_bytes());
        }
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::imageops;

    #[test]
    fn test_pattern_is_asymmetric() {
        let image = color_bars(64, 48, 0);
        assert_ne!(image, imageops::flip_horizontal(&image));
        assert_eq!(image.get_pixel(0, 0).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_pattern_moves() {
        assert_ne!(color_bars(64, 48, 0), color_bars(64, 48, 5));
    }

    #[test]
    fn test_tone_length_and_start() {
        let format = AudioFormat { rate: 48_000, channels: 2 };
        let data = sine_tone(format, 960, 0, 440.0);
        assert_eq!(data.len(), 960 * 4);
        assert_eq!(&data[..4], &[0, 0, 0, 0]);
    }
}
