// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Number of countdown steps shown before recording starts (3, 2, 1)
pub const COUNTDOWN_STEPS: u32 = 3;

/// Interval between countdown steps and between elapsed-timer ticks
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Default compositor cadence in frames per second
pub const DEFAULT_FRAMERATE: u32 = 30;

/// Filename offered when downloading a captured photo
pub const PHOTO_FILENAME: &str = "photo.png";

/// Filename offered when downloading a recorded video
///
/// Stays the same whichever encoding profile was negotiated.
pub const VIDEO_FILENAME: &str = "video.webm";

/// Video encoder bitrate presets
///
/// These presets define the target bitrate for video encoding based on resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BitratePreset {
    /// Low bitrate - smaller files, reduced quality
    Low,
    /// Medium bitrate - balanced quality and file size (default)
    #[default]
    Medium,
    /// High bitrate - larger files, better quality
    High,
}

impl BitratePreset {
    /// Get all preset variants for UI iteration
    pub const ALL: [BitratePreset; 3] = [
        BitratePreset::Low,
        BitratePreset::Medium,
        BitratePreset::High,
    ];

    /// Get display name for the preset
    pub fn display_name(&self) -> &'static str {
        match self {
            BitratePreset::Low => "Low",
            BitratePreset::Medium => "Medium",
            BitratePreset::High => "High",
        }
    }

    /// Get bitrate in kbps for a given frame width
    ///
    /// VP8/VP9 targets, roughly:
    /// - SD (640x480): Low=0.75, Medium=1.5, High=3 Mbps
    /// - HD (1280x720): Low=1.5, Medium=3, High=6 Mbps
    /// - Full HD (1920x1080) and above: Low=3, Medium=6, High=12 Mbps
    pub fn bitrate_kbps(&self, width: u32) -> u32 {
        let base = match get_resolution_tier(width) {
            ResolutionTier::SD => 750,
            ResolutionTier::HD => 1_500,
            ResolutionTier::FullHD => 3_000,
        };

        match self {
            BitratePreset::Low => base,
            BitratePreset::Medium => base * 2,
            BitratePreset::High => base * 4,
        }
    }
}

/// Resolution tiers used to scale encoder bitrates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionTier {
    /// 640x480 and below
    SD,
    /// Around 1280x720
    HD,
    /// 1920x1080 and above
    FullHD,
}

/// Classify a frame width into a resolution tier
pub fn get_resolution_tier(width: u32) -> ResolutionTier {
    match width {
        w if w >= 1920 => ResolutionTier::FullHD,
        w if w >= 1280 => ResolutionTier::HD,
        _ => ResolutionTier::SD,
    }
}

/// Format a bitrate in kbps for display
pub fn format_bitrate(kbps: u32) -> String {
    let mbps = kbps as f64 / 1000.0;
    if mbps == mbps.floor() {
        format!("{} Mbps", mbps as u32)
    } else {
        format!("{:.1} Mbps", mbps)
    }
}

/// GStreamer pipeline tuning
pub mod pipeline {
    /// Appsink buffers kept for the live preview
    pub const MAX_BUFFERS: u32 = 2;

    /// Pixel format delivered to the compositor and preview
    pub const OUTPUT_FORMAT: &str = "RGBA";

    /// Audio sample format carried between source and encoder
    pub const AUDIO_FORMAT: &str = "S16LE";

    /// Audio sample rate carried between source and encoder
    pub const AUDIO_RATE: u32 = 48_000;

    /// Audio channel count carried between source and encoder
    pub const AUDIO_CHANNELS: u32 = 2;

    /// Broadcast capacity for audio chunks shared with the recorder
    pub const AUDIO_CHANNEL_CAPACITY: usize = 64;
}

/// Timeouts around pipeline state changes
pub mod timing {
    use super::Duration;

    /// How long to wait for a camera pipeline to report errors after starting
    pub const START_ERROR_WINDOW: Duration = Duration::from_millis(500);

    /// Maximum time to wait for the encoder to drain after end-of-stream
    pub const FINALIZE_TIMEOUT: Duration = Duration::from_secs(5);

    /// Poll interval for encoder feeders and bus watchers
    pub const POLL_INTERVAL: Duration = Duration::from_millis(10);
}

/// Synthetic camera defaults
pub mod virtual_camera {
    /// Frame width produced by the synthetic camera
    pub const WIDTH: u32 = 640;

    /// Frame height produced by the synthetic camera
    pub const HEIGHT: u32 = 480;

    /// Samples per synthetic audio chunk (20 ms at 48 kHz)
    pub const AUDIO_CHUNK_FRAMES: usize = 960;

    /// Tone emitted by the synthetic microphone
    pub const TONE_HZ: f32 = 440.0;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_tiers() {
        assert_eq!(get_resolution_tier(640), ResolutionTier::SD);
        assert_eq!(get_resolution_tier(1280), ResolutionTier::HD);
        assert_eq!(get_resolution_tier(3840), ResolutionTier::FullHD);
    }

    #[test]
    fn test_format_bitrate() {
        assert_eq!(format_bitrate(3_000), "3 Mbps");
        assert_eq!(format_bitrate(1_500), "1.5 Mbps");
    }
}
