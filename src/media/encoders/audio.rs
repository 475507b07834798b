// SPDX-License-Identifier: MPL-2.0

//! Audio encoder for WebM recordings
//!
//! WebM carries Opus (or Vorbis); Opus is preferred and Vorbis is the
//! fallback when the Opus plugin is missing.

use gstreamer as gst;
use gstreamer::prelude::*;
use tracing::{debug, info};

/// Audio codec types in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCodec {
    Opus,
    Vorbis,
}

impl AudioCodec {
    pub const PRIORITY: [AudioCodec; 2] = [AudioCodec::Opus, AudioCodec::Vorbis];

    pub fn element_name(&self) -> &'static str {
        match self {
            AudioCodec::Opus => "opusenc",
            AudioCodec::Vorbis => "vorbisenc",
        }
    }

    /// Target bitrate in bits per second
    pub fn bitrate_bps(&self) -> i32 {
        128_000
    }
}

/// Create the first available audio encoder
pub fn select_audio_encoder() -> Result<(gst::Element, AudioCodec), String> {
    gst::init().map_err(|e| format!("Failed to initialize GStreamer: {}", e))?;

    for codec in AudioCodec::PRIORITY {
        if let Ok(encoder) = gst::ElementFactory::make(codec.element_name())
            .name("audio-encoder")
            .build()
        {
            if encoder.has_property("bitrate") {
                encoder.set_property_from_str("bitrate", &codec.bitrate_bps().to_string());
            }
            info!(encoder = codec.element_name(), "Selected audio encoder");
            return Ok((encoder, codec));
        }
        debug!(encoder = codec.element_name(), "Audio encoder not available");
    }

    Err("No audio encoder available. Install the GStreamer opus or vorbis plugin".to_string())
}
