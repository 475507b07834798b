// SPDX-License-Identifier: MPL-2.0

//! Video encoding profiles in priority order
//!
//! A profile pairs a MIME type with the codec and container that produce it.
//! Recording walks [`PROFILE_PRIORITY`] and uses the first profile the
//! encoder supports:
//!
//! 1. `video/webm;codecs=vp9`
//! 2. `video/webm;codecs=vp8`
//! 3. `video/webm` (baseline, VP8)

use super::detection::is_element_available;
use gstreamer as gst;
use gstreamer::prelude::*;
use tracing::debug;

/// Video codecs that fit a WebM container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoCodec {
    VP9,
    VP8,
}

impl VideoCodec {
    /// GStreamer encoder element
    pub fn element_name(&self) -> &'static str {
        match self {
            VideoCodec::VP9 => "vp9enc",
            VideoCodec::VP8 => "vp8enc",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            VideoCodec::VP9 => "VP9",
            VideoCodec::VP8 => "VP8",
        }
    }
}

/// Container formats for video
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerFormat {
    WebM,
}

impl ContainerFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ContainerFormat::WebM => "webm",
        }
    }

    /// Get muxer element name
    pub fn muxer_name(&self) -> &'static str {
        match self {
            ContainerFormat::WebM => "webmmux",
        }
    }
}

/// A negotiable recording format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodingProfile {
    pub mime_type: &'static str,
    pub codec: VideoCodec,
    pub container: ContainerFormat,
}

/// Profiles probed in order when recording starts
pub const PROFILE_PRIORITY: [EncodingProfile; 3] = [
    EncodingProfile {
        mime_type: "video/webm;codecs=vp9",
        codec: VideoCodec::VP9,
        container: ContainerFormat::WebM,
    },
    EncodingProfile {
        mime_type: "video/webm;codecs=vp8",
        codec: VideoCodec::VP8,
        container: ContainerFormat::WebM,
    },
    EncodingProfile {
        mime_type: "video/webm",
        codec: VideoCodec::VP8,
        container: ContainerFormat::WebM,
    },
];

impl EncodingProfile {
    /// Container MIME type without codec parameters
    pub fn base_mime_type(&self) -> &'static str {
        self.mime_type
            .split_once(';')
            .map_or(self.mime_type, |(base, _)| base)
    }

    /// Whether the installed GStreamer plugins can produce this profile
    pub fn is_available(&self) -> bool {
        is_element_available(self.codec.element_name())
            && is_element_available(self.container.muxer_name())
    }
}

impl std::fmt::Display for EncodingProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.mime_type)
    }
}

/// Look up a profile by MIME type
pub fn profile_for_mime(mime_type: &str) -> Option<&'static EncodingProfile> {
    PROFILE_PRIORITY
        .iter()
        .find(|profile| profile.mime_type.eq_ignore_ascii_case(mime_type.trim()))
}

/// Create the encoder element for a profile, tuned for live capture
pub fn create_video_encoder(profile: &EncodingProfile) -> Result<gst::Element, String> {
    let name = profile.codec.element_name();
    let encoder = gst::ElementFactory::make(name)
        .name("video-encoder")
        .build()
        .map_err(|e| format!("Failed to create encoder {}: {}", name, e))?;

    let settings = [
        // Realtime deadline keeps up with a live source
        ("deadline", "1"),
        ("cpu-used", "8"),
        ("end-usage", "cbr"),
        ("keyframe-max-dist", "60"),
    ];
    for (property, value) in settings {
        if encoder.has_property(property) {
            encoder.set_property_from_str(property, value);
        }
    }

    debug!(codec = profile.codec.display_name(), "Created video encoder");
    Ok(encoder)
}

/// Set the target bitrate of a libvpx encoder
///
/// Called once the frame size is known, since the presets scale with width.
pub fn set_video_bitrate(encoder: &gst::Element, bitrate_kbps: u32) {
    if encoder.has_property("target-bitrate") {
        // libvpx takes bits per second
        encoder.set_property_from_str("target-bitrate", &(bitrate_kbps as u64 * 1000).to_string());
        debug!(bitrate_kbps, "Configured video encoder bitrate");
    }
}
