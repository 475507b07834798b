// SPDX-License-Identifier: MPL-2.0

//! GStreamer encoder detection

use super::audio::AudioCodec;
use super::video::PROFILE_PRIORITY;
use gstreamer as gst;
use tracing::{debug, info};

/// Check if a specific GStreamer element is installed
pub fn is_element_available(element_name: &str) -> bool {
    if gst::init().is_err() {
        return false;
    }
    gst::ElementFactory::find(element_name).is_some()
}

/// Recording profiles the installed plugins can produce, in priority order
pub fn detect_profiles() -> Vec<&'static str> {
    PROFILE_PRIORITY
        .iter()
        .filter(|profile| {
            let available = profile.is_available();
            debug!(profile = %profile, available, "Probed encoding profile");
            available
        })
        .map(|profile| profile.mime_type)
        .collect()
}

/// Log all available encoders (for debugging)
pub fn log_available_encoders() {
    info!("=== GStreamer Encoder Detection ===");

    for profile in detect_profiles() {
        info!("  ✓ {}", profile);
    }

    for codec in AudioCodec::PRIORITY {
        if is_element_available(codec.element_name()) {
            info!("  ✓ audio {}", codec.element_name());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_runs() {
        let _ = detect_profiles();
        assert!(!is_element_available("definitely-not-an-element"));
    }
}
