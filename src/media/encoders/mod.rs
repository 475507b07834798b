// SPDX-License-Identifier: MPL-2.0

//! Media encoder selection and configuration
//!
//! - Video profiles probed in priority order (VP9, VP8, baseline WebM)
//! - Opus audio with a Vorbis fallback
//! - Plugin detection

pub mod audio;
pub mod detection;
pub mod video;

pub use detection::log_available_encoders;
pub use video::{ContainerFormat, EncodingProfile, PROFILE_PRIORITY, VideoCodec};
