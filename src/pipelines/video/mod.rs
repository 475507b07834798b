// SPDX-License-Identifier: MPL-2.0

//! Video recording pipeline
//!
//! - A compositor redraws the live camera (mirrored, filtered) onto its own surface
//! - The surface plus the microphone track form the derived stream
//! - An encoder turns the derived stream into ordered WebM chunks

pub mod clock;
pub mod compositor;
pub mod encoder;
pub mod muxer;
pub mod recorder;

pub use clock::RecordingClock;
pub use compositor::FrameCompositor;
pub use encoder::{
    DerivedStream, EncoderConfig, EncoderEvent, EncoderEvents, EncoderSession, MediaEncoder,
    event_stream, select_profile,
};
pub use recorder::{GStreamerEncoder, GStreamerSession};
