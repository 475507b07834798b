// SPDX-License-Identifier: GPL-3.0-only

//! Media encoder seam
//!
//! A recording session feeds a [`DerivedStream`] (composited video plus the
//! source's audio) to a [`MediaEncoder`] and receives encoded container bytes
//! back as an ordered stream of [`EncoderEvent`]s. The stream always ends with
//! [`EncoderEvent::Stopped`], after the last chunk.

use crate::backends::camera::types::{AudioTrack, FrameReceiver};
use crate::constants::{BitratePreset, DEFAULT_FRAMERATE};
use crate::errors::RecordingError;
use crate::media::encoders::{EncodingProfile, PROFILE_PRIORITY};
use futures::stream::{self, BoxStream};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Output of a running encoder session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncoderEvent {
    /// A piece of the container, in output order
    Chunk(Vec<u8>),
    /// The encoder failed; finalization follows
    Error(String),
    /// No more events will be delivered
    Stopped,
}

pub type EncoderEvents = BoxStream<'static, EncoderEvent>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderConfig {
    pub bitrate_preset: BitratePreset,
    pub framerate: u32,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            bitrate_preset: BitratePreset::default(),
            framerate: DEFAULT_FRAMERATE,
        }
    }
}

/// The tracks that get recorded
#[derive(Debug, Clone)]
pub struct DerivedStream {
    /// Compositor surface
    pub video: FrameReceiver,
    /// Microphone track of the live source, if it has one
    pub audio: Option<AudioTrack>,
}

pub trait MediaEncoder: Send + Sync {
    /// Whether this platform can encode at all
    fn is_available(&self) -> bool;

    fn is_type_supported(&self, profile: &EncodingProfile) -> bool;

    /// Begin encoding `stream` with `profile`
    fn start(
        &self,
        stream: DerivedStream,
        profile: &EncodingProfile,
        config: &EncoderConfig,
    ) -> Result<Box<dyn EncoderSession>, RecordingError>;
}

/// A running encode
pub trait EncoderSession: Send {
    /// Event stream of this session; `None` once taken
    fn take_events(&mut self) -> Option<EncoderEvents>;

    fn pause(&mut self);

    fn resume(&mut self);

    /// Finalize the container; remaining chunks and then `Stopped` follow
    fn stop(&mut self);
}

/// First profile in priority order that the encoder supports
pub fn select_profile(encoder: &dyn MediaEncoder) -> Result<EncodingProfile, RecordingError> {
    if !encoder.is_available() {
        warn!("No media encoder available");
        return Err(RecordingError::RecordingUnsupported);
    }

    for profile in &PROFILE_PRIORITY {
        if encoder.is_type_supported(profile) {
            info!(profile = %profile, "Selected encoding profile");
            return Ok(*profile);
        }
        debug!(profile = %profile, "Encoding profile not supported");
    }

    warn!("No supported encoding profile");
    Err(RecordingError::RecordingUnsupported)
}

/// Adapt an event channel into the session's event stream
pub fn event_stream(receiver: mpsc::UnboundedReceiver<EncoderEvent>) -> EncoderEvents {
    Box::pin(stream::unfold(receiver, |mut receiver| async move {
        receiver.recv().await.map(|event| (event, receiver))
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::encoders::VideoCodec;
    use futures::StreamExt;

    struct ProfileEncoder {
        available: bool,
        supported: Vec<&'static str>,
    }

    impl MediaEncoder for ProfileEncoder {
        fn is_available(&self) -> bool {
            self.available
        }

        fn is_type_supported(&self, profile: &EncodingProfile) -> bool {
            self.supported.contains(&profile.mime_type)
        }

        fn start(
            &self,
            _stream: DerivedStream,
            _profile: &EncodingProfile,
            _config: &EncoderConfig,
        ) -> Result<Box<dyn EncoderSession>, RecordingError> {
            Err(RecordingError::RecorderInitFailed("unused".to_string()))
        }
    }

    #[test]
    fn test_select_prefers_vp9() {
        let encoder = ProfileEncoder {
            available: true,
            supported: vec!["video/webm", "video/webm;codecs=vp9", "video/webm;codecs=vp8"],
        };
        let profile = select_profile(&encoder).unwrap();
        assert_eq!(profile.codec, VideoCodec::VP9);
    }

    #[test]
    fn test_select_falls_back_to_baseline() {
        let encoder = ProfileEncoder {
            available: true,
            supported: vec!["video/webm"],
        };
        assert_eq!(select_profile(&encoder).unwrap().mime_type, "video/webm");
    }

    #[test]
    fn test_select_unsupported() {
        let none = ProfileEncoder {
            available: true,
            supported: vec![],
        };
        assert_eq!(select_profile(&none), Err(RecordingError::RecordingUnsupported));

        let unavailable = ProfileEncoder {
            available: false,
            supported: vec!["video/webm"],
        };
        assert_eq!(
            select_profile(&unavailable),
            Err(RecordingError::RecordingUnsupported)
        );
    }

    #[tokio::test]
    async fn test_event_stream_preserves_order() {
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(EncoderEvent::Chunk(vec![1])).unwrap();
        tx.send(EncoderEvent::Chunk(vec![2])).unwrap();
        tx.send(EncoderEvent::Stopped).unwrap();
        drop(tx);

        let events: Vec<_> = event_stream(rx).collect().await;
        assert_eq!(
            events,
            vec![
                EncoderEvent::Chunk(vec![1]),
                EncoderEvent::Chunk(vec![2]),
                EncoderEvent::Stopped
            ]
        );
    }
}
