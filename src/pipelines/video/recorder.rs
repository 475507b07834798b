// SPDX-License-Identifier: MPL-2.0

//! GStreamer implementation of the media encoder
//!
//! ```text
//! compositor surface ─▶ appsrc ─▶ videoconvert ─▶ queue ─▶ vp9enc/vp8enc ─┐
//!                                                                          ├─▶ webmmux ─▶ appsink ─▶ chunks
//! microphone track ──▶ appsrc ─▶ audioconvert ─▶ audioresample ─▶ queue ─▶ opusenc ─┘
//! ```
//!
//! Feeders pull from the derived stream on their own threads and stamp
//! buffers from a shared [`RecordingClock`], so pausing simply stops feeding
//! and the timeline continues seamlessly on resume.

use super::clock::RecordingClock;
use super::encoder::{
    DerivedStream, EncoderConfig, EncoderEvent, EncoderEvents, EncoderSession, MediaEncoder,
    event_stream,
};
use super::muxer::{create_muxer, link_to_muxer};
use crate::backends::camera::frame_loop::{FrameLoop, LoopAction};
use crate::backends::camera::gstreamer::audio_caps;
use crate::backends::camera::types::{AudioTrack, FrameReceiver};
use crate::constants::{BitratePreset, timing};
use crate::errors::RecordingError;
use crate::media::encoders::audio::select_audio_encoder;
use crate::media::encoders::video::{create_video_encoder, set_video_bitrate};
use crate::media::encoders::EncodingProfile;
use gstreamer as gst;
use gstreamer::prelude::*;
use gstreamer_app::AppSrc;
use gstreamer_video::{VideoCapsBuilder, VideoFormat};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tokio::sync::broadcast::error::TryRecvError;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Encoder backed by the installed GStreamer plugins
#[derive(Debug, Default)]
pub struct GStreamerEncoder;

impl GStreamerEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl MediaEncoder for GStreamerEncoder {
    fn is_available(&self) -> bool {
        gst::init().is_ok()
    }

    fn is_type_supported(&self, profile: &EncodingProfile) -> bool {
        profile.is_available()
    }

    fn start(
        &self,
        stream: DerivedStream,
        profile: &EncodingProfile,
        config: &EncoderConfig,
    ) -> Result<Box<dyn EncoderSession>, RecordingError> {
        GStreamerSession::start(stream, profile, config)
            .map(|session| Box::new(session) as Box<dyn EncoderSession>)
            .map_err(RecordingError::RecorderInitFailed)
    }
}

/// A running GStreamer encode
pub struct GStreamerSession {
    pipeline: gst::Pipeline,
    events: Option<EncoderEvents>,
    clock: RecordingClock,
    video_src: AppSrc,
    audio_src: Option<AppSrc>,
    video_feeder: Option<FrameLoop>,
    audio_feeder: Option<FrameLoop>,
    stopping: Arc<AtomicBool>,
    bus_watch: Option<JoinHandle<()>>,
}

impl GStreamerSession {
    fn start(
        stream: DerivedStream,
        profile: &EncodingProfile,
        config: &EncoderConfig,
    ) -> Result<Self, String> {
        gst::init().map_err(|e| format!("Failed to initialize GStreamer: {}", e))?;

        info!(
            profile = %profile,
            framerate = config.framerate,
            preset = config.bitrate_preset.display_name(),
            audio = stream.audio.is_some(),
            "Starting encoder session"
        );

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let pipeline = gst::Pipeline::new();

        let video_src = live_appsrc("video-src");
        let convert = make("videoconvert")?;
        let queue = make("queue")?;
        let video_encoder = create_video_encoder(profile)?;
        let output = create_muxer(profile.container, event_tx.clone())?;

        pipeline
            .add_many([
                video_src.upcast_ref(),
                &convert,
                &queue,
                &video_encoder,
                &output.muxer,
                output.sink.upcast_ref(),
            ])
            .map_err(|e| format!("Failed to add video elements: {}", e))?;
        gst::Element::link_many([video_src.upcast_ref(), &convert, &queue, &video_encoder])
            .map_err(|e| format!("Failed to link video chain: {}", e))?;
        link_to_muxer(&video_encoder, &output.muxer, "video")?;
        output
            .muxer
            .link(&output.sink)
            .map_err(|_| "Failed to link muxer to chunk sink".to_string())?;

        let audio_src = match stream.audio.as_ref() {
            Some(track) => add_audio_branch(&pipeline, track, &output.muxer)?,
            None => None,
        };

        let bus = pipeline
            .bus()
            .ok_or_else(|| "No bus available".to_string())?;
        pipeline.set_state(gst::State::Playing).map_err(|e| {
            let _ = pipeline.set_state(gst::State::Null);
            format!("Failed to start encoder pipeline: {}", e)
        })?;

        let clock = RecordingClock::start();
        let video_feeder = spawn_video_feeder(
            stream.video,
            video_src.clone(),
            video_encoder,
            clock.clone(),
            config.framerate,
            config.bitrate_preset,
        );
        let audio_feeder = match (stream.audio.as_ref(), audio_src.as_ref()) {
            (Some(track), Some(src)) => Some(spawn_audio_feeder(track, src.clone(), clock.clone())),
            _ => None,
        };

        let stopping = Arc::new(AtomicBool::new(false));
        let bus_watch = spawn_bus_watch(bus, pipeline.clone(), Arc::clone(&stopping), event_tx);

        Ok(Self {
            pipeline,
            events: Some(event_stream(event_rx)),
            clock,
            video_src,
            audio_src,
            video_feeder: Some(video_feeder),
            audio_feeder,
            stopping,
            bus_watch: Some(bus_watch),
        })
    }
}

impl EncoderSession for GStreamerSession {
    fn take_events(&mut self) -> Option<EncoderEvents> {
        self.events.take()
    }

    fn pause(&mut self) {
        info!(elapsed_ms = self.clock.elapsed().as_millis() as u64, "Pausing encoder");
        self.clock.pause();
    }

    fn resume(&mut self) {
        info!("Resuming encoder");
        self.clock.resume();
    }

    fn stop(&mut self) {
        if self.stopping.swap(true, Ordering::SeqCst) {
            return;
        }
        info!(
            elapsed_ms = self.clock.elapsed().as_millis() as u64,
            "Finalizing encoder"
        );

        if let Some(feeder) = self.video_feeder.take() {
            feeder.cancel();
        }
        if let Some(feeder) = self.audio_feeder.take() {
            feeder.cancel();
        }

        if let Err(e) = self.video_src.end_of_stream() {
            warn!(error = ?e, "Failed to end video stream");
        }
        if let Some(src) = &self.audio_src
            && let Err(e) = src.end_of_stream()
        {
            warn!(error = ?e, "Failed to end audio stream");
        }
    }
}

impl Drop for GStreamerSession {
    fn drop(&mut self) {
        self.stop();
        if let Some(handle) = self.bus_watch.take()
            && handle.join().is_err()
        {
            error!("Encoder bus watch panicked");
        }
        let _ = self.pipeline.set_state(gst::State::Null);
    }
}

fn make(factory: &str) -> Result<gst::Element, String> {
    gst::ElementFactory::make(factory)
        .build()
        .map_err(|e| format!("Failed to create {}: {}", factory, e))
}

fn live_appsrc(name: &str) -> AppSrc {
    let src = AppSrc::builder()
        .name(name)
        .format(gst::Format::Time)
        .is_live(true)
        .build();
    src.set_property("do-timestamp", false);
    src
}

/// Add the audio chain, or record without audio when no encoder is installed
fn add_audio_branch(
    pipeline: &gst::Pipeline,
    track: &AudioTrack,
    muxer: &gst::Element,
) -> Result<Option<AppSrc>, String> {
    let (encoder, codec) = match select_audio_encoder() {
        Ok(selected) => selected,
        Err(e) => {
            warn!(error = %e, "Recording without audio");
            return Ok(None);
        }
    };

    let src = live_appsrc("audio-src");
    src.set_caps(Some(&audio_caps(track.format)));
    let convert = make("audioconvert")?;
    let resample = make("audioresample")?;
    let queue = make("queue")?;

    pipeline
        .add_many([src.upcast_ref(), &convert, &resample, &queue, &encoder])
        .map_err(|e| format!("Failed to add audio elements: {}", e))?;
    gst::Element::link_many([src.upcast_ref(), &convert, &resample, &queue, &encoder])
        .map_err(|e| format!("Failed to link audio chain: {}", e))?;
    link_to_muxer(&encoder, muxer, "audio")?;

    info!(codec = ?codec, rate = track.format.rate, channels = track.format.channels, "Audio branch ready");
    Ok(Some(src))
}

/// Push composited frames at the recording framerate
///
/// Caps are set from the first frame and renegotiated if the size changes.
fn spawn_video_feeder(
    surface: FrameReceiver,
    src: AppSrc,
    encoder: gst::Element,
    clock: RecordingClock,
    framerate: u32,
    preset: BitratePreset,
) -> FrameLoop {
    let framerate = framerate.max(1);
    let frame_duration = Duration::from_secs(1) / framerate;
    let mut negotiated: Option<(u32, u32)> = None;
    let mut pushed: u64 = 0;

    FrameLoop::start("video-feeder", frame_duration, move || {
        if clock.is_paused() {
            return LoopAction::Continue;
        }
        let Some(frame) = surface.borrow().clone() else {
            return LoopAction::Continue;
        };

        let size = (frame.width, frame.height);
        if negotiated != Some(size) {
            let caps = VideoCapsBuilder::new()
                .format(VideoFormat::Rgba)
                .width(frame.width as i32)
                .height(frame.height as i32)
                .framerate(gst::Fraction::new(framerate as i32, 1))
                .build();
            src.set_caps(Some(&caps));
            if negotiated.is_none() {
                set_video_bitrate(&encoder, preset.bitrate_kbps(frame.width));
            }
            info!(width = frame.width, height = frame.height, "Video caps negotiated");
            negotiated = Some(size);
        }

        let mut buffer = gst::Buffer::from_slice(Arc::clone(&frame.data));
        {
            let buffer = buffer.make_mut();
            buffer.set_pts(gst::ClockTime::from_nseconds(clock.elapsed().as_nanos() as u64));
            buffer.set_duration(gst::ClockTime::from_nseconds(frame_duration.as_nanos() as u64));
        }

        match src.push_buffer(buffer) {
            Ok(_) => {
                pushed += 1;
                if pushed % 300 == 0 {
                    debug!(frames = pushed, "Video feeder progress");
                }
                LoopAction::Continue
            }
            Err(e) => {
                debug!(error = ?e, "Video appsrc refused buffer, stopping feeder");
                LoopAction::Stop
            }
        }
    })
}

/// Forward microphone chunks, dropping them while paused
fn spawn_audio_feeder(track: &AudioTrack, src: AppSrc, clock: RecordingClock) -> FrameLoop {
    let mut receiver = track.subscribe();
    let format = track.format;
    let bytes_per_frame = format.bytes_per_frame().max(1) as u64;
    let mut base: Option<Duration> = None;
    let mut samples: u64 = 0;

    FrameLoop::start("audio-feeder", timing::POLL_INTERVAL, move || {
        loop {
            match receiver.try_recv() {
                Ok(chunk) => {
                    if clock.is_paused() {
                        continue;
                    }
                    // Anchor sample time to the clock after each pause
                    let anchor = *base.get_or_insert_with(|| clock.elapsed());
                    let frames = chunk.data.len() as u64 / bytes_per_frame;
                    let pts = anchor + samples_to_duration(samples, format.rate);
                    let duration = samples_to_duration(frames, format.rate);
                    samples += frames;

                    let mut buffer = gst::Buffer::from_slice(Arc::clone(&chunk.data));
                    {
                        let buffer = buffer.make_mut();
                        buffer.set_pts(gst::ClockTime::from_nseconds(pts.as_nanos() as u64));
                        buffer.set_duration(gst::ClockTime::from_nseconds(duration.as_nanos() as u64));
                    }
                    if let Err(e) = src.push_buffer(buffer) {
                        debug!(error = ?e, "Audio appsrc refused buffer, stopping feeder");
                        return LoopAction::Stop;
                    }
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    debug!(skipped, "Audio feeder lagged");
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Closed) => {
                    info!("Microphone track closed");
                    return LoopAction::Stop;
                }
            }
        }

        if clock.is_paused() && base.is_some() {
            base = None;
            samples = 0;
        }
        LoopAction::Continue
    })
}

fn samples_to_duration(samples: u64, rate: u32) -> Duration {
    Duration::from_nanos(samples * 1_000_000_000 / rate.max(1) as u64)
}

/// Watch the bus until EOS or an error, then shut the pipeline down
///
/// `Stopped` is always the last event sent. Once stopping has been requested
/// the watch gives the muxer [`timing::FINALIZE_TIMEOUT`] to drain.
fn spawn_bus_watch(
    bus: gst::Bus,
    pipeline: gst::Pipeline,
    stopping: Arc<AtomicBool>,
    events: mpsc::UnboundedSender<EncoderEvent>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut deadline: Option<Instant> = None;
        let poll = gst::ClockTime::from_mseconds(50);

        loop {
            if deadline.is_none() && stopping.load(Ordering::SeqCst) {
                deadline = Some(Instant::now() + timing::FINALIZE_TIMEOUT);
            }
            if let Some(deadline) = deadline
                && Instant::now() >= deadline
            {
                warn!("Encoder did not finalize in time");
                break;
            }

            let Some(msg) =
                bus.timed_pop_filtered(poll, &[gst::MessageType::Eos, gst::MessageType::Error])
            else {
                continue;
            };

            match msg.view() {
                gst::MessageView::Eos(..) => {
                    info!("Encoder finalized");
                    break;
                }
                gst::MessageView::Error(err) => {
                    error!(
                        error = %err.error(),
                        debug = ?err.debug(),
                        source = ?err.src().map(|s| s.name()),
                        "Encoder pipeline error"
                    );
                    let _ = events.send(EncoderEvent::Error(err.error().to_string()));
                    break;
                }
                _ => {}
            }
        }

        let _ = pipeline.set_state(gst::State::Null);
        let _ = events.send(EncoderEvent::Stopped);
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_samples_to_duration() {
        assert_eq!(samples_to_duration(48_000, 48_000), Duration::from_secs(1));
        assert_eq!(samples_to_duration(960, 48_000), Duration::from_millis(20));
        assert_eq!(samples_to_duration(10, 0), Duration::from_secs(10));
    }

    #[test]
    fn test_profile_support_matches_plugins() {
        let encoder = GStreamerEncoder::new();
        if !encoder.is_available() {
            return;
        }
        for profile in &crate::media::encoders::PROFILE_PRIORITY {
            assert_eq!(encoder.is_type_supported(profile), profile.is_available());
        }
    }
}
