// SPDX-License-Identifier: MPL-2.0

//! Capture pipelines feeding the live stream
//!
//! ```text
//! device source ─▶ videoconvert ─▶ appsink (RGBA) ─▶ watch channel
//! autoaudiosrc ─▶ audioconvert ─▶ audioresample ─▶ appsink (S16LE) ─▶ broadcast
//! ```

use super::super::types::*;
use crate::constants::{pipeline, timing};
use gstreamer as gst;
use gstreamer::prelude::*;
use gstreamer_app::{AppSink, AppSinkCallbacks};
use gstreamer_video::{VideoCapsBuilder, VideoFormat, VideoInfo};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Camera pipeline producing tightly packed RGBA frames
pub struct CapturePipeline {
    pipeline: gst::Pipeline,
    appsink: AppSink,
    name: String,
}

impl CapturePipeline {
    pub fn new(
        source: &gst::Device,
        device: &CameraDevice,
        frame_sender: FrameSender,
    ) -> BackendResult<Self> {
        info!(device = %device.name, path = %device.path, "Creating capture pipeline");

        let src = source.create_element(Some("camera-source")).map_err(|e| {
            BackendError::InitializationFailed(format!("Failed to create camera source: {}", e))
        })?;
        let convert = make_element("videoconvert")?;
        let caps = VideoCapsBuilder::new().format(VideoFormat::Rgba).build();
        let appsink = AppSink::builder().name("sink").caps(&caps).build();
        appsink.set_property("sync", false);
        appsink.set_property("max-buffers", pipeline::MAX_BUFFERS);
        appsink.set_property("drop", true);
        appsink.set_property("enable-last-sample", false);

        let gst_pipeline = gst::Pipeline::new();
        gst_pipeline
            .add_many([&src, &convert, appsink.upcast_ref()])
            .map_err(|e| BackendError::InitializationFailed(format!("Failed to add elements: {}", e)))?;
        gst::Element::link_many([&src, &convert, appsink.upcast_ref()]).map_err(|e| {
            BackendError::InitializationFailed(format!("Failed to link capture pipeline: {}", e))
        })?;

        let frame_counter = Arc::new(AtomicU64::new(0));
        appsink.set_callbacks(
            AppSinkCallbacks::builder()
                .new_sample(move |sink| {
                    let sample = sink.pull_sample().map_err(|_| gst::FlowError::Eos)?;
                    let frame_num = frame_counter.fetch_add(1, Ordering::Relaxed);

                    let buffer = sample.buffer().ok_or(gst::FlowError::Error)?;
                    let caps = sample.caps().ok_or(gst::FlowError::Error)?;
                    let info = VideoInfo::from_caps(caps).map_err(|e| {
                        error!(frame = frame_num, error = ?e, "Failed to read video info");
                        gst::FlowError::Error
                    })?;
                    let map = buffer.map_readable().map_err(|_| gst::FlowError::Error)?;

                    let data = pack_rgba(
                        map.as_slice(),
                        info.width(),
                        info.height(),
                        info.stride()[0] as usize,
                    )
                    .ok_or_else(|| {
                        warn!(frame = frame_num, "Short frame buffer, skipping");
                        gst::FlowError::Error
                    })?;

                    if frame_num % 300 == 0 {
                        debug!(frame = frame_num, width = info.width(), height = info.height(), "Frame");
                    }

                    frame_sender.send_replace(Some(Arc::new(CameraFrame {
                        width: info.width(),
                        height: info.height(),
                        data,
                        captured_at: Instant::now(),
                    })));
                    Ok(gst::FlowSuccess::Ok)
                })
                .build(),
        );

        start_and_check(&gst_pipeline, "camera")?;
        info!(device = %device.name, "Capture pipeline running");

        Ok(Self {
            pipeline: gst_pipeline,
            appsink,
            name: device.name.clone(),
        })
    }

    /// Stop the pipeline and release the camera
    pub fn stop(self) {
        info!(device = %self.name, "Stopping capture pipeline");
        self.appsink.set_callbacks(AppSinkCallbacks::builder().build());
        if let Err(e) = self.pipeline.set_state(gst::State::Null) {
            warn!(error = %e, "Failed to stop capture pipeline");
        }
    }
}

impl Drop for CapturePipeline {
    fn drop(&mut self) {
        let _ = self.pipeline.set_state(gst::State::Null);
    }
}

/// Default microphone converted to the shared audio format
pub struct MicrophonePipeline {
    pipeline: gst::Pipeline,
    appsink: AppSink,
}

impl MicrophonePipeline {
    pub fn new(track: AudioTrack) -> BackendResult<Self> {
        gst::init().map_err(|e| BackendError::NotAvailable(e.to_string()))?;
        if gst::ElementFactory::find("autoaudiosrc").is_none() {
            return Err(BackendError::NotAvailable("autoaudiosrc not installed".to_string()));
        }

        let src = make_element("autoaudiosrc")?;
        let convert = make_element("audioconvert")?;
        let resample = make_element("audioresample")?;
        let caps = audio_caps(track.format);
        let appsink = AppSink::builder().name("audio-sink").caps(&caps).build();
        appsink.set_property("sync", false);

        let gst_pipeline = gst::Pipeline::new();
        gst_pipeline
            .add_many([&src, &convert, &resample, appsink.upcast_ref()])
            .map_err(|e| BackendError::InitializationFailed(format!("Failed to add elements: {}", e)))?;
        gst::Element::link_many([&src, &convert, &resample, appsink.upcast_ref()]).map_err(|e| {
            BackendError::InitializationFailed(format!("Failed to link microphone pipeline: {}", e))
        })?;

        appsink.set_callbacks(
            AppSinkCallbacks::builder()
                .new_sample(move |sink| {
                    let sample = sink.pull_sample().map_err(|_| gst::FlowError::Eos)?;
                    let buffer = sample.buffer().ok_or(gst::FlowError::Error)?;
                    let map = buffer.map_readable().map_err(|_| gst::FlowError::Error)?;
                    track.push(AudioChunk {
                        data: Arc::from(map.as_slice()),
                    });
                    Ok(gst::FlowSuccess::Ok)
                })
                .build(),
        );

        start_and_check(&gst_pipeline, "microphone")?;
        info!("Microphone pipeline running");

        Ok(Self {
            pipeline: gst_pipeline,
            appsink,
        })
    }

    pub fn stop(self) {
        info!("Stopping microphone pipeline");
        self.appsink.set_callbacks(AppSinkCallbacks::builder().build());
        if let Err(e) = self.pipeline.set_state(gst::State::Null) {
            warn!(error = %e, "Failed to stop microphone pipeline");
        }
    }
}

impl Drop for MicrophonePipeline {
    fn drop(&mut self) {
        let _ = self.pipeline.set_state(gst::State::Null);
    }
}

/// Raw caps for the shared interleaved audio format
pub fn audio_caps(format: AudioFormat) -> gst::Caps {
    gst::Caps::builder("audio/x-raw")
        .field("format", pipeline::AUDIO_FORMAT)
        .field("rate", format.rate as i32)
        .field("channels", format.channels as i32)
        .field("layout", "interleaved")
        .build()
}

pub(crate) fn make_element(factory: &str) -> BackendResult<gst::Element> {
    gst::ElementFactory::make(factory).build().map_err(|e| {
        BackendError::InitializationFailed(format!("Failed to create {}: {}", factory, e))
    })
}

/// Set a pipeline to PLAYING and watch the bus briefly for startup errors
///
/// Sources report refused access and busy devices asynchronously, so a
/// successful state change alone doesn't mean the device opened.
fn start_and_check(pipeline: &gst::Pipeline, label: &str) -> BackendResult<()> {
    let state_change = pipeline.set_state(gst::State::Playing);

    let bus = pipeline
        .bus()
        .ok_or_else(|| BackendError::InitializationFailed("No bus available".to_string()))?;
    let timeout = gst::ClockTime::from_mseconds(timing::START_ERROR_WINDOW.as_millis() as u64);

    if let Some(msg) = bus.timed_pop_filtered(timeout, &[gst::MessageType::Error])
        && let gst::MessageView::Error(err) = msg.view()
    {
        error!(
            pipeline = label,
            error = %err.error(),
            debug = ?err.debug(),
            source = ?err.src().map(|s| s.name()),
            "GStreamer error during start"
        );
        let _ = pipeline.set_state(gst::State::Null);
        return Err(classify_error(err.error()));
    }

    if let Err(e) = state_change {
        let _ = pipeline.set_state(gst::State::Null);
        return Err(BackendError::InitializationFailed(format!(
            "Failed to start {} pipeline: {}",
            label, e
        )));
    }
    Ok(())
}

/// Map a pipeline error to the backend taxonomy
pub(crate) fn classify_error(err: gst::glib::Error) -> BackendError {
    if err.matches(gst::ResourceError::NotAuthorized) {
        BackendError::PermissionDenied(err.to_string())
    } else if err.matches(gst::ResourceError::NotFound) {
        BackendError::DeviceNotFound(err.to_string())
    } else {
        BackendError::InitializationFailed(err.to_string())
    }
}

/// Copy strided RGBA rows into a tight buffer
fn pack_rgba(src: &[u8], width: u32, height: u32, stride: usize) -> Option<Arc<[u8]>> {
    let row_bytes = width as usize * 4;
    let height = height as usize;
    if stride == row_bytes {
        let len = row_bytes * height;
        return src.get(..len).map(Arc::from);
    }

    let mut packed = Vec::with_capacity(row_bytes * height);
    for row in 0..height {
        let start = row * stride;
        packed.extend_from_slice(src.get(start..start + row_bytes)?);
    }
    Some(Arc::from(packed.into_boxed_slice()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_rgba_strips_padding() {
        // 2x2 frame with 4 bytes of padding per row
        let src: Vec<u8> = (0..24).collect();
        let packed = pack_rgba(&src, 2, 2, 12).unwrap();
        let expected: Vec<u8> = (0..8).chain(12..20).collect();
        assert_eq!(&*packed, expected.as_slice());
    }

    #[test]
    fn test_pack_rgba_rejects_short_buffer() {
        assert!(pack_rgba(&[0; 10], 2, 2, 8).is_none());
    }

    #[test]
    fn test_not_authorized_is_permission_denied() {
        let err = gst::glib::Error::new(gst::ResourceError::NotAuthorized, "denied");
        assert!(matches!(classify_error(err), BackendError::PermissionDenied(_)));

        let err = gst::glib::Error::new(gst::ResourceError::Busy, "busy");
        assert!(matches!(classify_error(err), BackendError::InitializationFailed(_)));
    }
}
