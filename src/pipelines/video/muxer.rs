// SPDX-License-Identifier: MPL-2.0

//! Container muxing into in-memory chunks
//!
//! The muxer writes to an appsink instead of a file. Every buffer the muxer
//! pushes becomes one [`EncoderEvent::Chunk`], in output order, so the
//! concatenation of all chunks is the complete container.

use super::encoder::EncoderEvent;
use crate::media::encoders::ContainerFormat;
use gstreamer as gst;
use gstreamer::prelude::*;
use gstreamer_app::{AppSink, AppSinkCallbacks};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Muxer and the sink collecting its output
pub struct ChunkMuxer {
    pub muxer: gst::Element,
    pub sink: AppSink,
}

/// Create a muxer whose output is delivered as chunk events
pub fn create_muxer(
    container: ContainerFormat,
    events: mpsc::UnboundedSender<EncoderEvent>,
) -> Result<ChunkMuxer, String> {
    let muxer_name = container.muxer_name();
    info!(muxer = muxer_name, "Creating muxer");

    let muxer = gst::ElementFactory::make(muxer_name)
        .name("muxer")
        .build()
        .map_err(|e| format!("Failed to create {}: {}", muxer_name, e))?;

    // The sink can't seek back to patch headers
    if muxer.has_property("streamable") {
        muxer.set_property("streamable", true);
    }

    let sink = AppSink::builder().name("chunk-sink").build();
    sink.set_property("sync", false);

    let chunk_count = Arc::new(AtomicU64::new(0));
    sink.set_callbacks(
        AppSinkCallbacks::builder()
            .new_sample(move |sink| {
                let sample = sink.pull_sample().map_err(|_| gst::FlowError::Eos)?;
                let buffer = sample.buffer().ok_or(gst::FlowError::Error)?;
                let map = buffer.map_readable().map_err(|_| gst::FlowError::Error)?;

                let count = chunk_count.fetch_add(1, Ordering::Relaxed);
                debug!(chunk = count, size = map.len(), "Muxer chunk");

                events
                    .send(EncoderEvent::Chunk(map.as_slice().to_vec()))
                    .map_err(|_| gst::FlowError::Flushing)?;
                Ok(gst::FlowSuccess::Ok)
            })
            .build(),
    );

    Ok(ChunkMuxer { muxer, sink })
}

/// Link an encoder to a new request pad of the muxer
pub fn link_to_muxer(encoder: &gst::Element, muxer: &gst::Element, track: &str) -> Result<(), String> {
    encoder
        .link(muxer)
        .map_err(|_| format!("Failed to link {} encoder to muxer", track))?;

    debug!(track, "Encoder linked to muxer");
    Ok(())
}
