// SPDX-License-Identifier: GPL-3.0-only

//! Render loop producing the recorded video track
//!
//! The recorder never sees raw camera frames. A compositor redraws the most
//! recent camera frame, mirrored and filtered exactly like the preview, onto
//! its own surface at a fixed cadence; the surface is what gets encoded.

use crate::backends::camera::frame_loop::{FrameLoop, LoopAction};
use crate::backends::camera::types::{CameraFrame, FacingMode, FrameReceiver, frame_channel};
use crate::media::{FilterType, compose_frame};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info};

/// Handle to a running compositor
///
/// Owned by the active recording. [`FrameCompositor::cancel`] consumes the
/// handle, so the loop can only be cancelled once; dropping it cancels too.
pub struct FrameCompositor {
    surface: FrameReceiver,
    rendered: Arc<AtomicU64>,
    render_loop: FrameLoop,
}

impl FrameCompositor {
    /// Start redrawing `source` at `framerate` frames per second
    ///
    /// The filter is read on every frame, so changing it mid-recording shows
    /// up in the next rendered frame.
    pub fn start(
        source: FrameReceiver,
        filter: watch::Receiver<FilterType>,
        facing: FacingMode,
        framerate: u32,
    ) -> Self {
        let (surface_tx, surface) = frame_channel();
        let rendered = Arc::new(AtomicU64::new(0));
        let loop_rendered = Arc::clone(&rendered);
        let interval = Duration::from_secs(1) / framerate.max(1);

        info!(%facing, framerate, "Starting frame compositor");

        let render_loop = FrameLoop::start("compositor", interval, move || {
            let frame = source.borrow().clone();
            let current_filter = *filter.borrow();

            if let Some(frame) = frame
                && let Some(image) = compose_frame(&frame, facing, current_filter)
            {
                let count = loop_rendered.fetch_add(1, Ordering::Relaxed);
                if count % 300 == 0 {
                    debug!(frame = count, filter = %current_filter, "Compositor frame");
                }
                surface_tx.send_replace(Some(Arc::new(CameraFrame::from_image(image))));
            }
            LoopAction::Continue
        });

        Self {
            surface,
            rendered,
            render_loop,
        }
    }

    /// Receiver for the composed frames
    pub fn surface(&self) -> FrameReceiver {
        self.surface.clone()
    }

    /// Frames drawn so far
    pub fn rendered_frames(&self) -> u64 {
        self.rendered.load(Ordering::Relaxed)
    }

    pub fn is_running(&self) -> bool {
        self.render_loop.is_running()
    }

    /// Stop rendering and wait for the loop to exit
    pub fn cancel(self) {
        info!(frames = self.rendered_frames(), "Cancelling frame compositor");
        self.render_loop.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage, imageops};

    fn source_with(image: RgbaImage) -> (crate::backends::camera::types::FrameSender, FrameReceiver) {
        let (tx, rx) = frame_channel();
        tx.send_replace(Some(Arc::new(CameraFrame::from_image(image))));
        (tx, rx)
    }

    fn wait_for_frame(surface: &FrameReceiver) -> Arc<CameraFrame> {
        for _ in 0..200 {
            if let Some(frame) = surface.borrow().clone() {
                return frame;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        panic!("compositor produced no frame");
    }

    #[test]
    fn test_surface_is_mirrored_and_filtered() {
        let mut image = RgbaImage::from_pixel(4, 2, Rgba([10, 10, 10, 255]));
        image.put_pixel(0, 0, Rgba([200, 0, 0, 255]));
        let (_tx, source) = source_with(image.clone());
        let (_filter_tx, filter) = watch::channel(FilterType::Invert);

        let compositor = FrameCompositor::start(source, filter, FacingMode::Front, 100);
        let frame = wait_for_frame(&compositor.surface());
        compositor.cancel();

        let expected = imageops::flip_horizontal(&crate::media::filters::apply_filter(
            image,
            FilterType::Invert,
        ));
        assert_eq!(frame.to_image(), Some(expected));
    }

    #[test]
    fn test_filter_change_reaches_surface() {
        let (_tx, source) = source_with(RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255])));
        let (filter_tx, filter) = watch::channel(FilterType::None);
        let compositor = FrameCompositor::start(source, filter, FacingMode::Rear, 200);
        let surface = compositor.surface();
        wait_for_frame(&surface);

        filter_tx.send_replace(FilterType::Invert);
        let mut inverted = false;
        for _ in 0..200 {
            if let Some(frame) = surface.borrow().clone()
                && frame.data[0] == 255
            {
                inverted = true;
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        compositor.cancel();
        assert!(inverted);
    }

    #[test]
    fn test_cancel_stops_rendering() {
        let (_tx, source) = source_with(RgbaImage::new(2, 2));
        let (_filter_tx, filter) = watch::channel(FilterType::None);
        let compositor = FrameCompositor::start(source, filter, FacingMode::Rear, 200);
        let rendered = Arc::clone(&compositor.rendered);
        wait_for_frame(&compositor.surface());

        compositor.cancel();
        let after_cancel = rendered.load(Ordering::Relaxed);
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(rendered.load(Ordering::Relaxed), after_cancel);
    }
}
