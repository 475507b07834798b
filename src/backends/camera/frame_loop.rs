// SPDX-License-Identifier: GPL-3.0-only
//! Paced worker threads
//!
//! A [`FrameLoop`] calls a closure at a fixed cadence on its own thread until
//! the closure asks to stop or the handle is cancelled. The synthetic camera,
//! the recording compositor and the encoder feeders all run on one.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Returned by each iteration to keep going or finish
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopAction {
    Continue,
    Stop,
}

/// Handle to a paced loop thread
///
/// The loop is cancelled and joined when the handle is dropped, so a handle
/// can't outlive whatever owns it.
///
/// ```ignore
/// let compositor = FrameLoop::start("compositor", Duration::from_millis(33), move || {
///     render_one_frame();
///     LoopAction::Continue
/// });
/// compositor.cancel();
/// ```
pub struct FrameLoop {
    thread_handle: Option<JoinHandle<()>>,
    stop_signal: Arc<AtomicBool>,
    name: String,
}

impl FrameLoop {
    /// Spawn a loop that runs `loop_fn` once per `interval`
    ///
    /// Iterations that overrun the interval are followed immediately by the
    /// next one; missed ticks are not replayed.
    pub fn start<F>(name: &str, interval: Duration, mut loop_fn: F) -> Self
    where
        F: FnMut() -> LoopAction + Send + 'static,
    {
        let stop_signal = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop_signal);
        let thread_name = name.to_string();

        info!(name = %name, interval_ms = interval.as_millis() as u64, "Starting frame loop");

        let thread_handle = thread::spawn(move || {
            let mut next_tick = Instant::now();

            while !thread_stop.load(Ordering::SeqCst) {
                if loop_fn() == LoopAction::Stop {
                    debug!(name = %thread_name, "Loop requested stop");
                    break;
                }

                next_tick += interval;
                let now = Instant::now();
                if next_tick > now {
                    sleep_unless_stopped(&thread_stop, next_tick - now);
                } else {
                    next_tick = now;
                }
            }

            debug!(name = %thread_name, "Frame loop thread exiting");
        });

        Self {
            thread_handle: Some(thread_handle),
            stop_signal,
            name: name.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stop the loop and wait for its thread
    pub fn cancel(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop_signal.store(true, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            if let Err(e) = handle.join() {
                warn!(name = %self.name, "Frame loop thread panicked: {:?}", e);
            } else {
                info!(name = %self.name, "Frame loop stopped");
            }
        }
    }
}

impl Drop for FrameLoop {
    fn drop(&mut self) {
        if self.thread_handle.is_some() {
            debug!(name = %self.name, "FrameLoop dropped, stopping loop");
            self.shutdown();
        }
    }
}

/// Sleep in short slices so cancellation isn't held up by long intervals
fn sleep_unless_stopped(stop: &AtomicBool, total: Duration) {
    const SLICE: Duration = Duration::from_millis(20);
    let deadline = Instant::now() + total;
    loop {
        if stop.load(Ordering::SeqCst) {
            return;
        }
        let now = Instant::now();
        if now >= deadline {
            return;
        }
        thread::sleep(SLICE.min(deadline - now));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    #[test]
    fn test_loop_stops_itself() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = Arc::clone(&counter);

        let frame_loop = FrameLoop::start("test-loop", Duration::ZERO, move || {
            if counter_clone.fetch_add(1, Ordering::SeqCst) >= 4 {
                LoopAction::Stop
            } else {
                LoopAction::Continue
            }
        });

        while frame_loop.is_running() {
            thread::sleep(Duration::from_millis(5));
        }
        frame_loop.cancel();
        assert_eq!(counter.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_cancel_stops_iterations() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = Arc::clone(&counter);

        let frame_loop = FrameLoop::start("test-cancel", Duration::from_millis(5), move || {
            counter_clone.fetch_add(1, Ordering::SeqCst);
            LoopAction::Continue
        });

        thread::sleep(Duration::from_millis(50));
        frame_loop.cancel();
        let after_cancel = counter.load(Ordering::SeqCst);
        assert!(after_cancel > 0);

        thread::sleep(Duration::from_millis(30));
        assert_eq!(counter.load(Ordering::SeqCst), after_cancel);
    }

    #[test]
    fn test_cancel_interrupts_long_interval() {
        let frame_loop = FrameLoop::start("test-slow", Duration::from_secs(60), || {
            LoopAction::Continue
        });
        thread::sleep(Duration::from_millis(20));

        let started = Instant::now();
        frame_loop.cancel();
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_drop_joins_thread() {
        let running = Arc::new(AtomicBool::new(false));
        let running_clone = Arc::clone(&running);

        let frame_loop = FrameLoop::start("test-drop", Duration::from_millis(1), move || {
            running_clone.store(true, Ordering::SeqCst);
            LoopAction::Continue
        });
        assert!(frame_loop.is_running() || running.load(Ordering::SeqCst));
        drop(frame_loop);
    }
}
