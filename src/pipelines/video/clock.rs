// SPDX-License-Identifier: GPL-3.0-only

//! Recording clock that stands still while paused

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

#[derive(Debug)]
struct ClockState {
    started: Instant,
    paused_at: Option<Instant>,
    paused_total: Duration,
}

/// Shared running time of a recording, excluding paused intervals
///
/// Cloned into every feeder so all tracks stamp buffers from one timeline.
#[derive(Debug, Clone)]
pub struct RecordingClock {
    state: Arc<Mutex<ClockState>>,
}

impl RecordingClock {
    pub fn start() -> Self {
        Self {
            state: Arc::new(Mutex::new(ClockState {
                started: Instant::now(),
                paused_at: None,
                paused_total: Duration::ZERO,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ClockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn pause(&self) {
        let mut state = self.lock();
        if state.paused_at.is_none() {
            state.paused_at = Some(Instant::now());
        }
    }

    pub fn resume(&self) {
        let mut state = self.lock();
        if let Some(paused_at) = state.paused_at.take() {
            state.paused_total += paused_at.elapsed();
        }
    }

    pub fn is_paused(&self) -> bool {
        self.lock().paused_at.is_some()
    }

    /// Running time so far
    pub fn elapsed(&self) -> Duration {
        let state = self.lock();
        let now = state.paused_at.unwrap_or_else(Instant::now);
        now.saturating_duration_since(state.started)
            .saturating_sub(state.paused_total)
    }
}
