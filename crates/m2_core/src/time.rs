//! Sleep-based frame pacing.
//!
//! The simulation thread runs one update per iteration and then suspends for
//! whatever is left of the frame budget. When the work overran the budget the
//! loop still yields for `min_sleep` so it never spins.

use std::time::Duration;

const FPS_SAMPLE_COUNT: usize = 60;

/// Suspension used when an iteration took as long as (or longer than) a frame.
pub const MIN_SLEEP: Duration = Duration::from_millis(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramePacer {
    frame_time: Duration,
    min_sleep: Duration,
}

impl FramePacer {
    /// Frame budget in whole milliseconds (60 Hz => 16 ms).
    pub fn from_frame_rate(frame_rate: u32) -> Self {
        let millis = 1000 / u64::from(frame_rate.max(1));
        Self {
            frame_time: Duration::from_millis(millis.max(1)),
            min_sleep: MIN_SLEEP,
        }
    }

    pub fn with_min_sleep(mut self, min_sleep: Duration) -> Self {
        self.min_sleep = min_sleep;
        self
    }

    pub fn frame_time(&self) -> Duration {
        self.frame_time
    }

    pub fn min_sleep(&self) -> Duration {
        self.min_sleep
    }

    /// How long to suspend after an iteration that took `elapsed`.
    pub fn sleep_for(&self, elapsed: Duration) -> Duration {
        match self.frame_time.checked_sub(elapsed) {
            Some(remaining) if !remaining.is_zero() => remaining,
            _ => self.min_sleep,
        }
    }
}

/// Rolling frame statistics for the debug overlay.
#[derive(Debug, Clone)]
pub struct FrameStats {
    pub frame_count: u64,
    pub last_frame_ms: f64,
    pub smoothed_fps: f64,
    pub smoothed_frame_time_ms: f64,

    samples: [f64; FPS_SAMPLE_COUNT],
    sample_index: usize,
}

impl FrameStats {
    pub fn new() -> Self {
        Self {
            frame_count: 0,
            last_frame_ms: 0.0,
            smoothed_fps: 60.0,
            smoothed_frame_time_ms: 16.667,
            samples: [1.0 / 60.0; FPS_SAMPLE_COUNT],
            sample_index: 0,
        }
    }

    pub fn record(&mut self, frame_dt: Duration) {
        let dt = frame_dt.as_secs_f64();
        self.frame_count += 1;
        self.last_frame_ms = dt * 1000.0;

        self.samples[self.sample_index] = dt;
        self.sample_index = (self.sample_index + 1) % FPS_SAMPLE_COUNT;
        let avg_dt: f64 = self.samples.iter().sum::<f64>() / FPS_SAMPLE_COUNT as f64;
        self.smoothed_frame_time_ms = avg_dt * 1000.0;
        self.smoothed_fps = if avg_dt > 0.0 { 1.0 / avg_dt } else { 0.0 };
    }
}

impl Default for FrameStats {
    fn default() -> Self {
        Self::new()
    }
}
