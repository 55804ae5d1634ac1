//! Frame counters.

use std::collections::VecDeque;

const MAX_SAMPLES: usize = 120;

/// Rolling frame-time statistics, fed one delta per rendered frame.
#[derive(Debug, Clone, Default)]
pub struct FrameStats {
    frame_times: VecDeque<f32>,
    frames: u64,
    skipped: u64,
}

impl FrameStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a completed frame that took `dt` seconds.
    pub fn record(&mut self, dt: f32) {
        self.frames += 1;
        self.frame_times.push_back(dt.max(0.0));
        if self.frame_times.len() > MAX_SAMPLES {
            self.frame_times.pop_front();
        }
    }

    /// Records a frame whose render sequence was skipped.
    pub fn record_skipped(&mut self) {
        self.skipped += 1;
    }

    /// Total frames rendered.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Total frames skipped after a backend error.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Average frames per second over the sample window.
    pub fn fps(&self) -> f32 {
        let total: f32 = self.frame_times.iter().sum();
        if total <= 0.0 {
            return 0.0;
        }
        self.frame_times.len() as f32 / total
    }

    /// Duration of the most recent frame in milliseconds.
    pub fn last_frame_ms(&self) -> f32 {
        self.frame_times.back().map_or(0.0, |dt| dt * 1000.0)
    }
}
