//! Frame timing for the benchmark loop

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Frames averaged for the rolling FPS figure
const WINDOW: usize = 120;

/// Tracks frame times for one backend and logs a rolling FPS once per `interval`
pub struct FrameStats {
    label: String,
    frame_times: VecDeque<f32>,
    total: Duration,
    frames: usize,
    interval: Duration,
    last_logged: Instant,
}

impl FrameStats {
    pub fn new(label: impl Into<String>) -> Self {
        Self::with_interval(label, Duration::from_secs(1))
    }

    pub fn with_interval(label: impl Into<String>, interval: Duration) -> Self {
        Self {
            label: label.into(),
            frame_times: VecDeque::with_capacity(WINDOW),
            total: Duration::ZERO,
            frames: 0,
            interval,
            last_logged: Instant::now(),
        }
    }

    /// Record one frame and log the rolling average if the interval has passed
    pub fn record(&mut self, frame_time: Duration) {
        self.total += frame_time;
        self.frames += 1;

        if self.frame_times.len() == WINDOW {
            self.frame_times.pop_front();
        }
        self.frame_times.push_back(frame_time.as_secs_f32());

        let now = Instant::now();
        if now - self.last_logged >= self.interval {
            self.last_logged = now;
            log::info!(
                "[{}] {:.0} FPS ({:.2}ms) after {} frames",
                self.label,
                self.rolling_fps(),
                self.rolling_frame_ms(),
                self.frames
            );
        }
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Mean frame time over the last `WINDOW` frames
    pub fn rolling_frame_ms(&self) -> f32 {
        if self.frame_times.is_empty() {
            return 0.0;
        }
        let sum: f32 = self.frame_times.iter().sum();
        sum / self.frame_times.len() as f32 * 1000.0
    }

    pub fn rolling_fps(&self) -> f32 {
        let ms = self.rolling_frame_ms();
        if ms > 0.0 {
            1000.0 / ms
        } else {
            0.0
        }
    }

    /// Mean frame time over the whole run
    pub fn mean_frame_ms(&self) -> f64 {
        if self.frames == 0 {
            return 0.0;
        }
        self.total.as_secs_f64() * 1000.0 / self.frames as f64
    }

    pub fn summary(&self) -> String {
        let mean = self.mean_frame_ms();
        let fps = if mean > 0.0 { 1000.0 / mean } else { 0.0 };
        format!(
            "{:<9} {:>6} frames  {:>9.3} ms/frame  {:>9.1} FPS",
            self.label, self.frames, mean, fps
        )
    }
}
