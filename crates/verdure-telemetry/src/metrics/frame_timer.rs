// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Frame timer: turns frame timestamps into a rolling FPS estimate.

use super::ring_buffer::RingBuffer;
use verdure_core::telemetry::FrameSample;

/// FPS reported while no frame duration has been measured yet.
pub const DEFAULT_FPS: f64 = 60.0;
/// Default number of frame durations kept.
pub const DEFAULT_WINDOW: usize = 60;
/// Default clamp applied to a single frame duration, in milliseconds.
pub const DEFAULT_MAX_DELTA_MS: f64 = 250.0;

/// Keeps the durations of the last `capacity` frames.
///
/// Durations are clamped to `max_delta_ms` so one long stall (a tab switch, a
/// debugger pause) does not dominate the average.
#[derive(Debug, Clone)]
pub struct FrameTimer {
    samples: RingBuffer<FrameSample>,
    max_delta_ms: f64,
    last_frame_time_ms: Option<f64>,
}

impl FrameTimer {
    /// Creates a timer keeping `capacity` samples.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize, max_delta_ms: f64) -> Self {
        Self {
            samples: RingBuffer::new(capacity),
            max_delta_ms,
            last_frame_time_ms: None,
        }
    }

    /// Records the start of a frame at `now_ms`.
    ///
    /// The first call only establishes the baseline and returns `None`. Each
    /// later call stores the (clamped) time elapsed since the previous one and
    /// returns it.
    ///
    /// # Panics
    ///
    /// Panics if `now_ms` is not finite or is earlier than the previous
    /// timestamp. Timestamps must come from a monotonic clock.
    pub fn record_frame(&mut self, now_ms: f64) -> Option<f64> {
        assert!(now_ms.is_finite(), "frame timestamp must be finite, got {now_ms}");

        let recorded = self.last_frame_time_ms.map(|last| {
            assert!(
                now_ms >= last,
                "frame timestamps must be monotonic: {now_ms} ms after {last} ms"
            );
            let duration_ms = (now_ms - last).min(self.max_delta_ms);
            self.samples.push(FrameSample {
                start_time_ms: last,
                duration_ms,
            });
            log::trace!("FrameTimer: frame took {duration_ms:.2} ms");
            duration_ms
        });

        self.last_frame_time_ms = Some(now_ms);
        recorded
    }

    /// Mean frame duration over the window, or `None` before the first sample.
    pub fn average_frame_time_ms(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        let total: f64 = self.samples.iter().map(|s| s.duration_ms).sum();
        Some(total / self.samples.count() as f64)
    }

    /// Frames per second derived from the mean duration.
    ///
    /// Returns [`DEFAULT_FPS`] when the window is empty or the mean is zero.
    pub fn current_fps(&self) -> f64 {
        match self.average_frame_time_ms() {
            Some(avg) if avg > 0.0 => 1000.0 / avg,
            _ => DEFAULT_FPS,
        }
    }

    /// Number of samples currently held.
    pub fn sample_count(&self) -> usize {
        self.samples.count()
    }

    /// Maximum number of samples held.
    pub fn capacity(&self) -> usize {
        self.samples.capacity()
    }

    /// Samples in chronological order.
    pub fn samples(&self) -> impl Iterator<Item = &FrameSample> {
        self.samples.iter()
    }

    /// Timestamp passed to the most recent `record_frame`.
    pub fn last_frame_time_ms(&self) -> Option<f64> {
        self.last_frame_time_ms
    }

    /// Forgets every sample and the baseline.
    pub fn reset(&mut self) {
        self.samples.clear();
        self.last_frame_time_ms = None;
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW, DEFAULT_MAX_DELTA_MS)
    }
}
