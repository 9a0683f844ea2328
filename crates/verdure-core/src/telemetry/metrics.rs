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

//! Per-frame measurements and the derived performance snapshot.

use serde::{Deserialize, Serialize};

/// One rendered frame: when it started and how long it took.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameSample {
    /// Monotonic start time of the frame, in milliseconds.
    pub start_time_ms: f64,
    /// Duration of the frame, in milliseconds.
    pub duration_ms: f64,
}

/// Statistics the host render layer reports after drawing a frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderStats {
    /// CPU + GPU time spent rendering, in milliseconds.
    pub render_time_ms: f64,
    /// Number of draw calls submitted.
    pub draw_calls: u32,
    /// Number of triangles submitted.
    pub triangle_count: u32,
}

/// Derived performance figures, recomputed once per evaluation period.
///
/// Snapshots are replaced wholesale, never patched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSnapshot {
    /// Frames per second over the frame window.
    pub fps: f64,
    /// Average frame time over the frame window, in milliseconds.
    pub avg_frame_time_ms: f64,
    /// Average render time over the render window, in milliseconds.
    pub avg_render_time_ms: f64,
    /// Memory in use, or `None` when the host cannot report it.
    pub memory_used_bytes: Option<u64>,
    /// Draw calls of the most recent frame.
    pub draw_calls: u32,
    /// Triangles of the most recent frame.
    pub triangle_count: u32,
}

impl Default for PerformanceSnapshot {
    fn default() -> Self {
        Self {
            fps: 60.0,
            avg_frame_time_ms: 1000.0 / 60.0,
            avg_render_time_ms: 0.0,
            memory_used_bytes: None,
            draw_calls: 0,
            triangle_count: 0,
        }
    }
}

impl PerformanceSnapshot {
    /// Memory in use in megabytes, if known.
    pub fn memory_used_mb(&self) -> Option<f64> {
        self.memory_used_bytes
            .map(|bytes| bytes as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_snapshot_has_unknown_memory() {
        let snapshot = PerformanceSnapshot::default();
        assert_eq!(snapshot.memory_used_bytes, None);
        assert_eq!(snapshot.memory_used_mb(), None);
    }

    #[test]
    fn test_memory_used_mb_conversion() {
        let snapshot = PerformanceSnapshot {
            memory_used_bytes: Some(3 * 1024 * 1024),
            ..Default::default()
        };
        assert_eq!(snapshot.memory_used_mb(), Some(3.0));
    }
}
