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

//! # Verdure Telemetry
//!
//! Leaf measurement components that feed the performance monitor: a bounded
//! frame-duration window and the resource usage tracker. Neither component
//! makes decisions; they only record and summarize.

#![warn(missing_docs)]

pub mod metrics;
pub mod monitoring;

pub use metrics::frame_timer::FrameTimer;
pub use metrics::ring_buffer::RingBuffer;
pub use monitoring::resource_tracker::{
    ResourceKind, ResourcePriority, ResourceRecord, ResourceTotals, ResourceTracker,
};
