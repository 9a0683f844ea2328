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

//! Data types shared by every measurement and control component.
//!
//! This module defines the "what" of telemetry: the records produced each
//! frame, the derived snapshot, the suggestions emitted on budget violations
//! and the probe contract for memory introspection. `verdure-telemetry`
//! provides the components that produce them and `verdure-infra` the
//! concrete host probes.

pub mod metrics;
pub mod monitoring;
pub mod suggestion;

pub use self::metrics::{FrameSample, PerformanceSnapshot, RenderStats};
pub use self::monitoring::{FixedMemoryProbe, MemoryProbe, UnavailableMemoryProbe};
pub use self::suggestion::{OptimizationSuggestion, Severity, SuggestedAction, SuggestionCategory};
