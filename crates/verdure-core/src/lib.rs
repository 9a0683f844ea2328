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

//! # Verdure Core
//!
//! Foundational crate containing the shared types and interface contracts of
//! the adaptive rendering controller: math primitives, the quality settings
//! model, telemetry records, scene/camera inputs and the event channel used
//! to deliver suggestions.

#![warn(missing_docs)]

pub mod event;
pub mod math;
pub mod platform;
pub mod scene;
pub mod settings;
pub mod telemetry;

pub use settings::{AdaptiveSettings, ComplexityTier, RawSettings};
