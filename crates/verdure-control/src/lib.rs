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

//! # Verdure Control
//!
//! The adaptive layer of the controller. Frame timings, render statistics and
//! resource declarations flow in; the [`monitor::PerformanceMonitor`] turns
//! them into a [`verdure_core::telemetry::PerformanceSnapshot`] every
//! evaluation period, moves the complexity tier through a hysteresis state
//! machine, and publishes optimization suggestions. The committed settings
//! live in the [`store::SettingsStore`], whose readers are notified of every
//! commit.
//!
//! [`service::FrameLoop`] drives the whole pipeline once per frame.

#![warn(missing_docs)]

pub mod analysis;
pub mod config;
pub mod monitor;
pub mod registry;
pub mod service;
pub mod store;

pub use config::{BudgetConfig, ConfigError, ControllerConfig, ResourceConfig};
pub use monitor::{BudgetState, PerformanceMonitor};
pub use registry::{FrameContext, UpdateRegistry};
pub use service::{DiagnosticsSnapshot, FrameLoop, FrameOutput};
pub use store::{SettingsReader, SettingsStore, Subscription};
