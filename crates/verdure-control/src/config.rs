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

//! Controller configuration.
//!
//! Every tunable has a default, so a configuration document only needs to
//! name the values it changes:
//!
//! ```
//! use verdure_control::ControllerConfig;
//! use verdure_core::ComplexityTier;
//!
//! let config = ControllerConfig::from_ron_str("(initial_tier: Medium, history_window: 3)")
//!     .expect("valid configuration");
//! assert_eq!(config.initial_tier, ComplexityTier::Medium);
//! assert_eq!(config.evaluation_interval, 30);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;
use verdure_core::ComplexityTier;

const MIB: u64 = 1024 * 1024;
const MINUTE_MS: f64 = 60_000.0;

/// Errors raised while loading or validating a [`ControllerConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The document is not valid RON for this schema.
    #[error("failed to parse controller configuration: {0}")]
    Parse(#[from] ron::error::SpannedError),
    /// A value is outside its accepted range.
    #[error("invalid controller configuration: `{field}` {reason}")]
    Invalid {
        /// Name of the offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

/// Thresholds checked by the budget analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetConfig {
    /// Average render time per frame above which a warning is raised.
    pub render_time_ms: f64,
    /// Average draw calls per frame above which a warning is raised.
    pub draw_calls: u32,
    /// Memory use above which a critical suggestion is raised.
    pub memory_bytes: u64,
    /// Sustained memory growth considered a leak.
    pub leak_rate_bytes_per_minute: u64,
    /// Runtime (and observation span) required before the leak check runs.
    pub leak_min_runtime_ms: f64,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            render_time_ms: 12.0,
            draw_calls: 100,
            memory_bytes: 512 * MIB,
            leak_rate_bytes_per_minute: 10 * MIB,
            leak_min_runtime_ms: 5.0 * MINUTE_MS,
        }
    }
}

/// Resource tracking limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceConfig {
    /// Single resources above this size trigger a memory warning.
    pub max_single_resource_bytes: u64,
    /// Low-priority resources idle for longer than this are evicted.
    pub idle_threshold_ms: f64,
    /// Eviction runs every this many frames.
    pub eviction_interval: u64,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            max_single_resource_bytes: 100 * MIB,
            idle_threshold_ms: 60_000.0,
            eviction_interval: 600,
        }
    }
}

/// All controller tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Number of frame durations averaged into the FPS estimate.
    pub frame_window: usize,
    /// Clamp applied to one frame duration.
    pub max_frame_delta_ms: f64,
    /// Frames between two evaluations.
    pub evaluation_interval: u64,
    /// Number of consecutive evaluation periods a tier change requires.
    pub history_window: usize,
    /// Periods below this FPS count towards lowering the tier.
    pub low_fps_threshold: f64,
    /// Periods above this FPS count towards raising the tier.
    pub high_fps_threshold: f64,
    /// Render scale added when the tier is raised.
    pub render_scale_step: f32,
    /// Tier the settings start at.
    pub initial_tier: ComplexityTier,
    /// Budget thresholds.
    pub budgets: BudgetConfig,
    /// Resource tracking limits.
    pub resources: ResourceConfig,
    /// World units added to every bounding radius when culling.
    pub culling_margin: f32,
    /// Number of recent suggestions kept for diagnostics.
    pub suggestion_history: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            frame_window: 60,
            max_frame_delta_ms: 250.0,
            evaluation_interval: 30,
            history_window: 5,
            low_fps_threshold: 25.0,
            high_fps_threshold: 50.0,
            render_scale_step: 0.1,
            initial_tier: ComplexityTier::High,
            budgets: BudgetConfig::default(),
            resources: ResourceConfig::default(),
            culling_margin: 1.0,
            suggestion_history: 20,
        }
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

fn require_positive_count(field: &'static str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(invalid(field, "must be greater than zero"));
    }
    Ok(())
}

fn require_positive_ms(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid(field, format!("must be a positive duration, got {value}")));
    }
    Ok(())
}

impl ControllerConfig {
    /// Parses a RON document and validates it.
    pub fn from_ron_str(document: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(document)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every value is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive_count("frame_window", self.frame_window as u64)?;
        require_positive_count("evaluation_interval", self.evaluation_interval)?;
        require_positive_count("history_window", self.history_window as u64)?;
        require_positive_count("resources.eviction_interval", self.resources.eviction_interval)?;
        require_positive_count("suggestion_history", self.suggestion_history as u64)?;
        require_positive_ms("max_frame_delta_ms", self.max_frame_delta_ms)?;
        require_positive_ms("budgets.render_time_ms", self.budgets.render_time_ms)?;
        require_positive_ms("budgets.leak_min_runtime_ms", self.budgets.leak_min_runtime_ms)?;

        if !self.resources.idle_threshold_ms.is_finite() || self.resources.idle_threshold_ms < 0.0 {
            return Err(invalid(
                "resources.idle_threshold_ms",
                "must be a non-negative duration",
            ));
        }
        if !self.low_fps_threshold.is_finite()
            || !self.high_fps_threshold.is_finite()
            || self.low_fps_threshold <= 0.0
        {
            return Err(invalid("low_fps_threshold", "thresholds must be positive and finite"));
        }
        if self.low_fps_threshold >= self.high_fps_threshold {
            return Err(invalid(
                "low_fps_threshold",
                format!(
                    "must be below high_fps_threshold ({} >= {})",
                    self.low_fps_threshold, self.high_fps_threshold
                ),
            ));
        }
        if !(self.render_scale_step > 0.0 && self.render_scale_step <= 1.0) {
            return Err(invalid(
                "render_scale_step",
                format!("must be in (0, 1], got {}", self.render_scale_step),
            ));
        }
        if !self.culling_margin.is_finite() || self.culling_margin < 0.0 {
            return Err(invalid("culling_margin", "must be a non-negative distance"));
        }
        Ok(())
    }
}
