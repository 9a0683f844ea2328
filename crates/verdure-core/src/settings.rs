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

//! The global quality model: complexity tiers and the adaptive settings value.
//!
//! `AdaptiveSettings` is a plain value. The store in `verdure-control` swaps
//! whole values; nothing mutates a committed instance in place.

use serde::{Deserialize, Serialize};

/// Smallest render scale a committed value may carry.
pub const MIN_RENDER_SCALE: f32 = 0.1;
/// Largest render scale a committed value may carry.
pub const MAX_RENDER_SCALE: f32 = 1.0;

/// Global ordinal quality setting.
///
/// The controller moves at most one step per decision cycle.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum ComplexityTier {
    /// Minimum quality.
    Low = 1,
    /// Reduced quality.
    Medium = 2,
    /// Default quality.
    #[default]
    High = 3,
    /// Everything enabled.
    Ultra = 4,
}

impl ComplexityTier {
    /// All tiers, lowest first.
    pub const ALL: [ComplexityTier; 4] = [
        ComplexityTier::Low,
        ComplexityTier::Medium,
        ComplexityTier::High,
        ComplexityTier::Ultra,
    ];

    /// Numeric level, 1 (low) to 4 (ultra).
    #[inline]
    pub fn level(self) -> u8 {
        self as u8
    }

    /// Zero-based index, handy for per-tier tables.
    #[inline]
    pub fn index(self) -> usize {
        self.level() as usize - 1
    }

    /// Maps any integer onto the nearest valid tier.
    pub fn from_level(level: i64) -> Self {
        match level {
            i64::MIN..=1 => ComplexityTier::Low,
            2 => ComplexityTier::Medium,
            3 => ComplexityTier::High,
            _ => ComplexityTier::Ultra,
        }
    }

    /// One tier higher, saturating at `Ultra`.
    pub fn step_up(self) -> Self {
        Self::from_level(self.level() as i64 + 1)
    }

    /// One tier lower, saturating at `Low`.
    pub fn step_down(self) -> Self {
        Self::from_level(self.level() as i64 - 1)
    }

    /// Whether particle systems are allowed at this tier.
    #[inline]
    pub fn allows_particles(self) -> bool {
        self >= ComplexityTier::High
    }
}

impl std::fmt::Display for ComplexityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}({})", self, self.level())
    }
}

/// The currently active quality configuration consumed by the render layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveSettings {
    /// Global complexity tier.
    pub complexity_tier: ComplexityTier,
    /// Whether particle systems (weather, sparkles) run at all.
    pub particles_enabled: bool,
    /// Whether shadow maps are rendered.
    pub shadows_enabled: bool,
    /// Whether the render target is antialiased.
    pub antialiasing: bool,
    /// Whether post-processing passes (bloom, tone mapping) run.
    pub post_processing: bool,
    /// Render-target scale in `(0, 1]`.
    pub render_scale: f32,
    /// Upper bound on live particles.
    pub max_particle_count: u32,
    /// Distance beyond which the render layer may stop drawing detail.
    pub lod_distance: f32,
}

impl AdaptiveSettings {
    /// The preset used when a tier is selected from scratch.
    pub fn for_tier(tier: ComplexityTier) -> Self {
        match tier {
            ComplexityTier::Low => Self {
                complexity_tier: tier,
                particles_enabled: false,
                shadows_enabled: false,
                antialiasing: false,
                post_processing: false,
                render_scale: 0.6,
                max_particle_count: 250,
                lod_distance: 40.0,
            },
            ComplexityTier::Medium => Self {
                complexity_tier: tier,
                particles_enabled: false,
                shadows_enabled: false,
                antialiasing: true,
                post_processing: false,
                render_scale: 0.8,
                max_particle_count: 1_000,
                lod_distance: 80.0,
            },
            ComplexityTier::High => Self {
                complexity_tier: tier,
                particles_enabled: true,
                shadows_enabled: true,
                antialiasing: true,
                post_processing: true,
                render_scale: 1.0,
                max_particle_count: 4_000,
                lod_distance: 150.0,
            },
            ComplexityTier::Ultra => Self {
                complexity_tier: tier,
                particles_enabled: true,
                shadows_enabled: true,
                antialiasing: true,
                post_processing: true,
                render_scale: 1.0,
                max_particle_count: 10_000,
                lod_distance: 300.0,
            },
        }
    }

    /// Returns a copy with every field pulled back into its valid range.
    ///
    /// `render_scale` is clamped into `[MIN_RENDER_SCALE, MAX_RENDER_SCALE]`;
    /// a non-finite scale becomes `MAX_RENDER_SCALE`. A negative or non-finite
    /// `lod_distance` becomes `0.0`.
    pub fn sanitized(&self) -> Self {
        let render_scale = if self.render_scale.is_finite() {
            self.render_scale.clamp(MIN_RENDER_SCALE, MAX_RENDER_SCALE)
        } else {
            MAX_RENDER_SCALE
        };
        let lod_distance = if self.lod_distance.is_finite() {
            self.lod_distance.max(0.0)
        } else {
            0.0
        };
        Self {
            render_scale,
            lod_distance,
            ..self.clone()
        }
    }

    /// Returns `true` if [`AdaptiveSettings::sanitized`] would change nothing.
    pub fn is_valid(&self) -> bool {
        self.sanitized() == *self
    }
}

impl Default for AdaptiveSettings {
    fn default() -> Self {
        Self::for_tier(ComplexityTier::default())
    }
}

/// Untyped settings as they arrive from a user override or a config file.
///
/// The tier is an arbitrary integer here; converting to [`AdaptiveSettings`]
/// clamps it onto the nearest tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSettings {
    /// Requested tier level, clamped into 1..=4.
    pub complexity_tier: i64,
    /// See [`AdaptiveSettings::particles_enabled`].
    pub particles_enabled: bool,
    /// See [`AdaptiveSettings::shadows_enabled`].
    pub shadows_enabled: bool,
    /// See [`AdaptiveSettings::antialiasing`].
    pub antialiasing: bool,
    /// See [`AdaptiveSettings::post_processing`].
    pub post_processing: bool,
    /// See [`AdaptiveSettings::render_scale`].
    pub render_scale: f32,
    /// See [`AdaptiveSettings::max_particle_count`].
    pub max_particle_count: u32,
    /// See [`AdaptiveSettings::lod_distance`].
    pub lod_distance: f32,
}

impl From<&AdaptiveSettings> for RawSettings {
    fn from(settings: &AdaptiveSettings) -> Self {
        Self {
            complexity_tier: settings.complexity_tier.level() as i64,
            particles_enabled: settings.particles_enabled,
            shadows_enabled: settings.shadows_enabled,
            antialiasing: settings.antialiasing,
            post_processing: settings.post_processing,
            render_scale: settings.render_scale,
            max_particle_count: settings.max_particle_count,
            lod_distance: settings.lod_distance,
        }
    }
}

impl From<RawSettings> for AdaptiveSettings {
    fn from(raw: RawSettings) -> Self {
        AdaptiveSettings {
            complexity_tier: ComplexityTier::from_level(raw.complexity_tier),
            particles_enabled: raw.particles_enabled,
            shadows_enabled: raw.shadows_enabled,
            antialiasing: raw.antialiasing,
            post_processing: raw.post_processing,
            render_scale: raw.render_scale,
            max_particle_count: raw.max_particle_count,
            lod_distance: raw.lod_distance,
        }
        .sanitized()
    }
}
