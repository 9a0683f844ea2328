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

//! Level-of-detail selection.
//!
//! Each complexity tier owns an ascending list of distance thresholds. For an
//! object at distance `d` from the camera the first level whose threshold is
//! at least `d` is used; objects beyond the last threshold get the last
//! (coarsest) level.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use verdure_core::math::Vec3;
use verdure_core::scene::SceneObjectRef;
use verdure_core::ComplexityTier;

/// Shading model used at a given level of detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaterialDetail {
    /// Unlit or vertex-lit.
    Basic,
    /// Classic lit shading.
    Standard,
    /// Physically based shading.
    Physical,
}

/// One rendering detail level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LodLevel {
    /// Maximum camera distance (inclusive) this level applies to.
    pub distance: f32,
    /// Fraction of the full geometry to draw, in `0.0..=1.0`.
    pub geometry_detail: f32,
    /// Shading model.
    pub material_detail: MaterialDetail,
    /// Whether skeletal/vertex animation runs.
    pub animations_enabled: bool,
    /// Whether attached particle emitters run.
    pub particles_enabled: bool,
}

impl LodLevel {
    const fn new(
        distance: f32,
        geometry_detail: f32,
        material_detail: MaterialDetail,
        animations_enabled: bool,
        particles_enabled: bool,
    ) -> Self {
        Self {
            distance,
            geometry_detail,
            material_detail,
            animations_enabled,
            particles_enabled,
        }
    }
}

/// Errors raised when building a [`LodTable`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LodTableError {
    /// A tier was given no levels.
    #[error("LOD table for tier {tier} is empty")]
    EmptyTier {
        /// The offending tier.
        tier: ComplexityTier,
    },
    /// A threshold is negative or not finite.
    #[error("LOD level {index} of tier {tier} has invalid distance {distance}")]
    InvalidDistance {
        /// The offending tier.
        tier: ComplexityTier,
        /// Position of the level in the tier's list.
        index: usize,
        /// The rejected value.
        distance: f32,
    },
    /// Thresholds are not in ascending order.
    #[error("LOD levels of tier {tier} are not sorted by distance (at index {index})")]
    Unsorted {
        /// The offending tier.
        tier: ComplexityTier,
        /// Position of the first out-of-order level.
        index: usize,
    },
    /// A geometry fraction is outside `0.0..=1.0`.
    #[error("LOD level {index} of tier {tier} has geometry detail {detail} outside 0..=1")]
    InvalidGeometryDetail {
        /// The offending tier.
        tier: ComplexityTier,
        /// Position of the level in the tier's list.
        index: usize,
        /// The rejected value.
        detail: f32,
    },
}

/// Per-tier level lists as written in configuration documents.
#[derive(Debug, Clone, Deserialize)]
struct LodTableDocument {
    low: Vec<LodLevel>,
    medium: Vec<LodLevel>,
    high: Vec<LodLevel>,
    ultra: Vec<LodLevel>,
}

impl TryFrom<LodTableDocument> for LodTable {
    type Error = LodTableError;

    fn try_from(document: LodTableDocument) -> Result<Self, Self::Error> {
        LodTable::new([document.low, document.medium, document.high, document.ultra])
    }
}

/// The LOD assignment of one visible object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LodAssignment {
    /// Host identifier of the object.
    pub object_id: String,
    /// Camera distance used for the selection.
    pub distance: f32,
    /// The selected level.
    pub level: LodLevel,
}

/// Validated LOD levels for every complexity tier.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "LodTableDocument")]
pub struct LodTable {
    tiers: [Vec<LodLevel>; 4],
}

impl LodTable {
    /// Builds a table from the level lists of `[Low, Medium, High, Ultra]`.
    ///
    /// Every list must be non-empty, with finite non-negative thresholds in
    /// ascending order (equal thresholds are allowed; the earlier one wins)
    /// and geometry fractions in `0.0..=1.0`.
    pub fn new(tiers: [Vec<LodLevel>; 4]) -> Result<Self, LodTableError> {
        for (tier, levels) in ComplexityTier::ALL.into_iter().zip(tiers.iter()) {
            if levels.is_empty() {
                return Err(LodTableError::EmptyTier { tier });
            }
            for (index, level) in levels.iter().enumerate() {
                if !level.distance.is_finite() || level.distance < 0.0 {
                    return Err(LodTableError::InvalidDistance {
                        tier,
                        index,
                        distance: level.distance,
                    });
                }
                if !(0.0..=1.0).contains(&level.geometry_detail) {
                    return Err(LodTableError::InvalidGeometryDetail {
                        tier,
                        index,
                        detail: level.geometry_detail,
                    });
                }
                if index > 0 && level.distance < levels[index - 1].distance {
                    return Err(LodTableError::Unsorted { tier, index });
                }
            }
        }
        Ok(Self { tiers })
    }

    /// The levels configured for `tier`, nearest first.
    pub fn levels(&self, tier: ComplexityTier) -> &[LodLevel] {
        &self.tiers[tier.index()]
    }

    /// Picks the level for an object at `distance` from the camera.
    pub fn level_for_distance(&self, distance: f32, tier: ComplexityTier) -> &LodLevel {
        let levels = &self.tiers[tier.index()];
        let coarsest = levels.len() - 1;
        levels
            .iter()
            .find(|level| level.distance >= distance)
            .unwrap_or(&levels[coarsest])
    }

    /// Picks the level for `object` seen from `camera_position`.
    pub fn select_lod(
        &self,
        object: &SceneObjectRef,
        camera_position: Vec3,
        tier: ComplexityTier,
    ) -> &LodLevel {
        self.level_for_distance(object.distance_to(camera_position), tier)
    }

    /// Assigns a level to every visible object, preserving order.
    pub fn assign_lod(
        &self,
        visible: &[&SceneObjectRef],
        camera_position: Vec3,
        tier: ComplexityTier,
    ) -> Vec<LodAssignment> {
        visible
            .iter()
            .map(|object| {
                let distance = object.distance_to(camera_position);
                LodAssignment {
                    object_id: object.id.clone(),
                    distance,
                    level: *self.level_for_distance(distance, tier),
                }
            })
            .collect()
    }
}

impl Default for LodTable {
    fn default() -> Self {
        use MaterialDetail::{Basic, Physical, Standard};
        Self {
            tiers: [
                vec![
                    LodLevel::new(15.0, 0.5, Basic, true, false),
                    LodLevel::new(40.0, 0.2, Basic, false, false),
                    LodLevel::new(80.0, 0.1, Basic, false, false),
                ],
                vec![
                    LodLevel::new(20.0, 0.75, Standard, true, false),
                    LodLevel::new(50.0, 0.4, Basic, true, false),
                    LodLevel::new(100.0, 0.2, Basic, false, false),
                ],
                vec![
                    LodLevel::new(25.0, 1.0, Physical, true, true),
                    LodLevel::new(60.0, 0.6, Standard, true, false),
                    LodLevel::new(120.0, 0.3, Basic, false, false),
                ],
                vec![
                    LodLevel::new(30.0, 1.0, Physical, true, true),
                    LodLevel::new(80.0, 0.75, Physical, true, true),
                    LodLevel::new(160.0, 0.5, Standard, true, false),
                    LodLevel::new(300.0, 0.25, Basic, false, false),
                ],
            ],
        }
    }
}
