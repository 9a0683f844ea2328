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

//! Spatial visibility filter.
//!
//! Objects are approximated by bounding spheres. An object is kept if its
//! center, or any of the six points offset along the world axes by its
//! inflated radius, lies inside the frustum. This is conservative for objects
//! straddling a plane and cheap enough to run on every object every frame.

use verdure_core::math::{Frustum, Mat4, Vec3};
use verdure_core::scene::{CameraState, SceneObjectRef};

const AXIS_OFFSETS: [Vec3; 6] = [
    Vec3::X,
    Vec3::new(-1.0, 0.0, 0.0),
    Vec3::Y,
    Vec3::new(0.0, -1.0, 0.0),
    Vec3::Z,
    Vec3::new(0.0, 0.0, -1.0),
];

/// Builds the six normalized frustum planes of `projection * view`.
pub fn compute_frustum(view: &Mat4, projection: &Mat4) -> Frustum {
    Frustum::from_view_projection(&(*projection * *view))
}

/// Returns `true` if the object's bounding sphere, grown by `margin`, reaches
/// into the frustum.
pub fn is_visible(object: &SceneObjectRef, frustum: &Frustum, margin: f32) -> bool {
    if frustum.contains_point(object.position) {
        return true;
    }
    let reach = object.bounding_radius.max(0.0) + margin;
    AXIS_OFFSETS
        .iter()
        .any(|axis| frustum.contains_point(object.position + *axis * reach))
}

/// Keeps the visible objects, preserving input order.
pub fn filter_visible<'a>(
    objects: &'a [SceneObjectRef],
    frustum: &Frustum,
    margin: f32,
) -> Vec<&'a SceneObjectRef> {
    objects
        .iter()
        .filter(|object| is_visible(object, frustum, margin))
        .collect()
}

/// Counters describing the most recent culling pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct CullingStats {
    /// Objects submitted.
    pub tested: usize,
    /// Objects kept.
    pub visible: usize,
}

impl CullingStats {
    /// Objects rejected.
    pub fn culled(&self) -> usize {
        self.tested - self.visible
    }
}

/// The visibility stage of the frame pipeline.
#[derive(Debug, Clone)]
pub struct CullingLane {
    margin: f32,
    last_stats: CullingStats,
}

impl CullingLane {
    /// Creates a lane inflating every bounding sphere by `margin` world units.
    pub fn new(margin: f32) -> Self {
        Self {
            margin,
            last_stats: CullingStats::default(),
        }
    }

    /// The margin added to each bounding radius.
    pub fn margin(&self) -> f32 {
        self.margin
    }

    /// Culls `objects` against `camera` and records the pass statistics.
    pub fn run<'a>(
        &mut self,
        camera: &CameraState,
        objects: &'a [SceneObjectRef],
    ) -> Vec<&'a SceneObjectRef> {
        let frustum = compute_frustum(&camera.view, &camera.projection);
        let visible = filter_visible(objects, &frustum, self.margin);
        self.last_stats = CullingStats {
            tested: objects.len(),
            visible: visible.len(),
        };
        log::trace!(
            "CullingLane: {}/{} objects visible",
            self.last_stats.visible,
            self.last_stats.tested
        );
        visible
    }

    /// Statistics of the last [`run`](Self::run).
    pub fn last_stats(&self) -> CullingStats {
        self.last_stats
    }
}

impl Default for CullingLane {
    fn default() -> Self {
        Self::new(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use verdure_core::math::FRAC_PI_2;

    fn camera() -> CameraState {
        // At +10 on Z looking at the origin; the half-width at the origin is 10.
        CameraState::look_at(
            Vec3::new(0.0, 0.0, 10.0),
            Vec3::ZERO,
            Vec3::Y,
            FRAC_PI_2,
            1.0,
            0.1,
            100.0,
        )
        .expect("valid camera")
    }

    fn frustum() -> Frustum {
        let camera = camera();
        compute_frustum(&camera.view, &camera.projection)
    }

    #[test]
    fn test_center_inside_is_visible() {
        let object = SceneObjectRef::new("rose", Vec3::new(1.0, 1.0, 0.0), 0.0);
        assert!(is_visible(&object, &frustum(), 0.0));
    }

    #[test]
    fn test_sphere_straddling_plane_is_visible() {
        let object = SceneObjectRef::new("hedge", Vec3::new(11.0, 0.0, 0.0), 0.5);
        assert!(!is_visible(&object, &frustum(), 0.0));
        assert!(is_visible(&object, &frustum(), 1.0));
    }

    #[test]
    fn test_far_outside_is_culled() {
        let object = SceneObjectRef::new("shed", Vec3::new(13.0, 0.0, 0.0), 0.5);
        assert!(!is_visible(&object, &frustum(), 1.0));

        let behind = SceneObjectRef::new("gate", Vec3::new(0.0, 0.0, 30.0), 2.0);
        assert!(!is_visible(&behind, &frustum(), 1.0));
    }

    #[test]
    fn test_visibility_is_deterministic() {
        let frustum = frustum();
        let objects = [
            SceneObjectRef::new("rose", Vec3::new(1.0, 1.0, 0.0), 0.5),
            SceneObjectRef::new("hedge", Vec3::new(11.0, 0.0, 0.0), 0.5),
            SceneObjectRef::new("shed", Vec3::new(13.0, 0.0, 0.0), 0.5),
            SceneObjectRef::new("gate", Vec3::new(0.0, 0.0, 30.0), 2.0),
        ];
        for object in &objects {
            let first = is_visible(object, &frustum, 1.0);
            for _ in 0..100 {
                assert_eq!(is_visible(object, &frustum, 1.0), first, "{}", object.id);
            }
        }
    }

    #[test]
    fn test_filter_preserves_order() {
        let objects = vec![
            SceneObjectRef::new("a", Vec3::new(0.0, 0.0, -5.0), 1.0),
            SceneObjectRef::new("b", Vec3::new(50.0, 0.0, 0.0), 1.0),
            SceneObjectRef::new("c", Vec3::new(-2.0, 0.0, 0.0), 1.0),
            SceneObjectRef::new("d", Vec3::new(0.0, 1.0, 2.0), 1.0),
        ];
        let ids: Vec<_> = filter_visible(&objects, &frustum(), 1.0)
            .iter()
            .map(|o| o.id.as_str())
            .collect();
        assert_eq!(ids, vec!["a", "c", "d"]);
    }

    #[test]
    fn test_lane_reports_stats() {
        let objects = vec![
            SceneObjectRef::new("a", Vec3::ZERO, 1.0),
            SceneObjectRef::new("b", Vec3::new(0.0, 80.0, 0.0), 1.0),
        ];
        let mut lane = CullingLane::default();
        let visible = lane.run(&camera(), &objects);
        assert_eq!(visible.len(), 1);
        assert_eq!(
            lane.last_stats(),
            CullingStats {
                tested: 2,
                visible: 1
            }
        );
        assert_eq!(lane.last_stats().culled(), 1);
    }

    #[test]
    fn test_empty_input() {
        let mut lane = CullingLane::default();
        assert!(lane.run(&camera(), &[]).is_empty());
        assert_eq!(lane.last_stats().culled(), 0);
    }
}
