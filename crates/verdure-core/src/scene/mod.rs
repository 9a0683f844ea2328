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

//! Per-frame scene inputs: the objects considered for drawing and the camera.

use crate::math::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// A drawable object as seen by the visibility and LOD stages.
///
/// The controller only reads these; the host owns the actual scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObjectRef {
    /// Host identifier of the object.
    pub id: String,
    /// World-space center of the object's bounding sphere.
    pub position: Vec3,
    /// Radius of the bounding sphere. Expected to be non-negative.
    pub bounding_radius: f32,
}

impl SceneObjectRef {
    /// Creates a new object reference.
    pub fn new(id: impl Into<String>, position: Vec3, bounding_radius: f32) -> Self {
        Self {
            id: id.into(),
            position,
            bounding_radius,
        }
    }

    /// Distance from `point` to the object's center.
    pub fn distance_to(&self, point: Vec3) -> f32 {
        self.position.distance(point)
    }
}

/// The camera of the frame being prepared.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CameraState {
    /// World-to-view transform.
    pub view: Mat4,
    /// View-to-clip transform (zero-to-one depth).
    pub projection: Mat4,
    /// World-space camera position, used for LOD distances.
    pub position: Vec3,
}

impl CameraState {
    /// Builds a right-handed perspective camera at `eye` looking at `target`.
    ///
    /// Returns `None` when `eye` and `target` coincide or `up` is parallel to
    /// the view direction.
    pub fn look_at(
        eye: Vec3,
        target: Vec3,
        up: Vec3,
        fov_y_radians: f32,
        aspect_ratio: f32,
        z_near: f32,
        z_far: f32,
    ) -> Option<Self> {
        let view = Mat4::look_at_rh(eye, target, up)?;
        Some(Self {
            view,
            projection: Mat4::perspective_rh_zo(fov_y_radians, aspect_ratio, z_near, z_far),
            position: eye,
        })
    }

    /// `projection * view`.
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::FRAC_PI_2;
    use approx::assert_relative_eq;

    #[test]
    fn test_distance_to_camera() {
        let object = SceneObjectRef::new("tree", Vec3::new(3.0, 0.0, 4.0), 1.0);
        assert_relative_eq!(object.distance_to(Vec3::ZERO), 5.0);
    }

    #[test]
    fn test_look_at_rejects_degenerate_camera() {
        let camera = CameraState::look_at(Vec3::ONE, Vec3::ONE, Vec3::Y, FRAC_PI_2, 1.0, 0.1, 10.0);
        assert!(camera.is_none());
    }

    #[test]
    fn test_look_at_records_position() {
        let eye = Vec3::new(0.0, 2.0, 10.0);
        let camera = CameraState::look_at(eye, Vec3::ZERO, Vec3::Y, FRAC_PI_2, 1.6, 0.1, 100.0)
            .expect("valid camera");
        assert_eq!(camera.position, eye);
    }
}
