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

//! Planes and view frustums for visibility tests.

use super::{Mat4, Vec3, Vec4, EPSILON};

/// An oriented plane `normal · p + d = 0`.
///
/// Points on the side the normal points to have a positive signed distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Unit normal of the plane.
    pub normal: Vec3,
    /// Signed offset from the origin along `normal`.
    pub d: f32,
}

impl Plane {
    /// Builds a plane from raw `(a, b, c, d)` coefficients, normalizing them so
    /// that [`Plane::signed_distance`] returns world-space distances.
    ///
    /// Degenerate coefficients (zero-length normal) are kept unnormalized.
    #[inline]
    pub fn from_coefficients(coefficients: Vec4) -> Self {
        let normal = coefficients.truncate();
        let len = normal.length();
        if len > EPSILON {
            Self {
                normal: normal * (1.0 / len),
                d: coefficients.w / len,
            }
        } else {
            Self {
                normal,
                d: coefficients.w,
            }
        }
    }

    /// Signed distance from `point` to the plane.
    #[inline]
    pub fn signed_distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.d
    }
}

/// The six clipping planes of a camera's view volume, normals pointing inward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    /// Planes in the order left, right, bottom, top, near, far.
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Index of the left plane in [`Frustum::planes`].
    pub const LEFT: usize = 0;
    /// Index of the right plane.
    pub const RIGHT: usize = 1;
    /// Index of the bottom plane.
    pub const BOTTOM: usize = 2;
    /// Index of the top plane.
    pub const TOP: usize = 3;
    /// Index of the near plane.
    pub const NEAR: usize = 4;
    /// Index of the far plane.
    pub const FAR: usize = 5;

    /// Extracts the planes from a combined `projection * view` matrix
    /// (Gribb–Hartmann), assuming a `[0, 1]` clip-space depth range.
    pub fn from_view_projection(view_projection: &Mat4) -> Self {
        let r0 = view_projection.get_row(0);
        let r1 = view_projection.get_row(1);
        let r2 = view_projection.get_row(2);
        let r3 = view_projection.get_row(3);

        Self {
            planes: [
                Plane::from_coefficients(r3 + r0),
                Plane::from_coefficients(r3 - r0),
                Plane::from_coefficients(r3 + r1),
                Plane::from_coefficients(r3 - r1),
                Plane::from_coefficients(r2),
                Plane::from_coefficients(r3 - r2),
            ],
        }
    }

    /// Returns `true` if `point` lies inside or on every plane.
    #[inline]
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.signed_distance(point) >= 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::FRAC_PI_2;

    fn camera_frustum() -> Frustum {
        // Camera at +10 on Z looking at the origin, 90° vertical FOV.
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec3::Y).unwrap();
        let proj = Mat4::perspective_rh_zo(FRAC_PI_2, 1.0, 0.1, 100.0);
        Frustum::from_view_projection(&(proj * view))
    }

    #[test]
    fn test_plane_normalizes_coefficients() {
        let plane = Plane::from_coefficients(Vec4::new(0.0, 2.0, 0.0, -4.0));
        assert_eq!(plane.normal, Vec3::Y);
        assert_eq!(plane.d, -2.0);
        assert_eq!(plane.signed_distance(Vec3::new(0.0, 5.0, 0.0)), 3.0);
    }

    #[test]
    fn test_frustum_contains_point_in_front() {
        let frustum = camera_frustum();
        assert!(frustum.contains_point(Vec3::ZERO));
        assert!(frustum.contains_point(Vec3::new(2.0, -2.0, 0.0)));
    }

    #[test]
    fn test_frustum_rejects_point_behind_camera() {
        let frustum = camera_frustum();
        assert!(!frustum.contains_point(Vec3::new(0.0, 0.0, 20.0)));
    }

    #[test]
    fn test_frustum_rejects_points_outside_sides_and_far() {
        let frustum = camera_frustum();
        // At distance 10 the half-width is 10 for a 90° FOV.
        assert!(!frustum.contains_point(Vec3::new(15.0, 0.0, 0.0)));
        assert!(!frustum.contains_point(Vec3::new(0.0, -15.0, 0.0)));
        assert!(!frustum.contains_point(Vec3::new(0.0, 0.0, -200.0)));
    }

    #[test]
    fn test_near_plane_faces_view_direction() {
        let frustum = camera_frustum();
        let near = frustum.planes[Frustum::NEAR];
        assert!(near.normal.z < 0.0);
    }
}
