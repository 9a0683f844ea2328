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

//! Math primitives used by the culling and level-of-detail stages.
//!
//! Only the subset the controller needs lives here: 3D/4D vectors, a
//! column-major 4x4 matrix for camera view/projection data, and the
//! plane/frustum pair used for visibility tests. Angles are in radians.

/// A small constant for floating-point comparisons.
pub const EPSILON: f32 = 1e-5;

pub use std::f32::consts::{FRAC_PI_2, FRAC_PI_3, FRAC_PI_4, PI};

pub mod geometry;
pub mod matrix;
pub mod vector;

pub use self::geometry::{Frustum, Plane};
pub use self::matrix::Mat4;
pub use self::vector::{Vec3, Vec4};

/// Clamps a value to a specified minimum and maximum range.
///
/// # Examples
///
/// ```
/// use verdure_core::math::clamp;
/// assert_eq!(clamp(1.5, 0.1, 1.0), 1.0);
/// assert_eq!(clamp(-0.3, 0.1, 1.0), 0.1);
/// ```
#[inline]
pub fn clamp<T: PartialOrd>(value: T, min_val: T, max_val: T) -> T {
    if value < min_val {
        min_val
    } else if value > max_val {
        max_val
    } else {
        value
    }
}

/// Approximate equality with the module's default [`EPSILON`].
#[inline]
pub fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}
