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

//! Linear algebra primitives used by the scene graph, the camera and the uniform blocks.
//!
//! All matrices are column-major and all angles are in **radians** unless a function
//! name says otherwise (e.g. `degrees_to_radians`).

/// A small constant for floating-point comparisons.
pub const EPSILON: f32 = 1e-5;

pub use std::f32::consts::PI;

/// The factor to convert degrees to radians (PI / 180.0).
pub const DEG_TO_RAD: f32 = PI / 180.0;
/// The factor to convert radians to degrees (180.0 / PI).
pub const RAD_TO_DEG: f32 = 180.0 / PI;

pub mod matrix;
pub mod vector;

pub use self::matrix::Mat4;
pub use self::vector::{Vec2, Vec3, Vec4};

/// Converts an angle from degrees to radians.
///
/// # Examples
///
/// ```
/// use umbra_core::math::{degrees_to_radians, PI};
/// assert_eq!(degrees_to_radians(180.0), PI);
/// ```
#[inline]
pub fn degrees_to_radians(degrees: f32) -> f32 {
    degrees * DEG_TO_RAD
}

/// Converts an angle from radians to degrees.
#[inline]
pub fn radians_to_degrees(radians: f32) -> f32 {
    radians * RAD_TO_DEG
}

/// Clamps a value between a minimum and a maximum.
///
/// # Examples
///
/// ```
/// use umbra_core::math::clamp;
/// assert_eq!(clamp(75.0, 1.0, 60.0), 60.0);
/// assert_eq!(clamp(-3.0, 1.0, 60.0), 1.0);
/// ```
#[inline]
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    value.max(min).min(max)
}

/// Checks if two floating-point numbers are approximately equal using [`EPSILON`].
#[inline]
pub fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_angle_conversions_round_trip() {
        assert_relative_eq!(radians_to_degrees(degrees_to_radians(62.7)), 62.7, epsilon = 1e-4);
        assert_relative_eq!(degrees_to_radians(90.0), PI / 2.0);
    }

    #[test]
    fn test_clamp_bounds() {
        assert_eq!(clamp(0.5, 1.0, 60.0), 1.0);
        assert_eq!(clamp(30.0, 1.0, 60.0), 30.0);
        assert_eq!(clamp(179.0, 1.0, 60.0), 60.0);
    }
}
