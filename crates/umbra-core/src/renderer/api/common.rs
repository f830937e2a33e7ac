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

//! Common value types and fixed render constants shared by every pass.

/// A 2D size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Extent2D {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Extent2D {
    /// Creates a new extent.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns `true` if either dimension is zero (e.g. a minimized window).
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Width divided by height. Returns 1.0 for an empty extent.
    pub fn aspect_ratio(&self) -> f32 {
        if self.is_empty() {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

/// The value an attachment is cleared to when a render pass begins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClearValue {
    /// A color attachment clear value (RGBA).
    Color([f32; 4]),
    /// A depth attachment clear value.
    Depth(f32),
}

/// Dynamic depth-bias parameters set during the shadow pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthBias {
    /// Constant depth value added to each fragment.
    pub constant: f32,
    /// Maximum (or minimum) depth bias of a fragment.
    pub clamp: f32,
    /// Factor applied to the fragment's slope.
    pub slope: f32,
}

/// The two render passes the renderer records each frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderPassKind {
    /// Depth-only pass into the off-screen shadow map.
    Shadow,
    /// Multisampled color pass resolved into the acquired presentable image.
    Main,
}

/// Side length of the square off-screen shadow depth target.
pub const SHADOW_MAP_SIZE: u32 = 2048;

/// Depth bias used while rendering the shadow map.
pub const SHADOW_DEPTH_BIAS: DepthBias = DepthBias {
    constant: 1.25,
    clamp: 0.0,
    slope: 1.75,
};

/// Background color of the main pass.
pub const CLEAR_COLOR: [f32; 4] = [161.0 / 255.0, 209.0 / 255.0, 72.0 / 255.0, 1.0];

/// Depth clear value for every depth attachment.
pub const CLEAR_DEPTH: f32 = 1.0;

/// Vertical field of view of the scene camera, in degrees.
pub const CAMERA_FOV_DEGREES: f32 = 45.0;
/// Near clipping plane distance.
pub const Z_NEAR: f32 = 0.1;
/// Far clipping plane distance.
pub const Z_FAR: f32 = 1000.0;

/// Uniform-buffer descriptors reserved in the descriptor pool.
pub const POOL_UNIFORM_DESCRIPTORS: u32 = 150;
/// Combined image sampler descriptors reserved in the descriptor pool.
pub const POOL_SAMPLER_DESCRIPTORS: u32 = 150;
/// Maximum number of descriptor sets allocated from the pool.
pub const POOL_MAX_SETS: u32 = 90;

/// Clear values of the main pass, indexed by attachment: resolve target, MSAA depth, MSAA color.
pub const MAIN_PASS_CLEAR_VALUES: [ClearValue; 3] = [
    ClearValue::Color(CLEAR_COLOR),
    ClearValue::Depth(CLEAR_DEPTH),
    ClearValue::Color(CLEAR_COLOR),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extent_aspect_ratio() {
        assert_eq!(Extent2D::new(1280, 720).aspect_ratio(), 1280.0 / 720.0);
        assert_eq!(Extent2D::new(0, 720).aspect_ratio(), 1.0);
        assert!(Extent2D::new(0, 720).is_empty());
    }

    #[test]
    fn test_main_pass_clear_order() {
        assert!(matches!(MAIN_PASS_CLEAR_VALUES[1], ClearValue::Depth(d) if d == 1.0));
        assert_eq!(MAIN_PASS_CLEAR_VALUES[0], MAIN_PASS_CLEAR_VALUES[2]);
    }
}
