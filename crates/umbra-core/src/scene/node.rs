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

//! Positioned mesh instances.

use super::mesh::MeshId;
use crate::math::{degrees_to_radians, Mat4, Vec3};
use crate::renderer::api::ids::{CopyCommandId, UniformBlockId};

/// Largest per-axis scale difference still treated as a uniform scale (exclusive).
pub const HOMOTHETY_TOLERANCE: f32 = 0.005;

/// Returns `true` when all three components differ pairwise by strictly less than
/// [`HOMOTHETY_TOLERANCE`].
///
/// # Examples
///
/// ```
/// use umbra_core::math::Vec3;
/// use umbra_core::scene::is_scale_homothety;
///
/// assert!(is_scale_homothety(Vec3::new(2.0, 2.004, 2.0)));
/// assert!(!is_scale_homothety(Vec3::new(1.0, 1.0, 3.0)));
/// ```
pub fn is_scale_homothety(scale: Vec3) -> bool {
    (scale.x - scale.y).abs() < HOMOTHETY_TOLERANCE
        && (scale.y - scale.z).abs() < HOMOTHETY_TOLERANCE
        && (scale.x - scale.z).abs() < HOMOTHETY_TOLERANCE
}

/// The device state of a node: its two uniform blocks and the command that copies them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeGpu {
    /// Model matrix block.
    pub model_block: UniformBlockId,
    /// Per-node copy of the mesh's material parameters.
    pub material_block: UniformBlockId,
    /// Copies both blocks from staging to device memory. Recorded once.
    pub copy: CopyCommandId,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Snapshot {
    position: Vec3,
    rotation: Vec3,
    scale: Vec3,
    visible: bool,
}

/// An instance of a mesh placed in the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    /// World position.
    pub position: Vec3,
    /// Euler rotation in degrees.
    pub rotation: Vec3,
    /// Per-axis scale.
    pub scale: Vec3,
    /// Whether the node is drawn.
    pub visible: bool,
    /// Whether the node is drawn by the transparent passes instead of the opaque one.
    pub transparent: bool,
    mesh: MeshId,
    initial: Snapshot,
    /// Device state, once prepared.
    pub gpu: Option<NodeGpu>,
}

impl SceneNode {
    /// Creates a visible, opaque node and records its initial state for [`SceneNode::reset`].
    pub fn new(mesh: MeshId, position: Vec3, rotation: Vec3, scale: Vec3) -> Self {
        let initial = Snapshot {
            position,
            rotation,
            scale,
            visible: true,
        };
        Self {
            position,
            rotation,
            scale,
            visible: true,
            transparent: false,
            mesh,
            initial,
            gpu: None,
        }
    }

    /// A node at the origin with no rotation and unit scale.
    pub fn at_origin(mesh: MeshId) -> Self {
        Self::new(mesh, Vec3::ZERO, Vec3::ZERO, Vec3::ONE)
    }

    /// The mesh this node draws.
    pub fn mesh(&self) -> MeshId {
        self.mesh
    }

    /// Whether the current scale is uniform.
    pub fn is_scale_homothety(&self) -> bool {
        is_scale_homothety(self.scale)
    }

    /// The model matrix: `T(position) * Rz * Rx * Ry * S(scale)`.
    pub fn transformation(&self) -> Mat4 {
        Mat4::from_translation(self.position)
            * Mat4::from_rotation_z(degrees_to_radians(self.rotation.z))
            * Mat4::from_rotation_x(degrees_to_radians(self.rotation.x))
            * Mat4::from_rotation_y(degrees_to_radians(self.rotation.y))
            * Mat4::from_scale(self.scale)
    }

    /// Restores the initial position.
    pub fn reset_position(&mut self) {
        self.position = self.initial.position;
    }

    /// Restores the initial rotation.
    pub fn reset_rotation(&mut self) {
        self.rotation = self.initial.rotation;
    }

    /// Restores the initial scale.
    pub fn reset_scale(&mut self) {
        self.scale = self.initial.scale;
    }

    /// Restores the initial transform and visibility.
    pub fn reset(&mut self) {
        self.reset_position();
        self.reset_rotation();
        self.reset_scale();
        self.visible = self.initial.visible;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec4;
    use approx::assert_relative_eq;

    fn mat4_approx_eq(a: &Mat4, b: &Mat4) -> bool {
        a.to_cols_array_2d()
            .iter()
            .flatten()
            .zip(b.to_cols_array_2d().iter().flatten())
            .all(|(x, y)| (x - y).abs() < 1e-5)
    }

    #[test]
    fn test_homothety_boundary_is_strict() {
        assert!(is_scale_homothety(Vec3::new(1.0, 1.0049, 1.0)));
        assert!(!is_scale_homothety(Vec3::new(1.0, 1.0, 1.25)));
        // A difference of exactly the tolerance is not uniform.
        assert!(!is_scale_homothety(Vec3::new(0.0, HOMOTHETY_TOLERANCE, 0.0)));
        assert!(!is_scale_homothety(Vec3::new(0.0, 0.0, -HOMOTHETY_TOLERANCE)));
    }

    #[test]
    fn test_transformation_recovers_scale_without_rotation() {
        let scale = Vec3::new(1.5, 2.0, 0.25);
        let node = SceneNode::new(MeshId(0), Vec3::new(3.0, -1.0, 2.0), Vec3::ZERO, scale);
        let m = node.transformation();
        assert_eq!(m.column_scale(), scale);
        assert_eq!(m.translation(), Vec3::new(3.0, -1.0, 2.0));
    }

    #[test]
    fn test_transformation_composes_in_fixed_order() {
        let node = SceneNode::new(
            MeshId(0),
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(30.0, 45.0, 60.0),
            Vec3::new(2.0, 1.0, 0.5),
        );
        let expected = Mat4::from_translation(node.position)
            * Mat4::from_rotation_z(60f32.to_radians())
            * Mat4::from_rotation_x(30f32.to_radians())
            * Mat4::from_rotation_y(45f32.to_radians())
            * Mat4::from_scale(node.scale);
        assert!(mat4_approx_eq(&node.transformation(), &expected));

        let swapped = Mat4::from_translation(node.position)
            * Mat4::from_rotation_y(45f32.to_radians())
            * Mat4::from_rotation_x(30f32.to_radians())
            * Mat4::from_rotation_z(60f32.to_radians())
            * Mat4::from_scale(node.scale);
        assert!(!mat4_approx_eq(&node.transformation(), &swapped));
    }

    #[test]
    fn test_rotation_applies_after_scale() {
        let node = SceneNode::new(
            MeshId(0),
            Vec3::ZERO,
            Vec3::new(0.0, 0.0, 90.0),
            Vec3::new(2.0, 1.0, 1.0),
        );
        // Local +X is scaled by 2, then rotated onto +Y.
        let p = node.transformation() * Vec4::new(1.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(p.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(p.y, 2.0, epsilon = 1e-5);
    }

    #[test]
    fn test_reset_restores_snapshot() {
        let mut node = SceneNode::new(MeshId(2), Vec3::Y, Vec3::X, Vec3::ONE);
        node.position = Vec3::new(9.0, 9.0, 9.0);
        node.rotation = Vec3::new(10.0, 0.0, 0.0);
        node.scale = Vec3::splat(3.0);
        node.visible = false;

        node.reset_scale();
        assert_eq!(node.scale, Vec3::ONE);
        assert_eq!(node.position, Vec3::new(9.0, 9.0, 9.0));

        node.reset();
        assert_eq!(node.position, Vec3::Y);
        assert_eq!(node.rotation, Vec3::X);
        assert!(node.visible);
        assert_eq!(node.mesh(), MeshId(2));
    }
}
