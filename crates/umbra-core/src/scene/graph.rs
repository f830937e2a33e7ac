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

//! The scene aggregate: meshes, nodes, light slots, skybox and debug quad.

use super::camera::Camera;
use super::light::{Ambient, LightParams, LightProperty, LIGHT_SLOTS};
use super::mesh::{Mesh, MeshId};
use super::node::SceneNode;
use super::texture::CubemapData;
use crate::math::Vec3;
use crate::renderer::api::ids::TextureId;

/// Uniform scale of the light visualization cubes.
pub const LIGHT_CUBE_SCALE: f32 = 0.8;

/// The skybox: a cube drawn around the camera and the cubemap it samples.
#[derive(Debug, Clone)]
pub struct Skybox {
    /// The cube node.
    pub node: SceneNode,
    /// The six faces.
    pub cubemap: CubemapData,
    /// The device cubemap, once uploaded.
    pub gpu: Option<TextureId>,
}

/// Everything the renderer draws.
///
/// The scene owns every mesh in an arena; nodes refer to them by [`MeshId`]. Each node added
/// through [`Scene::add_node`] gets its own mesh, because a mesh buffer caches a single
/// descriptor set that points at its node's uniform blocks.
#[derive(Debug, Clone)]
pub struct Scene {
    meshes: Vec<Mesh>,
    /// User nodes, in insertion order.
    pub nodes: Vec<SceneNode>,
    /// The light slots. Slot `i` always drives light cube `i`.
    pub lights: [LightProperty; LIGHT_SLOTS],
    light_cubes: [SceneNode; LIGHT_SLOTS],
    /// The skybox.
    pub skybox: Skybox,
    /// The quad that shows the shadow map when debugging.
    pub shadow_debug_quad: SceneNode,
    /// Ambient lighting.
    pub ambient: Ambient,
    /// Global lighting parameters.
    pub light_params: LightParams,
    /// The camera.
    pub camera: Camera,
}

impl Scene {
    /// Creates an empty scene with default lights and the given skybox faces.
    pub fn new(skybox: CubemapData) -> Self {
        let mut meshes = Vec::with_capacity(LIGHT_SLOTS + 2);
        let mut push = |mesh: Mesh| {
            meshes.push(mesh);
            MeshId(meshes.len() - 1)
        };

        let skybox_node = SceneNode::at_origin(push(Mesh::default_cube()));
        let quad_node = SceneNode::at_origin(push(Mesh::default_quad()));
        let light_cubes = std::array::from_fn(|_| {
            SceneNode::new(
                push(Mesh::default_cube()),
                Vec3::ZERO,
                Vec3::ZERO,
                Vec3::splat(LIGHT_CUBE_SCALE),
            )
        });

        Self {
            meshes,
            nodes: Vec::new(),
            lights: [LightProperty::default(); LIGHT_SLOTS],
            light_cubes,
            skybox: Skybox {
                node: skybox_node,
                cubemap: skybox,
                gpu: None,
            },
            shadow_debug_quad: quad_node,
            ambient: Ambient::default(),
            light_params: LightParams::default(),
            camera: Camera::default(),
        }
    }

    /// Adds `mesh` to the arena and places a visible, opaque node drawing it.
    pub fn add_node(
        &mut self,
        mesh: Mesh,
        position: Vec3,
        scale: Vec3,
        rotation: Vec3,
    ) -> &mut SceneNode {
        self.meshes.push(mesh);
        let id = MeshId(self.meshes.len() - 1);
        self.nodes.push(SceneNode::new(id, position, rotation, scale));
        let last = self.nodes.len() - 1;
        &mut self.nodes[last]
    }

    /// Looks up a mesh.
    pub fn mesh(&self, id: MeshId) -> Option<&Mesh> {
        self.meshes.get(id.0)
    }

    /// Looks up a mesh mutably.
    pub fn mesh_mut(&mut self, id: MeshId) -> Option<&mut Mesh> {
        self.meshes.get_mut(id.0)
    }

    /// Every mesh in the arena.
    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    /// Every mesh in the arena, mutably. The arena itself cannot grow through this.
    pub fn meshes_mut(&mut self) -> &mut [Mesh] {
        &mut self.meshes
    }

    /// The light visualization cubes, index-aligned with [`Scene::lights`].
    pub fn light_cubes(&self) -> &[SceneNode; LIGHT_SLOTS] {
        &self.light_cubes
    }

    /// The light visualization cubes, mutably.
    pub fn light_cubes_mut(&mut self) -> &mut [SceneNode; LIGHT_SLOTS] {
        &mut self.light_cubes
    }

    /// Moves cube `i` to light `i` and paints it with the light's color.
    pub fn update_light_cubes(&mut self) {
        for (cube, slot) in self.light_cubes.iter_mut().zip(self.lights.iter()) {
            cube.position = slot.light.position.truncate();
            if let Some(mesh) = self.meshes.get_mut(cube.mesh().0) {
                mesh.material.params.color = slot.light.color;
            }
        }
    }

    /// Every node the renderer prepares uniform blocks for: user nodes, then light cubes.
    pub fn drawable_nodes(&self) -> impl Iterator<Item = &SceneNode> {
        self.nodes.iter().chain(self.light_cubes.iter())
    }

    /// Every node with uniform blocks, mutably: user nodes, then light cubes.
    pub fn drawable_nodes_mut(&mut self) -> impl Iterator<Item = &mut SceneNode> {
        self.nodes.iter_mut().chain(self.light_cubes.iter_mut())
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(CubemapData::solid([0, 0, 0, 255]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec4;
    use crate::scene::light::LightKind;

    #[test]
    fn test_new_scene_has_fixed_slots() {
        let scene = Scene::default();
        assert_eq!(scene.lights.len(), 9);
        assert_eq!(scene.light_cubes().len(), 9);
        assert!(scene.nodes.is_empty());
        // Skybox, quad and one mesh per light cube.
        assert_eq!(scene.meshes().len(), 11);
        assert!(scene
            .light_cubes()
            .iter()
            .all(|c| c.scale == Vec3::splat(LIGHT_CUBE_SCALE)));
    }

    #[test]
    fn test_add_node_gives_each_node_its_own_mesh() {
        let mut scene = Scene::default();
        let a = scene
            .add_node(Mesh::default_cube(), Vec3::ZERO, Vec3::ONE, Vec3::ZERO)
            .mesh();
        let b = scene
            .add_node(Mesh::default_cube(), Vec3::X, Vec3::ONE, Vec3::ZERO)
            .mesh();
        assert_ne!(a, b);
        assert_eq!(scene.nodes[1].position, Vec3::X);
        assert!(scene.mesh(b).is_some());
    }

    #[test]
    fn test_update_light_cubes_follows_slot_index() {
        let mut scene = Scene::default();
        scene.lights[3].change_kind(LightKind::Spot);
        scene.lights[3].light.position = Vec4::new(1.0, 2.0, 3.0, 1.0);
        scene.lights[3].light.color = Vec4::new(0.1, 0.2, 0.3, 1.0);
        scene.update_light_cubes();

        let cube = &scene.light_cubes()[3];
        assert_eq!(cube.position, Vec3::new(1.0, 2.0, 3.0));
        let color = scene.mesh(cube.mesh()).map(|m| m.material.params.color);
        assert_eq!(color, Some(Vec4::new(0.1, 0.2, 0.3, 1.0)));
        assert_eq!(scene.light_cubes()[2].position, Vec3::ZERO);
    }

    #[test]
    fn test_drawable_nodes_end_with_light_cubes() {
        let mut scene = Scene::default();
        scene.add_node(Mesh::default_cube(), Vec3::ZERO, Vec3::ONE, Vec3::ZERO);
        assert_eq!(scene.drawable_nodes().count(), 10);
    }
}
