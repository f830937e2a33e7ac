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

//! Per-frame CPU to GPU streaming of the uniform blocks.
//!
//! Two tiers of blocks exist. The six scene-wide blocks share one copy command recorded at
//! preparation time; each node owns a model block and a material block with its own small
//! copy command. Updating a block only rewrites its staging memory; the copies are replayed,
//! never re-recorded.

use std::mem::size_of;
use umbra_core::renderer::api::common::Extent2D;
use umbra_core::renderer::api::ids::{CopyCommandId, UniformBlockId};
use umbra_core::renderer::api::uniforms::{
    AmbientUniforms, LightParamsUniforms, LightsUniforms, MaterialUniforms, NodeUniforms,
    SceneUniforms, ShadowUniforms,
};
use umbra_core::renderer::traits::{write_uniform, GraphicsDevice};
use umbra_core::renderer::ResourceError;
use umbra_core::scene::{Camera, LightProperty, NodeGpu, Scene, SceneNode, SHADOW_LIGHT_SLOT};

/// The six scene-wide uniform blocks and the command that copies all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneUniformBlocks {
    /// Camera matrices and the shadow view-projection.
    pub scene: UniformBlockId,
    /// The nine light slots.
    pub lights: UniformBlockId,
    /// Ambient terms.
    pub ambient: UniformBlockId,
    /// BRDF, gamma and shadow toggle.
    pub light_params: UniformBlockId,
    /// The shadow caster's matrix and kind, read by the shadow pass.
    pub shadow: UniformBlockId,
    /// A copy of the scene block bound to the skybox.
    pub skybox: UniformBlockId,
    /// Copies every block above, in field order.
    pub copy: CopyCommandId,
}

/// Creates the six scene-wide blocks and records their shared copy command once.
pub fn prepare_scene_uniforms<D>(device: &mut D) -> Result<SceneUniformBlocks, ResourceError>
where
    D: GraphicsDevice + ?Sized,
{
    let scene = device.create_uniform_block(size_of::<SceneUniforms>() as u64)?;
    let lights = device.create_uniform_block(size_of::<LightsUniforms>() as u64)?;
    let ambient = device.create_uniform_block(size_of::<AmbientUniforms>() as u64)?;
    let light_params = device.create_uniform_block(size_of::<LightParamsUniforms>() as u64)?;
    let shadow = device.create_uniform_block(size_of::<ShadowUniforms>() as u64)?;
    let skybox = device.create_uniform_block(size_of::<SceneUniforms>() as u64)?;
    let copy =
        device.record_uniform_copy(&[scene, lights, ambient, light_params, shadow, skybox])?;
    log::debug!("Prepared scene uniform blocks");
    Ok(SceneUniformBlocks {
        scene,
        lights,
        ambient,
        light_params,
        shadow,
        skybox,
        copy,
    })
}

/// Creates a node's model and material blocks and records the copy command they share.
pub fn prepare_node_uniforms<D>(device: &mut D) -> Result<NodeGpu, ResourceError>
where
    D: GraphicsDevice + ?Sized,
{
    let model_block = device.create_uniform_block(size_of::<NodeUniforms>() as u64)?;
    let material_block = device.create_uniform_block(size_of::<MaterialUniforms>() as u64)?;
    let copy = device.record_uniform_copy(&[model_block, material_block])?;
    Ok(NodeGpu {
        model_block,
        material_block,
        copy,
    })
}

/// Computes the camera block for a framebuffer of the given size.
pub fn scene_uniforms(camera: &Camera, extent: Extent2D, shadow_caster: &LightProperty) -> SceneUniforms {
    SceneUniforms {
        view: camera.view(),
        proj: Camera::projection(extent),
        depth_vp: shadow_caster.shadow_view_projection(),
    }
}

/// Writes the shadow block from the slot-0 light.
pub fn update_shadow_uniforms<D>(
    device: &mut D,
    blocks: &SceneUniformBlocks,
    scene: &Scene,
) -> Result<(), ResourceError>
where
    D: GraphicsDevice + ?Sized,
{
    let block = ShadowUniforms::from(&scene.lights[SHADOW_LIGHT_SLOT]);
    write_uniform(device, blocks.shadow, &block)
}

/// Writes the camera, light, ambient, light-parameter and skybox blocks.
pub fn update_scene_uniforms<D>(
    device: &mut D,
    blocks: &SceneUniformBlocks,
    scene: &Scene,
    extent: Extent2D,
) -> Result<(), ResourceError>
where
    D: GraphicsDevice + ?Sized,
{
    let camera = scene_uniforms(&scene.camera, extent, &scene.lights[SHADOW_LIGHT_SLOT]);
    write_uniform(device, blocks.scene, &camera)?;
    write_uniform(device, blocks.lights, &LightsUniforms::from(&scene.lights))?;
    write_uniform(device, blocks.ambient, &AmbientUniforms::from(&scene.ambient))?;
    write_uniform(
        device,
        blocks.light_params,
        &LightParamsUniforms::from(&scene.light_params),
    )?;
    write_uniform(device, blocks.skybox, &camera)
}

/// Replays the shared scene copy.
pub fn flush<D>(device: &mut D, blocks: &SceneUniformBlocks) -> Result<(), ResourceError>
where
    D: GraphicsDevice + ?Sized,
{
    device.submit_copy(blocks.copy)
}

/// Writes one node's model matrix and its mesh's live material parameters, then replays the
/// node's copy command.
fn update_node<D>(device: &mut D, scene: &Scene, node: &SceneNode) -> Result<(), ResourceError>
where
    D: GraphicsDevice + ?Sized,
{
    let Some(gpu) = node.gpu else {
        return Ok(());
    };
    let model = NodeUniforms {
        model: node.transformation(),
    };
    write_uniform(device, gpu.model_block, &model)?;
    if let Some(mesh) = scene.mesh(node.mesh()) {
        write_uniform(
            device,
            gpu.material_block,
            &MaterialUniforms::from(&mesh.material.params),
        )?;
    }
    device.submit_copy(gpu.copy)
}

/// Streams every user node, moves the light cubes onto their lights, then streams the cubes.
pub fn update_node_uniforms<D>(device: &mut D, scene: &mut Scene) -> Result<(), ResourceError>
where
    D: GraphicsDevice + ?Sized,
{
    for node in &scene.nodes {
        update_node(device, scene, node)?;
    }
    scene.update_light_cubes();
    for cube in scene.light_cubes() {
        update_node(device, scene, cube)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use umbra_core::math::Vec3;
    use umbra_core::renderer::testing::{Call, RecordingBackend};
    use umbra_core::scene::Mesh;

    #[test]
    fn test_scene_copy_is_recorded_once_and_replayed() {
        let mut device = RecordingBackend::default();
        let blocks = prepare_scene_uniforms(&mut device).unwrap();
        let scene = Scene::default();
        let extent = device.extent;
        for _ in 0..3 {
            update_shadow_uniforms(&mut device, &blocks, &scene).unwrap();
            update_scene_uniforms(&mut device, &blocks, &scene, extent).unwrap();
            flush(&mut device, &blocks).unwrap();
        }
        assert_eq!(
            device.count(|c| matches!(c, Call::RecordUniformCopy { .. })),
            1
        );
        assert_eq!(
            device.count(|c| *c == Call::SubmitCopy(blocks.copy)),
            3
        );
    }

    #[test]
    fn test_skybox_block_mirrors_scene_block() {
        let mut device = RecordingBackend::default();
        let blocks = prepare_scene_uniforms(&mut device).unwrap();
        let scene = Scene::default();
        let extent = device.extent;
        update_scene_uniforms(&mut device, &blocks, &scene, extent).unwrap();
        assert_eq!(device.last_write(blocks.scene), device.last_write(blocks.skybox));
        assert!(device.last_write(blocks.scene).is_some());
    }

    #[test]
    fn test_node_material_follows_live_mesh_material() {
        let mut device = RecordingBackend::default();
        let mut scene = Scene::default();
        scene.add_node(Mesh::default_cube(), Vec3::ZERO, Vec3::ONE, Vec3::ZERO);
        let gpu = prepare_node_uniforms(&mut device).unwrap();
        scene.nodes[0].gpu = Some(gpu);

        let mesh = scene.nodes[0].mesh();
        if let Some(m) = scene.mesh_mut(mesh) {
            m.material.params.roughness = 0.9;
        }
        update_node_uniforms(&mut device, &mut scene).unwrap();

        let bytes = device.last_write(gpu.material_block).unwrap();
        let written: MaterialUniforms = bytemuck::pod_read_unaligned(bytes);
        assert_eq!(written.roughness, 0.9);
        assert_eq!(device.count(|c| *c == Call::SubmitCopy(gpu.copy)), 1);
    }
}
