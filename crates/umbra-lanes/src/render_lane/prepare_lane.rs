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

//! First-frame upload of every scene resource and wiring of the descriptor sets.

use super::uniform_lane::{prepare_node_uniforms, SceneUniformBlocks};
use umbra_core::renderer::api::ids::{DescriptorSetId, TextureId};
use umbra_core::renderer::api::keys::{
    light_cube_bindings, main_bindings, DescriptorSetKey, SetLayoutKey,
};
use umbra_core::renderer::traits::{DescriptorResource, DescriptorWrite, GraphicsDevice};
use umbra_core::renderer::ResourceError;
use umbra_core::scene::{Material, Mesh, MeshBufferGpu, NodeGpu, Scene};

/// The shared descriptor sets the pass recorders bind by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneBindings {
    /// Set 0 of the shadow pass: the shadow matrix block.
    pub shadow: DescriptorSetId,
    /// The skybox camera block and cubemap.
    pub skybox: DescriptorSetId,
    /// The shadow map as sampled by the debug quad.
    pub quad_debug: DescriptorSetId,
}

/// Uploads geometry and textures, creates per-node uniform blocks and writes every
/// descriptor set the passes bind.
///
/// Runs once before the first frame. Resources that already have device state are kept,
/// so calling it again allocates nothing new.
///
/// ## Errors
///
/// Returns the first [`ResourceError`] the device reports; nothing is rolled back.
pub fn prepare_scene_buffers<D>(
    device: &mut D,
    scene: &mut Scene,
    blocks: &SceneUniformBlocks,
) -> Result<SceneBindings, ResourceError>
where
    D: GraphicsDevice + ?Sized,
{
    let skybox_map = match scene.skybox.gpu {
        Some(id) => id,
        None => {
            let id = device.create_cubemap(&scene.skybox.cubemap)?;
            scene.skybox.gpu = Some(id);
            id
        }
    };

    for index in 0..scene.nodes.len() {
        let gpu = ensure_node_uniforms(device, &mut scene.nodes[index].gpu)?;
        let mesh_id = scene.nodes[index].mesh();
        let Some(mesh) = scene.mesh_mut(mesh_id) else {
            log::warn!("Node {index} refers to a missing mesh; skipping");
            continue;
        };
        upload_mesh_buffers(device, mesh)?;
        let textures = upload_material_textures(device, &mut mesh.material)?;
        let writes = main_set_writes(blocks, gpu, textures, skybox_map);
        for buffer in &mut mesh.buffers {
            let set = buffer.descriptor_set_or_try_insert_with(|| {
                device.allocate_descriptor_set(SetLayoutKey::Main)
            })?;
            device.write_descriptor_set(set, &writes)?;
        }
    }

    for index in 0..scene.light_cubes().len() {
        let gpu = ensure_node_uniforms(device, &mut scene.light_cubes_mut()[index].gpu)?;
        let mesh_id = scene.light_cubes()[index].mesh();
        let Some(mesh) = scene.mesh_mut(mesh_id) else {
            continue;
        };
        upload_mesh_buffers(device, mesh)?;
        let writes = [
            DescriptorWrite::uniform(light_cube_bindings::SCENE, blocks.scene),
            DescriptorWrite::uniform(light_cube_bindings::NODE, gpu.model_block),
            DescriptorWrite::uniform(light_cube_bindings::LIGHT_PARAMS, blocks.light_params),
            DescriptorWrite::uniform(light_cube_bindings::MATERIAL, gpu.material_block),
        ];
        for buffer in &mut mesh.buffers {
            let set = buffer.descriptor_set_or_try_insert_with(|| {
                device.allocate_descriptor_set(SetLayoutKey::LightCube)
            })?;
            device.write_descriptor_set(set, &writes)?;
        }
    }

    for mesh_id in [scene.skybox.node.mesh(), scene.shadow_debug_quad.mesh()] {
        if let Some(mesh) = scene.mesh_mut(mesh_id) {
            upload_mesh_buffers(device, mesh)?;
        }
    }

    let shadow = device.named_descriptor_set(DescriptorSetKey::Shadow)?;
    device.write_descriptor_set(shadow, &[DescriptorWrite::uniform(0, blocks.shadow)])?;

    let skybox = device.named_descriptor_set(DescriptorSetKey::Skybox)?;
    device.write_descriptor_set(
        skybox,
        &[
            DescriptorWrite::uniform(0, blocks.skybox),
            DescriptorWrite::texture(1, skybox_map),
        ],
    )?;

    let quad_debug = device.named_descriptor_set(DescriptorSetKey::QuadDebug)?;
    device.write_descriptor_set(
        quad_debug,
        &[DescriptorWrite {
            binding: 0,
            resource: DescriptorResource::ShadowMap,
        }],
    )?;

    log::info!(
        "Prepared {} nodes over {} meshes",
        scene.nodes.len(),
        scene.meshes().len()
    );
    Ok(SceneBindings {
        shadow,
        skybox,
        quad_debug,
    })
}

fn ensure_node_uniforms<D>(device: &mut D, gpu: &mut Option<NodeGpu>) -> Result<NodeGpu, ResourceError>
where
    D: GraphicsDevice + ?Sized,
{
    match *gpu {
        Some(existing) => Ok(existing),
        None => {
            let created = prepare_node_uniforms(device)?;
            *gpu = Some(created);
            Ok(created)
        }
    }
}

/// Uploads the vertex and index buffers of every part that has none yet.
pub fn upload_mesh_buffers<D>(device: &mut D, mesh: &mut Mesh) -> Result<(), ResourceError>
where
    D: GraphicsDevice + ?Sized,
{
    for buffer in mesh.buffers.iter_mut().filter(|b| b.gpu.is_none()) {
        let vertex = device.create_vertex_buffer(buffer.vertices())?;
        let index = device.create_index_buffer(buffer.indices())?;
        buffer.gpu = Some(MeshBufferGpu { vertex, index });
    }
    log::debug!("Uploaded mesh '{}'", mesh.name);
    Ok(())
}

/// Uploads the five material textures that have no device copy yet and returns all five
/// ids in binding order.
fn upload_material_textures<D>(
    device: &mut D,
    material: &mut Material,
) -> Result<[TextureId; 5], ResourceError>
where
    D: GraphicsDevice + ?Sized,
{
    let mut ids = [TextureId(0); 5];
    for (slot, texture) in ids.iter_mut().zip(material.textures_mut()) {
        *slot = match texture.gpu {
            Some(id) => id,
            None => {
                let id = device.create_texture(&texture.data)?;
                texture.gpu = Some(id);
                id
            }
        };
    }
    Ok(ids)
}

fn main_set_writes(
    blocks: &SceneUniformBlocks,
    node: NodeGpu,
    [albedo, normal, specular, metallic, roughness]: [TextureId; 5],
    skybox: TextureId,
) -> [DescriptorWrite; 13] {
    use main_bindings as b;
    [
        DescriptorWrite::uniform(b::SCENE, blocks.scene),
        DescriptorWrite::uniform(b::NODE, node.model_block),
        DescriptorWrite::uniform(b::MATERIAL, node.material_block),
        DescriptorWrite::uniform(b::LIGHTS, blocks.lights),
        DescriptorWrite::uniform(b::AMBIENT, blocks.ambient),
        DescriptorWrite::uniform(b::LIGHT_PARAMS, blocks.light_params),
        DescriptorWrite::texture(b::ALBEDO, albedo),
        DescriptorWrite::texture(b::NORMAL, normal),
        DescriptorWrite::texture(b::SPECULAR, specular),
        DescriptorWrite::texture(b::METALLIC, metallic),
        DescriptorWrite::texture(b::ROUGHNESS, roughness),
        DescriptorWrite {
            binding: b::SHADOW_MAP,
            resource: DescriptorResource::ShadowMap,
        },
        DescriptorWrite::texture(b::SKYBOX, skybox),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render_lane::prepare_scene_uniforms;
    use umbra_core::math::Vec3;
    use umbra_core::renderer::testing::{Call, RecordingBackend};

    fn prepared() -> (RecordingBackend, Scene, SceneBindings) {
        let mut device = RecordingBackend::default();
        let mut scene = Scene::default();
        scene.add_node(Mesh::default_cube(), Vec3::ZERO, Vec3::ONE, Vec3::ZERO);
        let blocks = prepare_scene_uniforms(&mut device).unwrap();
        let bindings = prepare_scene_buffers(&mut device, &mut scene, &blocks).unwrap();
        (device, scene, bindings)
    }

    #[test]
    fn test_every_drawable_buffer_gets_one_set() {
        let (device, scene, _) = prepared();
        assert_eq!(
            device.count(|c| matches!(c, Call::AllocateDescriptorSet { layout: SetLayoutKey::Main, .. })),
            1
        );
        assert_eq!(
            device.count(|c| matches!(c, Call::AllocateDescriptorSet { layout: SetLayoutKey::LightCube, .. })),
            9
        );
        assert!(scene.drawable_nodes().all(|n| n.gpu.is_some()));
        let user_mesh = scene.mesh(scene.nodes[0].mesh()).unwrap();
        assert!(user_mesh.buffers[0].descriptor_set().is_some());
        assert!(user_mesh.material.textures().iter().all(|t| t.gpu.is_some()));
    }

    #[test]
    fn test_main_set_has_thirteen_bindings_in_order() {
        let (device, scene, _) = prepared();
        let set = scene.mesh(scene.nodes[0].mesh()).unwrap().buffers[0]
            .descriptor_set()
            .unwrap();
        let writes = device
            .calls
            .iter()
            .find_map(|c| match c {
                Call::WriteDescriptorSet { set: s, writes } if *s == set => Some(writes.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(writes.len(), 13);
        assert!(writes.iter().enumerate().all(|(i, w)| w.binding == i as u32));
        assert_eq!(writes[11].resource, DescriptorResource::ShadowMap);
        assert_eq!(
            writes[12].resource,
            DescriptorResource::Texture(scene.skybox.gpu.unwrap())
        );
    }

    #[test]
    fn test_preparing_twice_allocates_nothing_new() {
        let (mut device, mut scene, first) = prepared();
        let blocks = prepare_scene_uniforms(&mut device).unwrap();
        let allocations = |d: &RecordingBackend| {
            d.count(|c| {
                matches!(
                    c,
                    Call::AllocateDescriptorSet { .. }
                        | Call::CreateVertexBuffer { .. }
                        | Call::CreateTexture { .. }
                        | Call::CreateCubemap { .. }
                )
            })
        };
        let before = allocations(&device);
        let second = prepare_scene_buffers(&mut device, &mut scene, &blocks).unwrap();
        assert_eq!(allocations(&device), before);
        assert_eq!(first, second);
    }
}
