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

//! [`GraphicsDevice`] for the Vulkan renderer.

use super::conversions::IntoVk;
use super::image::{create_cubemap, create_texture};
use super::memory::create_device_local_buffer;
use super::renderer::{TextureSlot, VulkanRenderer};
use super::uniforms::{record_uniform_copy, submit_copy, UniformBlock};
use ash::vk;
use umbra_core::renderer::api::flags::BufferUsage;
use umbra_core::renderer::api::ids::{
    BufferId, CopyCommandId, DescriptorSetId, TextureId, UniformBlockId,
};
use umbra_core::renderer::api::keys::{BindingKind, DescriptorSetKey, SetLayoutKey};
use umbra_core::renderer::api::vertex::Vertex;
use umbra_core::renderer::error::{ResourceError, ResourceKind};
use umbra_core::renderer::traits::{DescriptorResource, DescriptorWrite, GraphicsDevice};
use umbra_core::scene::texture::{CubemapData, TextureData};

fn unknown(kind: ResourceKind, index: usize) -> ResourceError {
    ResourceError::UnknownHandle { kind, index }
}

/// The resolved target of one descriptor write.
enum DescriptorInfo {
    Buffer([vk::DescriptorBufferInfo; 1]),
    Image([vk::DescriptorImageInfo; 1]),
}

impl DescriptorInfo {
    fn kind(&self) -> BindingKind {
        match self {
            DescriptorInfo::Buffer(_) => BindingKind::UniformBuffer,
            DescriptorInfo::Image(_) => BindingKind::CombinedImageSampler,
        }
    }
}

impl VulkanRenderer {
    fn upload_buffer(&mut self, bytes: &[u8], usage: BufferUsage) -> Result<BufferId, ResourceError> {
        if bytes.is_empty() {
            return Err(ResourceError::Backend {
                kind: ResourceKind::Buffer,
                params: format!("size=0 usage={usage:?}"),
                code: "empty upload".to_string(),
            });
        }
        let buffer = create_device_local_buffer(&self.ctx, bytes, usage)?;
        self.buffers.push(buffer);
        Ok(BufferId(self.buffers.len() - 1))
    }

    fn uniform_block_mut(&mut self, id: UniformBlockId) -> Result<&mut UniformBlock, ResourceError> {
        self.uniform_blocks
            .get_mut(id.0)
            .ok_or(unknown(ResourceKind::UniformBlock, id.0))
    }

    fn resolve_descriptor(&self, resource: DescriptorResource) -> Result<DescriptorInfo, ResourceError> {
        match resource {
            DescriptorResource::Uniform(id) => self
                .uniform_blocks
                .get(id.0)
                .map(|block| DescriptorInfo::Buffer([block.descriptor()]))
                .ok_or(unknown(ResourceKind::UniformBlock, id.0)),
            DescriptorResource::Texture(id) => self
                .textures
                .get(id.0)
                .map(|slot| DescriptorInfo::Image([slot.texture.descriptor()]))
                .ok_or(unknown(ResourceKind::Texture, id.0)),
            DescriptorResource::ShadowMap => self
                .shadow
                .as_ref()
                .map(|shadow| DescriptorInfo::Image([shadow.descriptor()]))
                .ok_or(unknown(ResourceKind::Image, 0)),
        }
    }
}

impl GraphicsDevice for VulkanRenderer {
    fn create_vertex_buffer(&mut self, vertices: &[Vertex]) -> Result<BufferId, ResourceError> {
        self.upload_buffer(bytemuck::cast_slice(vertices), BufferUsage::VERTEX)
    }

    fn create_index_buffer(&mut self, indices: &[u16]) -> Result<BufferId, ResourceError> {
        self.upload_buffer(bytemuck::cast_slice(indices), BufferUsage::INDEX)
    }

    fn create_texture(&mut self, data: &TextureData) -> Result<TextureId, ResourceError> {
        let texture = create_texture(&self.ctx, data)?;
        self.textures.push(TextureSlot {
            texture,
            cubemap: false,
        });
        Ok(TextureId(self.textures.len() - 1))
    }

    fn create_cubemap(&mut self, data: &CubemapData) -> Result<TextureId, ResourceError> {
        let texture = create_cubemap(&self.ctx, data)?;
        self.textures.push(TextureSlot {
            texture,
            cubemap: true,
        });
        Ok(TextureId(self.textures.len() - 1))
    }

    fn create_uniform_block(&mut self, size: u64) -> Result<UniformBlockId, ResourceError> {
        let block = UniformBlock::new(&self.ctx, size)?;
        self.uniform_blocks.push(block);
        Ok(UniformBlockId(self.uniform_blocks.len() - 1))
    }

    fn write_uniform_block(
        &mut self,
        block: UniformBlockId,
        bytes: &[u8],
    ) -> Result<(), ResourceError> {
        self.uniform_block_mut(block)?.write(bytes)
    }

    fn record_uniform_copy(
        &mut self,
        blocks: &[UniformBlockId],
    ) -> Result<CopyCommandId, ResourceError> {
        let resolved = blocks
            .iter()
            .map(|id| {
                self.uniform_blocks
                    .get(id.0)
                    .ok_or(unknown(ResourceKind::UniformBlock, id.0))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let cmd = record_uniform_copy(&self.ctx, resolved)?;
        self.copy_commands.push(cmd);
        log::debug!("Recorded a copy of {} uniform blocks.", blocks.len());
        Ok(CopyCommandId(self.copy_commands.len() - 1))
    }

    fn submit_copy(&mut self, copy: CopyCommandId) -> Result<(), ResourceError> {
        let cmd = *self
            .copy_commands
            .get(copy.0)
            .ok_or(unknown(ResourceKind::CommandBuffer, copy.0))?;
        submit_copy(&self.ctx, cmd)
    }

    fn allocate_descriptor_set(
        &mut self,
        layout: SetLayoutKey,
    ) -> Result<DescriptorSetId, ResourceError> {
        let set = self.pipelines.allocate_set(&self.ctx.device, layout)?;
        self.descriptor_sets.push(set);
        Ok(DescriptorSetId(self.descriptor_sets.len() - 1))
    }

    fn named_descriptor_set(
        &mut self,
        key: DescriptorSetKey,
    ) -> Result<DescriptorSetId, ResourceError> {
        if let Some(id) = self.named_set_ids.get(&key) {
            return Ok(*id);
        }
        let set = self.pipelines.named_set(&self.ctx.device, key)?;
        self.descriptor_sets.push(set);
        let id = DescriptorSetId(self.descriptor_sets.len() - 1);
        self.named_set_ids.insert(key, id);
        Ok(id)
    }

    fn write_descriptor_set(
        &mut self,
        set: DescriptorSetId,
        writes: &[DescriptorWrite],
    ) -> Result<(), ResourceError> {
        let target = *self
            .descriptor_sets
            .get(set.0)
            .ok_or(unknown(ResourceKind::DescriptorSet, set.0))?;
        let infos = writes
            .iter()
            .map(|w| Ok((w.binding, self.resolve_descriptor(w.resource)?)))
            .collect::<Result<Vec<_>, ResourceError>>()?;
        let vk_writes: Vec<_> = infos
            .iter()
            .map(|(binding, info)| {
                let write = vk::WriteDescriptorSet::default()
                    .dst_set(target)
                    .dst_binding(*binding)
                    .dst_array_element(0)
                    .descriptor_type(info.kind().into_vk());
                match info {
                    DescriptorInfo::Buffer(buffer) => write.buffer_info(buffer),
                    DescriptorInfo::Image(image) => write.image_info(image),
                }
            })
            .collect();
        unsafe { self.ctx.device.update_descriptor_sets(&vk_writes, &[]) };
        Ok(())
    }
}
