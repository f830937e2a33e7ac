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

use crate::renderer::api::ids::{
    BufferId, CopyCommandId, DescriptorSetId, TextureId, UniformBlockId,
};
use crate::renderer::api::keys::{DescriptorSetKey, SetLayoutKey};
use crate::renderer::api::vertex::Vertex;
use crate::renderer::error::ResourceError;
use crate::scene::texture::{CubemapData, TextureData};
use std::fmt::Debug;

/// The resource a descriptor binding points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorResource {
    /// The device-local half of a uniform block.
    Uniform(UniformBlockId),
    /// A sampled texture or cubemap.
    Texture(TextureId),
    /// The shadow depth target, sampled through the shadow sampler.
    ShadowMap,
}

/// One write into a descriptor set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorWrite {
    /// The binding index in the set layout.
    pub binding: u32,
    /// What the binding is pointed at.
    pub resource: DescriptorResource,
}

impl DescriptorWrite {
    /// A uniform buffer binding.
    pub const fn uniform(binding: u32, block: UniformBlockId) -> Self {
        Self {
            binding,
            resource: DescriptorResource::Uniform(block),
        }
    }

    /// A combined image sampler binding.
    pub const fn texture(binding: u32, texture: TextureId) -> Self {
        Self {
            binding,
            resource: DescriptorResource::Texture(texture),
        }
    }
}

/// Creates and updates GPU resources.
///
/// Every resource is owned by the device and referenced through an opaque id. The device
/// releases everything it created when it is dropped; there is no per-resource destroy call
/// because the scene is never rebuilt mid-run.
pub trait GraphicsDevice: Debug {
    /// Uploads a vertex array into a device-local vertex buffer through a staging copy.
    ///
    /// ## Errors
    ///
    /// Returns a [`ResourceError`] if an allocation or the transfer fails.
    fn create_vertex_buffer(&mut self, vertices: &[Vertex]) -> Result<BufferId, ResourceError>;

    /// Uploads a 16-bit index array into a device-local index buffer.
    fn create_index_buffer(&mut self, indices: &[u16]) -> Result<BufferId, ResourceError>;

    /// Uploads an RGBA8 texture, generates its full mip chain and pairs it with a sampler.
    ///
    /// ## Errors
    ///
    /// Returns [`ResourceError::UnsupportedBlitFormat`] if the format cannot be blitted
    /// with linear filtering.
    fn create_texture(&mut self, data: &TextureData) -> Result<TextureId, ResourceError>;

    /// Uploads six faces into a cube-compatible image, in +X, -X, +Y, -Y, +Z, -Z order.
    fn create_cubemap(&mut self, data: &CubemapData) -> Result<TextureId, ResourceError>;

    /// Creates a uniform block: a persistently mapped staging buffer of `size` bytes and its
    /// device-local counterpart.
    fn create_uniform_block(&mut self, size: u64) -> Result<UniformBlockId, ResourceError>;

    /// Writes `bytes` at the start of a block's mapped staging memory.
    ///
    /// ## Errors
    ///
    /// Returns [`ResourceError::OutOfBounds`] if `bytes` is larger than the block.
    fn write_uniform_block(
        &mut self,
        block: UniformBlockId,
        bytes: &[u8],
    ) -> Result<(), ResourceError>;

    /// Records, once, a command buffer that copies each block's staging half into its
    /// device-local half.
    ///
    /// ## Returns
    ///
    /// A handle that [`GraphicsDevice::submit_copy`] replays without re-recording.
    fn record_uniform_copy(
        &mut self,
        blocks: &[UniformBlockId],
    ) -> Result<CopyCommandId, ResourceError>;

    /// Submits a pre-recorded copy and waits for the queue to go idle.
    fn submit_copy(&mut self, copy: CopyCommandId) -> Result<(), ResourceError>;

    /// Allocates a fresh descriptor set with the given layout from the shared pool.
    fn allocate_descriptor_set(
        &mut self,
        layout: SetLayoutKey,
    ) -> Result<DescriptorSetId, ResourceError>;

    /// Returns the shared descriptor set registered under `key`, allocating it on first use.
    fn named_descriptor_set(
        &mut self,
        key: DescriptorSetKey,
    ) -> Result<DescriptorSetId, ResourceError>;

    /// Points the bindings of `set` at the given resources.
    fn write_descriptor_set(
        &mut self,
        set: DescriptorSetId,
        writes: &[DescriptorWrite],
    ) -> Result<(), ResourceError>;
}

/// Writes a plain-old-data uniform value into a block's staging memory.
pub fn write_uniform<D, T>(device: &mut D, block: UniformBlockId, value: &T) -> Result<(), ResourceError>
where
    D: GraphicsDevice + ?Sized,
    T: bytemuck::Pod,
{
    device.write_uniform_block(block, bytemuck::bytes_of(value))
}
