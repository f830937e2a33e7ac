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

//! A GPU-free [`RenderBackend`] that records every call it receives.
//!
//! Enabled for this crate's tests and, through the `testing` feature, for the tests of the
//! crates that drive the traits.

use super::api::common::{ClearValue, DepthBias, Extent2D, RenderPassKind};
use super::api::ids::{BufferId, CopyCommandId, DescriptorSetId, TextureId, UniformBlockId};
use super::api::keys::{DescriptorSetKey, PipelineKey, PipelineLayoutKey, SetLayoutKey};
use super::api::vertex::Vertex;
use super::error::{PresentError, RenderError, ResourceError, ResourceKind};
use super::traits::{
    AcquireOutcome, CommandRecorder, DescriptorWrite, FrameSync, GraphicsDevice, PresentOutcome,
    RenderBackend,
};
use crate::scene::texture::{CubemapData, TextureData};
use std::collections::{HashMap, VecDeque};

/// One recorded trait call.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum Call {
    CreateVertexBuffer { id: BufferId, count: usize },
    CreateIndexBuffer { id: BufferId, count: usize },
    CreateTexture { id: TextureId, width: u32, height: u32 },
    CreateCubemap { id: TextureId, size: u32 },
    CreateUniformBlock { id: UniformBlockId, size: u64 },
    WriteUniformBlock { id: UniformBlockId, bytes: Vec<u8> },
    RecordUniformCopy { id: CopyCommandId, blocks: Vec<UniformBlockId> },
    SubmitCopy(CopyCommandId),
    AllocateDescriptorSet { id: DescriptorSetId, layout: SetLayoutKey },
    NamedDescriptorSet { id: DescriptorSetId, key: DescriptorSetKey },
    WriteDescriptorSet { set: DescriptorSetId, writes: Vec<DescriptorWrite> },
    BeginRenderPass { pass: RenderPassKind, clear_values: Vec<ClearValue> },
    EndRenderPass,
    SetViewport(Extent2D),
    SetScissor(Extent2D),
    SetDepthBias(DepthBias),
    ClearColorAttachment { attachment: u32, color: [f32; 4] },
    BindPipeline(PipelineKey),
    BindDescriptorSet { layout: PipelineLayoutKey, set_index: u32, set: DescriptorSetId },
    BindVertexBuffer(BufferId),
    BindIndexBuffer(BufferId),
    DrawIndexed(u32),
    WaitForSlot(usize),
    Acquire(usize),
    ResetSlot(usize),
    Submit(usize),
    WaitIdle,
    Present { slot: usize, image_index: u32 },
    BeginCommands { slot: usize, image_index: u32 },
    EndCommands,
    RecreateSurface(Extent2D),
}

/// A recording mock of every renderer trait.
#[derive(Debug)]
pub struct RecordingBackend {
    /// Every call, in order.
    pub calls: Vec<Call>,
    /// Reported presentable image count.
    pub slots: usize,
    /// Reported surface extent.
    pub extent: Extent2D,
    /// Outcomes returned by successive `acquire` calls; `Image(0)` once exhausted.
    pub acquire_outcomes: VecDeque<AcquireOutcome>,
    /// Outcomes returned by successive `present` calls; `Presented` once exhausted.
    pub present_outcomes: VecDeque<PresentOutcome>,
    block_sizes: HashMap<UniformBlockId, u64>,
    named_sets: HashMap<DescriptorSetKey, DescriptorSetId>,
    next_id: usize,
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self::new(2, Extent2D::new(1280, 720))
    }
}

impl RecordingBackend {
    /// A backend with `slots` presentable images of the given size.
    pub fn new(slots: usize, extent: Extent2D) -> Self {
        Self {
            calls: Vec::new(),
            slots,
            extent,
            acquire_outcomes: VecDeque::new(),
            present_outcomes: VecDeque::new(),
            block_sizes: HashMap::new(),
            named_sets: HashMap::new(),
            next_id: 0,
        }
    }

    fn next(&mut self) -> usize {
        self.next_id += 1;
        self.next_id
    }

    /// The calls recorded between the first `BeginRenderPass` of `pass` and its matching
    /// `EndRenderPass`, exclusive.
    pub fn pass_calls(&self, pass: RenderPassKind) -> Vec<Call> {
        self.calls
            .iter()
            .skip_while(|c| !matches!(c, Call::BeginRenderPass { pass: p, .. } if *p == pass))
            .skip(1)
            .take_while(|c| !matches!(c, Call::EndRenderPass))
            .cloned()
            .collect()
    }

    /// The pipelines bound, in order, over the whole recording.
    pub fn bound_pipelines(&self) -> Vec<PipelineKey> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::BindPipeline(p) => Some(*p),
                _ => None,
            })
            .collect()
    }

    /// The last bytes written to `block`, if any.
    pub fn last_write(&self, block: UniformBlockId) -> Option<&[u8]> {
        self.calls.iter().rev().find_map(|c| match c {
            Call::WriteUniformBlock { id, bytes } if *id == block => Some(bytes.as_slice()),
            _ => None,
        })
    }

    /// Number of calls matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|c| predicate(c)).count()
    }
}

impl GraphicsDevice for RecordingBackend {
    fn create_vertex_buffer(&mut self, vertices: &[Vertex]) -> Result<BufferId, ResourceError> {
        let id = BufferId(self.next());
        self.calls.push(Call::CreateVertexBuffer {
            id,
            count: vertices.len(),
        });
        Ok(id)
    }

    fn create_index_buffer(&mut self, indices: &[u16]) -> Result<BufferId, ResourceError> {
        let id = BufferId(self.next());
        self.calls.push(Call::CreateIndexBuffer {
            id,
            count: indices.len(),
        });
        Ok(id)
    }

    fn create_texture(&mut self, data: &TextureData) -> Result<TextureId, ResourceError> {
        let id = TextureId(self.next());
        self.calls.push(Call::CreateTexture {
            id,
            width: data.width,
            height: data.height,
        });
        Ok(id)
    }

    fn create_cubemap(&mut self, data: &CubemapData) -> Result<TextureId, ResourceError> {
        let id = TextureId(self.next());
        self.calls.push(Call::CreateCubemap {
            id,
            size: data.size,
        });
        Ok(id)
    }

    fn create_uniform_block(&mut self, size: u64) -> Result<UniformBlockId, ResourceError> {
        let id = UniformBlockId(self.next());
        self.block_sizes.insert(id, size);
        self.calls.push(Call::CreateUniformBlock { id, size });
        Ok(id)
    }

    fn write_uniform_block(
        &mut self,
        block: UniformBlockId,
        bytes: &[u8],
    ) -> Result<(), ResourceError> {
        let size = *self
            .block_sizes
            .get(&block)
            .ok_or(ResourceError::UnknownHandle {
                kind: ResourceKind::UniformBlock,
                index: block.0,
            })?;
        if bytes.len() as u64 > size {
            return Err(ResourceError::OutOfBounds {
                size,
                requested: bytes.len() as u64,
            });
        }
        self.calls.push(Call::WriteUniformBlock {
            id: block,
            bytes: bytes.to_vec(),
        });
        Ok(())
    }

    fn record_uniform_copy(
        &mut self,
        blocks: &[UniformBlockId],
    ) -> Result<CopyCommandId, ResourceError> {
        let id = CopyCommandId(self.next());
        self.calls.push(Call::RecordUniformCopy {
            id,
            blocks: blocks.to_vec(),
        });
        Ok(id)
    }

    fn submit_copy(&mut self, copy: CopyCommandId) -> Result<(), ResourceError> {
        self.calls.push(Call::SubmitCopy(copy));
        Ok(())
    }

    fn allocate_descriptor_set(
        &mut self,
        layout: SetLayoutKey,
    ) -> Result<DescriptorSetId, ResourceError> {
        let id = DescriptorSetId(self.next());
        self.calls.push(Call::AllocateDescriptorSet { id, layout });
        Ok(id)
    }

    fn named_descriptor_set(
        &mut self,
        key: DescriptorSetKey,
    ) -> Result<DescriptorSetId, ResourceError> {
        let id = match self.named_sets.get(&key) {
            Some(&id) => id,
            None => {
                let id = DescriptorSetId(self.next());
                self.named_sets.insert(key, id);
                id
            }
        };
        self.calls.push(Call::NamedDescriptorSet { id, key });
        Ok(id)
    }

    fn write_descriptor_set(
        &mut self,
        set: DescriptorSetId,
        writes: &[DescriptorWrite],
    ) -> Result<(), ResourceError> {
        self.calls.push(Call::WriteDescriptorSet {
            set,
            writes: writes.to_vec(),
        });
        Ok(())
    }
}

impl CommandRecorder for RecordingBackend {
    fn begin_render_pass(&mut self, pass: RenderPassKind, clear_values: &[ClearValue]) {
        self.calls.push(Call::BeginRenderPass {
            pass,
            clear_values: clear_values.to_vec(),
        });
    }

    fn end_render_pass(&mut self) {
        self.calls.push(Call::EndRenderPass);
    }

    fn set_viewport(&mut self, extent: Extent2D) {
        self.calls.push(Call::SetViewport(extent));
    }

    fn set_scissor(&mut self, extent: Extent2D) {
        self.calls.push(Call::SetScissor(extent));
    }

    fn set_depth_bias(&mut self, bias: DepthBias) {
        self.calls.push(Call::SetDepthBias(bias));
    }

    fn clear_color_attachment(&mut self, attachment: u32, color: [f32; 4], _extent: Extent2D) {
        self.calls
            .push(Call::ClearColorAttachment { attachment, color });
    }

    fn bind_pipeline(&mut self, pipeline: PipelineKey) {
        self.calls.push(Call::BindPipeline(pipeline));
    }

    fn bind_descriptor_set(&mut self, layout: PipelineLayoutKey, set_index: u32, set: DescriptorSetId) {
        self.calls.push(Call::BindDescriptorSet {
            layout,
            set_index,
            set,
        });
    }

    fn bind_vertex_buffer(&mut self, buffer: BufferId) {
        self.calls.push(Call::BindVertexBuffer(buffer));
    }

    fn bind_index_buffer(&mut self, buffer: BufferId) {
        self.calls.push(Call::BindIndexBuffer(buffer));
    }

    fn draw_indexed(&mut self, index_count: u32) {
        self.calls.push(Call::DrawIndexed(index_count));
    }
}

impl FrameSync for RecordingBackend {
    fn slot_count(&self) -> usize {
        self.slots
    }

    fn wait_for_slot(&mut self, slot: usize) -> Result<(), PresentError> {
        self.calls.push(Call::WaitForSlot(slot));
        Ok(())
    }

    fn acquire(&mut self, slot: usize) -> Result<AcquireOutcome, PresentError> {
        self.calls.push(Call::Acquire(slot));
        Ok(self
            .acquire_outcomes
            .pop_front()
            .unwrap_or(AcquireOutcome::Image(0)))
    }

    fn reset_slot(&mut self, slot: usize) -> Result<(), PresentError> {
        self.calls.push(Call::ResetSlot(slot));
        Ok(())
    }

    fn submit(&mut self, slot: usize) -> Result<(), PresentError> {
        self.calls.push(Call::Submit(slot));
        Ok(())
    }

    fn wait_idle(&mut self) -> Result<(), PresentError> {
        self.calls.push(Call::WaitIdle);
        Ok(())
    }

    fn present(&mut self, slot: usize, image_index: u32) -> Result<PresentOutcome, PresentError> {
        self.calls.push(Call::Present { slot, image_index });
        Ok(self
            .present_outcomes
            .pop_front()
            .unwrap_or(PresentOutcome::Presented))
    }
}

impl RenderBackend for RecordingBackend {
    fn extent(&self) -> Extent2D {
        self.extent
    }

    fn begin_commands(&mut self, slot: usize, image_index: u32) -> Result<(), RenderError> {
        self.calls.push(Call::BeginCommands { slot, image_index });
        Ok(())
    }

    fn end_commands(&mut self) -> Result<(), RenderError> {
        self.calls.push(Call::EndCommands);
        Ok(())
    }

    fn recreate_surface(&mut self, extent: Extent2D) -> Result<(), RenderError> {
        self.extent = extent;
        self.calls.push(Call::RecreateSurface(extent));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::traits::write_uniform;

    #[test]
    fn test_named_sets_are_created_once() {
        let mut b = RecordingBackend::default();
        let a = b.named_descriptor_set(DescriptorSetKey::Shadow).unwrap();
        let again = b.named_descriptor_set(DescriptorSetKey::Shadow).unwrap();
        assert_eq!(a, again);
        assert_ne!(a, b.named_descriptor_set(DescriptorSetKey::Skybox).unwrap());
    }

    #[test]
    fn test_uniform_write_is_bounds_checked() {
        let mut b = RecordingBackend::default();
        let block = b.create_uniform_block(4).unwrap();
        write_uniform(&mut b, block, &7u32).unwrap();
        assert_eq!(b.last_write(block), Some(&7u32.to_ne_bytes()[..]));
        assert!(matches!(
            write_uniform(&mut b, block, &[0u32; 2]),
            Err(ResourceError::OutOfBounds { size: 4, requested: 8 })
        ));
    }
}
