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

use crate::renderer::api::common::{ClearValue, DepthBias, Extent2D, RenderPassKind};
use crate::renderer::api::ids::{BufferId, DescriptorSetId};
use crate::renderer::api::keys::{PipelineKey, PipelineLayoutKey};

/// Records draw commands into the command buffer of the frame being built.
///
/// Recording itself cannot fail; errors surface when the command buffer is finished or
/// submitted. Calls outside an open render pass are a usage error the backend may ignore.
pub trait CommandRecorder {
    /// Begins `pass` on the framebuffer of the current frame, clearing its attachments to
    /// `clear_values` in attachment order.
    fn begin_render_pass(&mut self, pass: RenderPassKind, clear_values: &[ClearValue]);

    /// Ends the open render pass.
    fn end_render_pass(&mut self);

    /// Sets a full-extent viewport with a `[0, 1]` depth range.
    fn set_viewport(&mut self, extent: Extent2D);

    /// Sets a scissor rectangle covering `extent` from the origin.
    fn set_scissor(&mut self, extent: Extent2D);

    /// Sets the dynamic depth bias of the bound pipeline.
    fn set_depth_bias(&mut self, bias: DepthBias);

    /// Clears one color attachment of the open pass directly.
    fn clear_color_attachment(&mut self, attachment: u32, color: [f32; 4], extent: Extent2D);

    /// Binds a graphics pipeline.
    fn bind_pipeline(&mut self, pipeline: PipelineKey);

    /// Binds `set` at `set_index` of the given pipeline layout.
    fn bind_descriptor_set(&mut self, layout: PipelineLayoutKey, set_index: u32, set: DescriptorSetId);

    /// Binds a vertex buffer at binding 0.
    fn bind_vertex_buffer(&mut self, buffer: BufferId);

    /// Binds a 16-bit index buffer.
    fn bind_index_buffer(&mut self, buffer: BufferId);

    /// Draws `index_count` indices as one instance.
    fn draw_indexed(&mut self, index_count: u32);
}
