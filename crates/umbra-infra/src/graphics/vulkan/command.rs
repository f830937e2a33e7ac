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

//! [`CommandRecorder`] for the Vulkan renderer.
//!
//! Ids are resolved against the renderer's resource tables as each command is recorded.
//! A command issued with no open command buffer is dropped with a warning. A command naming
//! a missing framebuffer, pipeline, descriptor set or buffer fails the recording: later
//! commands are dropped and `end_commands` reports the first failure.

use super::conversions::IntoVk;
use super::renderer::VulkanRenderer;
use ash::vk;
use umbra_core::renderer::api::common::{ClearValue, DepthBias, Extent2D, RenderPassKind};
use umbra_core::renderer::api::ids::{BufferId, DescriptorSetId};
use umbra_core::renderer::api::keys::{PipelineKey, PipelineLayoutKey};
use umbra_core::renderer::error::RenderError;
use umbra_core::renderer::traits::CommandRecorder;

/// The command buffer being recorded, the image it targets, and the first failed command.
#[derive(Debug)]
pub(super) struct Recording {
    pub(super) cmd: vk::CommandBuffer,
    pub(super) image_index: u32,
    /// A render pass was begun and not yet ended.
    pub(super) pass_open: bool,
    failure: Option<RenderError>,
}

impl Recording {
    pub(super) fn new(cmd: vk::CommandBuffer, image_index: u32) -> Self {
        Self {
            cmd,
            image_index,
            pass_open: false,
            failure: None,
        }
    }

    /// The buffer to record into, or `None` once a command has failed.
    pub(super) fn active(&self) -> Option<vk::CommandBuffer> {
        if self.failure.is_some() {
            None
        } else {
            Some(self.cmd)
        }
    }

    /// Marks the recording as failed. Only the first failure is kept.
    pub(super) fn fail(&mut self, command: &'static str, details: String) {
        log::error!("'{command}' failed: {details}");
        if self.failure.is_none() {
            self.failure = Some(RenderError::Recording { command, details });
        }
    }

    /// The outcome of the recording once its command buffer has been ended.
    pub(super) fn finish(self) -> Result<(), RenderError> {
        match self.failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl VulkanRenderer {
    fn current_cmd(&self, command: &str) -> Option<vk::CommandBuffer> {
        match self.recording.as_ref() {
            Some(recording) => recording.active(),
            None => {
                log::warn!("'{command}' recorded outside begin_commands/end_commands; ignored.");
                None
            }
        }
    }

    fn fail(&mut self, command: &'static str, details: String) {
        if let Some(recording) = self.recording.as_mut() {
            recording.fail(command, details);
        }
    }

    fn pass_target(&self, pass: RenderPassKind) -> Option<(vk::RenderPass, vk::Framebuffer, Extent2D)> {
        match pass {
            RenderPassKind::Shadow => self
                .shadow
                .as_ref()
                .map(|shadow| (self.shadow_pass, shadow.framebuffer, shadow.extent)),
            RenderPassKind::Main => {
                let index = self.recording.as_ref()?.image_index as usize;
                let framebuffer = *self.targets.as_ref()?.framebuffers.get(index)?;
                Some((self.main_pass, framebuffer, self.swapchain.extent))
            }
        }
    }
}

impl CommandRecorder for VulkanRenderer {
    fn begin_render_pass(&mut self, pass: RenderPassKind, clear_values: &[ClearValue]) {
        let Some(cmd) = self.current_cmd("begin_render_pass") else {
            return;
        };
        let Some((render_pass, framebuffer, extent)) = self.pass_target(pass) else {
            self.fail("begin_render_pass", format!("no framebuffer for the {pass:?} pass"));
            return;
        };
        let clears: Vec<vk::ClearValue> = clear_values.iter().map(|c| c.into_vk()).collect();
        let info = vk::RenderPassBeginInfo::default()
            .render_pass(render_pass)
            .framebuffer(framebuffer)
            .render_area(extent.into_vk())
            .clear_values(&clears);
        unsafe {
            self.ctx
                .device
                .cmd_begin_render_pass(cmd, &info, vk::SubpassContents::INLINE)
        };
        if let Some(recording) = self.recording.as_mut() {
            recording.pass_open = true;
        }
    }

    fn end_render_pass(&mut self) {
        let Some(recording) = self.recording.as_mut() else {
            log::warn!("'end_render_pass' recorded outside begin_commands/end_commands; ignored.");
            return;
        };
        // A pass begun before a failure is still closed.
        if recording.pass_open {
            recording.pass_open = false;
            unsafe { self.ctx.device.cmd_end_render_pass(recording.cmd) };
        }
    }

    fn set_viewport(&mut self, extent: Extent2D) {
        let Some(cmd) = self.current_cmd("set_viewport") else {
            return;
        };
        let viewport = vk::Viewport {
            x: 0.0,
            y: 0.0,
            width: extent.width as f32,
            height: extent.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        };
        unsafe { self.ctx.device.cmd_set_viewport(cmd, 0, &[viewport]) };
    }

    fn set_scissor(&mut self, extent: Extent2D) {
        if let Some(cmd) = self.current_cmd("set_scissor") {
            unsafe { self.ctx.device.cmd_set_scissor(cmd, 0, &[extent.into_vk()]) };
        }
    }

    fn set_depth_bias(&mut self, bias: DepthBias) {
        if let Some(cmd) = self.current_cmd("set_depth_bias") {
            unsafe {
                self.ctx
                    .device
                    .cmd_set_depth_bias(cmd, bias.constant, bias.clamp, bias.slope)
            };
        }
    }

    fn clear_color_attachment(&mut self, attachment: u32, color: [f32; 4], extent: Extent2D) {
        let Some(cmd) = self.current_cmd("clear_color_attachment") else {
            return;
        };
        let clear = vk::ClearAttachment {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            color_attachment: attachment,
            clear_value: ClearValue::Color(color).into_vk(),
        };
        let rect = vk::ClearRect {
            rect: extent.into_vk(),
            base_array_layer: 0,
            layer_count: 1,
        };
        unsafe { self.ctx.device.cmd_clear_attachments(cmd, &[clear], &[rect]) };
    }

    fn bind_pipeline(&mut self, pipeline: PipelineKey) {
        let Some(cmd) = self.current_cmd("bind_pipeline") else {
            return;
        };
        let handle = self.pipelines.pipelines.get(pipeline);
        if handle == vk::Pipeline::null() {
            self.fail("bind_pipeline", format!("pipeline {pipeline:?} was never created"));
            return;
        }
        unsafe {
            self.ctx
                .device
                .cmd_bind_pipeline(cmd, vk::PipelineBindPoint::GRAPHICS, handle)
        };
    }

    fn bind_descriptor_set(&mut self, layout: PipelineLayoutKey, set_index: u32, set: DescriptorSetId) {
        let Some(cmd) = self.current_cmd("bind_descriptor_set") else {
            return;
        };
        let Some(&handle) = self.descriptor_sets.get(set.0) else {
            self.fail("bind_descriptor_set", format!("unknown descriptor set {}", set.0));
            return;
        };
        unsafe {
            self.ctx.device.cmd_bind_descriptor_sets(
                cmd,
                vk::PipelineBindPoint::GRAPHICS,
                self.pipelines.pipeline_layouts.get(layout),
                set_index,
                &[handle],
                &[],
            )
        };
    }

    fn bind_vertex_buffer(&mut self, buffer: BufferId) {
        let Some(cmd) = self.current_cmd("bind_vertex_buffer") else {
            return;
        };
        match self.buffers.get(buffer.0).map(|b| b.buffer) {
            Some(handle) => unsafe {
                self.ctx
                    .device
                    .cmd_bind_vertex_buffers(cmd, 0, &[handle], &[0])
            },
            None => self.fail("bind_vertex_buffer", format!("unknown vertex buffer {}", buffer.0)),
        }
    }

    fn bind_index_buffer(&mut self, buffer: BufferId) {
        let Some(cmd) = self.current_cmd("bind_index_buffer") else {
            return;
        };
        match self.buffers.get(buffer.0).map(|b| b.buffer) {
            Some(handle) => unsafe {
                self.ctx
                    .device
                    .cmd_bind_index_buffer(cmd, handle, 0, vk::IndexType::UINT16)
            },
            None => self.fail("bind_index_buffer", format!("unknown index buffer {}", buffer.0)),
        }
    }

    fn draw_indexed(&mut self, index_count: u32) {
        if let Some(cmd) = self.current_cmd("draw_indexed") {
            unsafe { self.ctx.device.cmd_draw_indexed(cmd, index_count, 1, 0, 0, 0) };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_recording_finishes_ok() {
        let recording = Recording::new(vk::CommandBuffer::null(), 1);
        assert!(recording.active().is_some());
        assert!(recording.finish().is_ok());
    }

    #[test]
    fn test_failed_bind_surfaces_at_end() {
        let mut recording = Recording::new(vk::CommandBuffer::null(), 0);
        recording.fail("bind_pipeline", "pipeline Shadow was never created".into());
        assert!(recording.active().is_none());
        match recording.finish() {
            Err(RenderError::Recording { command, .. }) => assert_eq!(command, "bind_pipeline"),
            other => panic!("expected a recording error, got {other:?}"),
        }
    }

    #[test]
    fn test_first_failure_wins() {
        let mut recording = Recording::new(vk::CommandBuffer::null(), 0);
        recording.fail("begin_render_pass", "no framebuffer for the Main pass".into());
        recording.fail("bind_descriptor_set", "unknown descriptor set 7".into());
        let err = recording.finish().unwrap_err();
        assert!(err.to_string().contains("begin_render_pass"));
    }
}
