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

//! Uniform blocks: a persistently mapped staging buffer paired with a device-local buffer,
//! and the pre-recorded command buffers that copy one into the other.

use super::context::VulkanContext;
use super::conversions::backend_error;
use super::memory::{create_buffer, record_copy_buffer, AllocatedBuffer};
use ash::{vk, Device};
use umbra_core::renderer::api::flags::{BufferUsage, MemoryPropertyFlags};
use umbra_core::renderer::error::{ResourceError, ResourceKind};

/// A uniform block. The CPU writes into `staging`; shaders read `device`.
#[derive(Debug)]
pub struct UniformBlock {
    staging: AllocatedBuffer,
    device: AllocatedBuffer,
}

impl UniformBlock {
    /// Creates both halves of a `size`-byte block and maps the staging half for the
    /// lifetime of the block.
    pub fn new(ctx: &VulkanContext, size: u64) -> Result<Self, ResourceError> {
        let mut staging = create_buffer(
            ctx,
            size,
            BufferUsage::TRANSFER_SRC,
            MemoryPropertyFlags::STAGING,
        )?;
        if let Err(e) = staging.allocation.map(&ctx.device) {
            staging.destroy(&ctx.device);
            return Err(e);
        }
        let device = match create_buffer(
            ctx,
            size,
            BufferUsage::TRANSFER_DST | BufferUsage::UNIFORM,
            MemoryPropertyFlags::DEVICE_LOCAL,
        ) {
            Ok(device) => device,
            Err(e) => {
                staging.destroy(&ctx.device);
                return Err(e);
            }
        };
        Ok(Self { staging, device })
    }

    /// Size of the block in bytes.
    pub fn size(&self) -> u64 {
        self.staging.size
    }

    /// Writes `bytes` at the start of the staging half.
    pub fn write(&mut self, bytes: &[u8]) -> Result<(), ResourceError> {
        self.staging.write(0, bytes)
    }

    /// Records the staging to device copy into `cmd`.
    pub fn record_copy(&self, device: &Device, cmd: vk::CommandBuffer) {
        record_copy_buffer(device, cmd, self.staging.buffer, self.device.buffer, self.size());
    }

    /// The descriptor of the device-local half.
    pub fn descriptor(&self) -> vk::DescriptorBufferInfo {
        vk::DescriptorBufferInfo {
            buffer: self.device.buffer,
            offset: 0,
            range: self.size(),
        }
    }

    /// Unmaps and destroys both halves.
    pub fn destroy(mut self, device: &Device) {
        if let Err(e) = self.staging.allocation.unmap(device) {
            log::warn!("Uniform block was not mapped at teardown: {e}");
        }
        self.staging.destroy(device);
        self.device.destroy(device);
    }
}

/// Records a reusable command buffer copying every block in `blocks`.
pub fn record_uniform_copy<'a>(
    ctx: &VulkanContext,
    blocks: impl IntoIterator<Item = &'a UniformBlock>,
) -> Result<vk::CommandBuffer, ResourceError> {
    let cmd = ctx.allocate_command_buffers(1)?[0];
    let begin = vk::CommandBufferBeginInfo::default();
    let recorded = unsafe { ctx.device.begin_command_buffer(cmd, &begin) }.and_then(|()| {
        for block in blocks {
            block.record_copy(&ctx.device, cmd);
        }
        unsafe { ctx.device.end_command_buffer(cmd) }
    });
    if let Err(e) = recorded {
        unsafe { ctx.device.free_command_buffers(ctx.command_pool, &[cmd]) };
        return Err(backend_error(
            ResourceKind::CommandBuffer,
            "uniform copy".to_string(),
            e,
        ));
    }
    Ok(cmd)
}

/// Submits a recorded copy and waits for the graphics queue to go idle.
pub fn submit_copy(ctx: &VulkanContext, cmd: vk::CommandBuffer) -> Result<(), ResourceError> {
    let buffers = [cmd];
    let submit = vk::SubmitInfo::default().command_buffers(&buffers);
    unsafe {
        ctx.device
            .queue_submit(ctx.graphics_queue, &[submit], vk::Fence::null())
            .and_then(|()| ctx.device.queue_wait_idle(ctx.graphics_queue))
    }
    .map_err(|e| backend_error(ResourceKind::UniformBlock, "submit copy".to_string(), e))
}
