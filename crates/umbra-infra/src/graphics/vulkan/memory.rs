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

//! Device memory allocations and buffers.
//!
//! Every buffer gets its own allocation, chosen first-fit among the memory types the
//! device reports.

use super::context::VulkanContext;
use super::conversions::{backend_error, IntoVk};
use ash::{vk, Device};
use std::ptr;
use umbra_core::renderer::api::flags::{BufferUsage, MemoryPropertyFlags};
use umbra_core::renderer::api::memory::{check_write_bounds, select_memory_type, MapState};
use umbra_core::renderer::error::{ResourceError, ResourceKind};

/// A block of device memory and its mapping state.
///
/// Mapping is strictly nested: mapping twice or unmapping an unmapped allocation is an
/// error. The raw pointer is only live between [`GpuAllocation::map`] and
/// [`GpuAllocation::unmap`].
#[derive(Debug)]
pub struct GpuAllocation {
    memory: vk::DeviceMemory,
    size: u64,
    state: MapState,
    ptr: *mut u8,
}

impl GpuAllocation {
    /// Allocates memory for `requirements` from the first type that has `properties`.
    pub fn allocate(
        ctx: &VulkanContext,
        requirements: vk::MemoryRequirements,
        properties: MemoryPropertyFlags,
    ) -> Result<Self, ResourceError> {
        let type_index = select_memory_type(
            &ctx.memory_types,
            requirements.memory_type_bits,
            properties,
        )?;
        let info = vk::MemoryAllocateInfo::default()
            .allocation_size(requirements.size)
            .memory_type_index(type_index);
        let memory = unsafe { ctx.device.allocate_memory(&info, None) }.map_err(|e| {
            backend_error(
                ResourceKind::Memory,
                format!(
                    "size={} type={type_index} properties={properties:?}",
                    requirements.size
                ),
                e,
            )
        })?;
        Ok(Self {
            memory,
            size: requirements.size,
            state: MapState::Unmapped,
            ptr: ptr::null_mut(),
        })
    }

    /// The underlying memory object.
    pub fn memory(&self) -> vk::DeviceMemory {
        self.memory
    }

    /// Allocation size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Maps the whole allocation.
    pub fn map(&mut self, device: &Device) -> Result<(), ResourceError> {
        self.state.begin_map()?;
        match unsafe { device.map_memory(self.memory, 0, vk::WHOLE_SIZE, vk::MemoryMapFlags::empty()) }
        {
            Ok(ptr) => {
                self.ptr = ptr.cast();
                Ok(())
            }
            Err(e) => {
                self.state = MapState::Unmapped;
                Err(backend_error(
                    ResourceKind::Memory,
                    format!("map size={}", self.size),
                    e,
                ))
            }
        }
    }

    /// Unmaps the allocation.
    pub fn unmap(&mut self, device: &Device) -> Result<(), ResourceError> {
        self.state.end_map()?;
        unsafe { device.unmap_memory(self.memory) };
        self.ptr = ptr::null_mut();
        Ok(())
    }

    /// Copies `bytes` into the mapped allocation at `offset`.
    pub fn write(&mut self, offset: u64, bytes: &[u8]) -> Result<(), ResourceError> {
        if !self.state.is_mapped() {
            return Err(ResourceError::InvalidMapState { operation: "write" });
        }
        check_write_bounds(self.size, offset, bytes.len() as u64)?;
        // SAFETY: the pointer is live while mapped and the range was bounds-checked.
        unsafe {
            ptr::copy_nonoverlapping(bytes.as_ptr(), self.ptr.add(offset as usize), bytes.len());
        }
        Ok(())
    }

    /// Unmaps if needed and frees the memory.
    pub fn release(mut self, device: &Device) {
        if self.state.is_mapped() {
            // Cannot fail: the state was just checked.
            let _ = self.unmap(device);
        }
        unsafe { device.free_memory(self.memory, None) };
    }
}

/// A buffer and its dedicated allocation.
#[derive(Debug)]
pub struct AllocatedBuffer {
    /// The buffer handle.
    pub buffer: vk::Buffer,
    /// Its memory.
    pub allocation: GpuAllocation,
    /// Requested size in bytes, which may be smaller than the allocation.
    pub size: u64,
}

impl AllocatedBuffer {
    /// Writes into a mapped buffer, bounds-checked against the requested size.
    pub fn write(&mut self, offset: u64, bytes: &[u8]) -> Result<(), ResourceError> {
        check_write_bounds(self.size, offset, bytes.len() as u64)?;
        self.allocation.write(offset, bytes)
    }

    /// Destroys the buffer, then frees its memory.
    pub fn destroy(self, device: &Device) {
        unsafe { device.destroy_buffer(self.buffer, None) };
        self.allocation.release(device);
    }
}

/// Creates a buffer of `size` bytes bound to memory with `properties`.
pub fn create_buffer(
    ctx: &VulkanContext,
    size: u64,
    usage: BufferUsage,
    properties: MemoryPropertyFlags,
) -> Result<AllocatedBuffer, ResourceError> {
    let params = || format!("size={size} usage={usage:?} properties={properties:?}");
    let info = vk::BufferCreateInfo::default()
        .size(size)
        .usage(usage.into_vk())
        .sharing_mode(vk::SharingMode::EXCLUSIVE);
    let buffer = unsafe { ctx.device.create_buffer(&info, None) }
        .map_err(|e| backend_error(ResourceKind::Buffer, params(), e))?;

    let requirements = unsafe { ctx.device.get_buffer_memory_requirements(buffer) };
    let allocation = match GpuAllocation::allocate(ctx, requirements, properties) {
        Ok(allocation) => allocation,
        Err(e) => {
            unsafe { ctx.device.destroy_buffer(buffer, None) };
            return Err(e);
        }
    };
    if let Err(e) = unsafe { ctx.device.bind_buffer_memory(buffer, allocation.memory(), 0) } {
        unsafe { ctx.device.destroy_buffer(buffer, None) };
        allocation.release(&ctx.device);
        return Err(backend_error(ResourceKind::Memory, params(), e));
    }
    log::debug!("Created buffer: {}", params());
    Ok(AllocatedBuffer {
        buffer,
        allocation,
        size,
    })
}

/// Records a copy of `size` bytes between two buffers into `cmd`.
pub fn record_copy_buffer(
    device: &Device,
    cmd: vk::CommandBuffer,
    src: vk::Buffer,
    dst: vk::Buffer,
    size: u64,
) {
    let region = vk::BufferCopy::default().size(size);
    unsafe { device.cmd_copy_buffer(cmd, src, dst, &[region]) };
}

/// Copies `size` bytes between two buffers with a one-time command buffer and waits for it.
pub fn copy_buffer(
    ctx: &VulkanContext,
    src: vk::Buffer,
    dst: vk::Buffer,
    size: u64,
) -> Result<(), ResourceError> {
    let cmd = ctx.begin_single_time_commands()?;
    record_copy_buffer(&ctx.device, cmd, src, dst, size);
    ctx.end_single_time_commands(cmd)
}

/// Creates a mapped, host-coherent staging buffer holding `bytes`.
pub fn create_staging_buffer(
    ctx: &VulkanContext,
    bytes: &[u8],
) -> Result<AllocatedBuffer, ResourceError> {
    let mut staging = create_buffer(
        ctx,
        bytes.len() as u64,
        BufferUsage::TRANSFER_SRC,
        MemoryPropertyFlags::STAGING,
    )?;
    let filled = staging
        .allocation
        .map(&ctx.device)
        .and_then(|()| staging.write(0, bytes))
        .and_then(|()| staging.allocation.unmap(&ctx.device));
    match filled {
        Ok(()) => Ok(staging),
        Err(e) => {
            staging.destroy(&ctx.device);
            Err(e)
        }
    }
}

/// Uploads `bytes` into a new device-local buffer through a temporary staging buffer.
pub fn create_device_local_buffer(
    ctx: &VulkanContext,
    bytes: &[u8],
    usage: BufferUsage,
) -> Result<AllocatedBuffer, ResourceError> {
    let staging = create_staging_buffer(ctx, bytes)?;
    let result = create_buffer(
        ctx,
        bytes.len() as u64,
        usage | BufferUsage::TRANSFER_DST,
        MemoryPropertyFlags::DEVICE_LOCAL,
    )
    .and_then(|buffer| match copy_buffer(ctx, staging.buffer, buffer.buffer, bytes.len() as u64) {
        Ok(()) => Ok(buffer),
        Err(e) => {
            buffer.destroy(&ctx.device);
            Err(e)
        }
    });
    staging.destroy(&ctx.device);
    result
}
