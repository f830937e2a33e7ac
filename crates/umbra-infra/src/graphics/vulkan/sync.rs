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

//! Per-slot semaphores and fences.

use super::context::VulkanContext;
use super::conversions::backend_error;
use ash::{vk, Device};
use umbra_core::renderer::error::{ResourceError, ResourceKind};

/// The synchronization objects of one in-flight slot.
#[derive(Debug, Clone, Copy)]
pub struct FrameSlot {
    /// Signaled when the acquired image is ready to be rendered into.
    pub image_available: vk::Semaphore,
    /// Signaled when rendering finished and the image can be presented.
    pub render_finished: vk::Semaphore,
    /// Signaled when the slot's submission completed. Created signaled.
    pub in_flight: vk::Fence,
}

impl FrameSlot {
    fn destroy(self, device: &Device) {
        unsafe {
            device.destroy_semaphore(self.image_available, None);
            device.destroy_semaphore(self.render_finished, None);
            device.destroy_fence(self.in_flight, None);
        }
    }
}

/// Creates `count` slots, one per presentable image.
pub fn create_frame_slots(ctx: &VulkanContext, count: usize) -> Result<Vec<FrameSlot>, ResourceError> {
    let semaphore_info = vk::SemaphoreCreateInfo::default();
    let fence_info = vk::FenceCreateInfo::default().flags(vk::FenceCreateFlags::SIGNALED);
    let mut slots = Vec::with_capacity(count);
    for index in 0..count {
        let created = unsafe {
            ctx.device
                .create_semaphore(&semaphore_info, None)
                .and_then(|image_available| {
                    ctx.device
                        .create_semaphore(&semaphore_info, None)
                        .map(|render_finished| (image_available, render_finished))
                        .inspect_err(|_| ctx.device.destroy_semaphore(image_available, None))
                })
                .and_then(|(image_available, render_finished)| {
                    ctx.device
                        .create_fence(&fence_info, None)
                        .map(|in_flight| FrameSlot {
                            image_available,
                            render_finished,
                            in_flight,
                        })
                        .inspect_err(|_| {
                            ctx.device.destroy_semaphore(image_available, None);
                            ctx.device.destroy_semaphore(render_finished, None);
                        })
                })
        };
        match created {
            Ok(slot) => slots.push(slot),
            Err(e) => {
                destroy_frame_slots(&ctx.device, &mut slots);
                return Err(backend_error(
                    ResourceKind::SyncObject,
                    format!("slot {index} of {count}"),
                    e,
                ));
            }
        }
    }
    log::debug!("Created {count} frame slots.");
    Ok(slots)
}

/// Destroys and removes every slot.
pub fn destroy_frame_slots(device: &Device, slots: &mut Vec<FrameSlot>) {
    for slot in slots.drain(..) {
        slot.destroy(device);
    }
}
