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

//! The Vulkan renderer: owns every GPU object and implements the backend traits.
//!
//! Resource creation lives in `device.rs` and command recording in `command.rs`; this file
//! holds construction, presentation, surface recreation and teardown.

use super::command::Recording;
use super::context::VulkanContext;
use super::conversions::{backend_error, present_error};
use super::image::GpuTexture;
use super::memory::AllocatedBuffer;
use super::pipelines::PipelineRegistry;
use super::swapchain::Swapchain;
use super::sync::{create_frame_slots, destroy_frame_slots, FrameSlot};
use super::targets::{create_main_render_pass, create_shadow_render_pass, ShadowTarget, SurfaceTargets};
use super::uniforms::UniformBlock;
use anyhow::{Context, Result};
use ash::vk;
use std::collections::HashMap;
use std::path::PathBuf;
use umbra_core::platform::window::{UmbraWindow, UmbraWindowHandle};
use umbra_core::renderer::api::common::Extent2D;
use umbra_core::renderer::api::ids::DescriptorSetId;
use umbra_core::renderer::api::keys::DescriptorSetKey;
use umbra_core::renderer::error::{PresentError, RenderError, ResourceError, ResourceKind};
use umbra_core::renderer::traits::{AcquireOutcome, FrameSync, PresentOutcome, RenderBackend};

/// Settings the renderer is created with.
#[derive(Debug, Clone)]
pub struct VulkanRendererConfig {
    /// Application name reported to the driver.
    pub app_name: String,
    /// Enables the Khronos validation layer when it is installed.
    pub enable_validation: bool,
    /// Directory holding the compiled `*.spv` shaders.
    pub shader_dir: PathBuf,
}

impl Default for VulkanRendererConfig {
    fn default() -> Self {
        Self {
            app_name: "Umbra".to_string(),
            enable_validation: cfg!(debug_assertions),
            shader_dir: PathBuf::from("assets/shaders"),
        }
    }
}

/// A textured resource plus whether it is a cubemap, which is released before 2D textures.
#[derive(Debug)]
pub(super) struct TextureSlot {
    pub(super) texture: GpuTexture,
    pub(super) cubemap: bool,
}

/// The Vulkan implementation of [`RenderBackend`].
pub struct VulkanRenderer {
    pub(super) ctx: VulkanContext,
    pub(super) swapchain: Swapchain,
    pub(super) main_pass: vk::RenderPass,
    pub(super) shadow_pass: vk::RenderPass,
    pub(super) targets: Option<SurfaceTargets>,
    pub(super) shadow: Option<ShadowTarget>,
    pub(super) pipelines: PipelineRegistry,
    pub(super) slots: Vec<FrameSlot>,
    pub(super) command_buffers: Vec<vk::CommandBuffer>,
    pub(super) recording: Option<Recording>,

    pub(super) buffers: Vec<AllocatedBuffer>,
    pub(super) textures: Vec<TextureSlot>,
    pub(super) uniform_blocks: Vec<UniformBlock>,
    pub(super) copy_commands: Vec<vk::CommandBuffer>,
    pub(super) descriptor_sets: Vec<vk::DescriptorSet>,
    pub(super) named_set_ids: HashMap<DescriptorSetKey, DescriptorSetId>,

    // Dropped after `Drop::drop` has destroyed the surface.
    _window: UmbraWindowHandle,
}

impl std::fmt::Debug for VulkanRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VulkanRenderer")
            .field("ctx", &self.ctx)
            .field("swapchain", &self.swapchain)
            .field("slots", &self.slots.len())
            .field("buffers", &self.buffers.len())
            .field("textures", &self.textures.len())
            .field("uniform_blocks", &self.uniform_blocks.len())
            .finish_non_exhaustive()
    }
}

impl VulkanRenderer {
    /// Brings up the device, the presentable chain, both passes and every pipeline.
    ///
    /// ## Errors
    ///
    /// Every failure here is fatal. Objects created before the failure are released.
    pub fn new(window: &dyn UmbraWindow, config: &VulkanRendererConfig) -> Result<Self> {
        // --- 1. Instance, surface and device ---
        let ctx = VulkanContext::new(window, &config.app_name, config.enable_validation)?;
        let (width, height) = window.inner_size();

        let mut renderer = Self {
            ctx,
            swapchain: Swapchain::default(),
            main_pass: vk::RenderPass::null(),
            shadow_pass: vk::RenderPass::null(),
            targets: None,
            shadow: None,
            pipelines: PipelineRegistry::new(&config.shader_dir),
            slots: Vec::new(),
            command_buffers: Vec::new(),
            recording: None,
            buffers: Vec::new(),
            textures: Vec::new(),
            uniform_blocks: Vec::new(),
            copy_commands: Vec::new(),
            descriptor_sets: Vec::new(),
            named_set_ids: HashMap::new(),
            _window: window.clone_handle_arc(),
        };

        // --- 2. Swapchain ---
        renderer.swapchain =
            Swapchain::new(&renderer.ctx, Extent2D::new(width, height), vk::SwapchainKHR::null())
                .context("Failed to create the swapchain")?;

        // --- 3. Render passes and attachments ---
        renderer.main_pass = create_main_render_pass(&renderer.ctx, renderer.swapchain.format)
            .context("Failed to create the main render pass")?;
        renderer.shadow_pass = create_shadow_render_pass(&renderer.ctx)
            .context("Failed to create the shadow render pass")?;
        renderer.targets = Some(
            SurfaceTargets::new(&renderer.ctx, renderer.main_pass, &renderer.swapchain)
                .context("Failed to create the multisampled targets")?,
        );
        renderer.shadow = Some(
            ShadowTarget::new(&renderer.ctx, renderer.shadow_pass)
                .context("Failed to create the shadow map")?,
        );

        // --- 4. Layouts, pool and pipelines ---
        renderer
            .pipelines
            .build(&renderer.ctx, renderer.main_pass, renderer.shadow_pass)
            .context("Failed to create the pipelines")?;

        // --- 5. Per-slot command buffers and sync objects ---
        renderer
            .rebuild_slots()
            .context("Failed to create the frame slots")?;

        log::info!(
            "Vulkan renderer ready on '{}' ({:?}, {} frame slots).",
            renderer.ctx.device_name,
            renderer.ctx.msaa_samples,
            renderer.slots.len()
        );
        Ok(renderer)
    }

    /// Name of the GPU in use.
    pub fn device_name(&self) -> &str {
        &self.ctx.device_name
    }

    /// Recreates command buffers and sync objects so there is one slot per image.
    fn rebuild_slots(&mut self) -> Result<(), ResourceError> {
        let count = self.swapchain.image_count();
        if self.slots.len() == count && self.command_buffers.len() == count {
            return Ok(());
        }
        destroy_frame_slots(&self.ctx.device, &mut self.slots);
        if !self.command_buffers.is_empty() {
            unsafe {
                self.ctx
                    .device
                    .free_command_buffers(self.ctx.command_pool, &self.command_buffers)
            };
            self.command_buffers.clear();
        }
        self.command_buffers = self.ctx.allocate_command_buffers(count as u32)?;
        self.slots = create_frame_slots(&self.ctx, count)?;
        Ok(())
    }

    fn slot(&self, slot: usize, operation: &'static str) -> Result<FrameSlot, PresentError> {
        self.slots
            .get(slot)
            .copied()
            .ok_or_else(|| PresentError::Backend {
                operation,
                code: format!("no frame slot {slot} (of {})", self.slots.len()),
            })
    }
}

impl FrameSync for VulkanRenderer {
    fn slot_count(&self) -> usize {
        self.slots.len()
    }

    fn wait_for_slot(&mut self, slot: usize) -> Result<(), PresentError> {
        let fence = self.slot(slot, "wait_for_fences")?.in_flight;
        unsafe { self.ctx.device.wait_for_fences(&[fence], true, u64::MAX) }
            .map_err(|e| present_error("wait_for_fences", e))
    }

    fn acquire(&mut self, slot: usize) -> Result<AcquireOutcome, PresentError> {
        let signal = self.slot(slot, "acquire")?.image_available;
        self.swapchain.acquire(&self.ctx, signal)
    }

    fn reset_slot(&mut self, slot: usize) -> Result<(), PresentError> {
        let fence = self.slot(slot, "reset_fences")?.in_flight;
        unsafe { self.ctx.device.reset_fences(&[fence]) }
            .map_err(|e| present_error("reset_fences", e))
    }

    fn submit(&mut self, slot: usize) -> Result<(), PresentError> {
        let sync = self.slot(slot, "queue_submit")?;
        let cmd = self.command_buffers[slot];
        let waits = [sync.image_available];
        let stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let buffers = [cmd];
        let signals = [sync.render_finished];
        let info = vk::SubmitInfo::default()
            .wait_semaphores(&waits)
            .wait_dst_stage_mask(&stages)
            .command_buffers(&buffers)
            .signal_semaphores(&signals);
        unsafe {
            self.ctx
                .device
                .queue_submit(self.ctx.graphics_queue, &[info], sync.in_flight)
        }
        .map_err(|e| present_error("queue_submit", e))
    }

    fn wait_idle(&mut self) -> Result<(), PresentError> {
        unsafe { self.ctx.device.queue_wait_idle(self.ctx.graphics_queue) }
            .map_err(|e| present_error("queue_wait_idle", e))
    }

    fn present(&mut self, slot: usize, image_index: u32) -> Result<PresentOutcome, PresentError> {
        let wait = self.slot(slot, "present")?.render_finished;
        self.swapchain.present(&self.ctx, wait, image_index)
    }
}

impl RenderBackend for VulkanRenderer {
    fn extent(&self) -> Extent2D {
        self.swapchain.extent
    }

    fn begin_commands(&mut self, slot: usize, image_index: u32) -> Result<(), RenderError> {
        let cmd = *self
            .command_buffers
            .get(slot)
            .ok_or(RenderError::NotPrepared("begin_commands"))?;
        let begin = vk::CommandBufferBeginInfo::default();
        unsafe {
            self.ctx
                .device
                .reset_command_buffer(cmd, vk::CommandBufferResetFlags::empty())
                .and_then(|()| self.ctx.device.begin_command_buffer(cmd, &begin))
        }
        .map_err(|e| backend_error(ResourceKind::CommandBuffer, format!("begin slot {slot}"), e))?;
        self.recording = Some(Recording::new(cmd, image_index));
        Ok(())
    }

    fn end_commands(&mut self) -> Result<(), RenderError> {
        let recording = self
            .recording
            .take()
            .ok_or(RenderError::NotPrepared("end_commands"))?;
        if recording.pass_open {
            unsafe { self.ctx.device.cmd_end_render_pass(recording.cmd) };
        }
        unsafe { self.ctx.device.end_command_buffer(recording.cmd) }
            .map_err(|e| backend_error(ResourceKind::CommandBuffer, "end".to_string(), e))?;
        recording.finish()
    }

    fn recreate_surface(&mut self, extent: Extent2D) -> Result<(), RenderError> {
        if extent.is_empty() {
            log::debug!("Surface is empty; recreation deferred.");
            return Ok(());
        }
        let mut retired: Option<Swapchain> = None;
        for step in RECREATION_ORDER {
            log::trace!("Surface recreation step: {step:?}");
            match step {
                RecreationStep::WaitIdle => unsafe { self.ctx.device.device_wait_idle() }
                    .map_err(|e| present_error("device_wait_idle", e))?,
                RecreationStep::CreateChain => {
                    let chain = Swapchain::new(&self.ctx, extent, self.swapchain.handle).map_err(|e| {
                        RenderError::Initialization {
                            stage: "swapchain recreation",
                            details: e.to_string(),
                        }
                    })?;
                    retired = Some(std::mem::replace(&mut self.swapchain, chain));
                }
                RecreationStep::DestroyOldTargets => {
                    if let Some(targets) = self.targets.take() {
                        targets.destroy(&self.ctx.device);
                    }
                }
                RecreationStep::DestroyOldChain => {
                    if let Some(mut old) = retired.take() {
                        old.destroy(&self.ctx);
                    }
                }
                RecreationStep::CreateTargets => {
                    self.targets = Some(SurfaceTargets::new(&self.ctx, self.main_pass, &self.swapchain)?);
                }
                RecreationStep::RebuildSlots => self.rebuild_slots()?,
            }
        }
        log::info!(
            "Surface recreated at {}x{} with {} images.",
            self.swapchain.extent.width,
            self.swapchain.extent.height,
            self.swapchain.image_count()
        );
        Ok(())
    }
}

/// One step of surface recreation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum RecreationStep {
    WaitIdle,
    /// Creates the new chain, handing it the old one, and keeps the old one aside.
    CreateChain,
    DestroyOldTargets,
    /// Destroys the old chain's views, then the old chain itself.
    DestroyOldChain,
    CreateTargets,
    RebuildSlots,
}

/// The order `recreate_surface` runs its steps in. The old chain, its views and the
/// framebuffers over them outlive the creation of the new chain, so a failed creation
/// leaves the renderer on a complete old chain.
pub(super) const RECREATION_ORDER: [RecreationStep; 6] = [
    RecreationStep::WaitIdle,
    RecreationStep::CreateChain,
    RecreationStep::DestroyOldTargets,
    RecreationStep::DestroyOldChain,
    RecreationStep::CreateTargets,
    RecreationStep::RebuildSlots,
];

impl Drop for VulkanRenderer {
    fn drop(&mut self) {
        log::info!("Shutting down the Vulkan renderer...");
        let device = &self.ctx.device;
        if let Err(e) = unsafe { device.device_wait_idle() } {
            log::error!("device_wait_idle failed during teardown: {e:?}");
        }

        // --- 1. Registries and descriptor pool ---
        self.pipelines.destroy_all(device);
        self.descriptor_sets.clear();
        self.named_set_ids.clear();

        unsafe {
            // --- 2. Framebuffers ---
            if let Some(targets) = self.targets.as_mut() {
                for framebuffer in targets.framebuffers.drain(..) {
                    device.destroy_framebuffer(framebuffer, None);
                }
            }
            if let Some(shadow) = self.shadow.as_mut() {
                device.destroy_framebuffer(std::mem::take(&mut shadow.framebuffer), None);
            }

            // --- 3. Render passes ---
            device.destroy_render_pass(std::mem::take(&mut self.main_pass), None);
            device.destroy_render_pass(std::mem::take(&mut self.shadow_pass), None);

            // --- 4. Samplers ---
            if let Some(shadow) = self.shadow.as_mut() {
                device.destroy_sampler(std::mem::take(&mut shadow.sampler), None);
            }
            for slot in &mut self.textures {
                device.destroy_sampler(std::mem::take(&mut slot.texture.sampler), None);
            }
        }

        // --- 5. Multisampled targets, then the shadow map ---
        if let Some(targets) = self.targets.take() {
            targets.destroy(device);
        }
        if let Some(shadow) = self.shadow.take() {
            shadow.destroy(device);
        }

        // --- 6. Uniform blocks and their copy commands ---
        if !self.copy_commands.is_empty() {
            unsafe { device.free_command_buffers(self.ctx.command_pool, &self.copy_commands) };
            self.copy_commands.clear();
        }
        for block in self.uniform_blocks.drain(..) {
            block.destroy(device);
        }

        // --- 7. Cubemaps, then scene textures and buffers ---
        let (cubemaps, textures): (Vec<_>, Vec<_>) =
            self.textures.drain(..).partition(|slot| slot.cubemap);
        for slot in cubemaps.into_iter().chain(textures) {
            slot.texture.destroy(device);
        }
        for buffer in self.buffers.drain(..) {
            buffer.destroy(device);
        }

        // --- 8. Sync objects, command buffers and swapchain ---
        destroy_frame_slots(device, &mut self.slots);
        if !self.command_buffers.is_empty() {
            unsafe { device.free_command_buffers(self.ctx.command_pool, &self.command_buffers) };
            self.command_buffers.clear();
        }
        self.swapchain.destroy(&self.ctx);

        // --- 9. Command pool, device, surface, messenger, instance ---
        self.ctx.destroy();
        log::info!("Vulkan renderer destroyed.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(step: RecreationStep) -> usize {
        RECREATION_ORDER
            .iter()
            .position(|&s| s == step)
            .unwrap_or_else(|| panic!("{step:?} missing from the recreation order"))
    }

    #[test]
    fn test_new_chain_exists_before_old_one_is_torn_down() {
        let create = position(RecreationStep::CreateChain);
        assert!(create > position(RecreationStep::WaitIdle));
        assert!(create < position(RecreationStep::DestroyOldTargets));
        assert!(create < position(RecreationStep::DestroyOldChain));
    }

    #[test]
    fn test_framebuffers_go_before_the_views_they_use() {
        assert!(position(RecreationStep::DestroyOldTargets) < position(RecreationStep::DestroyOldChain));
        assert!(position(RecreationStep::DestroyOldChain) < position(RecreationStep::CreateTargets));
        assert!(position(RecreationStep::CreateTargets) < position(RecreationStep::RebuildSlots));
    }
}
