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

//! The presentable image chain.

use super::context::VulkanContext;
use super::conversions::{backend_error, extent_from_vk, present_error, IntoVk};
use super::image::create_image_view;
use ash::vk;
use umbra_core::renderer::api::common::Extent2D;
use umbra_core::renderer::api::present::{choose_extent, choose_image_count, choose_surface_format};
use umbra_core::renderer::error::{PresentError, ResourceError, ResourceKind};
use umbra_core::renderer::traits::{AcquireOutcome, PresentOutcome};

/// Format used when the surface leaves the choice to the application.
const FALLBACK_FORMAT: vk::SurfaceFormatKHR = vk::SurfaceFormatKHR {
    format: vk::Format::B8G8R8A8_UNORM,
    color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
};

/// Picks the presentation mode. FIFO is the only mode every driver must offer.
pub fn choose_present_mode(_available: &[vk::PresentModeKHR]) -> vk::PresentModeKHR {
    vk::PresentModeKHR::FIFO
}

/// The swapchain, its images and one view per image.
#[derive(Debug, Default)]
pub struct Swapchain {
    /// The swapchain handle.
    pub handle: vk::SwapchainKHR,
    /// Format of the presentable images.
    pub format: vk::Format,
    /// Size of the presentable images.
    pub extent: Extent2D,
    /// Images owned by the swapchain.
    pub images: Vec<vk::Image>,
    /// One color view per image.
    pub views: Vec<vk::ImageView>,
}

impl Swapchain {
    /// Creates a chain for a window of `window_extent`, handing `old` over to it if given.
    ///
    /// `old` is left alive: the caller destroys it, views first, with [`Swapchain::destroy`]
    /// once the new chain exists and nothing references the old views.
    pub fn new(
        ctx: &VulkanContext,
        window_extent: Extent2D,
        old: vk::SwapchainKHR,
    ) -> Result<Self, ResourceError> {
        let query = |what: &str, e| backend_error(ResourceKind::Image, format!("surface {what}"), e);
        let (capabilities, formats, modes) = unsafe {
            (
                ctx.surface_loader
                    .get_physical_device_surface_capabilities(ctx.physical_device, ctx.surface)
                    .map_err(|e| query("capabilities", e))?,
                ctx.surface_loader
                    .get_physical_device_surface_formats(ctx.physical_device, ctx.surface)
                    .map_err(|e| query("formats", e))?,
                ctx.surface_loader
                    .get_physical_device_surface_present_modes(ctx.physical_device, ctx.surface)
                    .map_err(|e| query("present modes", e))?,
            )
        };

        let surface_format = choose_surface_format(
            &formats,
            |f| f.format == vk::Format::UNDEFINED,
            FALLBACK_FORMAT,
        );
        let present_mode = choose_present_mode(&modes);
        let extent = choose_extent(
            extent_from_vk(capabilities.current_extent),
            extent_from_vk(capabilities.min_image_extent),
            extent_from_vk(capabilities.max_image_extent),
            window_extent,
        );
        let image_count =
            choose_image_count(capabilities.min_image_count, capabilities.max_image_count);

        let families = ctx.queue_families.unique();
        let info = vk::SwapchainCreateInfoKHR::default()
            .surface(ctx.surface)
            .min_image_count(image_count)
            .image_format(surface_format.format)
            .image_color_space(surface_format.color_space)
            .image_extent(extent.into_vk())
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .pre_transform(capabilities.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(present_mode)
            .clipped(true)
            .old_swapchain(old);
        let info = if families.len() > 1 {
            info.image_sharing_mode(vk::SharingMode::CONCURRENT)
                .queue_family_indices(&families)
        } else {
            info.image_sharing_mode(vk::SharingMode::EXCLUSIVE)
        };

        let params = || {
            format!(
                "swapchain {}x{} images={image_count} format={:?}",
                extent.width, extent.height, surface_format.format
            )
        };
        let handle = unsafe { ctx.swapchain_loader.create_swapchain(&info, None) }
            .map_err(|e| backend_error(ResourceKind::Image, params(), e))?;

        let images = match unsafe { ctx.swapchain_loader.get_swapchain_images(handle) } {
            Ok(images) => images,
            Err(e) => {
                unsafe { ctx.swapchain_loader.destroy_swapchain(handle, None) };
                return Err(backend_error(ResourceKind::Image, params(), e));
            }
        };
        let mut chain = Self {
            handle,
            format: surface_format.format,
            extent,
            images,
            views: Vec::new(),
        };
        for &image in &chain.images {
            match create_image_view(
                &ctx.device,
                image,
                chain.format,
                vk::ImageAspectFlags::COLOR,
                1,
                vk::ImageViewType::TYPE_2D,
            ) {
                Ok(view) => chain.views.push(view),
                Err(e) => {
                    chain.destroy(ctx);
                    return Err(e);
                }
            }
        }
        log::info!(
            "Swapchain created: {}x{}, {} images, {:?}, {:?}",
            extent.width,
            extent.height,
            chain.images.len(),
            chain.format,
            present_mode
        );
        Ok(chain)
    }

    /// Number of presentable images.
    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    /// Destroys the views, keeping the handle.
    pub fn destroy_views(&mut self, ctx: &VulkanContext) {
        for view in self.views.drain(..) {
            unsafe { ctx.device.destroy_image_view(view, None) };
        }
    }

    /// Destroys the views and the swapchain itself.
    pub fn destroy(&mut self, ctx: &VulkanContext) {
        self.destroy_views(ctx);
        if self.handle != vk::SwapchainKHR::null() {
            unsafe { ctx.swapchain_loader.destroy_swapchain(self.handle, None) };
            self.handle = vk::SwapchainKHR::null();
        }
        self.images.clear();
    }

    /// Requests the next image, signaling `signal` once it is available.
    pub fn acquire(
        &self,
        ctx: &VulkanContext,
        signal: vk::Semaphore,
    ) -> Result<AcquireOutcome, PresentError> {
        let result = unsafe {
            ctx.swapchain_loader
                .acquire_next_image(self.handle, u64::MAX, signal, vk::Fence::null())
        };
        match result {
            // A suboptimal acquire still signals the semaphore; the frame goes ahead.
            Ok((index, _suboptimal)) => Ok(AcquireOutcome::Image(index)),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(AcquireOutcome::OutOfDate),
            Err(e) => Err(present_error("acquire", e)),
        }
    }

    /// Queues `image_index` for display after `wait` fires.
    pub fn present(
        &self,
        ctx: &VulkanContext,
        wait: vk::Semaphore,
        image_index: u32,
    ) -> Result<PresentOutcome, PresentError> {
        let waits = [wait];
        let chains = [self.handle];
        let indices = [image_index];
        let info = vk::PresentInfoKHR::default()
            .wait_semaphores(&waits)
            .swapchains(&chains)
            .image_indices(&indices);
        match unsafe { ctx.swapchain_loader.queue_present(ctx.present_queue, &info) } {
            Ok(false) => Ok(PresentOutcome::Presented),
            Ok(true) | Err(vk::Result::SUBOPTIMAL_KHR) => Ok(PresentOutcome::Suboptimal),
            Err(e) => Err(present_error("present", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_present_mode_is_always_fifo() {
        let offered = [vk::PresentModeKHR::MAILBOX, vk::PresentModeKHR::IMMEDIATE];
        assert_eq!(choose_present_mode(&offered), vk::PresentModeKHR::FIFO);
        assert_eq!(choose_present_mode(&[]), vk::PresentModeKHR::FIFO);
    }

    #[test]
    fn test_undefined_surface_format_falls_back() {
        let reported = [vk::SurfaceFormatKHR {
            format: vk::Format::UNDEFINED,
            color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
        }];
        let chosen = choose_surface_format(
            &reported,
            |f| f.format == vk::Format::UNDEFINED,
            FALLBACK_FORMAT,
        );
        assert_eq!(chosen.format, vk::Format::B8G8R8A8_UNORM);
    }
}
