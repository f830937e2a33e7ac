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

//! Render passes and the attachments they draw into.
//!
//! The main pass has three attachments: the presentable image (resolve target), the
//! multisampled depth buffer and the multisampled color buffer. Without multisampling the
//! presentable image is the color attachment directly and nothing is resolved. The shadow
//! pass has a single depth attachment that later passes sample.

use super::context::VulkanContext;
use super::conversions::{backend_error, IntoVk};
use super::image::{
    aspect_for, create_image, create_image_view, create_sampler, transition_image_layout,
    AllocatedImage, ImageDesc, SamplerKind, SHADOW_FORMAT,
};
use super::swapchain::Swapchain;
use ash::{vk, Device};
use umbra_core::renderer::api::common::{Extent2D, SHADOW_MAP_SIZE};
use umbra_core::renderer::api::image::{ImageLayout, SampleCount};
use umbra_core::renderer::error::{ResourceError, ResourceKind};

/// Attachment index of the presentable image in the main pass.
pub const PRESENT_ATTACHMENT: u32 = 0;
/// Attachment index of the multisampled depth buffer.
pub const DEPTH_ATTACHMENT: u32 = 1;
/// Attachment index of the multisampled color buffer.
pub const MSAA_COLOR_ATTACHMENT: u32 = 2;

/// The attachment the main subpass writes color into.
pub fn main_color_attachment(samples: SampleCount) -> u32 {
    if samples == SampleCount::X1 {
        PRESENT_ATTACHMENT
    } else {
        MSAA_COLOR_ATTACHMENT
    }
}

fn create_render_pass(
    device: &Device,
    info: &vk::RenderPassCreateInfo,
    what: &str,
) -> Result<vk::RenderPass, ResourceError> {
    unsafe { device.create_render_pass(info, None) }
        .map_err(|e| backend_error(ResourceKind::RenderPass, what.to_string(), e))
}

/// Creates the main pass: clears all three attachments and leaves the presentable image
/// ready to present.
pub fn create_main_render_pass(
    ctx: &VulkanContext,
    color_format: vk::Format,
) -> Result<vk::RenderPass, ResourceError> {
    let samples = ctx.msaa_samples;
    let resolving = samples != SampleCount::X1;
    let attachments = [
        vk::AttachmentDescription::default()
            .format(color_format)
            .samples(vk::SampleCountFlags::TYPE_1)
            .load_op(vk::AttachmentLoadOp::CLEAR)
            .store_op(vk::AttachmentStoreOp::STORE)
            .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
            .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
            .initial_layout(vk::ImageLayout::UNDEFINED)
            .final_layout(vk::ImageLayout::PRESENT_SRC_KHR),
        vk::AttachmentDescription::default()
            .format(ctx.depth_format)
            .samples(samples.into_vk())
            .load_op(vk::AttachmentLoadOp::CLEAR)
            .store_op(vk::AttachmentStoreOp::DONT_CARE)
            .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
            .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
            .initial_layout(vk::ImageLayout::UNDEFINED)
            .final_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL),
        vk::AttachmentDescription::default()
            .format(color_format)
            .samples(samples.into_vk())
            .load_op(vk::AttachmentLoadOp::CLEAR)
            .store_op(vk::AttachmentStoreOp::DONT_CARE)
            .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
            .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
            .initial_layout(vk::ImageLayout::UNDEFINED)
            .final_layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL),
    ];

    let color_refs = [vk::AttachmentReference {
        attachment: main_color_attachment(samples),
        layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
    }];
    let resolve_refs = [vk::AttachmentReference {
        attachment: PRESENT_ATTACHMENT,
        layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
    }];
    let depth_ref = vk::AttachmentReference {
        attachment: DEPTH_ATTACHMENT,
        layout: vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
    };
    let subpass = vk::SubpassDescription::default()
        .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
        .color_attachments(&color_refs)
        .depth_stencil_attachment(&depth_ref);
    let subpass = if resolving {
        subpass.resolve_attachments(&resolve_refs)
    } else {
        subpass
    };

    let stages = vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
        | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS;
    let dependencies = [vk::SubpassDependency::default()
        .src_subpass(vk::SUBPASS_EXTERNAL)
        .dst_subpass(0)
        .src_stage_mask(stages)
        .dst_stage_mask(stages)
        .dst_access_mask(
            vk::AccessFlags::COLOR_ATTACHMENT_WRITE
                | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
        )];

    let subpasses = [subpass];
    let info = vk::RenderPassCreateInfo::default()
        .attachments(&attachments)
        .subpasses(&subpasses)
        .dependencies(&dependencies);
    let pass = create_render_pass(&ctx.device, &info, "main")?;
    log::debug!("Main render pass created ({samples:?}, resolve: {resolving}).");
    Ok(pass)
}

/// Creates the depth-only shadow pass. The attachment ends read-only so later passes can
/// sample it.
pub fn create_shadow_render_pass(ctx: &VulkanContext) -> Result<vk::RenderPass, ResourceError> {
    let attachments = [vk::AttachmentDescription::default()
        .format(SHADOW_FORMAT)
        .samples(vk::SampleCountFlags::TYPE_1)
        .load_op(vk::AttachmentLoadOp::CLEAR)
        .store_op(vk::AttachmentStoreOp::STORE)
        .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
        .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
        .initial_layout(vk::ImageLayout::UNDEFINED)
        .final_layout(vk::ImageLayout::DEPTH_STENCIL_READ_ONLY_OPTIMAL)];
    let depth_ref = vk::AttachmentReference {
        attachment: 0,
        layout: vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
    };
    let subpasses = [vk::SubpassDescription::default()
        .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
        .depth_stencil_attachment(&depth_ref)];
    let dependencies = [
        vk::SubpassDependency::default()
            .src_subpass(vk::SUBPASS_EXTERNAL)
            .dst_subpass(0)
            .src_stage_mask(vk::PipelineStageFlags::FRAGMENT_SHADER)
            .dst_stage_mask(vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS)
            .src_access_mask(vk::AccessFlags::SHADER_READ)
            .dst_access_mask(vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE)
            .dependency_flags(vk::DependencyFlags::BY_REGION),
        vk::SubpassDependency::default()
            .src_subpass(0)
            .dst_subpass(vk::SUBPASS_EXTERNAL)
            .src_stage_mask(vk::PipelineStageFlags::LATE_FRAGMENT_TESTS)
            .dst_stage_mask(vk::PipelineStageFlags::FRAGMENT_SHADER)
            .src_access_mask(vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE)
            .dst_access_mask(vk::AccessFlags::SHADER_READ)
            .dependency_flags(vk::DependencyFlags::BY_REGION),
    ];
    let info = vk::RenderPassCreateInfo::default()
        .attachments(&attachments)
        .subpasses(&subpasses)
        .dependencies(&dependencies);
    create_render_pass(&ctx.device, &info, "shadow")
}

fn create_framebuffer(
    device: &Device,
    pass: vk::RenderPass,
    views: &[vk::ImageView],
    extent: Extent2D,
) -> Result<vk::Framebuffer, ResourceError> {
    let info = vk::FramebufferCreateInfo::default()
        .render_pass(pass)
        .attachments(views)
        .width(extent.width)
        .height(extent.height)
        .layers(1);
    unsafe { device.create_framebuffer(&info, None) }.map_err(|e| {
        backend_error(
            ResourceKind::Framebuffer,
            format!("{}x{} attachments={}", extent.width, extent.height, views.len()),
            e,
        )
    })
}

/// An image with one view over it.
#[derive(Debug)]
pub struct Attachment {
    /// The image.
    pub image: AllocatedImage,
    /// Its view.
    pub view: vk::ImageView,
}

impl Attachment {
    fn new(ctx: &VulkanContext, desc: ImageDesc) -> Result<Self, ResourceError> {
        let image = create_image(ctx, desc)?;
        match create_image_view(
            &ctx.device,
            image.image,
            desc.format,
            aspect_for(desc.format),
            1,
            vk::ImageViewType::TYPE_2D,
        ) {
            Ok(view) => Ok(Self { image, view }),
            Err(e) => {
                image.destroy(&ctx.device);
                Err(e)
            }
        }
    }

    /// Destroys the view, then the image.
    pub fn destroy(self, device: &Device) {
        unsafe { device.destroy_image_view(self.view, None) };
        self.image.destroy(device);
    }
}

/// Everything whose size follows the surface: multisampled attachments and one framebuffer
/// per presentable image.
#[derive(Debug)]
pub struct SurfaceTargets {
    /// Multisampled color buffer.
    pub color: Attachment,
    /// Multisampled depth buffer.
    pub depth: Attachment,
    /// Framebuffers, indexed like the swapchain images.
    pub framebuffers: Vec<vk::Framebuffer>,
}

impl SurfaceTargets {
    /// Creates the attachments and framebuffers for `swapchain`.
    pub fn new(
        ctx: &VulkanContext,
        pass: vk::RenderPass,
        swapchain: &Swapchain,
    ) -> Result<Self, ResourceError> {
        let extent = swapchain.extent;
        let mut color_desc = ImageDesc::new(
            extent,
            swapchain.format,
            vk::ImageUsageFlags::TRANSIENT_ATTACHMENT | vk::ImageUsageFlags::COLOR_ATTACHMENT,
        );
        color_desc.samples = ctx.msaa_samples;
        let color = Attachment::new(ctx, color_desc)?;
        if let Err(e) = transition_image_layout(
            ctx,
            &color.image,
            ImageLayout::Undefined,
            ImageLayout::ColorAttachment,
        ) {
            color.destroy(&ctx.device);
            return Err(e);
        }

        let mut depth_desc = ImageDesc::new(
            extent,
            ctx.depth_format,
            vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT,
        );
        depth_desc.samples = ctx.msaa_samples;
        let depth = match Attachment::new(ctx, depth_desc) {
            Ok(depth) => depth,
            Err(e) => {
                color.destroy(&ctx.device);
                return Err(e);
            }
        };

        let mut targets = Self {
            color,
            depth,
            framebuffers: Vec::with_capacity(swapchain.views.len()),
        };
        for &view in &swapchain.views {
            let views = [view, targets.depth.view, targets.color.view];
            match create_framebuffer(&ctx.device, pass, &views, extent) {
                Ok(framebuffer) => targets.framebuffers.push(framebuffer),
                Err(e) => {
                    targets.destroy(&ctx.device);
                    return Err(e);
                }
            }
        }
        log::debug!(
            "Surface targets created: {} framebuffers of {}x{}",
            targets.framebuffers.len(),
            extent.width,
            extent.height
        );
        Ok(targets)
    }

    /// Destroys the framebuffers, then both attachments.
    pub fn destroy(self, device: &Device) {
        for framebuffer in self.framebuffers {
            unsafe { device.destroy_framebuffer(framebuffer, None) };
        }
        self.depth.destroy(device);
        self.color.destroy(device);
    }
}

/// The off-screen shadow map: depth attachment, its sampler and its framebuffer.
#[derive(Debug)]
pub struct ShadowTarget {
    /// The depth attachment.
    pub depth: Attachment,
    /// Clamp-to-border sampler used by passes reading the map.
    pub sampler: vk::Sampler,
    /// Framebuffer of the shadow pass.
    pub framebuffer: vk::Framebuffer,
    /// Size of the map.
    pub extent: Extent2D,
}

impl ShadowTarget {
    /// Creates a square shadow map of [`SHADOW_MAP_SIZE`] texels.
    pub fn new(ctx: &VulkanContext, pass: vk::RenderPass) -> Result<Self, ResourceError> {
        let extent = Extent2D::new(SHADOW_MAP_SIZE, SHADOW_MAP_SIZE);
        let depth = Attachment::new(
            ctx,
            ImageDesc::new(
                extent,
                SHADOW_FORMAT,
                vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT | vk::ImageUsageFlags::SAMPLED,
            ),
        )?;
        let sampler = match create_sampler(ctx, SamplerKind::Shadow) {
            Ok(sampler) => sampler,
            Err(e) => {
                depth.destroy(&ctx.device);
                return Err(e);
            }
        };
        match create_framebuffer(&ctx.device, pass, &[depth.view], extent) {
            Ok(framebuffer) => {
                log::debug!("Shadow map created: {SHADOW_MAP_SIZE}x{SHADOW_MAP_SIZE}");
                Ok(Self {
                    depth,
                    sampler,
                    framebuffer,
                    extent,
                })
            }
            Err(e) => {
                unsafe { ctx.device.destroy_sampler(sampler, None) };
                depth.destroy(&ctx.device);
                Err(e)
            }
        }
    }

    /// The descriptor the shadow map binds as.
    pub fn descriptor(&self) -> vk::DescriptorImageInfo {
        vk::DescriptorImageInfo {
            sampler: self.sampler,
            image_view: self.depth.view,
            image_layout: vk::ImageLayout::DEPTH_STENCIL_READ_ONLY_OPTIMAL,
        }
    }

    /// Destroys framebuffer, sampler and attachment.
    pub fn destroy(self, device: &Device) {
        unsafe {
            device.destroy_framebuffer(self.framebuffer, None);
            device.destroy_sampler(self.sampler, None);
        }
        self.depth.destroy(device);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_sample_renders_into_the_presentable_image() {
        assert_eq!(main_color_attachment(SampleCount::X1), PRESENT_ATTACHMENT);
        assert_eq!(main_color_attachment(SampleCount::X4), MSAA_COLOR_ATTACHMENT);
    }
}
