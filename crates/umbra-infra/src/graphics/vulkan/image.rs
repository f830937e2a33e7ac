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

//! Images, views, samplers, layout transitions and mip generation.

use super::context::VulkanContext;
use super::conversions::{backend_error, IntoVk};
use super::memory::{create_staging_buffer, GpuAllocation};
use ash::{vk, Device};
use umbra_core::renderer::api::common::Extent2D;
use umbra_core::renderer::api::flags::MemoryPropertyFlags;
use umbra_core::renderer::api::image::{mip_blits, ImageLayout, LayoutTransition, SampleCount};
use umbra_core::renderer::error::{ResourceError, ResourceKind};
use umbra_core::scene::texture::{CubemapData, TextureData};

/// Format of every sampled color texture.
pub const TEXTURE_FORMAT: vk::Format = vk::Format::R8G8B8A8_UNORM;

/// Format of the shadow depth target.
pub const SHADOW_FORMAT: vk::Format = vk::Format::D16_UNORM;

/// Parameters of [`create_image`].
#[derive(Debug, Clone, Copy)]
pub struct ImageDesc {
    /// Size of level 0.
    pub extent: Extent2D,
    /// Mip level count.
    pub mip_levels: u32,
    /// Array layer count; 6 for cubemaps.
    pub layers: u32,
    /// Samples per texel.
    pub samples: SampleCount,
    /// Texel format.
    pub format: vk::Format,
    /// Allowed usages.
    pub usage: vk::ImageUsageFlags,
    /// Whether the image can back a cube view.
    pub cube_compatible: bool,
}

impl ImageDesc {
    /// A single-sampled, single-layer 2D image with one mip level.
    pub fn new(extent: Extent2D, format: vk::Format, usage: vk::ImageUsageFlags) -> Self {
        Self {
            extent,
            mip_levels: 1,
            layers: 1,
            samples: SampleCount::X1,
            format,
            usage,
            cube_compatible: false,
        }
    }
}

/// An image and its dedicated device-local allocation.
#[derive(Debug)]
pub struct AllocatedImage {
    /// The image handle.
    pub image: vk::Image,
    /// Its memory.
    pub allocation: GpuAllocation,
    /// How it was created.
    pub desc: ImageDesc,
}

impl AllocatedImage {
    /// Destroys the image, then frees its memory.
    pub fn destroy(self, device: &Device) {
        unsafe { device.destroy_image(self.image, None) };
        self.allocation.release(device);
    }
}

/// Creates an optimally tiled image in device-local memory.
pub fn create_image(ctx: &VulkanContext, desc: ImageDesc) -> Result<AllocatedImage, ResourceError> {
    let params = || {
        format!(
            "{}x{} mips={} layers={} samples={:?} format={:?} usage={:?}",
            desc.extent.width,
            desc.extent.height,
            desc.mip_levels,
            desc.layers,
            desc.samples,
            desc.format,
            desc.usage
        )
    };
    let flags = if desc.cube_compatible {
        vk::ImageCreateFlags::CUBE_COMPATIBLE
    } else {
        vk::ImageCreateFlags::empty()
    };
    let info = vk::ImageCreateInfo::default()
        .flags(flags)
        .image_type(vk::ImageType::TYPE_2D)
        .extent(vk::Extent3D {
            width: desc.extent.width,
            height: desc.extent.height,
            depth: 1,
        })
        .mip_levels(desc.mip_levels)
        .array_layers(desc.layers)
        .format(desc.format)
        .tiling(vk::ImageTiling::OPTIMAL)
        .initial_layout(vk::ImageLayout::UNDEFINED)
        .usage(desc.usage)
        .samples(desc.samples.into_vk())
        .sharing_mode(vk::SharingMode::EXCLUSIVE);
    let image = unsafe { ctx.device.create_image(&info, None) }
        .map_err(|e| backend_error(ResourceKind::Image, params(), e))?;

    let requirements = unsafe { ctx.device.get_image_memory_requirements(image) };
    let allocation =
        match GpuAllocation::allocate(ctx, requirements, MemoryPropertyFlags::DEVICE_LOCAL) {
            Ok(allocation) => allocation,
            Err(e) => {
                unsafe { ctx.device.destroy_image(image, None) };
                return Err(e);
            }
        };
    if let Err(e) = unsafe { ctx.device.bind_image_memory(image, allocation.memory(), 0) } {
        unsafe { ctx.device.destroy_image(image, None) };
        allocation.release(&ctx.device);
        return Err(backend_error(ResourceKind::Memory, params(), e));
    }
    log::debug!("Created image: {}", params());
    Ok(AllocatedImage {
        image,
        allocation,
        desc,
    })
}

/// Aspect mask of an attachment in `format`.
pub fn aspect_for(format: vk::Format) -> vk::ImageAspectFlags {
    match format {
        vk::Format::D16_UNORM | vk::Format::D32_SFLOAT | vk::Format::X8_D24_UNORM_PACK32 => {
            vk::ImageAspectFlags::DEPTH
        }
        vk::Format::D16_UNORM_S8_UINT
        | vk::Format::D24_UNORM_S8_UINT
        | vk::Format::D32_SFLOAT_S8_UINT => {
            vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
        }
        _ => vk::ImageAspectFlags::COLOR,
    }
}

/// Creates a view over every level and layer of `image`.
pub fn create_image_view(
    device: &Device,
    image: vk::Image,
    format: vk::Format,
    aspect: vk::ImageAspectFlags,
    mip_levels: u32,
    view_type: vk::ImageViewType,
) -> Result<vk::ImageView, ResourceError> {
    let layers = if view_type == vk::ImageViewType::CUBE { 6 } else { 1 };
    let info = vk::ImageViewCreateInfo::default()
        .image(image)
        .view_type(view_type)
        .format(format)
        .subresource_range(vk::ImageSubresourceRange {
            aspect_mask: aspect,
            base_mip_level: 0,
            level_count: mip_levels,
            base_array_layer: 0,
            layer_count: layers,
        });
    unsafe { device.create_image_view(&info, None) }.map_err(|e| {
        backend_error(
            ResourceKind::ImageView,
            format!("format={format:?} type={view_type:?} mips={mip_levels}"),
            e,
        )
    })
}

fn color_range(base_mip_level: u32, level_count: u32, layers: u32) -> vk::ImageSubresourceRange {
    vk::ImageSubresourceRange {
        aspect_mask: vk::ImageAspectFlags::COLOR,
        base_mip_level,
        level_count,
        base_array_layer: 0,
        layer_count: layers,
    }
}

/// Records a barrier moving every level and layer of a color image between two layouts.
///
/// Only the transitions [`LayoutTransition::resolve`] accepts are supported.
pub fn record_layout_transition(
    device: &Device,
    cmd: vk::CommandBuffer,
    image: &AllocatedImage,
    from: ImageLayout,
    to: ImageLayout,
) -> Result<(), ResourceError> {
    let transition = LayoutTransition::resolve(from, to)?;
    let (src_access, dst_access) = transition.access();
    let (src_stage, dst_stage) = transition.stages();
    let barrier = vk::ImageMemoryBarrier::default()
        .old_layout(from.into_vk())
        .new_layout(to.into_vk())
        .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .image(image.image)
        .subresource_range(color_range(0, image.desc.mip_levels, image.desc.layers))
        .src_access_mask(src_access.into_vk())
        .dst_access_mask(dst_access.into_vk());
    unsafe {
        device.cmd_pipeline_barrier(
            cmd,
            src_stage.into_vk(),
            dst_stage.into_vk(),
            vk::DependencyFlags::empty(),
            &[],
            &[],
            &[barrier],
        );
    }
    Ok(())
}

/// Moves every level and layer of `image` from `from` to `to`, waiting for completion.
pub fn transition_image_layout(
    ctx: &VulkanContext,
    image: &AllocatedImage,
    from: ImageLayout,
    to: ImageLayout,
) -> Result<(), ResourceError> {
    // Rejected before any command buffer is allocated.
    LayoutTransition::resolve(from, to)?;
    let cmd = ctx.begin_single_time_commands()?;
    record_layout_transition(&ctx.device, cmd, image, from, to)?;
    ctx.end_single_time_commands(cmd)
}

/// Copies tightly packed layers from `buffer` into level 0 of `image`.
pub fn copy_buffer_to_image(
    ctx: &VulkanContext,
    buffer: vk::Buffer,
    image: &AllocatedImage,
    layer_size: u64,
) -> Result<(), ResourceError> {
    let regions: Vec<_> = (0..image.desc.layers)
        .map(|layer| {
            vk::BufferImageCopy::default()
                .buffer_offset(u64::from(layer) * layer_size)
                .image_subresource(vk::ImageSubresourceLayers {
                    aspect_mask: vk::ImageAspectFlags::COLOR,
                    mip_level: 0,
                    base_array_layer: layer,
                    layer_count: 1,
                })
                .image_extent(vk::Extent3D {
                    width: image.desc.extent.width,
                    height: image.desc.extent.height,
                    depth: 1,
                })
        })
        .collect();
    let cmd = ctx.begin_single_time_commands()?;
    unsafe {
        ctx.device.cmd_copy_buffer_to_image(
            cmd,
            buffer,
            image.image,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            &regions,
        );
    }
    ctx.end_single_time_commands(cmd)
}

fn mip_barrier(
    image: vk::Image,
    level: u32,
    old_layout: vk::ImageLayout,
    new_layout: vk::ImageLayout,
    src_access: vk::AccessFlags,
    dst_access: vk::AccessFlags,
) -> vk::ImageMemoryBarrier<'static> {
    vk::ImageMemoryBarrier::default()
        .image(image)
        .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .subresource_range(color_range(level, 1, 1))
        .old_layout(old_layout)
        .new_layout(new_layout)
        .src_access_mask(src_access)
        .dst_access_mask(dst_access)
}

fn blit_offsets((width, height): (u32, u32)) -> [vk::Offset3D; 2] {
    [
        vk::Offset3D::default(),
        vk::Offset3D {
            x: width as i32,
            y: height as i32,
            z: 1,
        },
    ]
}

/// Fills levels `1..mip_levels` of a 2D image by repeated linear blits from level 0.
///
/// Every level must be in `TRANSFER_DST_OPTIMAL` on entry; all of them end in
/// `SHADER_READ_ONLY_OPTIMAL`.
///
/// ## Errors
///
/// Returns [`ResourceError::UnsupportedBlitFormat`] if the format cannot be filtered
/// linearly, before any command is recorded.
pub fn generate_mipmaps(ctx: &VulkanContext, image: &AllocatedImage) -> Result<(), ResourceError> {
    let format = image.desc.format;
    if !ctx
        .format_properties(format)
        .optimal_tiling_features
        .contains(vk::FormatFeatureFlags::SAMPLED_IMAGE_FILTER_LINEAR)
    {
        return Err(ResourceError::UnsupportedBlitFormat {
            format: format!("{format:?}"),
        });
    }

    let device = &ctx.device;
    let levels = image.desc.mip_levels;
    let blits = mip_blits(image.desc.extent.width, image.desc.extent.height, levels);
    let cmd = ctx.begin_single_time_commands()?;
    unsafe {
        for (index, &(src, dst)) in blits.iter().enumerate() {
            let src_level = index as u32;
            let to_src = mip_barrier(
                image.image,
                src_level,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
                vk::AccessFlags::TRANSFER_WRITE,
                vk::AccessFlags::TRANSFER_READ,
            );
            device.cmd_pipeline_barrier(
                cmd,
                vk::PipelineStageFlags::TRANSFER,
                vk::PipelineStageFlags::TRANSFER,
                vk::DependencyFlags::empty(),
                &[],
                &[],
                &[to_src],
            );

            let blit = vk::ImageBlit {
                src_subresource: vk::ImageSubresourceLayers {
                    aspect_mask: vk::ImageAspectFlags::COLOR,
                    mip_level: src_level,
                    base_array_layer: 0,
                    layer_count: 1,
                },
                src_offsets: blit_offsets(src),
                dst_subresource: vk::ImageSubresourceLayers {
                    aspect_mask: vk::ImageAspectFlags::COLOR,
                    mip_level: src_level + 1,
                    base_array_layer: 0,
                    layer_count: 1,
                },
                dst_offsets: blit_offsets(dst),
            };
            device.cmd_blit_image(
                cmd,
                image.image,
                vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
                image.image,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &[blit],
                vk::Filter::LINEAR,
            );

            let to_read = mip_barrier(
                image.image,
                src_level,
                vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
                vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
                vk::AccessFlags::TRANSFER_READ,
                vk::AccessFlags::SHADER_READ,
            );
            device.cmd_pipeline_barrier(
                cmd,
                vk::PipelineStageFlags::TRANSFER,
                vk::PipelineStageFlags::FRAGMENT_SHADER,
                vk::DependencyFlags::empty(),
                &[],
                &[],
                &[to_read],
            );
        }

        // The last level was only ever written.
        let last = mip_barrier(
            image.image,
            levels.saturating_sub(1),
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            vk::AccessFlags::TRANSFER_WRITE,
            vk::AccessFlags::SHADER_READ,
        );
        device.cmd_pipeline_barrier(
            cmd,
            vk::PipelineStageFlags::TRANSFER,
            vk::PipelineStageFlags::FRAGMENT_SHADER,
            vk::DependencyFlags::empty(),
            &[],
            &[],
            &[last],
        );
    }
    ctx.end_single_time_commands(cmd)
}

/// The three sampler configurations the renderer uses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SamplerKind {
    /// Repeating, anisotropic, trilinear over `mip_levels` levels.
    Texture {
        /// Mip levels of the sampled texture.
        mip_levels: u32,
    },
    /// Clamped, linear, for the skybox cubemap.
    Skybox,
    /// Clamped to an opaque white border, for the shadow map.
    Shadow,
}

/// Creates a sampler of the given kind.
pub fn create_sampler(ctx: &VulkanContext, kind: SamplerKind) -> Result<vk::Sampler, ResourceError> {
    let base = vk::SamplerCreateInfo::default()
        .mag_filter(vk::Filter::LINEAR)
        .min_filter(vk::Filter::LINEAR)
        .mipmap_mode(vk::SamplerMipmapMode::LINEAR)
        .unnormalized_coordinates(false)
        .compare_enable(false)
        .compare_op(vk::CompareOp::ALWAYS)
        .mip_lod_bias(0.0)
        .min_lod(0.0);
    let info = match kind {
        SamplerKind::Texture { mip_levels } => {
            let info = base
                .address_mode_u(vk::SamplerAddressMode::REPEAT)
                .address_mode_v(vk::SamplerAddressMode::REPEAT)
                .address_mode_w(vk::SamplerAddressMode::REPEAT)
                .border_color(vk::BorderColor::INT_OPAQUE_BLACK)
                .max_lod(mip_levels as f32);
            match ctx.max_anisotropy {
                Some(max) => info.anisotropy_enable(true).max_anisotropy(max.min(16.0)),
                None => info.anisotropy_enable(false).max_anisotropy(1.0),
            }
        }
        SamplerKind::Skybox => base
            .address_mode_u(vk::SamplerAddressMode::CLAMP_TO_EDGE)
            .address_mode_v(vk::SamplerAddressMode::CLAMP_TO_EDGE)
            .address_mode_w(vk::SamplerAddressMode::CLAMP_TO_EDGE)
            .border_color(vk::BorderColor::FLOAT_OPAQUE_WHITE)
            .max_anisotropy(1.0)
            .max_lod(1.0),
        SamplerKind::Shadow => base
            .address_mode_u(vk::SamplerAddressMode::CLAMP_TO_BORDER)
            .address_mode_v(vk::SamplerAddressMode::CLAMP_TO_BORDER)
            .address_mode_w(vk::SamplerAddressMode::CLAMP_TO_BORDER)
            .border_color(vk::BorderColor::FLOAT_OPAQUE_WHITE)
            .max_anisotropy(1.0)
            .max_lod(1.0),
    };
    unsafe { ctx.device.create_sampler(&info, None) }
        .map_err(|e| backend_error(ResourceKind::Sampler, format!("{kind:?}"), e))
}

/// A sampled image: image, view and its own sampler.
#[derive(Debug)]
pub struct GpuTexture {
    /// The image.
    pub image: AllocatedImage,
    /// A view over all levels (and all faces for a cubemap).
    pub view: vk::ImageView,
    /// The sampler it is bound with.
    pub sampler: vk::Sampler,
}

impl GpuTexture {
    /// Destroys sampler, view and image.
    pub fn destroy(self, device: &Device) {
        unsafe {
            device.destroy_sampler(self.sampler, None);
            device.destroy_image_view(self.view, None);
        }
        self.image.destroy(device);
    }

    /// The descriptor this texture binds as.
    pub fn descriptor(&self) -> vk::DescriptorImageInfo {
        vk::DescriptorImageInfo {
            sampler: self.sampler,
            image_view: self.view,
            image_layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        }
    }
}

fn finish_texture(
    ctx: &VulkanContext,
    image: AllocatedImage,
    view_type: vk::ImageViewType,
    sampler: SamplerKind,
) -> Result<GpuTexture, ResourceError> {
    let view = match create_image_view(
        &ctx.device,
        image.image,
        image.desc.format,
        vk::ImageAspectFlags::COLOR,
        image.desc.mip_levels,
        view_type,
    ) {
        Ok(view) => view,
        Err(e) => {
            image.destroy(&ctx.device);
            return Err(e);
        }
    };
    match create_sampler(ctx, sampler) {
        Ok(sampler) => Ok(GpuTexture {
            image,
            view,
            sampler,
        }),
        Err(e) => {
            unsafe { ctx.device.destroy_image_view(view, None) };
            image.destroy(&ctx.device);
            Err(e)
        }
    }
}

/// Uploads an RGBA8 texture, then generates its full mip chain.
pub fn create_texture(ctx: &VulkanContext, data: &TextureData) -> Result<GpuTexture, ResourceError> {
    let staging = create_staging_buffer(ctx, &data.pixels)?;
    let mut desc = ImageDesc::new(
        Extent2D::new(data.width, data.height),
        TEXTURE_FORMAT,
        vk::ImageUsageFlags::TRANSFER_SRC
            | vk::ImageUsageFlags::TRANSFER_DST
            | vk::ImageUsageFlags::SAMPLED,
    );
    desc.mip_levels = data.mip_levels();

    let uploaded = create_image(ctx, desc).and_then(|image| {
        let filled = transition_image_layout(ctx, &image, ImageLayout::Undefined, ImageLayout::TransferDst)
            .and_then(|()| copy_buffer_to_image(ctx, staging.buffer, &image, data.byte_len()))
            .and_then(|()| generate_mipmaps(ctx, &image));
        match filled {
            Ok(()) => Ok(image),
            Err(e) => {
                image.destroy(&ctx.device);
                Err(e)
            }
        }
    });
    staging.destroy(&ctx.device);

    let image = uploaded?;
    let mip_levels = image.desc.mip_levels;
    let texture = finish_texture(
        ctx,
        image,
        vk::ImageViewType::TYPE_2D,
        SamplerKind::Texture { mip_levels },
    )?;
    log::debug!(
        "Texture uploaded: {}x{} with {} mip levels",
        data.width,
        data.height,
        mip_levels
    );
    Ok(texture)
}

/// Uploads six square faces into a cube-compatible image with a single mip level.
pub fn create_cubemap(ctx: &VulkanContext, data: &CubemapData) -> Result<GpuTexture, ResourceError> {
    let staging = create_staging_buffer(ctx, &data.contiguous())?;
    let mut desc = ImageDesc::new(
        Extent2D::new(data.size, data.size),
        TEXTURE_FORMAT,
        vk::ImageUsageFlags::TRANSFER_DST | vk::ImageUsageFlags::SAMPLED,
    );
    desc.layers = 6;
    desc.cube_compatible = true;

    let uploaded = create_image(ctx, desc).and_then(|image| {
        let filled = transition_image_layout(ctx, &image, ImageLayout::Undefined, ImageLayout::TransferDst)
            .and_then(|()| copy_buffer_to_image(ctx, staging.buffer, &image, data.face_len()))
            .and_then(|()| {
                transition_image_layout(
                    ctx,
                    &image,
                    ImageLayout::TransferDst,
                    ImageLayout::ShaderReadOnly,
                )
            });
        match filled {
            Ok(()) => Ok(image),
            Err(e) => {
                image.destroy(&ctx.device);
                Err(e)
            }
        }
    });
    staging.destroy(&ctx.device);

    let texture = finish_texture(ctx, uploaded?, vk::ImageViewType::CUBE, SamplerKind::Skybox)?;
    log::debug!("Cubemap uploaded: 6 faces of {}x{}", data.size, data.size);
    Ok(texture)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_aspects() {
        assert_eq!(aspect_for(SHADOW_FORMAT), vk::ImageAspectFlags::DEPTH);
        assert_eq!(
            aspect_for(vk::Format::D24_UNORM_S8_UINT),
            vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
        );
        assert_eq!(aspect_for(TEXTURE_FORMAT), vk::ImageAspectFlags::COLOR);
    }

    #[test]
    fn test_blit_offsets_cover_the_level() {
        let [origin, corner] = blit_offsets((256, 150));
        assert_eq!((origin.x, origin.y, origin.z), (0, 0, 0));
        assert_eq!((corner.x, corner.y, corner.z), (256, 150, 1));
    }

    #[test]
    fn test_mip_barrier_targets_one_level() {
        let b = mip_barrier(
            vk::Image::null(),
            3,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
            vk::AccessFlags::TRANSFER_WRITE,
            vk::AccessFlags::TRANSFER_READ,
        );
        assert_eq!(b.subresource_range.base_mip_level, 3);
        assert_eq!(b.subresource_range.level_count, 1);
        assert_eq!(b.old_layout, vk::ImageLayout::TRANSFER_DST_OPTIMAL);
    }
}
