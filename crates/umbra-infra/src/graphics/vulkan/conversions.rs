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

//! Conversions between the engine's backend-agnostic types and `ash::vk` types.

use ash::vk;
use umbra_core::renderer::api::common::{ClearValue, Extent2D};
use umbra_core::renderer::api::flags::{BufferUsage, MemoryPropertyFlags, ShaderStageFlags};
use umbra_core::renderer::api::image::{BarrierAccess, BarrierStage, ImageLayout, SampleCount};
use umbra_core::renderer::api::keys::{BindingKind, CompareOp, CullMode, FrontFace};
use umbra_core::renderer::api::memory::MemoryType;
use umbra_core::renderer::api::vertex::VertexFormat;
use umbra_core::renderer::error::{PresentError, ResourceError, ResourceKind};

/// A local extension trait to convert our engine's types into Vulkan types.
/// This avoids Rust's orphan rules while keeping an idiomatic `.into_vk()` syntax.
pub trait IntoVk<T> {
    /// Consumes self and converts it into a Vulkan type.
    fn into_vk(self) -> T;
}

// --- Dimensions and clear values ---

impl IntoVk<vk::Extent2D> for Extent2D {
    fn into_vk(self) -> vk::Extent2D {
        vk::Extent2D {
            width: self.width,
            height: self.height,
        }
    }
}

impl IntoVk<vk::Rect2D> for Extent2D {
    fn into_vk(self) -> vk::Rect2D {
        vk::Rect2D {
            offset: vk::Offset2D::default(),
            extent: self.into_vk(),
        }
    }
}

impl IntoVk<vk::ClearValue> for ClearValue {
    fn into_vk(self) -> vk::ClearValue {
        match self {
            ClearValue::Color(float32) => vk::ClearValue {
                color: vk::ClearColorValue { float32 },
            },
            ClearValue::Depth(depth) => vk::ClearValue {
                depth_stencil: vk::ClearDepthStencilValue { depth, stencil: 0 },
            },
        }
    }
}

/// Converts a Vulkan extent back into the engine's type.
pub fn extent_from_vk(extent: vk::Extent2D) -> Extent2D {
    Extent2D::new(extent.width, extent.height)
}

// --- Pipeline state ---

impl IntoVk<vk::CullModeFlags> for CullMode {
    fn into_vk(self) -> vk::CullModeFlags {
        match self {
            CullMode::Front => vk::CullModeFlags::FRONT,
            CullMode::Back => vk::CullModeFlags::BACK,
        }
    }
}

impl IntoVk<vk::FrontFace> for FrontFace {
    fn into_vk(self) -> vk::FrontFace {
        match self {
            FrontFace::CounterClockwise => vk::FrontFace::COUNTER_CLOCKWISE,
            FrontFace::Clockwise => vk::FrontFace::CLOCKWISE,
        }
    }
}

impl IntoVk<vk::CompareOp> for CompareOp {
    fn into_vk(self) -> vk::CompareOp {
        match self {
            CompareOp::Less => vk::CompareOp::LESS,
            CompareOp::LessOrEqual => vk::CompareOp::LESS_OR_EQUAL,
        }
    }
}

impl IntoVk<vk::Format> for VertexFormat {
    fn into_vk(self) -> vk::Format {
        match self {
            VertexFormat::Float32x2 => vk::Format::R32G32_SFLOAT,
            VertexFormat::Float32x3 => vk::Format::R32G32B32_SFLOAT,
        }
    }
}

impl IntoVk<vk::DescriptorType> for BindingKind {
    fn into_vk(self) -> vk::DescriptorType {
        match self {
            BindingKind::UniformBuffer => vk::DescriptorType::UNIFORM_BUFFER,
            BindingKind::CombinedImageSampler => vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
        }
    }
}

// --- Images and barriers ---

impl IntoVk<vk::ImageLayout> for ImageLayout {
    fn into_vk(self) -> vk::ImageLayout {
        match self {
            ImageLayout::Undefined => vk::ImageLayout::UNDEFINED,
            ImageLayout::TransferDst => vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            ImageLayout::TransferSrc => vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
            ImageLayout::ShaderReadOnly => vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            ImageLayout::ColorAttachment => vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            ImageLayout::DepthStencilAttachment => {
                vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL
            }
            ImageLayout::PresentSrc => vk::ImageLayout::PRESENT_SRC_KHR,
        }
    }
}

impl IntoVk<vk::PipelineStageFlags> for BarrierStage {
    fn into_vk(self) -> vk::PipelineStageFlags {
        match self {
            BarrierStage::TopOfPipe => vk::PipelineStageFlags::TOP_OF_PIPE,
            BarrierStage::Transfer => vk::PipelineStageFlags::TRANSFER,
            BarrierStage::FragmentShader => vk::PipelineStageFlags::FRAGMENT_SHADER,
            BarrierStage::ColorAttachmentOutput => {
                vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
            }
        }
    }
}

impl IntoVk<vk::AccessFlags> for BarrierAccess {
    fn into_vk(self) -> vk::AccessFlags {
        match self {
            BarrierAccess::None => vk::AccessFlags::empty(),
            BarrierAccess::TransferWrite => vk::AccessFlags::TRANSFER_WRITE,
            BarrierAccess::ShaderRead => vk::AccessFlags::SHADER_READ,
            BarrierAccess::ColorAttachmentReadWrite => {
                vk::AccessFlags::COLOR_ATTACHMENT_READ | vk::AccessFlags::COLOR_ATTACHMENT_WRITE
            }
        }
    }
}

impl IntoVk<vk::SampleCountFlags> for SampleCount {
    fn into_vk(self) -> vk::SampleCountFlags {
        vk::SampleCountFlags::from_raw(self.bits())
    }
}

// --- Flag sets. The engine's bits are the Vulkan bits. ---

impl IntoVk<vk::BufferUsageFlags> for BufferUsage {
    fn into_vk(self) -> vk::BufferUsageFlags {
        vk::BufferUsageFlags::from_raw(self.bits())
    }
}

impl IntoVk<vk::MemoryPropertyFlags> for MemoryPropertyFlags {
    fn into_vk(self) -> vk::MemoryPropertyFlags {
        vk::MemoryPropertyFlags::from_raw(self.bits())
    }
}

impl IntoVk<vk::ShaderStageFlags> for ShaderStageFlags {
    fn into_vk(self) -> vk::ShaderStageFlags {
        vk::ShaderStageFlags::from_raw(self.bits())
    }
}

/// The memory types reported by a physical device, in index order.
pub fn memory_types(properties: &vk::PhysicalDeviceMemoryProperties) -> Vec<MemoryType> {
    let count = (properties.memory_type_count as usize).min(vk::MAX_MEMORY_TYPES);
    properties.memory_types[..count]
        .iter()
        .map(|ty| MemoryType {
            property_flags: MemoryPropertyFlags::from_bits_truncate(ty.property_flags.as_raw()),
            heap_index: ty.heap_index,
        })
        .collect()
}

/// Renders a Vulkan result code for error diagnostics, e.g. `ERROR_OUT_OF_DEVICE_MEMORY`.
pub fn result_code(result: vk::Result) -> String {
    format!("{result:?}")
}

/// Wraps a failed Vulkan call into a structured resource diagnostic.
pub fn backend_error(kind: ResourceKind, params: String, result: vk::Result) -> ResourceError {
    ResourceError::Backend {
        kind,
        params,
        code: result_code(result),
    }
}

/// Wraps a failed presentation-path call. Out-of-date results keep their own variant.
pub fn present_error(operation: &'static str, result: vk::Result) -> PresentError {
    match result {
        vk::Result::ERROR_OUT_OF_DATE_KHR => PresentError::OutOfDate,
        other => PresentError::Backend {
            operation,
            code: result_code(other),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use umbra_core::renderer::api::memory::select_memory_type;

    #[test]
    fn test_flag_bits_match_vulkan() {
        let usage: vk::BufferUsageFlags = (BufferUsage::VERTEX | BufferUsage::TRANSFER_DST).into_vk();
        assert_eq!(
            usage,
            vk::BufferUsageFlags::VERTEX_BUFFER | vk::BufferUsageFlags::TRANSFER_DST
        );
        let props: vk::MemoryPropertyFlags = MemoryPropertyFlags::STAGING.into_vk();
        assert_eq!(
            props,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT
        );
        let stages: vk::ShaderStageFlags = ShaderStageFlags::VERTEX_FRAGMENT.into_vk();
        assert!(stages.contains(vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT));
    }

    #[test]
    fn test_sample_count_raw_value() {
        let s: vk::SampleCountFlags = SampleCount::X4.into_vk();
        assert_eq!(s, vk::SampleCountFlags::TYPE_4);
        let one: vk::SampleCountFlags = SampleCount::X1.into_vk();
        assert_eq!(one, vk::SampleCountFlags::TYPE_1);
    }

    #[test]
    fn test_depth_clear_value() {
        let v: vk::ClearValue = ClearValue::Depth(1.0).into_vk();
        // SAFETY: the depth variant was written just above.
        let depth = unsafe { v.depth_stencil.depth };
        assert_eq!(depth, 1.0);
    }

    #[test]
    fn test_memory_types_feed_first_fit_selection() {
        let mut properties = vk::PhysicalDeviceMemoryProperties {
            memory_type_count: 3,
            ..Default::default()
        };
        properties.memory_types[0].property_flags = vk::MemoryPropertyFlags::DEVICE_LOCAL;
        properties.memory_types[1].property_flags =
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT;
        properties.memory_types[2].property_flags = vk::MemoryPropertyFlags::HOST_VISIBLE
            | vk::MemoryPropertyFlags::HOST_COHERENT
            | vk::MemoryPropertyFlags::HOST_CACHED;

        let types = memory_types(&properties);
        assert_eq!(types.len(), 3);
        assert_eq!(
            select_memory_type(&types, 0b110, MemoryPropertyFlags::STAGING).unwrap(),
            1
        );
        assert_eq!(
            select_memory_type(&types, 0b100, MemoryPropertyFlags::STAGING).unwrap(),
            2
        );
        assert!(select_memory_type(&types, 0b110, MemoryPropertyFlags::DEVICE_LOCAL).is_err());
    }

    #[test]
    fn test_result_code_names_the_error() {
        assert_eq!(
            result_code(vk::Result::ERROR_OUT_OF_DATE_KHR),
            "ERROR_OUT_OF_DATE_KHR"
        );
    }

    #[test]
    fn test_present_error_keeps_out_of_date_distinct() {
        assert_eq!(
            present_error("acquire", vk::Result::ERROR_OUT_OF_DATE_KHR),
            PresentError::OutOfDate
        );
        assert!(matches!(
            present_error("present", vk::Result::ERROR_DEVICE_LOST),
            PresentError::Backend { operation: "present", .. }
        ));
    }
}
