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

//! Image layouts, supported layout transitions, mip-chain math and MSAA sample counts.

use crate::renderer::error::ResourceError;

/// The layouts an image moves through in this renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageLayout {
    /// Contents are undefined; the initial layout of every image.
    Undefined,
    /// Optimal as a copy or blit destination.
    TransferDst,
    /// Optimal as a copy or blit source.
    TransferSrc,
    /// Optimal for sampling from shaders.
    ShaderReadOnly,
    /// Optimal as a color attachment.
    ColorAttachment,
    /// Optimal as a depth/stencil attachment.
    DepthStencilAttachment,
    /// Ready to be presented.
    PresentSrc,
}

/// Pipeline stage groups used in layout-transition barriers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarrierStage {
    /// Top of pipe.
    TopOfPipe,
    /// Transfer operations.
    Transfer,
    /// Fragment shader.
    FragmentShader,
    /// Color attachment output.
    ColorAttachmentOutput,
}

/// Memory access groups used in layout-transition barriers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarrierAccess {
    /// No access.
    None,
    /// Transfer write.
    TransferWrite,
    /// Shader read.
    ShaderRead,
    /// Color attachment read and write.
    ColorAttachmentReadWrite,
}

/// One of the layout transitions the renderer knows how to perform outside a render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutTransition {
    /// Fresh image about to receive a copy.
    UndefinedToTransferDst,
    /// Uploaded image about to be sampled.
    TransferDstToShaderRead,
    /// Fresh image about to be rendered into.
    UndefinedToColorAttachment,
}

impl LayoutTransition {
    /// Resolves a `(from, to)` pair into a supported transition.
    ///
    /// Any other pair is a fatal [`ResourceError::UnsupportedLayoutTransition`].
    pub fn resolve(from: ImageLayout, to: ImageLayout) -> Result<Self, ResourceError> {
        match (from, to) {
            (ImageLayout::Undefined, ImageLayout::TransferDst) => Ok(Self::UndefinedToTransferDst),
            (ImageLayout::TransferDst, ImageLayout::ShaderReadOnly) => {
                Ok(Self::TransferDstToShaderRead)
            }
            (ImageLayout::Undefined, ImageLayout::ColorAttachment) => {
                Ok(Self::UndefinedToColorAttachment)
            }
            _ => Err(ResourceError::UnsupportedLayoutTransition { from, to }),
        }
    }

    /// Source and destination access masks for the barrier.
    pub fn access(&self) -> (BarrierAccess, BarrierAccess) {
        match self {
            Self::UndefinedToTransferDst => (BarrierAccess::None, BarrierAccess::TransferWrite),
            Self::TransferDstToShaderRead => {
                (BarrierAccess::TransferWrite, BarrierAccess::ShaderRead)
            }
            Self::UndefinedToColorAttachment => {
                (BarrierAccess::None, BarrierAccess::ColorAttachmentReadWrite)
            }
        }
    }

    /// Source and destination pipeline stages for the barrier.
    pub fn stages(&self) -> (BarrierStage, BarrierStage) {
        match self {
            Self::UndefinedToTransferDst => (BarrierStage::TopOfPipe, BarrierStage::Transfer),
            Self::TransferDstToShaderRead => (BarrierStage::Transfer, BarrierStage::FragmentShader),
            Self::UndefinedToColorAttachment => {
                (BarrierStage::TopOfPipe, BarrierStage::ColorAttachmentOutput)
            }
        }
    }
}

/// Returns the number of mip levels for a full chain: `floor(log2(max(w, h))) + 1`.
///
/// # Examples
///
/// ```
/// use umbra_core::renderer::api::image::mip_levels;
/// assert_eq!(mip_levels(513, 300), 10);
/// assert_eq!(mip_levels(1, 1), 1);
/// ```
pub fn mip_levels(width: u32, height: u32) -> u32 {
    let largest = width.max(height).max(1);
    u32::BITS - largest.leading_zeros()
}

/// Returns the blit regions for generating levels `1..levels` from level 0.
///
/// Each entry is `(source_extent, destination_extent)`; the destination halves the source
/// with floor division, clamped to 1 texel.
pub fn mip_blits(width: u32, height: u32, levels: u32) -> Vec<((u32, u32), (u32, u32))> {
    let mut blits = Vec::with_capacity(levels.saturating_sub(1) as usize);
    let (mut w, mut h) = (width.max(1), height.max(1));
    for _ in 1..levels {
        let next = ((w / 2).max(1), (h / 2).max(1));
        blits.push(((w, h), next));
        (w, h) = next;
    }
    blits
}

/// Number of samples per pixel of a render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum SampleCount {
    /// 1 sample (no multisampling).
    #[default]
    X1 = 1,
    /// 2 samples.
    X2 = 2,
    /// 4 samples.
    X4 = 4,
    /// 8 samples.
    X8 = 8,
    /// 16 samples.
    X16 = 16,
    /// 32 samples.
    X32 = 32,
    /// 64 samples.
    X64 = 64,
}

impl SampleCount {
    /// Returns the raw sample-count bit.
    pub const fn bits(self) -> u32 {
        self as u32
    }
}

/// Returns the highest sample count supported by both the color and depth framebuffer masks.
pub fn max_usable_sample_count(color_counts: u32, depth_counts: u32) -> SampleCount {
    let counts = color_counts & depth_counts;
    [
        SampleCount::X64,
        SampleCount::X32,
        SampleCount::X16,
        SampleCount::X8,
        SampleCount::X4,
        SampleCount::X2,
    ]
    .into_iter()
    .find(|s| counts & s.bits() != 0)
    .unwrap_or(SampleCount::X1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mip_levels() {
        assert_eq!(mip_levels(513, 300), 10);
        assert_eq!(mip_levels(512, 512), 10);
        assert_eq!(mip_levels(1024, 1), 11);
        assert_eq!(mip_levels(1, 1), 1);
        assert_eq!(mip_levels(0, 0), 1);
    }

    #[test]
    fn test_mip_blits_halve_with_floor_and_clamp() {
        let blits = mip_blits(513, 300, mip_levels(513, 300));
        assert_eq!(blits.len(), 9);
        assert_eq!(blits[0], ((513, 300), (256, 150)));
        assert_eq!(blits[1], ((256, 150), (128, 75)));
        assert_eq!(blits[2], ((128, 75), (64, 37)));
        assert_eq!(blits[8], ((2, 1), (1, 1)));
        let tall = mip_blits(1, 8, 4);
        assert_eq!(tall, vec![((1, 8), (1, 4)), ((1, 4), (1, 2)), ((1, 2), (1, 1))]);
    }

    #[test]
    fn test_supported_transitions() {
        use ImageLayout::*;
        assert_eq!(
            LayoutTransition::resolve(Undefined, TransferDst).unwrap(),
            LayoutTransition::UndefinedToTransferDst
        );
        assert_eq!(
            LayoutTransition::resolve(TransferDst, ShaderReadOnly).unwrap(),
            LayoutTransition::TransferDstToShaderRead
        );
        assert_eq!(
            LayoutTransition::resolve(Undefined, ColorAttachment).unwrap(),
            LayoutTransition::UndefinedToColorAttachment
        );
    }

    #[test]
    fn test_unsupported_transition_is_an_error() {
        use ImageLayout::*;
        let err = LayoutTransition::resolve(ShaderReadOnly, TransferDst).unwrap_err();
        assert_eq!(
            err,
            ResourceError::UnsupportedLayoutTransition {
                from: ShaderReadOnly,
                to: TransferDst
            }
        );
        assert!(LayoutTransition::resolve(Undefined, PresentSrc).is_err());
    }

    #[test]
    fn test_max_usable_sample_count() {
        assert_eq!(max_usable_sample_count(0b1111, 0b0111), SampleCount::X4);
        assert_eq!(max_usable_sample_count(0b1, 0b1), SampleCount::X1);
        assert_eq!(max_usable_sample_count(0x7f, 0x7f), SampleCount::X64);
    }
}
