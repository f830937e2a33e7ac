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

//! Defines the hierarchy of error types for the rendering subsystem.
//!
//! Every fatal variant carries enough context to produce a structured diagnostic:
//! which kind of resource failed, with which parameters, and the API result code.

use crate::renderer::api::image::ImageLayout;
use crate::renderer::api::flags::MemoryPropertyFlags;
use std::fmt;

/// The kind of GPU object an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Device memory.
    Memory,
    /// A buffer object.
    Buffer,
    /// An image object.
    Image,
    /// An image view.
    ImageView,
    /// A sampler.
    Sampler,
    /// A shader module.
    ShaderModule,
    /// A descriptor set layout.
    DescriptorSetLayout,
    /// A descriptor pool or descriptor set.
    DescriptorSet,
    /// A pipeline layout.
    PipelineLayout,
    /// A graphics pipeline.
    Pipeline,
    /// A render pass.
    RenderPass,
    /// A framebuffer.
    Framebuffer,
    /// A command pool or command buffer.
    CommandBuffer,
    /// A fence or semaphore.
    SyncObject,
    /// A uniform block (staging and device pair).
    UniformBlock,
    /// A texture (image, view and sampler).
    Texture,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// An error raised while creating, mapping or using a GPU resource.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceError {
    /// No memory type matches both the resource's type bits and the requested properties.
    NoSuitableMemoryType {
        /// The memory type bitmask reported by the resource's requirements.
        type_bits: u32,
        /// The property flags that were requested.
        properties: MemoryPropertyFlags,
    },
    /// A backend call creating or binding a resource failed.
    Backend {
        /// The kind of resource being created.
        kind: ResourceKind,
        /// The requested parameters, rendered for the diagnostic.
        params: String,
        /// The underlying API result code.
        code: String,
    },
    /// An image layout transition outside the supported set was requested.
    UnsupportedLayoutTransition {
        /// The layout the image was in.
        from: ImageLayout,
        /// The layout that was requested.
        to: ImageLayout,
    },
    /// The image format cannot be used as a linear-filtered blit source for mip generation.
    UnsupportedBlitFormat {
        /// The format, rendered for the diagnostic.
        format: String,
    },
    /// A map or unmap call broke the strict map/unmap nesting of an allocation.
    InvalidMapState {
        /// What was attempted.
        operation: &'static str,
    },
    /// A write went past the end of a mapped allocation.
    OutOfBounds {
        /// The allocation size in bytes.
        size: u64,
        /// The requested write end offset in bytes.
        requested: u64,
    },
    /// An id did not refer to a live resource of this kind.
    UnknownHandle {
        /// The kind of resource looked up.
        kind: ResourceKind,
        /// The id's raw index.
        index: usize,
    },
    /// A file required to build a resource could not be read.
    MissingFile {
        /// The path that could not be read.
        path: String,
        /// The I/O error message.
        reason: String,
    },
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::NoSuitableMemoryType {
                type_bits,
                properties,
            } => write!(
                f,
                "No memory type in mask {type_bits:#b} satisfies {properties:?}"
            ),
            ResourceError::Backend { kind, params, code } => {
                write!(f, "Failed to create {kind} ({params}): {code}")
            }
            ResourceError::UnsupportedLayoutTransition { from, to } => {
                write!(f, "Unsupported layout transition: {from:?} -> {to:?}")
            }
            ResourceError::UnsupportedBlitFormat { format } => write!(
                f,
                "Texture image format {format} does not support linear blitting"
            ),
            ResourceError::InvalidMapState { operation } => {
                write!(f, "Invalid map state for operation '{operation}'")
            }
            ResourceError::OutOfBounds { size, requested } => write!(
                f,
                "Write of {requested} bytes exceeds allocation of {size} bytes"
            ),
            ResourceError::UnknownHandle { kind, index } => {
                write!(f, "No live {kind} with id {index}")
            }
            ResourceError::MissingFile { path, reason } => {
                write!(f, "Failed to read '{path}': {reason}")
            }
        }
    }
}

impl std::error::Error for ResourceError {}

/// An error raised by the presentation surface or the frame synchronization objects.
#[derive(Debug, Clone, PartialEq)]
pub enum PresentError {
    /// The presentable chain no longer matches the surface and must be recreated.
    OutOfDate,
    /// A backend call failed.
    Backend {
        /// The operation that failed (e.g. "acquire", "present", "wait_for_fences").
        operation: &'static str,
        /// The underlying API result code.
        code: String,
    },
}

impl fmt::Display for PresentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PresentError::OutOfDate => write!(f, "Presentation surface is out of date"),
            PresentError::Backend { operation, code } => {
                write!(f, "Presentation operation '{operation}' failed: {code}")
            }
        }
    }
}

impl std::error::Error for PresentError {}

/// A high-level error that can occur while initializing or running the renderer.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderError {
    /// A fatal failure while bringing up the instance, device, surface or pipelines.
    Initialization {
        /// The initialization stage that failed.
        stage: &'static str,
        /// A description of the failure, including the API result code.
        details: String,
    },
    /// A resource operation failed.
    Resource(ResourceError),
    /// A presentation or synchronization operation failed.
    Present(PresentError),
    /// A frame operation was requested before the scene was prepared.
    NotPrepared(&'static str),
    /// A command could not be recorded into the frame's command buffer.
    Recording {
        /// The recorder command that failed.
        command: &'static str,
        /// What the command referred to that was missing.
        details: String,
    },
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Initialization { stage, details } => {
                write!(f, "Renderer initialization failed at '{stage}': {details}")
            }
            RenderError::Resource(e) => write!(f, "Resource error: {e}"),
            RenderError::Present(e) => write!(f, "Presentation error: {e}"),
            RenderError::NotPrepared(what) => write!(f, "'{what}' used before preparation"),
            RenderError::Recording { command, details } => {
                write!(f, "Recording '{command}' failed: {details}")
            }
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Resource(e) => Some(e),
            RenderError::Present(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ResourceError> for RenderError {
    fn from(e: ResourceError) -> Self {
        RenderError::Resource(e)
    }
}

impl From<PresentError> for RenderError {
    fn from(e: PresentError) -> Self {
        RenderError::Present(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_transition_diagnostic_names_both_layouts() {
        let e = ResourceError::UnsupportedLayoutTransition {
            from: ImageLayout::ShaderReadOnly,
            to: ImageLayout::TransferDst,
        };
        let msg = e.to_string();
        assert!(msg.contains("ShaderReadOnly"));
        assert!(msg.contains("TransferDst"));
    }

    #[test]
    fn test_render_error_keeps_source_chain() {
        use std::error::Error;
        let e: RenderError = ResourceError::UnsupportedBlitFormat {
            format: "R8G8B8A8_SRGB".into(),
        }
        .into();
        assert!(e.source().is_some());
        assert!(e.to_string().contains("linear blitting"));
    }

    #[test]
    fn test_recording_error_names_the_command() {
        let e = RenderError::Recording {
            command: "bind_pipeline",
            details: "pipeline Shadow was never created".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("bind_pipeline"));
        assert!(msg.contains("Shadow"));
    }
}
