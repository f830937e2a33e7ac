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

//! Opaque handles to backend-owned GPU resources.
//!
//! Ids are returned by a [`GraphicsDevice`](crate::renderer::traits::GraphicsDevice) and
//! resolved by the same backend when commands are recorded.

/// A device-local vertex or index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub usize);

/// A sampled texture (image, view and sampler).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub usize);

/// A uniform block: a persistently mapped staging buffer paired with a device-local buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformBlockId(pub usize);

/// A pre-recorded command buffer that copies staging uniform blocks to device memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CopyCommandId(pub usize);

/// A descriptor set allocated from the backend's pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DescriptorSetId(pub usize);
