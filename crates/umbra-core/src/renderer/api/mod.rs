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

//! Backend-agnostic rendering API.
//!
//! - **[`common`]**: extents, clear values, pass kinds and the fixed render constants.
//! - **[`ids`]**: opaque handles to backend-owned resources.
//! - **[`keys`]** and **[`registry`]**: enumerated registry keys and the create-or-fetch cache.
//! - **[`memory`]**, **[`image`]**, **[`present`]**: allocation, mip and swapchain policy math.
//! - **[`vertex`]** and **[`uniforms`]**: the byte layouts the shaders consume.

pub mod common;
pub mod flags;
pub mod ids;
pub mod image;
pub mod keys;
pub mod memory;
pub mod present;
pub mod registry;
pub mod uniforms;
pub mod vertex;

pub use self::common::*;
pub use self::flags::{BufferUsage, MemoryPropertyFlags, ShaderStageFlags};
pub use self::ids::*;
pub use self::keys::{
    BindingDesc, BindingKind, DescriptorSetKey, PipelineDesc, PipelineKey, PipelineLayoutKey,
    SetLayoutKey,
};
pub use self::registry::Registry;
pub use self::vertex::Vertex;
