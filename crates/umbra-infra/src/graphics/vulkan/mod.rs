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

//! The Vulkan backend, built on `ash`.
//!
//! [`VulkanRenderer`] implements every rendering trait of `umbra-core`. The other modules
//! are its building blocks, each owning one family of GPU objects.

mod command;
pub mod context;
pub mod conversions;
mod device;
pub mod image;
pub mod memory;
pub mod pipelines;
mod renderer;
pub mod swapchain;
pub mod sync;
pub mod targets;
pub mod uniforms;

pub use self::renderer::{VulkanRenderer, VulkanRendererConfig};
