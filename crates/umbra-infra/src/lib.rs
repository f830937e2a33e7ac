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

//! # Umbra Infra
//!
//! Concrete implementations of the contracts defined in `umbra-core`: a Vulkan backend
//! built on `ash`, and the `winit` window and input translation.

#![warn(missing_docs)]

pub mod graphics;
pub mod platform;

pub use graphics::vulkan::{VulkanRenderer, VulkanRendererConfig};
pub use platform::input::InputState;
pub use platform::window::{WinitWindow, WinitWindowBuilder};
