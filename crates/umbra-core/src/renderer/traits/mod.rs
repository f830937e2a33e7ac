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

//! Defines the core architectural traits for the rendering subsystem.
//!
//! These contracts decouple the frame logic in `umbra-lanes` and `umbra-sdk` from the
//! Vulkan backend in `umbra-infra`.
//!
//! - [`GraphicsDevice`]: creates and updates GPU resources.
//! - [`CommandRecorder`]: records draw commands for the frame being built.
//! - [`FrameSync`]: per-slot synchronization around acquire, submit and present.
//! - [`RenderBackend`]: all three together, plus surface management.
//! - [`DebugOverlay`]: the debug interface drawn last in the main pass.

mod command_recorder;
mod frame_sync;
mod graphics_device;
mod overlay;

pub use self::command_recorder::CommandRecorder;
pub use self::frame_sync::{advance_slot, AcquireOutcome, FrameSync, PresentOutcome, RenderBackend};
pub use self::graphics_device::{write_uniform, DescriptorResource, DescriptorWrite, GraphicsDevice};
pub use self::overlay::{DebugOverlay, OverlayState};
