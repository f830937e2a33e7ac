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

//! Provides the public, backend-agnostic rendering contracts.
//!
//! This module defines the 'what' of rendering: resource ids, registry keys, uniform
//! layouts, error types and the traits a backend implements. The 'how' lives in the Vulkan
//! backend of `umbra-infra`; `umbra-lanes` records passes against these traits without
//! knowing the API underneath.

pub mod api;
pub mod error;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod traits;

pub use self::api::*;
pub use self::error::{PresentError, RenderError, ResourceError, ResourceKind};
pub use self::traits::{
    CommandRecorder, DebugOverlay, FrameSync, GraphicsDevice, OverlayState, RenderBackend,
};
