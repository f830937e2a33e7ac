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

use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use std::sync::Arc;

/// The windowing handle traits a graphics backend needs to create a surface.
pub trait WindowHandle: HasWindowHandle + HasDisplayHandle {}

impl<T: HasWindowHandle + HasDisplayHandle> WindowHandle for T {}

/// A shared, thread-safe handle to a window, kept alive by the surface that uses it.
pub type UmbraWindowHandle = Arc<dyn WindowHandle + Send + Sync>;

/// A window the renderer can present into.
///
/// Any windowing backend can implement this trait; `umbra-infra` implements it for winit.
pub trait UmbraWindow: HasWindowHandle + HasDisplayHandle + Send + Sync {
    /// Returns the physical dimensions (width, height) of the window's inner area.
    ///
    /// Either dimension is zero while the window is minimized.
    fn inner_size(&self) -> (u32, u32);

    /// Requests that the window be redrawn.
    fn request_redraw(&self);

    /// Grabs and hides the cursor, or releases it.
    fn set_cursor_captured(&self, captured: bool);

    /// Clones a shared handle to the window for surface creation.
    fn clone_handle_arc(&self) -> UmbraWindowHandle;
}
