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

use super::command_recorder::CommandRecorder;
use super::graphics_device::GraphicsDevice;
use crate::renderer::api::common::Extent2D;
use crate::renderer::error::{PresentError, RenderError};

/// The result of asking the presentation surface for its next image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// The index of the acquired presentable image.
    Image(u32),
    /// The chain no longer matches the surface; the frame must be skipped.
    OutOfDate,
}

/// The result of presenting a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentOutcome {
    /// The image was queued for display.
    Presented,
    /// The image was queued but the chain should be recreated before the next frame.
    Suboptimal,
}

/// Per-slot fences and semaphores coordinating acquire, submit and present.
///
/// There is one slot per presentable image. Fences start signaled, so waiting on a slot
/// that was never submitted returns immediately. Every wait is unbounded.
pub trait FrameSync {
    /// Number of in-flight slots; equals the presentable image count.
    fn slot_count(&self) -> usize;

    /// Blocks until the GPU has finished the last submission made from `slot`.
    fn wait_for_slot(&mut self, slot: usize) -> Result<(), PresentError>;

    /// Requests the next presentable image, signaling the slot's image-available semaphore.
    fn acquire(&mut self, slot: usize) -> Result<AcquireOutcome, PresentError>;

    /// Returns the slot's fence to the unsignaled state.
    fn reset_slot(&mut self, slot: usize) -> Result<(), PresentError>;

    /// Submits the slot's recorded command buffer. The submission waits on image-available at
    /// the color-attachment-output stage and signals render-finished and the slot's fence.
    fn submit(&mut self, slot: usize) -> Result<(), PresentError>;

    /// Blocks until the graphics queue is idle.
    fn wait_idle(&mut self) -> Result<(), PresentError>;

    /// Queues `image_index` for display once the slot's render-finished semaphore fires.
    fn present(&mut self, slot: usize, image_index: u32) -> Result<PresentOutcome, PresentError>;
}

/// The slot that follows `slot`, wrapping at `slot_count`.
///
/// # Examples
///
/// ```
/// use umbra_core::renderer::traits::advance_slot;
/// assert_eq!(advance_slot(1, 3), 2);
/// assert_eq!(advance_slot(2, 3), 0);
/// ```
pub fn advance_slot(slot: usize, slot_count: usize) -> usize {
    if slot_count == 0 {
        0
    } else {
        (slot + 1) % slot_count
    }
}

/// A complete renderer backend: resource creation, command recording and presentation.
///
/// Recording goes through the [`CommandRecorder`] half, which writes into the command
/// buffer opened by [`RenderBackend::begin_commands`].
pub trait RenderBackend: GraphicsDevice + CommandRecorder + FrameSync {
    /// The current size of the presentable images.
    fn extent(&self) -> Extent2D;

    /// Resets and begins the command buffer of `slot`, targeting presentable image
    /// `image_index` for the main pass.
    fn begin_commands(&mut self, slot: usize, image_index: u32) -> Result<(), RenderError>;

    /// Ends the command buffer opened by [`RenderBackend::begin_commands`].
    fn end_commands(&mut self) -> Result<(), RenderError>;

    /// Waits for the device to go idle and rebuilds every size-dependent object for a
    /// surface of `extent`.
    ///
    /// ## Errors
    ///
    /// Returns a [`RenderError`] if the swapchain or one of its attachments cannot be
    /// recreated. Such a failure is fatal.
    fn recreate_surface(&mut self, extent: Extent2D) -> Result<(), RenderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_slot_wraps() {
        let mut slot = 0;
        let visited: Vec<usize> = (0..5)
            .map(|_| {
                slot = advance_slot(slot, 2);
                slot
            })
            .collect();
        assert_eq!(visited, vec![1, 0, 1, 0, 1]);
        assert_eq!(advance_slot(4, 0), 0);
    }
}
