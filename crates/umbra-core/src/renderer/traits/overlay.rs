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
use crate::platform::input::InputSnapshot;
use crate::scene::Scene;

/// Toggles shared between the overlay and the pass recorders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OverlayState {
    /// Hides every overlay element, including the shadow map debug quad.
    pub hide_gui: bool,
    /// Draws the shadow map on a quad in the main pass.
    pub show_shadow_map_debug: bool,
}

impl OverlayState {
    /// Whether the shadow debug quad is drawn this frame.
    pub fn shows_shadow_debug_quad(&self) -> bool {
        self.show_shadow_map_debug && !self.hide_gui
    }
}

/// A debug user interface layered over the main pass.
///
/// The overlay edits the scene directly while it builds its frame, then appends its own
/// draw commands as the very last thing recorded inside the main pass.
pub trait DebugOverlay {
    /// Starts a new overlay frame with this frame's input.
    fn new_frame(&mut self, input: &InputSnapshot);

    /// Builds the overlay for this frame. May mutate lights, materials and nodes.
    fn build(&mut self, scene: &mut Scene, state: &mut OverlayState);

    /// Appends the overlay's draw commands to the open main pass.
    fn record(&mut self, recorder: &mut dyn CommandRecorder);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_quad_needs_both_flags() {
        let mut s = OverlayState {
            show_shadow_map_debug: true,
            ..OverlayState::default()
        };
        assert!(s.shows_shadow_debug_quad());
        s.hide_gui = true;
        assert!(!s.shows_shadow_debug_quad());
    }
}
