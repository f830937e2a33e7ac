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

//! A keyboard-driven stand-in for an immediate-mode debug interface.

use umbra_core::platform::input::{InputSnapshot, Key};
use umbra_core::renderer::traits::{CommandRecorder, DebugOverlay, OverlayState};
use umbra_core::scene::{LightKind, Scene, SHADOW_LIGHT_SLOT};

/// Edits the scene from key presses and draws nothing.
///
/// F1 toggles the GUI visibility flag. Keys 1, 2 and 3 switch the shadow-casting light to
/// point, spot and directional.
#[derive(Debug, Default)]
pub struct KeyboardOverlay {
    pressed: Vec<Key>,
    show_shadow_map_debug: bool,
}

impl KeyboardOverlay {
    /// Creates an overlay that keeps the shadow debug quad hidden.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests the shadow map debug quad. It is still hidden while the GUI is hidden.
    pub fn with_shadow_map_debug(mut self, show: bool) -> Self {
        self.show_shadow_map_debug = show;
        self
    }
}

fn kind_for(key: Key) -> Option<LightKind> {
    match key {
        Key::Digit1 => Some(LightKind::Point),
        Key::Digit2 => Some(LightKind::Spot),
        Key::Digit3 => Some(LightKind::Directional),
        _ => None,
    }
}

impl DebugOverlay for KeyboardOverlay {
    fn new_frame(&mut self, input: &InputSnapshot) {
        self.pressed.clear();
        self.pressed.extend(input.pressed.iter().copied());
    }

    fn build(&mut self, scene: &mut Scene, state: &mut OverlayState) {
        state.show_shadow_map_debug = self.show_shadow_map_debug;
        for &key in &self.pressed {
            if key == Key::F1 {
                state.hide_gui = !state.hide_gui;
                log::debug!("GUI hidden: {}", state.hide_gui);
            } else if let Some(kind) = kind_for(key) {
                scene.lights[SHADOW_LIGHT_SLOT].change_kind(kind);
                log::debug!("Shadow light switched to {kind:?}");
            }
        }
    }

    fn record(&mut self, _recorder: &mut dyn CommandRecorder) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(overlay: &mut KeyboardOverlay, scene: &mut Scene, state: &mut OverlayState, key: Key) {
        overlay.new_frame(&InputSnapshot::with_keys([key]));
        overlay.build(scene, state);
    }

    #[test]
    fn test_f1_toggles_gui() {
        let mut overlay = KeyboardOverlay::new();
        let mut scene = Scene::default();
        let mut state = OverlayState::default();
        press(&mut overlay, &mut scene, &mut state, Key::F1);
        assert!(state.hide_gui);
        press(&mut overlay, &mut scene, &mut state, Key::F1);
        assert!(!state.hide_gui);
    }

    #[test]
    fn test_digits_change_shadow_light_kind() {
        let mut overlay = KeyboardOverlay::new();
        let mut scene = Scene::default();
        let mut state = OverlayState::default();

        press(&mut overlay, &mut scene, &mut state, Key::Digit3);
        assert_eq!(scene.lights[0].kind(), LightKind::Directional);
        assert_eq!(scene.lights[0].light.position.w, 0.0);

        press(&mut overlay, &mut scene, &mut state, Key::Digit2);
        assert_eq!(scene.lights[0].kind(), LightKind::Spot);
        assert!(scene.lights[0].light.outer_angle <= 60.0);
    }

    #[test]
    fn test_held_key_acts_once() {
        let mut overlay = KeyboardOverlay::new();
        let mut scene = Scene::default();
        let mut state = OverlayState::default();
        press(&mut overlay, &mut scene, &mut state, Key::F1);

        let mut held = InputSnapshot::with_keys([Key::F1]);
        held.pressed.clear();
        overlay.new_frame(&held);
        overlay.build(&mut scene, &mut state);
        assert!(state.hide_gui);
    }

    #[test]
    fn test_shadow_debug_request_is_forwarded() {
        let mut overlay = KeyboardOverlay::new().with_shadow_map_debug(true);
        let mut scene = Scene::default();
        let mut state = OverlayState::default();
        press(&mut overlay, &mut scene, &mut state, Key::Other);
        assert!(state.shows_shadow_debug_quad());
    }
}
