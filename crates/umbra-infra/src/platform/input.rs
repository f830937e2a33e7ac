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

//! Translation from `winit` events to the engine's per-frame [`InputSnapshot`].
//!
//! [`InputState`] accumulates window and device events between frames. The frame loop calls
//! [`InputState::snapshot`] once per frame, which also clears the per-frame edges
//! (fresh presses and cursor movement).

use std::collections::HashSet;
use umbra_core::platform::input::{InputSnapshot, Key, MouseButton};
use winit::event::{DeviceEvent, ElementState, MouseButton as WinitMouseButton, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Accumulates keyboard and mouse state between two snapshots.
#[derive(Debug, Default)]
pub struct InputState {
    keys: HashSet<Key>,
    pressed: HashSet<Key>,
    buttons: HashSet<MouseButton>,
    buttons_pressed: HashSet<MouseButton>,
    cursor: Option<(f64, f64)>,
    cursor_delta: (f64, f64),
    raw_delta: (f64, f64),
}

impl InputState {
    /// Creates an empty state: nothing held, cursor position unknown.
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one window event into the state. Non-input events are ignored, except a focus
    /// loss, which releases everything held.
    pub fn handle_window_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    self.key(map_keycode(code), event.state, event.repeat);
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if let Some(button) = map_mouse_button(*button) {
                    self.button(button, *state);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor_moved(position.x, position.y);
            }
            WindowEvent::Focused(false) => {
                self.keys.clear();
                self.buttons.clear();
            }
            _ => {}
        }
    }

    /// Folds one raw device event into the state.
    ///
    /// Raw mouse motion keeps flowing while the cursor is locked, when `CursorMoved` stops.
    pub fn handle_device_event(&mut self, event: &DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta } = event {
            self.raw_delta.0 += delta.0;
            self.raw_delta.1 += delta.1;
        }
    }

    /// Produces the snapshot for this frame and starts accumulating the next one.
    pub fn snapshot(&mut self) -> InputSnapshot {
        let cursor_delta = if self.raw_delta != (0.0, 0.0) {
            self.raw_delta
        } else {
            self.cursor_delta
        };
        let snapshot = InputSnapshot {
            keys: self.keys.clone(),
            pressed: std::mem::take(&mut self.pressed),
            mouse_buttons: self.buttons.clone(),
            mouse_pressed: std::mem::take(&mut self.buttons_pressed),
            cursor: self.cursor.unwrap_or_default(),
            cursor_delta,
        };
        self.cursor_delta = (0.0, 0.0);
        self.raw_delta = (0.0, 0.0);
        snapshot
    }

    fn key(&mut self, key: Key, state: ElementState, repeat: bool) {
        match state {
            ElementState::Pressed => {
                if !repeat && self.keys.insert(key) {
                    self.pressed.insert(key);
                }
            }
            ElementState::Released => {
                self.keys.remove(&key);
            }
        }
    }

    fn button(&mut self, button: MouseButton, state: ElementState) {
        match state {
            ElementState::Pressed => {
                if self.buttons.insert(button) {
                    self.buttons_pressed.insert(button);
                }
            }
            ElementState::Released => {
                self.buttons.remove(&button);
            }
        }
    }

    fn cursor_moved(&mut self, x: f64, y: f64) {
        // The first position only anchors the cursor.
        if let Some((px, py)) = self.cursor {
            self.cursor_delta.0 += x - px;
            self.cursor_delta.1 += y - py;
        }
        self.cursor = Some((x, y));
    }
}

/// Maps a physical key code to the keys the renderer reacts to.
fn map_keycode(code: KeyCode) -> Key {
    match code {
        KeyCode::KeyW => Key::W,
        KeyCode::KeyA => Key::A,
        KeyCode::KeyS => Key::S,
        KeyCode::KeyD => Key::D,
        KeyCode::KeyQ => Key::Q,
        KeyCode::KeyE => Key::E,
        KeyCode::Escape => Key::Escape,
        KeyCode::F1 => Key::F1,
        KeyCode::Digit1 | KeyCode::Numpad1 => Key::Digit1,
        KeyCode::Digit2 | KeyCode::Numpad2 => Key::Digit2,
        KeyCode::Digit3 | KeyCode::Numpad3 => Key::Digit3,
        _ => Key::Other,
    }
}

fn map_mouse_button(button: WinitMouseButton) -> Option<MouseButton> {
    match button {
        WinitMouseButton::Left => Some(MouseButton::Left),
        WinitMouseButton::Right => Some(MouseButton::Right),
        WinitMouseButton::Middle => Some(MouseButton::Middle),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_keycode() {
        assert_eq!(map_keycode(KeyCode::KeyW), Key::W);
        assert_eq!(map_keycode(KeyCode::Numpad2), Key::Digit2);
        assert_eq!(map_keycode(KeyCode::F1), Key::F1);
        assert_eq!(map_keycode(KeyCode::Space), Key::Other);
    }

    #[test]
    fn test_map_mouse_button() {
        assert_eq!(map_mouse_button(WinitMouseButton::Right), Some(MouseButton::Right));
        assert_eq!(map_mouse_button(WinitMouseButton::Back), None);
        assert_eq!(map_mouse_button(WinitMouseButton::Other(8)), None);
    }

    #[test]
    fn test_press_is_reported_once() {
        let mut state = InputState::new();
        state.key(Key::F1, ElementState::Pressed, false);
        state.key(Key::F1, ElementState::Pressed, true);

        let first = state.snapshot();
        assert!(first.was_key_pressed(Key::F1));
        assert!(first.is_key_down(Key::F1));

        let second = state.snapshot();
        assert!(!second.was_key_pressed(Key::F1));
        assert!(second.is_key_down(Key::F1));

        state.key(Key::F1, ElementState::Released, false);
        assert!(!state.snapshot().is_key_down(Key::F1));
    }

    #[test]
    fn test_button_edges() {
        let mut state = InputState::new();
        state.button(MouseButton::Right, ElementState::Pressed);
        state.button(MouseButton::Right, ElementState::Released);
        let s = state.snapshot();
        assert!(s.was_button_pressed(MouseButton::Right));
        assert!(!s.is_button_down(MouseButton::Right));
    }

    #[test]
    fn test_cursor_delta_accumulates_and_resets() {
        let mut state = InputState::new();
        state.cursor_moved(10.0, 10.0);
        state.cursor_moved(15.0, 8.0);
        state.cursor_moved(20.0, 4.0);
        let s = state.snapshot();
        assert_eq!(s.cursor, (20.0, 4.0));
        assert_eq!(s.cursor_delta, (10.0, -6.0));
        assert_eq!(state.snapshot().cursor_delta, (0.0, 0.0));
    }

    #[test]
    fn test_raw_motion_wins_over_cursor_delta() {
        let mut state = InputState::new();
        state.cursor_moved(0.0, 0.0);
        state.cursor_moved(100.0, 0.0);
        state.handle_device_event(&DeviceEvent::MouseMotion { delta: (3.0, -2.0) });
        assert_eq!(state.snapshot().cursor_delta, (3.0, -2.0));
    }

    #[test]
    fn test_focus_loss_releases_everything() {
        let mut state = InputState::new();
        state.key(Key::W, ElementState::Pressed, false);
        state.button(MouseButton::Left, ElementState::Pressed);
        state.handle_window_event(&WindowEvent::Focused(false));
        let s = state.snapshot();
        assert!(!s.is_key_down(Key::W));
        assert!(!s.is_button_down(MouseButton::Left));
    }

    #[test]
    fn test_non_input_events_are_ignored() {
        let mut state = InputState::new();
        state.handle_window_event(&WindowEvent::Resized(winit::dpi::PhysicalSize::new(10, 10)));
        state.handle_window_event(&WindowEvent::CloseRequested);
        assert_eq!(state.snapshot(), InputSnapshot::default());
    }
}
