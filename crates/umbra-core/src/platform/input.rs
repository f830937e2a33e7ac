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

//! A value snapshot of keyboard and mouse state for one frame.
//!
//! The platform layer rebuilds the snapshot every frame and hands it explicitly to whoever
//! needs it (the camera, the overlay). There is no global input state.

use std::collections::HashSet;

/// The keys the renderer reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Key {
    W,
    A,
    S,
    D,
    Q,
    E,
    Escape,
    F1,
    Digit1,
    Digit2,
    Digit3,
    /// Any key without a dedicated variant.
    Other,
}

/// Mouse buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Keyboard and mouse state for one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputSnapshot {
    /// Keys held down.
    pub keys: HashSet<Key>,
    /// Keys that went down since the previous snapshot.
    pub pressed: HashSet<Key>,
    /// Mouse buttons held down.
    pub mouse_buttons: HashSet<MouseButton>,
    /// Mouse buttons that went down since the previous snapshot.
    pub mouse_pressed: HashSet<MouseButton>,
    /// Cursor position in physical pixels.
    pub cursor: (f64, f64),
    /// Cursor movement since the previous snapshot.
    pub cursor_delta: (f64, f64),
}

impl InputSnapshot {
    /// Returns `true` while `key` is held.
    pub fn is_key_down(&self, key: Key) -> bool {
        self.keys.contains(&key)
    }

    /// Returns `true` on the frame `key` went down.
    pub fn was_key_pressed(&self, key: Key) -> bool {
        self.pressed.contains(&key)
    }

    /// Returns `true` while `button` is held.
    pub fn is_button_down(&self, button: MouseButton) -> bool {
        self.mouse_buttons.contains(&button)
    }

    /// Returns `true` on the frame `button` went down.
    pub fn was_button_pressed(&self, button: MouseButton) -> bool {
        self.mouse_pressed.contains(&button)
    }

    /// A snapshot with the given keys held and freshly pressed.
    pub fn with_keys(keys: impl IntoIterator<Item = Key>) -> Self {
        let keys: HashSet<Key> = keys.into_iter().collect();
        Self {
            pressed: keys.clone(),
            keys,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_keys_marks_held_and_pressed() {
        let s = InputSnapshot::with_keys([Key::W, Key::F1]);
        assert!(s.is_key_down(Key::W));
        assert!(s.was_key_pressed(Key::F1));
        assert!(!s.is_key_down(Key::S));
        assert!(!s.is_button_down(MouseButton::Right));
    }
}
