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

//! The scene camera.

use crate::math::{clamp, degrees_to_radians, Mat4, Vec3};
use crate::platform::input::{InputSnapshot, Key, MouseButton};
use crate::renderer::api::common::{Extent2D, CAMERA_FOV_DEGREES, Z_FAR, Z_NEAR};

/// Pitch limit in degrees, keeping the view away from the up axis.
pub const PITCH_LIMIT: f32 = 89.0;

/// How the camera orientation is driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraMode {
    /// Always looks at the world origin.
    #[default]
    LookAt,
    /// Looks along yaw and pitch, which are edited directly.
    Value,
    /// Yaw and pitch follow the cursor; WASD/QE move the camera.
    Mouse,
}

/// A fly camera with a fixed perspective projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// Eye position.
    pub position: Vec3,
    /// Distance moved per frame while a movement key is held.
    pub speed: f32,
    /// Yaw in degrees.
    pub yaw: f32,
    /// Pitch in degrees, within [`PITCH_LIMIT`].
    pub pitch: f32,
    /// Degrees of rotation per pixel of cursor movement.
    pub sensitivity: f32,
    /// The active mode.
    pub mode: CameraMode,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 8.0, 14.0),
            speed: 0.2,
            yaw: -90.0,
            pitch: -32.0,
            sensitivity: 0.05,
            mode: CameraMode::LookAt,
        }
    }
}

impl Camera {
    /// The unit viewing direction derived from yaw and pitch.
    pub fn front(&self) -> Vec3 {
        let yaw = degrees_to_radians(self.yaw);
        let pitch = degrees_to_radians(self.pitch);
        Vec3::new(pitch.cos() * yaw.cos(), pitch.sin(), pitch.cos() * yaw.sin()).normalize()
    }

    /// The view matrix.
    pub fn view(&self) -> Mat4 {
        let target = match self.mode {
            CameraMode::LookAt => Vec3::ZERO,
            CameraMode::Value | CameraMode::Mouse => self.position + self.front(),
        };
        Mat4::look_at_rh(self.position, target, Vec3::Y).unwrap_or(Mat4::IDENTITY)
    }

    /// The projection matrix for a framebuffer of the given size, Y flipped for Vulkan.
    pub fn projection(extent: Extent2D) -> Mat4 {
        Mat4::perspective_rh_zo(
            degrees_to_radians(CAMERA_FOV_DEGREES),
            extent.aspect_ratio(),
            Z_NEAR,
            Z_FAR,
        )
        .with_flipped_y()
    }

    /// Applies one frame of input. Returns `true` if the mode changed.
    ///
    /// The right mouse button toggles [`CameraMode::Mouse`]; Escape leaves it.
    pub fn update(&mut self, input: &InputSnapshot) -> bool {
        let previous = self.mode;
        if input.was_button_pressed(MouseButton::Right) {
            self.mode = match self.mode {
                CameraMode::Mouse => CameraMode::Value,
                _ => CameraMode::Mouse,
            };
        } else if self.mode == CameraMode::Mouse && input.was_key_pressed(Key::Escape) {
            self.mode = CameraMode::Value;
        }

        if self.mode == CameraMode::Mouse && previous == CameraMode::Mouse {
            self.rotate(input.cursor_delta);
            self.translate(input);
        }
        self.mode != previous
    }

    fn rotate(&mut self, (dx, dy): (f64, f64)) {
        self.yaw += dx as f32 * self.sensitivity;
        // Screen Y grows downwards.
        self.pitch = clamp(
            self.pitch - dy as f32 * self.sensitivity,
            -PITCH_LIMIT,
            PITCH_LIMIT,
        );
    }

    fn translate(&mut self, input: &InputSnapshot) {
        let front = self.front();
        let right = front.cross(Vec3::Y).normalize();
        let step = self.speed;
        if input.is_key_down(Key::W) {
            self.position += front * step;
        }
        if input.is_key_down(Key::S) {
            self.position -= front * step;
        }
        if input.is_key_down(Key::D) {
            self.position += right * step;
        }
        if input.is_key_down(Key::A) {
            self.position -= right * step;
        }
        if input.is_key_down(Key::Q) {
            self.position.y += 0.5 * step;
        }
        if input.is_key_down(Key::E) {
            self.position.y -= 0.5 * step;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec4;
    use approx::assert_relative_eq;

    fn mouse_camera() -> Camera {
        Camera {
            mode: CameraMode::Mouse,
            ..Camera::default()
        }
    }

    #[test]
    fn test_default_front_looks_down_negative_z() {
        let c = Camera {
            pitch: 0.0,
            ..Camera::default()
        };
        let f = c.front();
        assert_relative_eq!(f.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(f.z, -1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_look_at_mode_centers_origin() {
        let c = Camera::default();
        let p = Camera::projection(Extent2D::new(1280, 720)) * c.view() * Vec4::W;
        assert_relative_eq!(p.x / p.w, 0.0, epsilon = 1e-5);
        assert_relative_eq!(p.y / p.w, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_projection_flips_y() {
        let p = Camera::projection(Extent2D::new(800, 800));
        assert!(p.cols[1].y < 0.0);
    }

    #[test]
    fn test_keys_ignored_outside_mouse_mode() {
        let mut c = Camera::default();
        assert!(!c.update(&InputSnapshot::with_keys([Key::W])));
        assert_eq!(c.position, Camera::default().position);
    }

    #[test]
    fn test_forward_and_vertical_movement() {
        let mut c = mouse_camera();
        let front = c.front();
        c.update(&InputSnapshot::with_keys([Key::W, Key::Q]));
        let moved = c.position - Camera::default().position;
        assert_relative_eq!(moved.x, front.x * 0.2, epsilon = 1e-5);
        assert_relative_eq!(moved.y, front.y * 0.2 + 0.1, epsilon = 1e-5);
        assert_relative_eq!(moved.z, front.z * 0.2, epsilon = 1e-5);
    }

    #[test]
    fn test_pitch_is_clamped() {
        let mut c = mouse_camera();
        let input = InputSnapshot {
            cursor_delta: (0.0, -1.0e6),
            ..InputSnapshot::default()
        };
        c.update(&input);
        assert_eq!(c.pitch, PITCH_LIMIT);
    }

    #[test]
    fn test_escape_leaves_mouse_mode_and_right_click_toggles() {
        let mut c = mouse_camera();
        assert!(c.update(&InputSnapshot::with_keys([Key::Escape])));
        assert_eq!(c.mode, CameraMode::Value);

        let mut click = InputSnapshot::default();
        click.mouse_pressed.insert(MouseButton::Right);
        assert!(c.update(&click));
        assert_eq!(c.mode, CameraMode::Mouse);
        assert!(c.update(&click));
        assert_eq!(c.mode, CameraMode::Value);
    }
}
