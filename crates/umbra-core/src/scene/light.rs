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

//! Light slots, ambient terms and the global lighting parameters.
//!
//! The scene has exactly [`LIGHT_SLOTS`] lights. Each slot is a [`LightProperty`], which owns
//! its [`Light`] data together with the [`LightKind`] that decides which fields are meaningful.
//! Slot 0 is the only shadow-casting light.

use crate::math::{clamp, degrees_to_radians, Mat4, Vec3, Vec4};
use crate::renderer::api::common::{Z_FAR, Z_NEAR};

/// Number of light slots in a scene.
pub const LIGHT_SLOTS: usize = 9;

/// Index of the light slot whose light casts the shadow.
pub const SHADOW_LIGHT_SLOT: usize = 0;

/// Smallest cone angle a spot light accepts, in degrees.
pub const SPOT_ANGLE_MIN: f32 = 1.0;
/// Largest cone angle a spot light accepts while editing, in degrees.
pub const SPOT_ANGLE_MAX: f32 = 179.0;
/// Largest outer angle kept when a light is switched to [`LightKind::Spot`].
pub const SPOT_KIND_OUTER_MAX: f32 = 60.0;

/// Where a directional light is placed to render its shadow map.
pub const DIRECTIONAL_SHADOW_EYE: Vec3 = Vec3::new(-10.0, 9.0, 12.0);
/// Half extent of the orthographic shadow volume of a directional light.
pub const DIRECTIONAL_SHADOW_HALF_EXTENT: f32 = 20.0;

/// The kind of a light slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LightKind {
    /// Emits in every direction from its position.
    #[default]
    Point,
    /// Emits a cone from its position along its rotation.
    Spot,
    /// Infinitely distant; only its rotation matters.
    Directional,
}

impl LightKind {
    /// Every kind, in shader index order.
    pub const ALL: [LightKind; 3] = [LightKind::Point, LightKind::Spot, LightKind::Directional];

    /// The integer the shaders use for this kind.
    pub const fn shader_index(self) -> u32 {
        match self {
            LightKind::Point => 0,
            LightKind::Spot => 1,
            LightKind::Directional => 2,
        }
    }

    /// Returns the kind that follows this one, wrapping around.
    pub const fn next(self) -> Self {
        match self {
            LightKind::Point => LightKind::Spot,
            LightKind::Spot => LightKind::Directional,
            LightKind::Directional => LightKind::Point,
        }
    }
}

/// The data of one light slot.
///
/// `position.w` discriminates positional (1.0) from directional (0.0) lights. `rotation`
/// holds Euler angles in degrees and is used as the direction of spot and directional lights.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    /// Linear RGBA color.
    pub color: Vec4,
    /// Whether the light contributes to shading.
    pub visible: bool,
    /// Position, with the kind discriminator in `w`.
    pub position: Vec4,
    /// Attenuation radius.
    pub radius: f32,
    /// Intensity multiplier, never negative.
    pub intensity: f32,
    /// Euler rotation in degrees.
    pub rotation: Vec4,
    /// Outer cone angle in degrees.
    pub outer_angle: f32,
    /// Inner cone angle in degrees.
    pub inner_angle: f32,
    /// Whether the spot cone fades between the inner and outer angles.
    pub soft_edge: bool,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            color: Vec4::ZERO,
            visible: false,
            position: Vec4::W,
            radius: 0.0,
            intensity: 1.0,
            rotation: Vec4::ZERO,
            outer_angle: 180.0,
            inner_angle: 0.0,
            soft_edge: false,
        }
    }
}

impl Light {
    /// Returns `true` for directional lights (`position.w == 0`).
    pub fn is_directional(&self) -> bool {
        self.position.w == 0.0
    }

    /// The unit direction the light points along, derived from its rotation.
    ///
    /// `z` is negated so that a zero rotation points down -Z, like the camera.
    pub fn front(&self) -> Vec3 {
        let rx = degrees_to_radians(self.rotation.x);
        let ry = degrees_to_radians(self.rotation.y);
        let f = Vec3::new(rx.cos() * ry.sin(), rx.sin(), rx.cos() * ry.cos()).normalize();
        Vec3::new(f.x, f.y, -f.z)
    }
}

/// One light slot: a kind and the light it governs.
///
/// The property owns its light, so slot `i` of the kinds and slot `i` of the data can never
/// be reindexed independently.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LightProperty {
    kind: LightKind,
    /// The light data of this slot.
    pub light: Light,
}

impl LightProperty {
    /// Creates a slot of the given kind, deriving the kind-dependent fields.
    pub fn new(kind: LightKind, light: Light) -> Self {
        let mut property = Self { kind, light };
        property.apply_kind();
        property
    }

    /// The kind of this slot.
    pub fn kind(&self) -> LightKind {
        self.kind
    }

    /// Switches the slot to `kind` and re-derives `position.w` and the cone angles.
    ///
    /// # Examples
    ///
    /// ```
    /// use umbra_core::scene::{LightKind, LightProperty};
    ///
    /// let mut slot = LightProperty::default();
    /// slot.change_kind(LightKind::Spot);
    /// assert_eq!(slot.light.outer_angle, 60.0);
    /// assert_eq!(slot.light.inner_angle, 50.0);
    /// assert_eq!(slot.light.position.w, 1.0);
    /// ```
    pub fn change_kind(&mut self, kind: LightKind) {
        self.kind = kind;
        self.apply_kind();
    }

    fn apply_kind(&mut self) {
        let light = &mut self.light;
        match self.kind {
            LightKind::Point => {
                light.position.w = 1.0;
                light.outer_angle = 180.0;
            }
            LightKind::Spot => {
                light.position.w = 1.0;
                light.outer_angle = clamp(light.outer_angle, SPOT_ANGLE_MIN, SPOT_KIND_OUTER_MAX);
                light.inner_angle = (light.outer_angle - 10.0).max(SPOT_ANGLE_MIN);
            }
            LightKind::Directional => {
                light.position.w = 0.0;
            }
        }
    }

    /// Sets the outer cone angle, clamped to the slider domain.
    ///
    /// Dropping the outer angle below the inner angle pulls the inner angle down with it.
    pub fn set_outer_angle(&mut self, degrees: f32) {
        let light = &mut self.light;
        light.outer_angle = clamp(degrees, SPOT_ANGLE_MIN, SPOT_ANGLE_MAX);
        if light.outer_angle < light.inner_angle {
            light.inner_angle = light.outer_angle;
        }
    }

    /// Sets the inner cone angle, clamped to the slider domain.
    ///
    /// Raising the inner angle above the outer angle pushes the outer angle up with it.
    pub fn set_inner_angle(&mut self, degrees: f32) {
        let light = &mut self.light;
        light.inner_angle = clamp(degrees, SPOT_ANGLE_MIN, SPOT_ANGLE_MAX);
        if light.inner_angle > light.outer_angle {
            light.outer_angle = light.inner_angle;
        }
    }

    /// Sets the intensity, clamped to zero.
    pub fn set_intensity(&mut self, intensity: f32) {
        self.light.intensity = intensity.max(0.0);
    }

    /// Whether a visualization cube is drawn for this slot.
    pub fn shows_cube(&self) -> bool {
        self.light.visible && !self.light.is_directional()
    }

    /// The view-projection matrix used to render this slot's shadow map.
    ///
    /// The projection is identity while the light is invisible or a point light. Spot lights
    /// use a perspective frustum as wide as their outer angle; directional lights an
    /// orthographic box seen from [`DIRECTIONAL_SHADOW_EYE`].
    pub fn shadow_view_projection(&self) -> Mat4 {
        let light = &self.light;
        let projection = if !light.visible {
            Mat4::IDENTITY
        } else {
            match self.kind {
                LightKind::Spot => Mat4::perspective_rh_zo(
                    degrees_to_radians(light.outer_angle),
                    1.0,
                    Z_NEAR,
                    Z_FAR,
                ),
                LightKind::Directional => {
                    let e = DIRECTIONAL_SHADOW_HALF_EXTENT;
                    Mat4::orthographic_rh_zo(-e, e, -e, e, Z_NEAR, Z_FAR)
                }
                LightKind::Point => Mat4::IDENTITY,
            }
        }
        .with_flipped_y();

        let eye = match self.kind {
            LightKind::Directional => DIRECTIONAL_SHADOW_EYE,
            _ => light.position.truncate(),
        };
        // A light pointing straight up or down has no usable up vector.
        let view = Mat4::look_at_rh(eye, eye + light.front(), Vec3::Y).unwrap_or_else(|| {
            log::warn!("Shadow light looks along the up axis; using an identity view");
            Mat4::IDENTITY
        });
        projection * view
    }
}

/// How the ambient term is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AmbientMode {
    /// A single color scaled by `ka`.
    #[default]
    Flat,
    /// Sky, equator and ground colors blended by the normal's Y.
    Trilight,
    /// Six colors, one per axis direction.
    CubeMap,
}

impl AmbientMode {
    /// The integer the shaders use for this mode.
    pub const fn shader_index(self) -> u32 {
        match self {
            AmbientMode::Flat => 0,
            AmbientMode::Trilight => 1,
            AmbientMode::CubeMap => 2,
        }
    }
}

/// The ambient lighting parameters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Ambient {
    /// Sky color of the trilight mode.
    pub sky: Vec4,
    /// Equator color of the trilight mode.
    pub equator: Vec4,
    /// Ground color of the trilight mode.
    pub ground: Vec4,
    /// Cube colors: +X, -X, +Y, -Y, +Z, -Z.
    pub cube: [Vec4; 6],
    /// Ambient coefficient.
    pub ka: f32,
    /// Active mode.
    pub mode: AmbientMode,
}

/// The specular BRDF used by the lit pipelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Brdf {
    /// GGX distribution with Smith geometry.
    #[default]
    Ggx,
    /// GGX with Karis' approximations.
    GgxKaris,
}

impl Brdf {
    /// The integer the shaders use for this BRDF.
    pub const fn shader_index(self) -> u32 {
        match self {
            Brdf::Ggx => 0,
            Brdf::GgxKaris => 1,
        }
    }
}

/// Global lighting parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightParams {
    /// Specular BRDF.
    pub brdf: Brdf,
    /// Output gamma.
    pub gamma: f32,
    /// Whether the lit pipelines sample the shadow map.
    pub use_shadow: bool,
}

impl Default for LightParams {
    fn default() -> Self {
        Self {
            brdf: Brdf::Ggx,
            gamma: 2.2,
            use_shadow: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn spot(outer: f32, inner: f32) -> LightProperty {
        let mut slot = LightProperty::new(LightKind::Spot, Light::default());
        slot.light.outer_angle = outer;
        slot.light.inner_angle = inner;
        slot
    }

    #[test]
    fn test_change_kind_to_spot_clamps_cone() {
        for outer in [0.0, 1.0, 5.0, 45.2, 62.7, 180.0] {
            let mut slot = LightProperty::default();
            slot.light.outer_angle = outer;
            slot.light.position.w = 0.0;
            slot.change_kind(LightKind::Spot);
            let l = slot.light;
            assert!(1.0 <= l.inner_angle, "outer {outer}");
            assert!(l.inner_angle <= l.outer_angle, "outer {outer}");
            assert!(l.outer_angle <= 60.0, "outer {outer}");
            assert_eq!(l.position.w, 1.0);
        }
    }

    #[test]
    fn test_change_kind_to_point_and_directional() {
        let mut slot = spot(30.0, 20.0);
        slot.change_kind(LightKind::Point);
        assert_eq!(slot.light.position.w, 1.0);
        assert_eq!(slot.light.outer_angle, 180.0);

        slot.change_kind(LightKind::Directional);
        assert_eq!(slot.light.position.w, 0.0);
        assert!(slot.light.is_directional());
    }

    #[test]
    fn test_outer_below_inner_drags_inner() {
        let mut slot = spot(40.0, 30.0);
        slot.set_outer_angle(20.0);
        assert_eq!(slot.light.outer_angle, 20.0);
        assert_eq!(slot.light.inner_angle, 20.0);
    }

    #[test]
    fn test_inner_above_outer_pushes_outer() {
        let mut slot = spot(40.0, 30.0);
        slot.set_inner_angle(75.0);
        assert_eq!(slot.light.inner_angle, 75.0);
        assert_eq!(slot.light.outer_angle, 75.0);
        slot.set_inner_angle(500.0);
        assert_eq!(slot.light.outer_angle, SPOT_ANGLE_MAX);
    }

    #[test]
    fn test_intensity_never_negative() {
        let mut slot = LightProperty::default();
        slot.set_intensity(-4.0);
        assert_eq!(slot.light.intensity, 0.0);
    }

    #[test]
    fn test_cube_hidden_for_directional_or_invisible() {
        let mut slot = LightProperty::default();
        slot.light.visible = true;
        assert!(slot.shows_cube());
        slot.change_kind(LightKind::Directional);
        assert!(!slot.shows_cube());
        slot.change_kind(LightKind::Point);
        slot.light.visible = false;
        assert!(!slot.shows_cube());
    }

    #[test]
    fn test_front_of_zero_rotation_points_down_negative_z() {
        let front = Light::default().front();
        assert_relative_eq!(front.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(front.y, 0.0, epsilon = 1e-6);
        assert_relative_eq!(front.z, -1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_invisible_light_has_flipped_identity_projection() {
        let slot = LightProperty::new(LightKind::Spot, Light::default());
        let eye = slot.light.position.truncate();
        let view = Mat4::look_at_rh(eye, eye + slot.light.front(), Vec3::Y).unwrap_or_default();
        let expected = Mat4::IDENTITY.with_flipped_y() * view;
        assert_eq!(slot.shadow_view_projection(), expected);
    }

    #[test]
    fn test_spot_shadow_projects_light_front_to_center() {
        let mut slot = spot(62.7, 45.2);
        slot.light.visible = true;
        slot.light.position = Vec4::new(0.0, 14.5, 8.85, 1.0);
        slot.light.rotation.x = -47.0;
        let vp = slot.shadow_view_projection();
        let target = slot.light.position.truncate() + slot.light.front() * 10.0;
        let clip = vp * Vec4::from_vec3(target, 1.0);
        assert_relative_eq!(clip.x / clip.w, 0.0, epsilon = 1e-4);
        assert_relative_eq!(clip.y / clip.w, 0.0, epsilon = 1e-4);
        assert!(clip.z / clip.w > 0.0 && clip.z / clip.w < 1.0);
    }

    #[test]
    fn test_light_kind_cycles() {
        let mut kind = LightKind::Point;
        for expected in [LightKind::Spot, LightKind::Directional, LightKind::Point] {
            kind = kind.next();
            assert_eq!(kind, expected);
        }
        assert_eq!(LightKind::Directional.shader_index(), 2);
    }
}
