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

//! std140 layouts of every uniform block the shaders read.
//!
//! Each struct is `#[repr(C)]` with explicit padding so that `bytemuck` can view it as
//! bytes and the byte image matches the GLSL std140 rules.

use crate::math::{Mat4, Vec4};
use crate::scene::light::{Ambient, Light, LightParams, LightProperty, LIGHT_SLOTS};
use crate::scene::material::MaterialParams;

/// Camera matrices, plus the shadow view-projection used to sample the shadow map.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SceneUniforms {
    /// World to view.
    pub view: Mat4,
    /// View to clip, Y flipped.
    pub proj: Mat4,
    /// World to shadow clip space of slot 0's light.
    pub depth_vp: Mat4,
}

/// One light slot as the lit shaders see it.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    /// Linear RGBA color.
    pub color: Vec4,
    /// Position; `w` is 0 for directional lights.
    pub position: Vec4,
    /// Euler rotation in degrees.
    pub rotation: Vec4,
    /// Attenuation radius.
    pub radius: f32,
    /// Intensity.
    pub intensity: f32,
    /// Outer cone angle in degrees.
    pub outer_angle: f32,
    /// Inner cone angle in degrees.
    pub inner_angle: f32,
    /// 1 if visible.
    pub visible: u32,
    /// 1 if the cone edge is soft.
    pub soft_edge: u32,
    _pad: [u32; 2],
}

impl From<&Light> for LightUniform {
    fn from(light: &Light) -> Self {
        Self {
            color: light.color,
            position: light.position,
            rotation: light.rotation,
            radius: light.radius,
            intensity: light.intensity,
            outer_angle: light.outer_angle,
            inner_angle: light.inner_angle,
            visible: light.visible as u32,
            soft_edge: light.soft_edge as u32,
            _pad: [0; 2],
        }
    }
}

/// The light array.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightsUniforms {
    /// One entry per slot, in slot order.
    pub lights: [LightUniform; LIGHT_SLOTS],
}

impl From<&[LightProperty; LIGHT_SLOTS]> for LightsUniforms {
    fn from(slots: &[LightProperty; LIGHT_SLOTS]) -> Self {
        Self {
            lights: std::array::from_fn(|i| LightUniform::from(&slots[i].light)),
        }
    }
}

/// Ambient lighting terms.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct AmbientUniforms {
    /// Trilight sky color.
    pub sky: Vec4,
    /// Trilight equator color.
    pub equator: Vec4,
    /// Trilight ground color.
    pub ground: Vec4,
    /// Ambient cube: +X, -X, +Y, -Y, +Z, -Z.
    pub cube: [Vec4; 6],
    /// Ambient coefficient.
    pub ka: f32,
    /// Ambient mode index.
    pub mode: u32,
    _pad: [u32; 2],
}

impl From<&Ambient> for AmbientUniforms {
    fn from(ambient: &Ambient) -> Self {
        Self {
            sky: ambient.sky,
            equator: ambient.equator,
            ground: ambient.ground,
            cube: ambient.cube,
            ka: ambient.ka,
            mode: ambient.mode.shader_index(),
            _pad: [0; 2],
        }
    }
}

/// Global lighting parameters.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightParamsUniforms {
    /// BRDF index.
    pub brdf: u32,
    /// Output gamma.
    pub gamma: f32,
    /// 1 if the shadow map is sampled.
    pub use_shadow: u32,
    _pad: u32,
}

impl From<&LightParams> for LightParamsUniforms {
    fn from(params: &LightParams) -> Self {
        Self {
            brdf: params.brdf.shader_index(),
            gamma: params.gamma,
            use_shadow: params.use_shadow as u32,
            _pad: 0,
        }
    }
}

/// The shadow caster's view-projection, read by the shadow pass.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ShadowUniforms {
    /// World to shadow clip space.
    pub depth_vp: Mat4,
    /// Kind index of the shadow caster.
    pub light_kind: u32,
    _pad: [u32; 3],
}

impl From<&LightProperty> for ShadowUniforms {
    fn from(slot: &LightProperty) -> Self {
        Self {
            depth_vp: slot.shadow_view_projection(),
            light_kind: slot.kind().shader_index(),
            _pad: [0; 3],
        }
    }
}

/// Per-node model matrix.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct NodeUniforms {
    /// Object to world.
    pub model: Mat4,
}

/// Per-node copy of the mesh material's parameters.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniforms {
    /// Base color.
    pub color: Vec4,
    /// Dielectric reflectance.
    pub reflectance: f32,
    /// Perceptual roughness.
    pub roughness: f32,
    /// Metalness.
    pub metallic: f32,
    _pad: f32,
}

impl From<&MaterialParams> for MaterialUniforms {
    fn from(params: &MaterialParams) -> Self {
        Self {
            color: params.color,
            reflectance: params.reflectance,
            roughness: params.roughness,
            metallic: params.metallic,
            _pad: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::light::LightKind;
    use std::mem::size_of;

    #[test]
    fn test_block_sizes_are_std140_multiples() {
        assert_eq!(size_of::<SceneUniforms>(), 192);
        assert_eq!(size_of::<LightUniform>(), 80);
        assert_eq!(size_of::<LightsUniforms>(), 720);
        assert_eq!(size_of::<AmbientUniforms>(), 160);
        assert_eq!(size_of::<LightParamsUniforms>(), 16);
        assert_eq!(size_of::<ShadowUniforms>(), 80);
        assert_eq!(size_of::<NodeUniforms>(), 64);
        assert_eq!(size_of::<MaterialUniforms>(), 32);
    }

    #[test]
    fn test_light_array_keeps_slot_order() {
        let mut slots = [LightProperty::default(); LIGHT_SLOTS];
        slots[4].set_intensity(7.0);
        slots[4].light.visible = true;
        let block = LightsUniforms::from(&slots);
        assert_eq!(block.lights[4].intensity, 7.0);
        assert_eq!(block.lights[4].visible, 1);
        assert_eq!(block.lights[3].visible, 0);
    }

    #[test]
    fn test_shadow_block_carries_kind_index() {
        let slot = LightProperty::new(LightKind::Directional, Light::default());
        assert_eq!(ShadowUniforms::from(&slot).light_kind, 2);
    }
}
