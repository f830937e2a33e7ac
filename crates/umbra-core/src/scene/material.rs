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

//! Physically based materials and the catalog of measured base colors.

use super::texture::Texture;
use crate::math::Vec4;

/// The scalar parameters of a material, as the shaders see them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialParams {
    /// Base color (linear RGBA).
    pub color: Vec4,
    /// Perceptual roughness in [0, 1].
    pub roughness: f32,
    /// Metalness in [0, 1].
    pub metallic: f32,
    /// Dielectric reflectance in [0, 1].
    pub reflectance: f32,
}

impl Default for MaterialParams {
    fn default() -> Self {
        Self {
            color: Vec4::ONE,
            roughness: 0.5,
            metallic: 0.0,
            reflectance: 0.5,
        }
    }
}

/// A material: parameters plus five owned textures.
///
/// Every texture always exists. A material built without files holds 1x1 placeholders, so
/// descriptor writes never see a missing texture. The specular texture is bound but not
/// used by the shading model.
#[derive(Debug, Clone)]
pub struct Material {
    /// Display name.
    pub name: String,
    /// Scalar parameters.
    pub params: MaterialParams,
    /// Base color map.
    pub albedo: Texture,
    /// Tangent-space normal map.
    pub normal: Texture,
    /// Specular-role map.
    pub specular: Texture,
    /// Metalness map.
    pub metallic: Texture,
    /// Roughness map.
    pub roughness: Texture,
}

impl Default for Material {
    fn default() -> Self {
        Self::new("Default", MaterialParams::default())
    }
}

impl Material {
    /// Creates a material with placeholder textures.
    pub fn new(name: impl Into<String>, params: MaterialParams) -> Self {
        Self {
            name: name.into(),
            params,
            albedo: Texture::default(),
            normal: Texture::default(),
            specular: Texture::default(),
            metallic: Texture::default(),
            roughness: Texture::default(),
        }
    }

    /// The five textures in descriptor binding order.
    pub fn textures(&self) -> [&Texture; 5] {
        [
            &self.albedo,
            &self.normal,
            &self.specular,
            &self.metallic,
            &self.roughness,
        ]
    }

    /// The five textures in descriptor binding order, mutably.
    pub fn textures_mut(&mut self) -> [&mut Texture; 5] {
        [
            &mut self.albedo,
            &mut self.normal,
            &mut self.specular,
            &mut self.metallic,
            &mut self.roughness,
        ]
    }

    /// Replaces the name and parameters with the template's. Textures are kept.
    pub fn apply_template(&mut self, template: MaterialTemplate) {
        self.name = template.name().to_owned();
        self.params = template.params();
    }
}

/// A catalog entry of measured base colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[allow(missing_docs)]
pub enum MaterialTemplate {
    #[default]
    Default,
    Silver,
    Aluminum,
    Platinum,
    Iron,
    Titanium,
    Copper,
    Gold,
    Brass,
    Coal,
    Rubber,
    Mud,
    Wood,
    Vegetation,
    Brick,
    Sand,
    Concrete,
}

const fn srgb8(r: u8, g: u8, b: u8) -> Vec4 {
    Vec4::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, 1.0)
}

impl MaterialTemplate {
    /// Every template, in catalog order.
    pub const ALL: [MaterialTemplate; 17] = [
        MaterialTemplate::Default,
        MaterialTemplate::Silver,
        MaterialTemplate::Aluminum,
        MaterialTemplate::Platinum,
        MaterialTemplate::Iron,
        MaterialTemplate::Titanium,
        MaterialTemplate::Copper,
        MaterialTemplate::Gold,
        MaterialTemplate::Brass,
        MaterialTemplate::Coal,
        MaterialTemplate::Rubber,
        MaterialTemplate::Mud,
        MaterialTemplate::Wood,
        MaterialTemplate::Vegetation,
        MaterialTemplate::Brick,
        MaterialTemplate::Sand,
        MaterialTemplate::Concrete,
    ];

    /// The template's display name.
    pub const fn name(self) -> &'static str {
        match self {
            MaterialTemplate::Default => "Default",
            MaterialTemplate::Silver => "Silver",
            MaterialTemplate::Aluminum => "Aluminum",
            MaterialTemplate::Platinum => "Platinum",
            MaterialTemplate::Iron => "Iron",
            MaterialTemplate::Titanium => "Titanium",
            MaterialTemplate::Copper => "Copper",
            MaterialTemplate::Gold => "Gold",
            MaterialTemplate::Brass => "Brass",
            MaterialTemplate::Coal => "Coal",
            MaterialTemplate::Rubber => "Rubber",
            MaterialTemplate::Mud => "Mud",
            MaterialTemplate::Wood => "Wood",
            MaterialTemplate::Vegetation => "Vegetation",
            MaterialTemplate::Brick => "Brick",
            MaterialTemplate::Sand => "Sand",
            MaterialTemplate::Concrete => "Concrete",
        }
    }

    /// Returns `true` for the conductor templates.
    pub const fn is_metal(self) -> bool {
        matches!(
            self,
            MaterialTemplate::Silver
                | MaterialTemplate::Aluminum
                | MaterialTemplate::Platinum
                | MaterialTemplate::Iron
                | MaterialTemplate::Titanium
                | MaterialTemplate::Copper
                | MaterialTemplate::Gold
                | MaterialTemplate::Brass
        )
    }

    /// The template's parameters. Template colors are opaque.
    pub fn params(self) -> MaterialParams {
        let color = match self {
            MaterialTemplate::Default => return MaterialParams::default(),
            MaterialTemplate::Silver => srgb8(250, 249, 245),
            MaterialTemplate::Aluminum => srgb8(244, 245, 245),
            MaterialTemplate::Platinum => srgb8(214, 209, 200),
            MaterialTemplate::Iron => srgb8(192, 189, 186),
            MaterialTemplate::Titanium => srgb8(206, 200, 194),
            MaterialTemplate::Copper => srgb8(251, 216, 184),
            MaterialTemplate::Gold => srgb8(255, 220, 157),
            MaterialTemplate::Brass => srgb8(244, 228, 173),
            MaterialTemplate::Coal => srgb8(50, 50, 50),
            MaterialTemplate::Rubber => srgb8(53, 53, 53),
            MaterialTemplate::Mud => srgb8(85, 61, 49),
            MaterialTemplate::Wood => srgb8(135, 92, 60),
            MaterialTemplate::Vegetation => srgb8(123, 130, 78),
            MaterialTemplate::Brick => srgb8(148, 125, 117),
            MaterialTemplate::Sand => srgb8(177, 168, 132),
            MaterialTemplate::Concrete => srgb8(192, 191, 187),
        };
        if self.is_metal() {
            MaterialParams {
                color,
                roughness: 0.1,
                metallic: 1.0,
                ..MaterialParams::default()
            }
        } else {
            MaterialParams {
                color,
                ..MaterialParams::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_material_owns_placeholder_textures() {
        let m = Material::default();
        assert_eq!(m.name, "Default");
        assert_eq!(m.params.color, Vec4::ONE);
        for t in m.textures() {
            assert_eq!(t.data.pixels.len(), 4);
            assert!(t.gpu.is_none());
        }
    }

    #[test]
    fn test_metal_templates() {
        let gold = MaterialTemplate::Gold.params();
        assert_eq!(gold.metallic, 1.0);
        assert_relative_eq!(gold.roughness, 0.1);
        assert_relative_eq!(gold.color.y, 220.0 / 255.0);
        let wood = MaterialTemplate::Wood.params();
        assert_eq!(wood.metallic, 0.0);
        assert_eq!(wood.roughness, 0.5);
    }

    #[test]
    fn test_apply_template_keeps_textures() {
        let mut m = Material::default();
        m.albedo.gpu = Some(crate::renderer::api::ids::TextureId(7));
        m.apply_template(MaterialTemplate::Brick);
        assert_eq!(m.name, "Brick");
        assert_eq!(m.albedo.gpu, Some(crate::renderer::api::ids::TextureId(7)));
        assert_eq!(MaterialTemplate::ALL.iter().filter(|t| t.is_metal()).count(), 8);
    }
}
