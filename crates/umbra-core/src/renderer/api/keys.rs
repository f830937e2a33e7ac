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

//! Enumerated keys for the resource registries, and the fixed descriptions behind them.
//!
//! Each key names one pipeline, pipeline layout, descriptor-set layout or shared descriptor
//! set of the renderer's fixed pass set. The descriptions here are the single source the
//! backend builds its objects from.

use super::common::RenderPassKind;
use super::flags::ShaderStageFlags;

/// What a descriptor binding holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    /// A uniform buffer.
    UniformBuffer,
    /// A combined image sampler.
    CombinedImageSampler,
}

/// One binding slot of a descriptor-set layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindingDesc {
    /// The binding index in the shader.
    pub binding: u32,
    /// What the binding holds.
    pub kind: BindingKind,
    /// Which stages can read it.
    pub stages: ShaderStageFlags,
}

const fn uniform(binding: u32, stages: ShaderStageFlags) -> BindingDesc {
    BindingDesc {
        binding,
        kind: BindingKind::UniformBuffer,
        stages,
    }
}

const fn sampler(binding: u32) -> BindingDesc {
    BindingDesc {
        binding,
        kind: BindingKind::CombinedImageSampler,
        stages: ShaderStageFlags::FRAGMENT,
    }
}

/// Binding indices of the "main" descriptor-set layout.
pub mod main_bindings {
    /// Scene camera block.
    pub const SCENE: u32 = 0;
    /// Per-node model block.
    pub const NODE: u32 = 1;
    /// Per-node material block.
    pub const MATERIAL: u32 = 2;
    /// Light array block.
    pub const LIGHTS: u32 = 3;
    /// Ambient block.
    pub const AMBIENT: u32 = 4;
    /// Global light parameters block.
    pub const LIGHT_PARAMS: u32 = 5;
    /// Albedo texture.
    pub const ALBEDO: u32 = 6;
    /// Normal map.
    pub const NORMAL: u32 = 7;
    /// Specular-role texture.
    pub const SPECULAR: u32 = 8;
    /// Metallic map.
    pub const METALLIC: u32 = 9;
    /// Roughness map.
    pub const ROUGHNESS: u32 = 10;
    /// Shadow depth map.
    pub const SHADOW_MAP: u32 = 11;
    /// Skybox cubemap.
    pub const SKYBOX: u32 = 12;
}

/// Binding indices of the "lightCube" descriptor-set layout.
pub mod light_cube_bindings {
    /// Scene camera block.
    pub const SCENE: u32 = 0;
    /// Per-node model block.
    pub const NODE: u32 = 1;
    /// Global light parameters block.
    pub const LIGHT_PARAMS: u32 = 2;
    /// Per-node material block.
    pub const MATERIAL: u32 = 3;
}

const MAIN_BINDINGS: [BindingDesc; 13] = [
    uniform(main_bindings::SCENE, ShaderStageFlags::VERTEX_FRAGMENT),
    uniform(main_bindings::NODE, ShaderStageFlags::VERTEX),
    uniform(main_bindings::MATERIAL, ShaderStageFlags::FRAGMENT),
    uniform(main_bindings::LIGHTS, ShaderStageFlags::FRAGMENT),
    uniform(main_bindings::AMBIENT, ShaderStageFlags::FRAGMENT),
    uniform(main_bindings::LIGHT_PARAMS, ShaderStageFlags::VERTEX_FRAGMENT),
    sampler(main_bindings::ALBEDO),
    sampler(main_bindings::NORMAL),
    sampler(main_bindings::SPECULAR),
    sampler(main_bindings::METALLIC),
    sampler(main_bindings::ROUGHNESS),
    sampler(main_bindings::SHADOW_MAP),
    sampler(main_bindings::SKYBOX),
];

const LIGHT_CUBE_BINDINGS: [BindingDesc; 4] = [
    uniform(light_cube_bindings::SCENE, ShaderStageFlags::VERTEX),
    uniform(light_cube_bindings::NODE, ShaderStageFlags::VERTEX),
    uniform(light_cube_bindings::LIGHT_PARAMS, ShaderStageFlags::VERTEX_FRAGMENT),
    uniform(light_cube_bindings::MATERIAL, ShaderStageFlags::FRAGMENT),
];

const SHADOW_BINDINGS: [BindingDesc; 1] = [uniform(0, ShaderStageFlags::VERTEX)];

const SKYBOX_BINDINGS: [BindingDesc; 2] = [uniform(0, ShaderStageFlags::VERTEX), sampler(1)];

const QUAD_DEBUG_BINDINGS: [BindingDesc; 1] = [sampler(0)];

/// Keys of the descriptor-set layout registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetLayoutKey {
    /// Everything a lit mesh reads.
    Main,
    /// What a light-visualization cube reads.
    LightCube,
    /// The shadow matrix block.
    Shadow,
    /// The skybox camera block and cubemap.
    Skybox,
    /// The shadow map sampled by the debug quad.
    QuadDebug,
}

impl SetLayoutKey {
    /// Every layout, in creation order.
    pub const ALL: [SetLayoutKey; 5] = [
        SetLayoutKey::Main,
        SetLayoutKey::LightCube,
        SetLayoutKey::Shadow,
        SetLayoutKey::Skybox,
        SetLayoutKey::QuadDebug,
    ];

    /// The bindings of this layout, in binding order.
    pub fn bindings(&self) -> &'static [BindingDesc] {
        match self {
            SetLayoutKey::Main => &MAIN_BINDINGS,
            SetLayoutKey::LightCube => &LIGHT_CUBE_BINDINGS,
            SetLayoutKey::Shadow => &SHADOW_BINDINGS,
            SetLayoutKey::Skybox => &SKYBOX_BINDINGS,
            SetLayoutKey::QuadDebug => &QUAD_DEBUG_BINDINGS,
        }
    }
}

/// Keys of the pipeline layout registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineLayoutKey {
    /// Lit meshes, opaque and transparent.
    Main,
    /// Light-visualization cubes.
    LightCube,
    /// Shadow depth pass.
    Shadow,
    /// Skybox.
    Skybox,
    /// Shadow map debug quad.
    QuadDebug,
}

impl PipelineLayoutKey {
    /// Every pipeline layout, in creation order.
    pub const ALL: [PipelineLayoutKey; 5] = [
        PipelineLayoutKey::Main,
        PipelineLayoutKey::LightCube,
        PipelineLayoutKey::Shadow,
        PipelineLayoutKey::Skybox,
        PipelineLayoutKey::QuadDebug,
    ];

    /// The descriptor-set layouts of this pipeline layout, by set index.
    ///
    /// The shadow layout puts the shadow matrix at set 0 and the per-mesh "main" set at 1.
    pub fn set_layouts(&self) -> &'static [SetLayoutKey] {
        match self {
            PipelineLayoutKey::Main => &[SetLayoutKey::Main],
            PipelineLayoutKey::LightCube => &[SetLayoutKey::LightCube],
            PipelineLayoutKey::Shadow => &[SetLayoutKey::Shadow, SetLayoutKey::Main],
            PipelineLayoutKey::Skybox => &[SetLayoutKey::Skybox, SetLayoutKey::Main],
            PipelineLayoutKey::QuadDebug => &[SetLayoutKey::QuadDebug],
        }
    }
}

/// Which faces the rasterizer discards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CullMode {
    /// Discard front faces, rendering back faces.
    Front,
    /// Discard back faces, rendering front faces.
    Back,
}

/// Winding order that marks a triangle as front-facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontFace {
    /// Counter-clockwise triangles face forward.
    CounterClockwise,
    /// Clockwise triangles face forward.
    Clockwise,
}

/// Depth comparison function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// Passes if the incoming depth is less than the stored depth.
    Less,
    /// Passes if the incoming depth is less than or equal to the stored depth.
    LessOrEqual,
}

/// Fixed-function and shader description of one graphics pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineDesc {
    /// The pipeline layout it is created with.
    pub layout: PipelineLayoutKey,
    /// Render pass the pipeline draws into.
    pub pass: RenderPassKind,
    /// Vertex stage SPIR-V file, relative to the shader directory.
    pub vertex_shader: &'static str,
    /// Fragment stage SPIR-V file; `None` for depth-only pipelines.
    pub fragment_shader: Option<&'static str>,
    /// Face culling.
    pub cull: CullMode,
    /// Front face winding.
    pub front_face: FrontFace,
    /// Whether depth writes are enabled. Depth testing is always on.
    pub depth_write: bool,
    /// Depth comparison.
    pub depth_compare: CompareOp,
    /// Whether source-alpha blending is enabled on the color target.
    pub alpha_blend: bool,
    /// Whether the pipeline takes a dynamic depth bias.
    pub depth_bias: bool,
}

/// Keys of the pipeline registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineKey {
    /// Opaque lit meshes.
    Main,
    /// First transparent pass: culls front faces so back faces are drawn.
    TransparentBackFaces,
    /// Second transparent pass: culls back faces so front faces are drawn.
    TransparentFrontFaces,
    /// Light-visualization cubes.
    LightCube,
    /// Shadow depth pass.
    Shadow,
    /// Skybox.
    Skybox,
    /// Shadow map debug quad.
    QuadDebug,
}

impl PipelineKey {
    /// Every pipeline, in creation order.
    pub const ALL: [PipelineKey; 7] = [
        PipelineKey::Main,
        PipelineKey::TransparentBackFaces,
        PipelineKey::TransparentFrontFaces,
        PipelineKey::LightCube,
        PipelineKey::Shadow,
        PipelineKey::Skybox,
        PipelineKey::QuadDebug,
    ];

    /// Returns the fixed description of this pipeline.
    pub fn desc(&self) -> PipelineDesc {
        let lit = PipelineDesc {
            layout: PipelineLayoutKey::Main,
            pass: RenderPassKind::Main,
            vertex_shader: "main.vert.spv",
            fragment_shader: Some("main.frag.spv"),
            cull: CullMode::Back,
            front_face: FrontFace::CounterClockwise,
            depth_write: true,
            depth_compare: CompareOp::Less,
            alpha_blend: false,
            depth_bias: false,
        };
        let transparent = PipelineDesc {
            fragment_shader: Some("transparent.frag.spv"),
            depth_write: false,
            depth_compare: CompareOp::LessOrEqual,
            alpha_blend: true,
            ..lit
        };
        match self {
            PipelineKey::Main => lit,
            PipelineKey::TransparentBackFaces => PipelineDesc {
                cull: CullMode::Front,
                ..transparent
            },
            PipelineKey::TransparentFrontFaces => PipelineDesc {
                cull: CullMode::Back,
                ..transparent
            },
            PipelineKey::LightCube => PipelineDesc {
                layout: PipelineLayoutKey::LightCube,
                vertex_shader: "light_cube.vert.spv",
                fragment_shader: Some("light_cube.frag.spv"),
                ..lit
            },
            PipelineKey::Shadow => PipelineDesc {
                layout: PipelineLayoutKey::Shadow,
                pass: RenderPassKind::Shadow,
                vertex_shader: "shadow.vert.spv",
                fragment_shader: None,
                front_face: FrontFace::Clockwise,
                depth_compare: CompareOp::LessOrEqual,
                depth_bias: true,
                ..lit
            },
            PipelineKey::Skybox => PipelineDesc {
                layout: PipelineLayoutKey::Skybox,
                vertex_shader: "skybox.vert.spv",
                fragment_shader: Some("skybox.frag.spv"),
                front_face: FrontFace::Clockwise,
                depth_write: false,
                depth_compare: CompareOp::LessOrEqual,
                ..lit
            },
            PipelineKey::QuadDebug => PipelineDesc {
                layout: PipelineLayoutKey::QuadDebug,
                vertex_shader: "quad.vert.spv",
                fragment_shader: Some("quad.frag.spv"),
                cull: CullMode::Front,
                depth_compare: CompareOp::LessOrEqual,
                ..lit
            },
        }
    }
}

/// Keys of the shared descriptor-set registry.
///
/// Per-mesh-buffer sets are not registered here; each mesh buffer caches its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorSetKey {
    /// The shadow matrix block, bound at set 0 of the shadow pass.
    Shadow,
    /// The skybox camera block and cubemap.
    Skybox,
    /// The shadow map, sampled by the debug quad.
    QuadDebug,
}

impl DescriptorSetKey {
    /// The layout the set is allocated with.
    pub fn layout(&self) -> SetLayoutKey {
        match self {
            DescriptorSetKey::Shadow => SetLayoutKey::Shadow,
            DescriptorSetKey::Skybox => SetLayoutKey::Skybox,
            DescriptorSetKey::QuadDebug => SetLayoutKey::QuadDebug,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_main_layout_has_thirteen_ordered_bindings() {
        let b = SetLayoutKey::Main.bindings();
        assert_eq!(b.len(), 13);
        assert!(b.iter().enumerate().all(|(i, d)| d.binding == i as u32));
        assert!(b[..6].iter().all(|d| d.kind == BindingKind::UniformBuffer));
        assert!(b[6..].iter().all(|d| d.kind == BindingKind::CombinedImageSampler));
        assert_eq!(b[0].stages, ShaderStageFlags::VERTEX_FRAGMENT);
        assert_eq!(b[1].stages, ShaderStageFlags::VERTEX);
    }

    #[test]
    fn test_shadow_layout_orders_matrix_before_mesh_set() {
        assert_eq!(
            PipelineLayoutKey::Shadow.set_layouts(),
            &[SetLayoutKey::Shadow, SetLayoutKey::Main]
        );
    }

    #[test]
    fn test_transparent_pipelines_cull_opposite_faces() {
        let back = PipelineKey::TransparentBackFaces.desc();
        let front = PipelineKey::TransparentFrontFaces.desc();
        assert_eq!(back.cull, CullMode::Front);
        assert_eq!(front.cull, CullMode::Back);
        for d in [back, front] {
            assert!(d.alpha_blend);
            assert!(!d.depth_write);
            assert_eq!(d.layout, PipelineLayoutKey::Main);
        }
    }

    #[test]
    fn test_skybox_tests_depth_without_writing() {
        let d = PipelineKey::Skybox.desc();
        assert!(!d.depth_write);
        assert_eq!(d.depth_compare, CompareOp::LessOrEqual);
    }

    #[test]
    fn test_shadow_pipeline_is_depth_only_with_bias() {
        let d = PipelineKey::Shadow.desc();
        assert_eq!(d.pass, RenderPassKind::Shadow);
        assert!(d.fragment_shader.is_none());
        assert!(d.depth_bias);
        assert!(PipelineKey::ALL
            .iter()
            .filter(|k| **k != PipelineKey::Shadow)
            .all(|k| k.desc().pass == RenderPassKind::Main && !k.desc().depth_bias));
    }
}
