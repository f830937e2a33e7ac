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

//! Descriptor-set layouts, pipeline layouts, graphics pipelines and the descriptor pool.
//!
//! Everything here is built once from the fixed descriptions in
//! [`umbra_core::renderer::api::keys`] and kept in keyed registries until teardown.
//! Viewport and scissor are dynamic, so nothing in this module depends on the surface size.

use super::context::VulkanContext;
use super::conversions::{backend_error, IntoVk};
use ash::{vk, Device};
use std::path::{Path, PathBuf};
use umbra_core::renderer::api::common::{
    RenderPassKind, POOL_MAX_SETS, POOL_SAMPLER_DESCRIPTORS, POOL_UNIFORM_DESCRIPTORS,
};
use umbra_core::renderer::api::image::SampleCount;
use umbra_core::renderer::api::keys::{
    DescriptorSetKey, PipelineDesc, PipelineKey, PipelineLayoutKey, SetLayoutKey,
};
use umbra_core::renderer::api::registry::Registry;
use umbra_core::renderer::api::vertex::{VERTEX_ATTRIBUTES, VERTEX_STRIDE};
use umbra_core::renderer::error::{ResourceError, ResourceKind};

/// Reads a SPIR-V file into words.
///
/// ## Errors
///
/// Returns [`ResourceError::MissingFile`] if the file cannot be opened or its length is
/// not a whole number of words.
pub fn read_shader_code(path: &Path) -> Result<Vec<u32>, ResourceError> {
    let missing = |e: std::io::Error| ResourceError::MissingFile {
        path: path.display().to_string(),
        reason: e.to_string(),
    };
    let mut file = std::fs::File::open(path).map_err(missing)?;
    ash::util::read_spv(&mut file).map_err(missing)
}

/// Reads a SPIR-V file and wraps it in a shader module.
pub fn load_shader_module(device: &Device, path: &Path) -> Result<vk::ShaderModule, ResourceError> {
    let code = read_shader_code(path)?;
    let info = vk::ShaderModuleCreateInfo::default().code(&code);
    unsafe { device.create_shader_module(&info, None) }.map_err(|e| {
        backend_error(ResourceKind::ShaderModule, path.display().to_string(), e)
    })
}

fn create_set_layout(device: &Device, key: SetLayoutKey) -> Result<vk::DescriptorSetLayout, ResourceError> {
    let bindings: Vec<_> = key
        .bindings()
        .iter()
        .map(|b| {
            vk::DescriptorSetLayoutBinding::default()
                .binding(b.binding)
                .descriptor_type(b.kind.into_vk())
                .descriptor_count(1)
                .stage_flags(b.stages.into_vk())
        })
        .collect();
    let info = vk::DescriptorSetLayoutCreateInfo::default().bindings(&bindings);
    unsafe { device.create_descriptor_set_layout(&info, None) }
        .map_err(|e| backend_error(ResourceKind::DescriptorSetLayout, format!("{key:?}"), e))
}

fn create_descriptor_pool(device: &Device) -> Result<vk::DescriptorPool, ResourceError> {
    let sizes = [
        vk::DescriptorPoolSize {
            ty: vk::DescriptorType::UNIFORM_BUFFER,
            descriptor_count: POOL_UNIFORM_DESCRIPTORS,
        },
        vk::DescriptorPoolSize {
            ty: vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
            descriptor_count: POOL_SAMPLER_DESCRIPTORS,
        },
    ];
    let info = vk::DescriptorPoolCreateInfo::default()
        .pool_sizes(&sizes)
        .max_sets(POOL_MAX_SETS);
    unsafe { device.create_descriptor_pool(&info, None) }.map_err(|e| {
        backend_error(
            ResourceKind::DescriptorSet,
            format!(
                "pool uniforms={POOL_UNIFORM_DESCRIPTORS} samplers={POOL_SAMPLER_DESCRIPTORS} sets={POOL_MAX_SETS}"
            ),
            e,
        )
    })
}

/// Dynamic states of a pipeline built from `desc`.
pub fn dynamic_states(desc: &PipelineDesc) -> Vec<vk::DynamicState> {
    let mut states = vec![vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
    if desc.depth_bias {
        states.push(vk::DynamicState::DEPTH_BIAS);
    }
    states
}

/// Color blend state of the single color target.
pub fn blend_attachment(alpha_blend: bool) -> vk::PipelineColorBlendAttachmentState {
    let state = vk::PipelineColorBlendAttachmentState::default()
        .color_write_mask(vk::ColorComponentFlags::RGBA);
    if alpha_blend {
        state
            .blend_enable(true)
            .src_color_blend_factor(vk::BlendFactor::SRC_ALPHA)
            .dst_color_blend_factor(vk::BlendFactor::ONE_MINUS_SRC_ALPHA)
            .color_blend_op(vk::BlendOp::ADD)
            .src_alpha_blend_factor(vk::BlendFactor::ONE)
            .dst_alpha_blend_factor(vk::BlendFactor::ZERO)
            .alpha_blend_op(vk::BlendOp::ADD)
    } else {
        state.blend_enable(false)
    }
}

/// Owns every layout, pipeline and pooled descriptor set.
#[derive(Debug)]
pub struct PipelineRegistry {
    shader_dir: PathBuf,
    /// Descriptor-set layouts.
    pub set_layouts: Registry<SetLayoutKey, vk::DescriptorSetLayout>,
    /// Pipeline layouts.
    pub pipeline_layouts: Registry<PipelineLayoutKey, vk::PipelineLayout>,
    /// Graphics pipelines.
    pub pipelines: Registry<PipelineKey, vk::Pipeline>,
    /// Shared descriptor sets.
    pub named_sets: Registry<DescriptorSetKey, vk::DescriptorSet>,
    /// The pool every set is allocated from.
    pub descriptor_pool: vk::DescriptorPool,
}

impl PipelineRegistry {
    /// Creates empty registries that load shaders from `shader_dir`.
    pub fn new(shader_dir: &Path) -> Self {
        Self {
            shader_dir: shader_dir.to_path_buf(),
            set_layouts: Registry::new(),
            pipeline_layouts: Registry::new(),
            pipelines: Registry::new(),
            named_sets: Registry::new(),
            descriptor_pool: vk::DescriptorPool::null(),
        }
    }

    /// Creates every layout, the descriptor pool and every pipeline.
    ///
    /// On failure the registries keep whatever was created, for
    /// [`PipelineRegistry::destroy_all`] to release.
    pub fn build(
        &mut self,
        ctx: &VulkanContext,
        main_pass: vk::RenderPass,
        shadow_pass: vk::RenderPass,
    ) -> Result<(), ResourceError> {
        let device = &ctx.device;
        // --- 1. Descriptor-set layouts ---
        for key in SetLayoutKey::ALL {
            let layout = create_set_layout(device, key)?;
            self.set_layouts.add(key, layout);
        }

        // --- 2. Pipeline layouts ---
        for key in PipelineLayoutKey::ALL {
            let sets: Vec<_> = key
                .set_layouts()
                .iter()
                .map(|set| self.set_layouts.get(*set))
                .collect();
            let info = vk::PipelineLayoutCreateInfo::default().set_layouts(&sets);
            let layout = unsafe { device.create_pipeline_layout(&info, None) }.map_err(|e| {
                backend_error(ResourceKind::PipelineLayout, format!("{key:?}"), e)
            })?;
            self.pipeline_layouts.add(key, layout);
        }

        // --- 3. Descriptor pool ---
        self.descriptor_pool = create_descriptor_pool(device)?;

        // --- 4. Pipelines ---
        for key in PipelineKey::ALL {
            let desc = key.desc();
            let (pass, samples) = match desc.pass {
                RenderPassKind::Shadow => (shadow_pass, SampleCount::X1),
                RenderPassKind::Main => (main_pass, ctx.msaa_samples),
            };
            let pipeline = self.create_pipeline(device, key, &desc, pass, samples)?;
            self.pipelines.add(key, pipeline);
        }
        log::info!(
            "Created {} set layouts, {} pipeline layouts and {} pipelines from '{}'.",
            self.set_layouts.len(),
            self.pipeline_layouts.len(),
            self.pipelines.len(),
            self.shader_dir.display()
        );
        Ok(())
    }

    fn create_pipeline(
        &self,
        device: &Device,
        key: PipelineKey,
        desc: &PipelineDesc,
        pass: vk::RenderPass,
        samples: SampleCount,
    ) -> Result<vk::Pipeline, ResourceError> {
        let vertex = load_shader_module(device, &self.shader_dir.join(desc.vertex_shader))?;
        let fragment = match desc.fragment_shader {
            Some(file) => match load_shader_module(device, &self.shader_dir.join(file)) {
                Ok(module) => Some(module),
                Err(e) => {
                    unsafe { device.destroy_shader_module(vertex, None) };
                    return Err(e);
                }
            },
            None => None,
        };

        let mut stages = vec![vk::PipelineShaderStageCreateInfo::default()
            .stage(vk::ShaderStageFlags::VERTEX)
            .module(vertex)
            .name(c"main")];
        if let Some(module) = fragment {
            stages.push(
                vk::PipelineShaderStageCreateInfo::default()
                    .stage(vk::ShaderStageFlags::FRAGMENT)
                    .module(module)
                    .name(c"main"),
            );
        }

        let bindings = [vk::VertexInputBindingDescription::default()
            .binding(0)
            .stride(VERTEX_STRIDE)
            .input_rate(vk::VertexInputRate::VERTEX)];
        let attributes: Vec<_> = VERTEX_ATTRIBUTES
            .iter()
            .map(|a| {
                vk::VertexInputAttributeDescription::default()
                    .binding(0)
                    .location(a.location)
                    .format(a.format.into_vk())
                    .offset(a.offset)
            })
            .collect();
        let vertex_input = vk::PipelineVertexInputStateCreateInfo::default()
            .vertex_binding_descriptions(&bindings)
            .vertex_attribute_descriptions(&attributes);
        let input_assembly = vk::PipelineInputAssemblyStateCreateInfo::default()
            .topology(vk::PrimitiveTopology::TRIANGLE_LIST);
        let viewport_state = vk::PipelineViewportStateCreateInfo::default()
            .viewport_count(1)
            .scissor_count(1);
        let rasterizer = vk::PipelineRasterizationStateCreateInfo::default()
            .polygon_mode(vk::PolygonMode::FILL)
            .line_width(1.0)
            .cull_mode(desc.cull.into_vk())
            .front_face(desc.front_face.into_vk())
            .depth_bias_enable(desc.depth_bias);
        let multisampling =
            vk::PipelineMultisampleStateCreateInfo::default().rasterization_samples(samples.into_vk());
        let depth_stencil = vk::PipelineDepthStencilStateCreateInfo::default()
            .depth_test_enable(true)
            .depth_write_enable(desc.depth_write)
            .depth_compare_op(desc.depth_compare.into_vk());

        let blend = [blend_attachment(desc.alpha_blend)];
        let color_targets: &[vk::PipelineColorBlendAttachmentState] = match desc.pass {
            RenderPassKind::Shadow => &[],
            RenderPassKind::Main => &blend,
        };
        let color_blending =
            vk::PipelineColorBlendStateCreateInfo::default().attachments(color_targets);
        let dynamic = dynamic_states(desc);
        let dynamic_state = vk::PipelineDynamicStateCreateInfo::default().dynamic_states(&dynamic);

        let info = vk::GraphicsPipelineCreateInfo::default()
            .stages(&stages)
            .vertex_input_state(&vertex_input)
            .input_assembly_state(&input_assembly)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterizer)
            .multisample_state(&multisampling)
            .depth_stencil_state(&depth_stencil)
            .color_blend_state(&color_blending)
            .dynamic_state(&dynamic_state)
            .layout(self.pipeline_layouts.get(desc.layout))
            .render_pass(pass)
            .subpass(0);
        let result = unsafe {
            device.create_graphics_pipelines(vk::PipelineCache::null(), &[info], None)
        };

        unsafe {
            device.destroy_shader_module(vertex, None);
            if let Some(module) = fragment {
                device.destroy_shader_module(module, None);
            }
        }
        let pipelines = result.map_err(|(_, e)| {
            backend_error(
                ResourceKind::Pipeline,
                format!("{key:?} ({})", desc.vertex_shader),
                e,
            )
        })?;
        log::debug!("Pipeline {key:?} created.");
        Ok(pipelines[0])
    }

    /// Allocates a descriptor set with the layout `key` from the shared pool.
    pub fn allocate_set(
        &self,
        device: &Device,
        key: SetLayoutKey,
    ) -> Result<vk::DescriptorSet, ResourceError> {
        let layouts = [self.set_layouts.get(key)];
        let info = vk::DescriptorSetAllocateInfo::default()
            .descriptor_pool(self.descriptor_pool)
            .set_layouts(&layouts);
        let sets = unsafe { device.allocate_descriptor_sets(&info) }
            .map_err(|e| backend_error(ResourceKind::DescriptorSet, format!("{key:?}"), e))?;
        Ok(sets[0])
    }

    /// Returns the shared set registered under `key`, allocating it on first use.
    pub fn named_set(
        &mut self,
        device: &Device,
        key: DescriptorSetKey,
    ) -> Result<vk::DescriptorSet, ResourceError> {
        if self.named_sets.contains(key) {
            return Ok(self.named_sets.get(key));
        }
        let set = self.allocate_set(device, key.layout())?;
        self.named_sets.add(key, set);
        Ok(set)
    }

    /// Releases every descriptor set, then destroys pipelines, pipeline layouts, set
    /// layouts and finally the pool.
    pub fn destroy_all(&mut self, device: &Device) {
        unsafe {
            if self.descriptor_pool != vk::DescriptorPool::null() {
                if let Err(e) = device
                    .reset_descriptor_pool(self.descriptor_pool, vk::DescriptorPoolResetFlags::empty())
                {
                    log::warn!("Failed to reset the descriptor pool: {e:?}");
                }
            }
            self.named_sets.destroy_all(|_, _| {});
            self.pipelines
                .destroy_all(|_, pipeline| device.destroy_pipeline(pipeline, None));
            self.pipeline_layouts
                .destroy_all(|_, layout| device.destroy_pipeline_layout(layout, None));
            self.set_layouts
                .destroy_all(|_, layout| device.destroy_descriptor_set_layout(layout, None));
            device.destroy_descriptor_pool(std::mem::take(&mut self.descriptor_pool), None);
        }
        log::debug!("Pipeline registries destroyed.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_the_shadow_pipeline_has_dynamic_depth_bias() {
        for key in PipelineKey::ALL {
            let states = dynamic_states(&key.desc());
            assert_eq!(&states[..2], &[vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR]);
            assert_eq!(
                states.contains(&vk::DynamicState::DEPTH_BIAS),
                key == PipelineKey::Shadow
            );
        }
    }

    #[test]
    fn test_alpha_blend_uses_source_alpha() {
        let b = blend_attachment(true);
        assert_eq!(b.blend_enable, vk::TRUE);
        assert_eq!(b.src_color_blend_factor, vk::BlendFactor::SRC_ALPHA);
        assert_eq!(b.dst_color_blend_factor, vk::BlendFactor::ONE_MINUS_SRC_ALPHA);
        assert_eq!(blend_attachment(false).blend_enable, vk::FALSE);
    }

    #[test]
    fn test_shader_code_read_errors_name_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let absent = dir.path().join("absent.vert.spv");
        match read_shader_code(&absent) {
            Err(ResourceError::MissingFile { path, .. }) => assert!(path.ends_with("absent.vert.spv")),
            other => panic!("unexpected {other:?}"),
        }

        let truncated = dir.path().join("truncated.frag.spv");
        std::fs::write(&truncated, [0x03, 0x02, 0x23]).unwrap();
        assert!(matches!(
            read_shader_code(&truncated),
            Err(ResourceError::MissingFile { .. })
        ));
    }

    #[test]
    fn test_shader_code_is_read_as_words() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("header.spv");
        std::fs::write(&path, 0x0723_0203u32.to_le_bytes()).unwrap();
        assert_eq!(read_shader_code(&path).unwrap(), vec![0x0723_0203]);
    }
}
