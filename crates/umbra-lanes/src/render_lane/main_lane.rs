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

//! Main color pass recording.

use super::{draw_geometry, draw_with_part_sets, mesh_of, SceneBindings};
use umbra_core::renderer::api::common::{
    Extent2D, RenderPassKind, CLEAR_COLOR, MAIN_PASS_CLEAR_VALUES,
};
use umbra_core::renderer::api::keys::{PipelineKey, PipelineLayoutKey};
use umbra_core::renderer::traits::{CommandRecorder, DebugOverlay, OverlayState};
use umbra_core::renderer::RenderError;
use umbra_core::scene::{Scene, SceneNode};

/// Everything the main pass reads besides the scene.
pub struct MainPassInputs<'a> {
    /// Shared sets written at preparation time.
    pub bindings: &'a SceneBindings,
    /// Current framebuffer size.
    pub extent: Extent2D,
    /// Overlay toggles for this frame.
    pub overlay_state: OverlayState,
}

/// Records the main pass in draw order: opaque nodes, light cubes, the optional shadow
/// debug quad, the skybox, transparent back faces, transparent front faces and finally the
/// overlay.
///
/// ## Errors
///
/// Returns [`RenderError::NotPrepared`] if a drawn part has no device buffers or set.
pub fn record_main_pass(
    recorder: &mut dyn CommandRecorder,
    scene: &Scene,
    inputs: &MainPassInputs<'_>,
    overlay: &mut dyn DebugOverlay,
) -> Result<(), RenderError> {
    let extent = inputs.extent;
    recorder.begin_render_pass(RenderPassKind::Main, &MAIN_PASS_CLEAR_VALUES);
    recorder.clear_color_attachment(0, CLEAR_COLOR, extent);
    recorder.set_viewport(extent);
    recorder.set_scissor(extent);

    recorder.bind_pipeline(PipelineKey::Main);
    draw_nodes(recorder, scene, |n| !n.transparent)?;

    recorder.bind_pipeline(PipelineKey::LightCube);
    for (cube, slot) in scene.light_cubes().iter().zip(scene.lights.iter()) {
        if slot.shows_cube() {
            let mesh = mesh_of(scene, cube.mesh())?;
            draw_with_part_sets(recorder, mesh, PipelineLayoutKey::LightCube, 0)?;
        }
    }

    if inputs.overlay_state.shows_shadow_debug_quad() {
        recorder.bind_pipeline(PipelineKey::QuadDebug);
        recorder.bind_descriptor_set(PipelineLayoutKey::QuadDebug, 0, inputs.bindings.quad_debug);
        draw_geometry(recorder, mesh_of(scene, scene.shadow_debug_quad.mesh())?)?;
    }

    recorder.bind_pipeline(PipelineKey::Skybox);
    recorder.bind_descriptor_set(PipelineLayoutKey::Skybox, 0, inputs.bindings.skybox);
    draw_geometry(recorder, mesh_of(scene, scene.skybox.node.mesh())?)?;

    for pipeline in [PipelineKey::TransparentBackFaces, PipelineKey::TransparentFrontFaces] {
        recorder.bind_pipeline(pipeline);
        draw_nodes(recorder, scene, |n| n.transparent)?;
    }

    overlay.record(recorder);
    recorder.end_render_pass();
    Ok(())
}

fn draw_nodes(
    recorder: &mut dyn CommandRecorder,
    scene: &Scene,
    filter: impl Fn(&SceneNode) -> bool,
) -> Result<(), RenderError> {
    for node in scene.nodes.iter().filter(|n| n.visible && filter(n)) {
        draw_with_part_sets(recorder, mesh_of(scene, node.mesh())?, PipelineLayoutKey::Main, 0)?;
    }
    Ok(())
}
