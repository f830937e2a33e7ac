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

//! Shadow depth pass recording.

use super::{draw_with_part_sets, mesh_of, SceneBindings};
use umbra_core::renderer::api::common::{
    ClearValue, Extent2D, RenderPassKind, CLEAR_DEPTH, SHADOW_DEPTH_BIAS, SHADOW_MAP_SIZE,
};
use umbra_core::renderer::api::keys::{PipelineKey, PipelineLayoutKey};
use umbra_core::renderer::traits::CommandRecorder;
use umbra_core::renderer::RenderError;
use umbra_core::scene::Scene;

/// Set index of the per-part "main" set inside the shadow pipeline layout.
const SHADOW_PART_SET: u32 = 1;

/// Renders the depth of every visible opaque node from slot 0's light into the shadow map.
///
/// The shadow matrix set is bound once at set 0; each part binds its own lit-mesh set at
/// set 1 so the vertex shader reads that node's model matrix.
///
/// ## Errors
///
/// Returns [`RenderError::NotPrepared`] if a drawn part has no device buffers or set.
pub fn record_shadow_pass(
    recorder: &mut dyn CommandRecorder,
    scene: &Scene,
    bindings: &SceneBindings,
) -> Result<(), RenderError> {
    let size = Extent2D::new(SHADOW_MAP_SIZE, SHADOW_MAP_SIZE);
    recorder.begin_render_pass(RenderPassKind::Shadow, &[ClearValue::Depth(CLEAR_DEPTH)]);
    recorder.set_viewport(size);
    recorder.set_scissor(size);
    recorder.set_depth_bias(SHADOW_DEPTH_BIAS);
    recorder.bind_pipeline(PipelineKey::Shadow);
    recorder.bind_descriptor_set(PipelineLayoutKey::Shadow, 0, bindings.shadow);

    for node in scene.nodes.iter().filter(|n| n.visible && !n.transparent) {
        let mesh = mesh_of(scene, node.mesh())?;
        draw_with_part_sets(recorder, mesh, PipelineLayoutKey::Shadow, SHADOW_PART_SET)?;
    }

    recorder.end_render_pass();
    Ok(())
}
