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

//! Rendering lanes: the per-frame hot path from scene data to recorded commands.
//!
//! Every lane talks to the backend only through the `umbra-core` traits, so the same code
//! drives the Vulkan renderer and the recording mock used in tests.

mod main_lane;
mod prepare_lane;
mod shadow_lane;
mod uniform_lane;

pub use main_lane::*;
pub use prepare_lane::*;
pub use shadow_lane::*;
pub use uniform_lane::*;

use umbra_core::renderer::api::keys::PipelineLayoutKey;
use umbra_core::renderer::traits::CommandRecorder;
use umbra_core::renderer::RenderError;
use umbra_core::scene::{Mesh, MeshBufferGpu, MeshId, Scene};

fn mesh_of(scene: &Scene, id: MeshId) -> Result<&Mesh, RenderError> {
    scene.mesh(id).ok_or(RenderError::NotPrepared("mesh"))
}

/// Draws every part of `mesh` with the descriptor set cached on that part.
fn draw_with_part_sets(
    recorder: &mut dyn CommandRecorder,
    mesh: &Mesh,
    layout: PipelineLayoutKey,
    set_index: u32,
) -> Result<(), RenderError> {
    for buffer in &mesh.buffers {
        let gpu = buffer.gpu.ok_or(RenderError::NotPrepared("mesh buffer"))?;
        let set = buffer
            .descriptor_set()
            .ok_or(RenderError::NotPrepared("mesh descriptor set"))?;
        bind_geometry(recorder, gpu);
        recorder.bind_descriptor_set(layout, set_index, set);
        recorder.draw_indexed(buffer.index_count());
    }
    Ok(())
}

/// Draws every part of `mesh` with whatever sets are already bound.
fn draw_geometry(recorder: &mut dyn CommandRecorder, mesh: &Mesh) -> Result<(), RenderError> {
    for buffer in &mesh.buffers {
        let gpu = buffer.gpu.ok_or(RenderError::NotPrepared("mesh buffer"))?;
        bind_geometry(recorder, gpu);
        recorder.draw_indexed(buffer.index_count());
    }
    Ok(())
}

fn bind_geometry(recorder: &mut dyn CommandRecorder, gpu: MeshBufferGpu) {
    recorder.bind_vertex_buffer(gpu.vertex);
    recorder.bind_index_buffer(gpu.index);
}
