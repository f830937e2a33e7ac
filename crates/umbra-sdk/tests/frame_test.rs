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

use approx::assert_relative_eq;
use umbra_core::math::{Vec3, Vec4};
use umbra_core::platform::input::{InputSnapshot, Key};
use umbra_core::renderer::api::common::{Extent2D, RenderPassKind};
use umbra_core::renderer::api::keys::{PipelineKey, PipelineLayoutKey};
use umbra_core::renderer::api::uniforms::ShadowUniforms;
use umbra_core::renderer::testing::{Call, RecordingBackend};
use umbra_core::scene::{Light, LightKind, LightProperty, Mesh, Scene};
use umbra_sdk::{FrameOrchestrator, FrameOutcome, KeyboardOverlay};

fn spot_scene() -> Scene {
    let mut scene = Scene::default();
    // Inserted before the opaque cube on purpose.
    scene
        .add_node(Mesh::default_cube(), Vec3::new(3.0, 1.0, 0.0), Vec3::ONE, Vec3::ZERO)
        .transparent = true;
    scene.add_node(Mesh::default_cube(), Vec3::ZERO, Vec3::ONE, Vec3::ZERO);

    let mut spot = LightProperty::new(
        LightKind::Spot,
        Light {
            visible: true,
            position: Vec4::new(0.0, 14.5, 8.85, 1.0),
            rotation: Vec4::new(-47.0, 0.0, 0.0, 0.0),
            ..Light::default()
        },
    );
    spot.light.outer_angle = 62.7;
    spot.light.inner_angle = 45.2;
    scene.lights[0] = spot;
    scene
}

fn main_pass_pipelines(backend: &RecordingBackend) -> Vec<PipelineKey> {
    backend
        .pass_calls(RenderPassKind::Main)
        .into_iter()
        .filter_map(|c| match c {
            Call::BindPipeline(p) => Some(p),
            _ => None,
        })
        .collect()
}

#[test]
fn test_one_frame_of_the_spot_scene() {
    let mut backend = RecordingBackend::default();
    let mut scene = spot_scene();
    let mut overlay = KeyboardOverlay::new();
    let mut orchestrator = FrameOrchestrator::new();
    let extent = backend.extent;

    let outcome = orchestrator
        .draw_frame(&mut backend, &mut scene, &mut overlay, &InputSnapshot::default(), extent)
        .unwrap();
    assert_eq!(outcome, FrameOutcome::Presented);

    assert_eq!(
        main_pass_pipelines(&backend),
        vec![
            PipelineKey::Main,
            PipelineKey::LightCube,
            PipelineKey::Skybox,
            PipelineKey::TransparentBackFaces,
            PipelineKey::TransparentFrontFaces,
        ]
    );

    // The shadow pass binds one shared matrix set, filled from slot 0 only.
    let shadow = backend.pass_calls(RenderPassKind::Shadow);
    let shared = shadow
        .iter()
        .filter(|c| {
            matches!(
                c,
                Call::BindDescriptorSet {
                    layout: PipelineLayoutKey::Shadow,
                    set_index: 0,
                    ..
                }
            )
        })
        .count();
    assert_eq!(shared, 1);

    let shadow_block = backend
        .calls
        .iter()
        .find_map(|c| match c {
            Call::RecordUniformCopy { blocks, .. } if blocks.len() == 6 => Some(blocks[4]),
            _ => None,
        })
        .unwrap();
    let expected = ShadowUniforms::from(&scene.lights[0]);
    assert_eq!(
        backend.last_write(shadow_block).unwrap(),
        bytemuck::bytes_of(&expected)
    );
}

#[test]
fn test_light_cube_follows_its_light() {
    let mut backend = RecordingBackend::default();
    let mut scene = spot_scene();
    let mut orchestrator = FrameOrchestrator::new();
    let extent = backend.extent;
    orchestrator
        .draw_frame(
            &mut backend,
            &mut scene,
            &mut KeyboardOverlay::new(),
            &InputSnapshot::default(),
            extent,
        )
        .unwrap();

    let cube = &scene.light_cubes()[0];
    assert_relative_eq!(cube.position.y, 14.5);
    assert_relative_eq!(cube.position.z, 8.85);
}

#[test]
fn test_overlay_edits_land_in_the_same_frame() {
    let mut backend = RecordingBackend::default();
    let mut scene = spot_scene();
    let mut overlay = KeyboardOverlay::new();
    let mut orchestrator = FrameOrchestrator::new();
    let extent = Extent2D::new(1280, 720);

    orchestrator
        .draw_frame(
            &mut backend,
            &mut scene,
            &mut overlay,
            &InputSnapshot::with_keys([Key::Digit3, Key::F1]),
            extent,
        )
        .unwrap();

    assert_eq!(scene.lights[0].kind(), LightKind::Directional);
    assert!(orchestrator.overlay_state().hide_gui);
    // A directional light has no cube; the pipeline is still bound once.
    assert_eq!(
        main_pass_pipelines(&backend)
            .iter()
            .filter(|p| **p == PipelineKey::LightCube)
            .count(),
        1
    );
    let draws_between = |calls: &[Call]| {
        let start = calls
            .iter()
            .position(|c| *c == Call::BindPipeline(PipelineKey::LightCube))
            .unwrap();
        calls[start + 1..]
            .iter()
            .take_while(|c| !matches!(c, Call::BindPipeline(_)))
            .filter(|c| matches!(c, Call::DrawIndexed(_)))
            .count()
    };
    assert_eq!(draws_between(&backend.pass_calls(RenderPassKind::Main)), 0);
}
