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

use umbra_core::math::{Vec3, Vec4};
use umbra_core::platform::input::InputSnapshot;
use umbra_core::renderer::api::common::{Extent2D, RenderPassKind, SHADOW_DEPTH_BIAS};
use umbra_core::renderer::api::ids::DescriptorSetId;
use umbra_core::renderer::api::keys::{PipelineKey, PipelineLayoutKey, SetLayoutKey};
use umbra_core::renderer::api::uniforms::ShadowUniforms;
use umbra_core::renderer::testing::{Call, RecordingBackend};
use umbra_core::renderer::traits::{CommandRecorder, DebugOverlay, OverlayState};
use umbra_core::renderer::RenderError;
use umbra_core::scene::{Light, LightKind, LightProperty, Mesh, Scene};
use umbra_lanes::render_lane::{
    flush, prepare_scene_buffers, prepare_scene_uniforms, record_main_pass, record_shadow_pass,
    update_node_uniforms, update_scene_uniforms, update_shadow_uniforms, MainPassInputs,
    SceneBindings,
};

/// Counts how often it was asked to record.
#[derive(Default)]
struct CountingOverlay {
    recorded: usize,
}

impl DebugOverlay for CountingOverlay {
    fn new_frame(&mut self, _input: &InputSnapshot) {}

    fn build(&mut self, _scene: &mut Scene, _state: &mut OverlayState) {}

    fn record(&mut self, _recorder: &mut dyn CommandRecorder) {
        self.recorded += 1;
    }
}

fn spot_scene() -> Scene {
    let mut scene = Scene::default();
    // The transparent node is inserted first; draw order must not follow insertion order.
    scene
        .add_node(Mesh::default_quad(), Vec3::new(0.0, 2.0, 0.0), Vec3::ONE, Vec3::ZERO)
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

fn render_one_frame(
    device: &mut RecordingBackend,
    scene: &mut Scene,
    overlay_state: OverlayState,
) -> Result<SceneBindings, RenderError> {
    let blocks = prepare_scene_uniforms(device)?;
    let bindings = prepare_scene_buffers(device, scene, &blocks)?;
    let extent = device.extent;

    update_node_uniforms(device, scene)?;
    update_shadow_uniforms(device, &blocks, scene)?;
    update_scene_uniforms(device, &blocks, scene, extent)?;
    flush(device, &blocks)?;

    let mut overlay = CountingOverlay::default();
    record_shadow_pass(device, scene, &bindings)?;
    let inputs = MainPassInputs {
        bindings: &bindings,
        extent,
        overlay_state,
    };
    record_main_pass(device, scene, &inputs, &mut overlay)?;
    assert_eq!(overlay.recorded, 1);
    Ok(bindings)
}

#[test]
fn test_main_pass_order_is_fixed() {
    let mut device = RecordingBackend::default();
    let mut scene = spot_scene();
    render_one_frame(&mut device, &mut scene, OverlayState::default()).unwrap();

    assert_eq!(
        device.bound_pipelines(),
        vec![
            PipelineKey::Shadow,
            PipelineKey::Main,
            PipelineKey::LightCube,
            PipelineKey::Skybox,
            PipelineKey::TransparentBackFaces,
            PipelineKey::TransparentFrontFaces,
        ]
    );
}

#[test]
fn test_shadow_pass_binds_only_slot_zero_matrix() {
    let mut device = RecordingBackend::default();
    let mut scene = spot_scene();
    let bindings = render_one_frame(&mut device, &mut scene, OverlayState::default()).unwrap();

    let shadow = device.pass_calls(RenderPassKind::Shadow);
    let shared_binds: Vec<_> = shadow
        .iter()
        .filter(|c| matches!(c, Call::BindDescriptorSet { set_index: 0, .. }))
        .collect();
    assert_eq!(
        shared_binds,
        vec![&Call::BindDescriptorSet {
            layout: PipelineLayoutKey::Shadow,
            set_index: 0,
            set: bindings.shadow,
        }]
    );
    assert!(shadow.contains(&Call::SetDepthBias(SHADOW_DEPTH_BIAS)));
    assert!(shadow.contains(&Call::SetViewport(Extent2D::new(2048, 2048))));
    // Only the opaque cube casts a shadow.
    assert_eq!(
        shadow.iter().filter(|c| matches!(c, Call::DrawIndexed(_))).count(),
        1
    );

    let expected = ShadowUniforms::from(&scene.lights[0]);
    let written = device
        .calls
        .iter()
        .rev()
        .find_map(|c| match c {
            Call::WriteUniformBlock { bytes, .. }
                if bytes.len() == std::mem::size_of::<ShadowUniforms>() =>
            {
                Some(bytemuck::pod_read_unaligned::<ShadowUniforms>(bytes))
            }
            _ => None,
        })
        .unwrap();
    assert_eq!(written, expected);
    assert_ne!(written.depth_vp, umbra_core::math::Mat4::IDENTITY);
}

#[test]
fn test_debug_quad_drawn_only_when_gui_visible() {
    let shown = OverlayState {
        show_shadow_map_debug: true,
        hide_gui: false,
    };
    let mut device = RecordingBackend::default();
    let mut scene = spot_scene();
    render_one_frame(&mut device, &mut scene, shown).unwrap();
    let pipelines = device.bound_pipelines();
    let quad = pipelines.iter().position(|p| *p == PipelineKey::QuadDebug);
    let skybox = pipelines.iter().position(|p| *p == PipelineKey::Skybox);
    assert!(quad.is_some());
    assert!(quad < skybox);

    let hidden = OverlayState {
        hide_gui: true,
        ..shown
    };
    let mut device = RecordingBackend::default();
    let mut scene = spot_scene();
    render_one_frame(&mut device, &mut scene, hidden).unwrap();
    assert!(!device.bound_pipelines().contains(&PipelineKey::QuadDebug));
}

#[test]
fn test_light_cubes_skip_directional_and_hidden_slots() {
    let mut device = RecordingBackend::default();
    let mut scene = spot_scene();
    scene.lights[1] = LightProperty::new(
        LightKind::Directional,
        Light {
            visible: true,
            ..Light::default()
        },
    );
    scene.lights[2] = LightProperty::new(
        LightKind::Point,
        Light {
            visible: true,
            ..Light::default()
        },
    );
    render_one_frame(&mut device, &mut scene, OverlayState::default()).unwrap();

    let main = device.pass_calls(RenderPassKind::Main);
    let cube_draws = main
        .iter()
        .filter(|c| {
            matches!(
                c,
                Call::BindDescriptorSet {
                    layout: PipelineLayoutKey::LightCube,
                    ..
                }
            )
        })
        .count();
    assert_eq!(cube_draws, 2);
}

#[test]
fn test_recording_before_preparation_is_reported() {
    let mut device = RecordingBackend::default();
    let scene = spot_scene();
    let bindings = SceneBindings {
        shadow: DescriptorSetId(0),
        skybox: DescriptorSetId(0),
        quad_debug: DescriptorSetId(0),
    };
    assert!(matches!(
        record_shadow_pass(&mut device, &scene, &bindings),
        Err(RenderError::NotPrepared(_))
    ));
}

#[test]
fn test_lazy_descriptor_allocation_is_idempotent() {
    let mut device = RecordingBackend::default();
    let mut scene = spot_scene();
    let blocks = prepare_scene_uniforms(&mut device).unwrap();
    prepare_scene_buffers(&mut device, &mut scene, &blocks).unwrap();
    prepare_scene_buffers(&mut device, &mut scene, &blocks).unwrap();

    assert_eq!(
        device.count(|c| matches!(
            c,
            Call::AllocateDescriptorSet {
                layout: SetLayoutKey::Main,
                ..
            }
        )),
        2
    );
}
