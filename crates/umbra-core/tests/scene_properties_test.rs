use approx::assert_relative_eq;
use umbra_core::math::{Mat4, Vec3, Vec4};
use umbra_core::renderer::api::flags::MemoryPropertyFlags;
use umbra_core::renderer::api::image::mip_levels;
use umbra_core::renderer::api::memory::{select_memory_type, MemoryType};
use umbra_core::renderer::api::uniforms::{LightsUniforms, ShadowUniforms};
use umbra_core::scene::{
    is_scale_homothety, Light, LightKind, LightProperty, Mesh, Scene, LIGHT_CUBE_SCALE,
};

fn spot_light() -> Light {
    Light {
        visible: true,
        position: Vec4::new(0.0, 14.5, 8.85, 1.0),
        rotation: Vec4::new(-47.0, 0.0, 0.0, 0.0),
        ..Light::default()
    }
}

#[test]
fn test_kind_changes_keep_cone_consistent() {
    let mut slot = LightProperty::new(LightKind::Point, spot_light());
    assert_eq!(slot.light.outer_angle, 180.0);

    for outer in [0.5, 30.0, 62.7, 179.0] {
        slot.change_kind(LightKind::Point);
        slot.light.outer_angle = outer;
        slot.change_kind(LightKind::Spot);
        let l = slot.light;
        assert!(1.0 <= l.inner_angle && l.inner_angle <= l.outer_angle && l.outer_angle <= 60.0);
        assert_eq!(l.position.w, 1.0);
    }

    slot.change_kind(LightKind::Directional);
    assert_eq!(slot.light.position.w, 0.0);
    assert!(!slot.shows_cube());
}

#[test]
fn test_slider_edits_hold_the_cone_invariant() {
    let mut slot = LightProperty::new(LightKind::Spot, spot_light());
    slot.set_inner_angle(120.0);
    assert_eq!(slot.light.outer_angle, 120.0);
    slot.set_outer_angle(20.0);
    assert_eq!(slot.light.inner_angle, 20.0);
    slot.set_outer_angle(500.0);
    assert_eq!(slot.light.outer_angle, 179.0);
}

#[test]
fn test_mip_count_and_first_fit_memory() {
    assert_eq!(mip_levels(513, 300), 10);

    let host = MemoryType {
        property_flags: MemoryPropertyFlags::STAGING,
        heap_index: 1,
    };
    let local = MemoryType {
        property_flags: MemoryPropertyFlags::DEVICE_LOCAL,
        heap_index: 0,
    };
    let types = [host, host, host, local, local];
    assert_eq!(
        select_memory_type(&types, 0b1_1111, MemoryPropertyFlags::DEVICE_LOCAL),
        Ok(3)
    );
    assert!(select_memory_type(&types, 0b0111, MemoryPropertyFlags::DEVICE_LOCAL).is_err());
}

#[test]
fn test_homothety_on_generated_scales() {
    for i in 0..50 {
        let base = 0.1 + i as f32 * 0.37;
        assert!(is_scale_homothety(Vec3::new(base, base + 0.004, base - 0.0009)));
        assert!(!is_scale_homothety(Vec3::new(base, base, base + 0.01)));
    }
}

#[test]
fn test_light_cubes_follow_their_slots() {
    let mut scene = Scene::default();
    scene.add_node(Mesh::default_cube(), Vec3::ZERO, Vec3::ONE, Vec3::ZERO);
    scene.lights[3] = LightProperty::new(
        LightKind::Point,
        Light {
            visible: true,
            color: Vec4::new(0.2, 0.4, 0.6, 1.0),
            position: Vec4::new(1.0, 2.0, 3.0, 1.0),
            ..Light::default()
        },
    );
    scene.update_light_cubes();

    let cube = &scene.light_cubes()[3];
    assert_eq!(cube.position, Vec3::new(1.0, 2.0, 3.0));
    assert_eq!(cube.scale, Vec3::splat(LIGHT_CUBE_SCALE));
    let color = scene.mesh(cube.mesh()).map(|m| m.material.params.color);
    assert_eq!(color, Some(Vec4::new(0.2, 0.4, 0.6, 1.0)));
    // Another cube keeps its own color.
    let other = scene.mesh(scene.light_cubes()[4].mesh()).map(|m| m.material.params.color);
    assert_eq!(other, Some(Vec4::ZERO));
}

#[test]
fn test_shadow_block_uses_slot_zero_matrix() {
    let mut scene = Scene::default();
    scene.lights[0] = LightProperty::new(LightKind::Spot, spot_light());
    scene.lights[0].light.outer_angle = 62.7;
    scene.lights[0].light.inner_angle = 45.2;

    let block = ShadowUniforms::from(&scene.lights[0]);
    assert_eq!(block.light_kind, 1);
    assert_ne!(block.depth_vp, Mat4::IDENTITY);

    // A point straight ahead of the light projects to the center of its shadow map.
    let ahead = scene.lights[0].light.position.truncate() + scene.lights[0].light.front() * 5.0;
    let clip = block.depth_vp * Vec4::new(ahead.x, ahead.y, ahead.z, 1.0);
    assert_relative_eq!(clip.x / clip.w, 0.0, epsilon = 1e-4);
    assert_relative_eq!(clip.y / clip.w, 0.0, epsilon = 1e-4);

    let lights = LightsUniforms::from(&scene.lights);
    assert_eq!(lights.lights[0].outer_angle, 62.7);
}
