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

// Umbra sandbox
// A floor, a row of material samples, a glass cube and two lights.

use anyhow::Result;
use std::time::Instant;
use umbra_sdk::prelude::*;

/// Index of the node the sandbox spins.
const SPINNING_NODE: usize = 1;

struct SandboxApp {
    started: Instant,
}

fn spot_light() -> LightProperty {
    let mut spot = LightProperty::new(
        LightKind::Spot,
        Light {
            color: Vec4::new(1.0, 0.97, 0.9, 1.0),
            visible: true,
            position: Vec4::new(0.0, 14.5, 8.85, 1.0),
            rotation: Vec4::new(-47.0, 0.0, 0.0, 0.0),
            radius: 40.0,
            intensity: 3.0,
            soft_edge: true,
            ..Light::default()
        },
    );
    spot.set_outer_angle(62.7);
    spot.set_inner_angle(45.2);
    spot
}

fn point_light() -> LightProperty {
    LightProperty::new(
        LightKind::Point,
        Light {
            color: Vec4::new(0.3, 0.5, 1.0, 1.0),
            visible: true,
            position: Vec4::new(-6.0, 3.0, -2.0, 1.0),
            radius: 12.0,
            intensity: 1.5,
            ..Light::default()
        },
    )
}

fn skybox(config: &EngineConfig) -> CubemapData {
    let dir = config.asset_path("textures/skybox");
    match load_cubemap(&dir) {
        Ok(cubemap) => cubemap,
        Err(e) => {
            log::warn!("Skybox unavailable ({e}), using a flat sky");
            CubemapData::solid([110, 140, 180, 255])
        }
    }
}

fn sample(template: MaterialTemplate) -> Mesh {
    let mut cube = Mesh::default_cube();
    cube.material.apply_template(template);
    cube
}

impl Application for SandboxApp {
    fn new(context: &EngineContext<'_>) -> Result<Self> {
        log::info!("Sandbox running on {}", context.device_name);
        Ok(Self {
            started: Instant::now(),
        })
    }

    fn build_scene(&mut self, context: &EngineContext<'_>) -> Result<Scene> {
        let mut scene = Scene::new(skybox(context.config));

        scene.add_node(
            sample(MaterialTemplate::Concrete),
            Vec3::new(0.0, -0.6, 0.0),
            Vec3::new(24.0, 0.2, 24.0),
            Vec3::ZERO,
        );

        let row = [
            MaterialTemplate::Gold,
            MaterialTemplate::Copper,
            MaterialTemplate::Iron,
            MaterialTemplate::Wood,
            MaterialTemplate::Rubber,
            MaterialTemplate::Brick,
        ];
        for (i, template) in row.into_iter().enumerate() {
            let x = (i as f32 - 2.5) * 2.5;
            scene.add_node(sample(template), Vec3::new(x, 0.5, 0.0), Vec3::ONE, Vec3::ZERO);
        }

        let mut glass = Mesh::default_cube();
        glass.material.params.color = Vec4::new(0.6, 0.85, 1.0, 0.35);
        glass.material.params.roughness = 0.05;
        scene
            .add_node(glass, Vec3::new(0.0, 1.5, 3.5), Vec3::splat(1.5), Vec3::new(0.0, 30.0, 0.0))
            .transparent = true;

        scene.lights[0] = spot_light();
        scene.lights[1] = point_light();
        scene.ambient.mode = AmbientMode::Trilight;
        scene.ambient.sky = Vec4::new(0.55, 0.65, 0.85, 1.0);
        scene.ambient.equator = Vec4::new(0.4, 0.4, 0.4, 1.0);
        scene.ambient.ground = Vec4::new(0.2, 0.17, 0.14, 1.0);
        scene.ambient.ka = 0.3;
        scene.light_params.use_shadow = true;

        log::info!("Sandbox scene built with {} nodes", scene.nodes.len());
        Ok(scene)
    }

    fn update(&mut self, scene: &mut Scene, _input: &InputSnapshot) {
        let t = self.started.elapsed().as_secs_f32();
        if let Some(node) = scene.nodes.get_mut(SPINNING_NODE) {
            node.rotation.y = (t * 45.0) % 360.0;
        }
    }
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = EngineConfig::from_environment()?;
    if let Err(e) = Engine::run::<SandboxApp>(config) {
        log::error!("Fatal: {e:?}");
        return Err(e);
    }
    Ok(())
}
