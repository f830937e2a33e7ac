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

//! # Umbra SDK
//!
//! The public entry point of the Umbra renderer. Implement [`Application`] to build a
//! scene, then hand it to [`Engine::run`]:
//!
//! ```no_run
//! use umbra_sdk::prelude::*;
//!
//! struct Demo;
//!
//! impl Application for Demo {
//!     fn new(_context: &EngineContext<'_>) -> anyhow::Result<Self> {
//!         Ok(Demo)
//!     }
//!
//!     fn build_scene(&mut self, _context: &EngineContext<'_>) -> anyhow::Result<Scene> {
//!         let mut scene = Scene::default();
//!         scene.add_node(Mesh::default_cube(), Vec3::ZERO, Vec3::ONE, Vec3::ZERO);
//!         Ok(scene)
//!     }
//! }
//!
//! fn main() -> anyhow::Result<()> {
//!     Engine::run::<Demo>(EngineConfig::default())
//! }
//! ```

#![warn(missing_docs)]

mod config;
mod engine;
mod orchestrator;
mod overlay;

pub use config::{EngineConfig, ASSETS_ENV, CONFIG_FILE, VALIDATION_ENV};
pub use engine::{Application, Engine, EngineContext};
pub use orchestrator::{FrameOrchestrator, FrameOutcome};
pub use overlay::KeyboardOverlay;

/// The types an application needs to build and animate a scene.
pub mod prelude {
    pub use crate::{Application, Engine, EngineConfig, EngineContext, KeyboardOverlay};
    pub use umbra_core::math::{Vec3, Vec4};
    pub use umbra_core::platform::input::{InputSnapshot, Key, MouseButton};
    pub use umbra_core::scene::{
        AmbientMode, Brdf, Camera, CameraMode, CubemapData, Light, LightKind, LightProperty,
        Material, MaterialParams, MaterialTemplate, Mesh, MeshBuffer, Scene, SceneNode,
        TextureData,
    };
    pub use umbra_lanes::asset_lane::{load_cubemap, load_mesh, load_obj, load_rgba8, AssetError};
}
