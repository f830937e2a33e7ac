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

//! The scene model: what the renderer draws.
//!
//! A [`Scene`] owns a mesh arena, the user nodes that draw those meshes, a fixed array of
//! [`LIGHT_SLOTS`] light slots with their visualization cubes, a skybox and a shadow debug
//! quad. The model is plain data; `umbra-lanes` reads it each frame to stream uniforms and
//! record passes.

pub mod camera;
pub mod graph;
pub mod light;
pub mod material;
pub mod mesh;
pub mod node;
pub mod texture;

pub use camera::{Camera, CameraMode};
pub use graph::{Scene, Skybox, LIGHT_CUBE_SCALE};
pub use light::{
    Ambient, AmbientMode, Brdf, Light, LightKind, LightParams, LightProperty, LIGHT_SLOTS,
    SHADOW_LIGHT_SLOT,
};
pub use material::{Material, MaterialParams, MaterialTemplate};
pub use mesh::{Mesh, MeshBuffer, MeshBufferGpu, MeshError, MeshId};
pub use node::{is_scale_homothety, NodeGpu, SceneNode};
pub use texture::{CubemapData, Texture, TextureData};
