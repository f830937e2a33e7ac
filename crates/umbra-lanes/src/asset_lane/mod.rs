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

//! Asset lane: decoding meshes and images from disk into scene data.

mod error;
mod obj_loader_lane;
mod texture_loader_lane;

pub use error::*;
pub use obj_loader_lane::*;
pub use texture_loader_lane::*;

/// Parses raw file bytes into an asset of type `A`.
pub trait AssetLoaderLane<A> {
    /// Decodes `bytes`.
    fn load(&self, bytes: &[u8]) -> Result<A, AssetError>;
}
