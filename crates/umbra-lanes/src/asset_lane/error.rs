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

//! Errors raised while reading assets from disk.

use std::path::PathBuf;
use thiserror::Error;
use umbra_core::scene::MeshError;

/// Why an asset could not be loaded.
#[derive(Debug, Error)]
pub enum AssetError {
    /// The file could not be read.
    #[error("Cannot read '{path}': {source}")]
    Io {
        /// The file that was requested.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The image bytes could not be decoded.
    #[error("Image decode error: {0}")]
    Decode(#[from] image::ImageError),
    /// The image has no pixels.
    #[error("Image has no pixels")]
    EmptyImage,
    /// The OBJ file could not be parsed.
    #[error("Cannot parse OBJ '{path}': {source}")]
    Obj {
        /// The OBJ file.
        path: PathBuf,
        /// The parser error.
        #[source]
        source: tobj::LoadError,
    },
    /// A model has more vertices than 16-bit indices can address.
    #[error("Model '{model}' has {count} vertices, more than 16-bit indices can address")]
    TooManyVertices {
        /// The model name inside the OBJ file.
        model: String,
        /// Its vertex count.
        count: usize,
    },
    /// The OBJ file contains no model.
    #[error("'{0}' contains no model")]
    Empty(PathBuf),
    /// The parsed geometry is not a valid triangle list.
    #[error("Invalid mesh: {0}")]
    Mesh(#[from] MeshError),
    /// The six faces of a cubemap are not squares of one size.
    #[error("Cubemap faces in '{0}' are not squares of one size")]
    CubemapFaces(PathBuf),
}

impl AssetError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AssetError::Io {
            path: path.into(),
            source,
        }
    }
}
