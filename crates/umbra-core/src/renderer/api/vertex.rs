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

//! The vertex format consumed by every pipeline.

use std::mem::{offset_of, size_of};

/// One mesh vertex.
///
/// The stride and attribute offsets are fixed: every pipeline reads location 0 = position,
/// 1 = texture coordinates, 2 = vertex color, 3 = normal from a single interleaved binding.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    /// Object-space position.
    pub position: [f32; 3],
    /// Texture coordinates.
    pub uv: [f32; 2],
    /// Vertex color.
    pub color: [f32; 3],
    /// Object-space normal.
    pub normal: [f32; 3],
}

impl Vertex {
    /// Creates a white vertex.
    pub const fn new(position: [f32; 3], uv: [f32; 2], normal: [f32; 3]) -> Self {
        Self {
            position,
            uv,
            color: [1.0, 1.0, 1.0],
            normal,
        }
    }
}

/// The data format of a vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexFormat {
    /// Two 32-bit floats.
    Float32x2,
    /// Three 32-bit floats.
    Float32x3,
}

/// One attribute of the interleaved vertex binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    /// Shader input location.
    pub location: u32,
    /// Component format.
    pub format: VertexFormat,
    /// Byte offset inside a [`Vertex`].
    pub offset: u32,
}

/// Byte stride of the vertex binding.
pub const VERTEX_STRIDE: u32 = size_of::<Vertex>() as u32;

/// Attributes of the vertex binding, by location.
pub const VERTEX_ATTRIBUTES: [VertexAttribute; 4] = [
    VertexAttribute {
        location: 0,
        format: VertexFormat::Float32x3,
        offset: offset_of!(Vertex, position) as u32,
    },
    VertexAttribute {
        location: 1,
        format: VertexFormat::Float32x2,
        offset: offset_of!(Vertex, uv) as u32,
    },
    VertexAttribute {
        location: 2,
        format: VertexFormat::Float32x3,
        offset: offset_of!(Vertex, color) as u32,
    },
    VertexAttribute {
        location: 3,
        format: VertexFormat::Float32x3,
        offset: offset_of!(Vertex, normal) as u32,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_layout_constants() {
        assert_eq!(VERTEX_STRIDE, 44);
        let offsets: Vec<u32> = VERTEX_ATTRIBUTES.iter().map(|a| a.offset).collect();
        assert_eq!(offsets, vec![0, 12, 20, 32]);
    }
}
