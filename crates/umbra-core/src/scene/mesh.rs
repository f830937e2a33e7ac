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

//! Meshes, their buffers, and the built-in procedural shapes.

use super::material::Material;
use crate::renderer::api::ids::{BufferId, DescriptorSetId};
use crate::renderer::api::vertex::Vertex;
use std::fmt;

/// Index of a mesh in the scene's mesh arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshId(pub usize);

/// Why a vertex/index pair cannot form a triangle list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeshError {
    /// The index count is not a multiple of 3.
    NotTriangles {
        /// The offending index count.
        index_count: usize,
    },
    /// An index refers past the end of the vertex array.
    IndexOutOfRange {
        /// The offending index.
        index: u16,
        /// The vertex count.
        vertex_count: usize,
    },
}

impl fmt::Display for MeshError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeshError::NotTriangles { index_count } => {
                write!(f, "{index_count} indices do not form a triangle list")
            }
            MeshError::IndexOutOfRange {
                index,
                vertex_count,
            } => write!(f, "Index {index} is out of range for {vertex_count} vertices"),
        }
    }
}

impl std::error::Error for MeshError {}

/// The device buffers of a [`MeshBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshBufferGpu {
    /// Device-local vertex buffer.
    pub vertex: BufferId,
    /// Device-local 16-bit index buffer.
    pub index: BufferId,
}

/// One drawable part of a mesh: a triangle list and its device buffers.
///
/// The geometry is immutable once built. The descriptor set is allocated lazily the first
/// time the buffer is bound and cached afterwards; a buffer never owns more than one.
#[derive(Debug, Clone)]
pub struct MeshBuffer {
    vertices: Vec<Vertex>,
    indices: Vec<u16>,
    /// Device buffers, once uploaded.
    pub gpu: Option<MeshBufferGpu>,
    descriptor_set: Option<DescriptorSetId>,
}

impl MeshBuffer {
    /// Builds a mesh buffer from a triangle list.
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u16>) -> Result<Self, MeshError> {
        if indices.len() % 3 != 0 {
            return Err(MeshError::NotTriangles {
                index_count: indices.len(),
            });
        }
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
            return Err(MeshError::IndexOutOfRange {
                index,
                vertex_count: vertices.len(),
            });
        }
        Ok(Self {
            vertices,
            indices,
            gpu: None,
            descriptor_set: None,
        })
    }

    /// The vertices.
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// The 16-bit triangle-list indices.
    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    /// Number of indices to draw.
    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    /// The cached descriptor set, if one was allocated.
    pub fn descriptor_set(&self) -> Option<DescriptorSetId> {
        self.descriptor_set
    }

    /// Returns the cached descriptor set, allocating it with `allocate` on first use.
    pub fn descriptor_set_or_try_insert_with<E>(
        &mut self,
        allocate: impl FnOnce() -> Result<DescriptorSetId, E>,
    ) -> Result<DescriptorSetId, E> {
        if let Some(set) = self.descriptor_set {
            return Ok(set);
        }
        let set = allocate()?;
        self.descriptor_set = Some(set);
        Ok(set)
    }
}

/// A named list of mesh buffers sharing one material.
#[derive(Debug, Clone)]
pub struct Mesh {
    /// Display name.
    pub name: String,
    /// Drawable parts.
    pub buffers: Vec<MeshBuffer>,
    /// The material every part is shaded with.
    pub material: Material,
}

impl Mesh {
    /// Creates a mesh with a default material.
    pub fn new(name: impl Into<String>, buffers: Vec<MeshBuffer>) -> Self {
        Self {
            name: name.into(),
            buffers,
            material: Material::default(),
        }
    }

    /// A unit cube centered on the origin, four vertices per face.
    pub fn default_cube() -> Self {
        Self::new("DefaultCube", vec![procedural(&CUBE_VERTICES, &CUBE_INDICES)])
    }

    /// A unit quad in the XY plane with a corner at the origin.
    pub fn default_quad() -> Self {
        Self::new("DefaultQuad", vec![procedural(&QUAD_VERTICES, &QUAD_INDICES)])
    }
}

fn procedural(vertices: &[Vertex], indices: &[u16]) -> MeshBuffer {
    MeshBuffer {
        vertices: vertices.to_vec(),
        indices: indices.to_vec(),
        gpu: None,
        descriptor_set: None,
    }
}

const fn v(position: [f32; 3], uv: [f32; 2], color: [f32; 3], normal: [f32; 3]) -> Vertex {
    Vertex {
        position,
        uv,
        color,
        normal,
    }
}

const R: [f32; 3] = [1.0, 0.0, 0.0];
const G: [f32; 3] = [0.0, 1.0, 0.0];
const B: [f32; 3] = [0.0, 0.0, 1.0];
const W: [f32; 3] = [1.0, 1.0, 1.0];

#[rustfmt::skip]
const CUBE_VERTICES: [Vertex; 24] = [
    // +Z
    v([-0.5, -0.5, 0.5], [1.0, 0.0], R, [0.0, 0.0, 1.0]),
    v([0.5, -0.5, 0.5], [0.0, 0.0], G, [0.0, 0.0, 1.0]),
    v([0.5, 0.5, 0.5], [0.0, 1.0], B, [0.0, 0.0, 1.0]),
    v([-0.5, 0.5, 0.5], [1.0, 1.0], W, [0.0, 0.0, 1.0]),
    // -Z
    v([-0.5, -0.5, -0.5], [1.0, 0.0], R, [0.0, 0.0, -1.0]),
    v([-0.5, 0.5, -0.5], [1.0, 1.0], W, [0.0, 0.0, -1.0]),
    v([0.5, 0.5, -0.5], [0.0, 1.0], B, [0.0, 0.0, -1.0]),
    v([0.5, -0.5, -0.5], [0.0, 0.0], G, [0.0, 0.0, -1.0]),
    // -Y
    v([-0.5, -0.5, -0.5], [1.0, 0.0], R, [0.0, -1.0, 0.0]),
    v([0.5, -0.5, -0.5], [0.0, 0.0], G, [0.0, -1.0, 0.0]),
    v([0.5, -0.5, 0.5], [0.0, 1.0], B, [0.0, -1.0, 0.0]),
    v([-0.5, -0.5, 0.5], [1.0, 1.0], W, [0.0, -1.0, 0.0]),
    // +Y
    v([0.5, 0.5, -0.5], [0.0, 1.0], B, [0.0, 1.0, 0.0]),
    v([-0.5, 0.5, -0.5], [1.0, 1.0], W, [0.0, 1.0, 0.0]),
    v([-0.5, 0.5, 0.5], [1.0, 0.0], R, [0.0, 1.0, 0.0]),
    v([0.5, 0.5, 0.5], [0.0, 0.0], G, [0.0, 1.0, 0.0]),
    // +X
    v([0.5, -0.5, 0.5], [1.0, 0.0], R, [1.0, 0.0, 0.0]),
    v([0.5, -0.5, -0.5], [0.0, 0.0], G, [1.0, 0.0, 0.0]),
    v([0.5, 0.5, -0.5], [0.0, 1.0], B, [1.0, 0.0, 0.0]),
    v([0.5, 0.5, 0.5], [1.0, 1.0], W, [1.0, 0.0, 0.0]),
    // -X
    v([-0.5, -0.5, -0.5], [1.0, 0.0], R, [-1.0, 0.0, 0.0]),
    v([-0.5, -0.5, 0.5], [0.0, 0.0], G, [-1.0, 0.0, 0.0]),
    v([-0.5, 0.5, 0.5], [0.0, 1.0], B, [-1.0, 0.0, 0.0]),
    v([-0.5, 0.5, -0.5], [1.0, 1.0], W, [-1.0, 0.0, 0.0]),
];

#[rustfmt::skip]
const CUBE_INDICES: [u16; 36] = [
    0, 1, 2, 2, 3, 0,
    4, 5, 6, 6, 7, 4,
    8, 9, 10, 10, 11, 8,
    12, 13, 14, 14, 15, 12,
    16, 17, 18, 18, 19, 16,
    20, 21, 22, 22, 23, 20,
];

const QUAD_VERTICES: [Vertex; 4] = [
    v([1.0, 1.0, 0.0], [1.0, 1.0], W, [0.0, 0.0, 1.0]),
    v([0.0, 1.0, 0.0], [0.0, 1.0], W, [0.0, 0.0, 1.0]),
    v([0.0, 0.0, 0.0], [0.0, 0.0], W, [0.0, 0.0, 1.0]),
    v([1.0, 0.0, 0.0], [1.0, 0.0], W, [0.0, 0.0, 1.0]),
];

const QUAD_INDICES: [u16; 6] = [0, 1, 2, 2, 3, 0];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_cube_shape() {
        let cube = Mesh::default_cube();
        assert_eq!(cube.buffers.len(), 1);
        let b = &cube.buffers[0];
        assert_eq!(b.vertices().len(), 24);
        assert_eq!(b.index_count(), 36);
        // Each face's normal points away from the center.
        for face in b.vertices().chunks(4) {
            let n = face[0].normal;
            assert!(face.iter().all(|v| v.normal == n));
            let p = face[0].position;
            assert!(p[0] * n[0] + p[1] * n[1] + p[2] * n[2] > 0.0);
        }
    }

    #[test]
    fn test_default_quad_shape() {
        let quad = Mesh::default_quad();
        assert_eq!(quad.buffers[0].indices(), &[0, 1, 2, 2, 3, 0]);
        assert!(quad.buffers[0].vertices().iter().all(|v| v.position[2] == 0.0));
    }

    #[test]
    fn test_new_rejects_non_triangle_lists() {
        let verts = vec![Vertex::default(); 3];
        assert_eq!(
            MeshBuffer::new(verts.clone(), vec![0, 1]).err(),
            Some(MeshError::NotTriangles { index_count: 2 })
        );
        assert!(matches!(
            MeshBuffer::new(verts, vec![0, 1, 3]),
            Err(MeshError::IndexOutOfRange { index: 3, .. })
        ));
    }

    #[test]
    fn test_descriptor_set_is_allocated_once() {
        let mut b = Mesh::default_cube().buffers.remove(0);
        let mut calls = 0;
        for _ in 0..2 {
            let set = b
                .descriptor_set_or_try_insert_with::<()>(|| {
                    calls += 1;
                    Ok(DescriptorSetId(4))
                })
                .unwrap();
            assert_eq!(set, DescriptorSetId(4));
        }
        assert_eq!(calls, 1);
        assert_eq!(b.descriptor_set(), Some(DescriptorSetId(4)));
    }
}
