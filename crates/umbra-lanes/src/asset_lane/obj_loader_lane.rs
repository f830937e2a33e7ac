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

//! Wavefront OBJ mesh loading.

use super::{load_rgba8, AssetError, AssetLoaderLane};
use std::path::{Path, PathBuf};
use umbra_core::math::Vec3;
use umbra_core::renderer::api::vertex::Vertex;
use umbra_core::scene::{Mesh, MeshBuffer, Texture};

/// The texture files a model's material refers to, resolved against the OBJ folder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterialTexturePaths {
    /// `map_Kd`.
    pub albedo: Option<PathBuf>,
    /// `map_Bump` / `bump`.
    pub normal: Option<PathBuf>,
    /// `map_Ks`.
    pub specular: Option<PathBuf>,
    /// `map_Pm`.
    pub metallic: Option<PathBuf>,
    /// `map_Pr`.
    pub roughness: Option<PathBuf>,
}

impl MaterialTexturePaths {
    /// The five paths in descriptor binding order.
    pub fn slots(&self) -> [Option<&Path>; 5] {
        [
            self.albedo.as_deref(),
            self.normal.as_deref(),
            self.specular.as_deref(),
            self.metallic.as_deref(),
            self.roughness.as_deref(),
        ]
    }
}

/// One OBJ model as a 16-bit triangle list.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshBufferData {
    /// Model name from the `o`/`g` statement.
    pub name: String,
    /// Interleaved vertices; color is always white.
    pub vertices: Vec<Vertex>,
    /// Triangle-list indices.
    pub indices: Vec<u16>,
    /// Textures named by the model's material.
    pub textures: MaterialTexturePaths,
}

fn load_options() -> tobj::LoadOptions {
    tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    }
}

/// Parses OBJ text without resolving `mtllib` statements.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjLoaderLane;

impl AssetLoaderLane<Vec<MeshBufferData>> for ObjLoaderLane {
    fn load(&self, bytes: &[u8]) -> Result<Vec<MeshBufferData>, AssetError> {
        let (models, _) = tobj::load_obj_buf(&mut std::io::Cursor::new(bytes), &load_options(), |_| {
            Ok((Vec::new(), Default::default()))
        })
        .map_err(|source| AssetError::Obj {
            path: PathBuf::from("<memory>"),
            source,
        })?;
        if models.is_empty() {
            return Err(AssetError::Empty(PathBuf::from("<memory>")));
        }
        convert_models(&models, &[], Path::new(""))
    }
}

/// Loads every model of an OBJ file, with the material textures resolved relative to the
/// file's folder. A missing or broken `.mtl` is logged and the models keep no textures.
///
/// ## Errors
///
/// [`AssetError::Obj`] if the file cannot be parsed, [`AssetError::Empty`] if it holds no
/// model, [`AssetError::TooManyVertices`] if a model exceeds the 16-bit index range.
pub fn load_obj(path: impl AsRef<Path>) -> Result<Vec<MeshBufferData>, AssetError> {
    let path = path.as_ref();
    let (models, materials) =
        tobj::load_obj(path, &load_options()).map_err(|source| AssetError::Obj {
            path: path.to_path_buf(),
            source,
        })?;
    if models.is_empty() {
        return Err(AssetError::Empty(path.to_path_buf()));
    }
    let materials = materials.unwrap_or_else(|e| {
        log::warn!("No usable materials for {}: {e}", path.display());
        Vec::new()
    });
    let folder = path.parent().unwrap_or(Path::new(""));
    let buffers = convert_models(&models, &materials, folder)?;
    log::debug!("Loaded {} models from {}", buffers.len(), path.display());
    Ok(buffers)
}

/// Loads an OBJ file as one [`Mesh`] named after the file, one part per model.
///
/// Each material slot takes the first texture any model names for it; those files are
/// decoded immediately.
///
/// ## Errors
///
/// Everything [`load_obj`] and [`load_rgba8`] can return.
pub fn load_mesh(path: impl AsRef<Path>) -> Result<Mesh, AssetError> {
    let path = path.as_ref();
    let models = load_obj(path)?;

    let mut chosen: [Option<&Path>; 5] = [None; 5];
    for model in &models {
        for (slot, candidate) in chosen.iter_mut().zip(model.textures.slots()) {
            if slot.is_none() {
                *slot = candidate;
            }
        }
    }
    let mut textures = Vec::with_capacity(chosen.len());
    for file in chosen {
        textures.push(match file {
            Some(file) => Some(Texture::new(load_rgba8(file)?)),
            None => None,
        });
    }

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let buffers = models
        .into_iter()
        .map(|m| MeshBuffer::new(m.vertices, m.indices))
        .collect::<Result<Vec<_>, _>>()?;
    let mut mesh = Mesh::new(name, buffers);
    for (slot, texture) in mesh.material.textures_mut().into_iter().zip(textures) {
        if let Some(texture) = texture {
            *slot = texture;
        }
    }
    Ok(mesh)
}

fn convert_models(
    models: &[tobj::Model],
    materials: &[tobj::Material],
    folder: &Path,
) -> Result<Vec<MeshBufferData>, AssetError> {
    models
        .iter()
        .map(|model| {
            let textures = model
                .mesh
                .material_id
                .and_then(|id| materials.get(id))
                .map(|m| texture_paths(m, folder))
                .unwrap_or_default();
            convert_model(model, textures)
        })
        .collect()
}

fn texture_paths(material: &tobj::Material, folder: &Path) -> MaterialTexturePaths {
    let resolve = |name: Option<&String>| name.map(|n| folder.join(n.trim()));
    MaterialTexturePaths {
        albedo: resolve(material.diffuse_texture.as_ref()),
        normal: resolve(material.normal_texture.as_ref()),
        specular: resolve(material.specular_texture.as_ref()),
        metallic: resolve(material.unknown_param.get("map_Pm")),
        roughness: resolve(material.unknown_param.get("map_Pr")),
    }
}

fn convert_model(
    model: &tobj::Model,
    textures: MaterialTexturePaths,
) -> Result<MeshBufferData, AssetError> {
    let mesh = &model.mesh;
    let count = mesh.positions.len() / 3;
    // Indices run 0..count, so a u16 index addresses up to u16::MAX + 1 vertices.
    if count > usize::from(u16::MAX) + 1 {
        return Err(AssetError::TooManyVertices {
            model: model.name.clone(),
            count,
        });
    }
    // Bounded by the vertex count check above.
    let indices: Vec<u16> = mesh.indices.iter().map(|&i| i as u16).collect();

    let positions: Vec<Vec3> = mesh
        .positions
        .chunks_exact(3)
        .map(|p| Vec3::new(p[0], p[1], p[2]))
        .collect();
    let normals: Vec<Vec3> = if mesh.normals.len() == mesh.positions.len() {
        mesh.normals
            .chunks_exact(3)
            .map(|n| Vec3::new(n[0], n[1], n[2]))
            .collect()
    } else {
        smooth_normals(&positions, &indices)
    };
    let uv = |i: usize| {
        mesh.texcoords
            .get(i * 2..i * 2 + 2)
            .map_or([0.0, 0.0], |t| [t[0], t[1]])
    };

    let vertices = positions
        .iter()
        .zip(&normals)
        .enumerate()
        .map(|(i, (p, n))| Vertex::new(p.to_array(), uv(i), n.to_array()))
        .collect();

    Ok(MeshBufferData {
        name: model.name.clone(),
        vertices,
        indices,
        textures,
    })
}

/// Area-weighted average of the face normals around each vertex.
fn smooth_normals(positions: &[Vec3], indices: &[u16]) -> Vec<Vec3> {
    let mut sums = vec![Vec3::ZERO; positions.len()];
    for triangle in indices.chunks_exact(3) {
        let [a, b, c] = [0, 1, 2].map(|k| usize::from(triangle[k]));
        let (Some(&pa), Some(&pb), Some(&pc)) = (positions.get(a), positions.get(b), positions.get(c))
        else {
            continue;
        };
        let face = (pb - pa).cross(pc - pa);
        for i in [a, b, c] {
            sums[i] += face;
        }
    }
    sums.iter().map(Vec3::normalize).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::fs;

    const TRIANGLE_NO_NORMALS: &str = "o tri\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";

    #[test]
    fn test_missing_normals_are_generated() {
        let models = ObjLoaderLane.load(TRIANGLE_NO_NORMALS.as_bytes()).unwrap();
        assert_eq!(models.len(), 1);
        let tri = &models[0];
        assert_eq!(tri.indices, vec![0, 1, 2]);
        for v in &tri.vertices {
            assert_relative_eq!(v.normal[2], 1.0, epsilon = 1e-6);
            assert_eq!(v.color, [1.0, 1.0, 1.0]);
            assert_eq!(v.uv, [0.0, 0.0]);
        }
    }

    #[test]
    fn test_quads_are_triangulated() {
        let quad = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nvt 0 0\nvt 1 0\nvt 1 1\nvt 0 1\n\
                    f 1/1 2/2 3/3 4/4\n";
        let models = ObjLoaderLane.load(quad.as_bytes()).unwrap();
        assert_eq!(models[0].indices.len(), 6);
        assert_eq!(models[0].vertices[2].uv, [1.0, 1.0]);
    }

    #[test]
    fn test_material_textures_resolve_next_to_obj() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("box.mtl"),
            "newmtl m\nmap_Kd albedo.png\nmap_Bump normal.png\nmap_Pr rough.png\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("box.obj"),
            format!("mtllib box.mtl\nusemtl m\n{TRIANGLE_NO_NORMALS}"),
        )
        .unwrap();

        let models = load_obj(dir.path().join("box.obj")).unwrap();
        let paths = &models[0].textures;
        assert_eq!(paths.albedo.as_deref(), Some(dir.path().join("albedo.png").as_path()));
        assert_eq!(paths.normal.as_deref(), Some(dir.path().join("normal.png").as_path()));
        assert_eq!(paths.roughness.as_deref(), Some(dir.path().join("rough.png").as_path()));
        assert!(paths.specular.is_none());
        assert!(paths.metallic.is_none());
    }

    #[test]
    fn test_load_mesh_decodes_material_textures() {
        let dir = tempfile::tempdir().unwrap();
        image::RgbaImage::from_pixel(2, 2, image::Rgba([9, 8, 7, 255]))
            .save(dir.path().join("albedo.png"))
            .unwrap();
        fs::write(dir.path().join("a.mtl"), "newmtl m\nmap_Kd albedo.png\n").unwrap();
        fs::write(
            dir.path().join("a.obj"),
            format!("mtllib a.mtl\nusemtl m\n{TRIANGLE_NO_NORMALS}"),
        )
        .unwrap();

        let mesh = load_mesh(dir.path().join("a.obj")).unwrap();
        assert_eq!(mesh.name, "a.obj");
        assert_eq!(mesh.buffers.len(), 1);
        assert_eq!(mesh.material.albedo.data.width, 2);
        assert_eq!(&mesh.material.albedo.data.pixels[..4], &[9, 8, 7, 255]);
        assert_eq!(mesh.material.normal.data.width, 1);
    }

    #[test]
    fn test_missing_obj_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_obj(dir.path().join("missing.obj")),
            Err(AssetError::Obj { .. })
        ));
    }

    #[test]
    fn test_too_many_vertices_rejected() {
        // Faces must reference every vertex; unreferenced ones are dropped when reindexing.
        let triangles = usize::from(u16::MAX) / 3 + 1;
        let mut obj = String::from("o big\n");
        for i in 0..triangles * 3 {
            obj.push_str(&format!("v {i} {} 0\n", i % 3));
        }
        for t in 0..triangles {
            obj.push_str(&format!("f {} {} {}\n", 3 * t + 1, 3 * t + 2, 3 * t + 3));
        }
        let err = ObjLoaderLane.load(obj.as_bytes()).unwrap_err();
        assert!(matches!(err, AssetError::TooManyVertices { count, .. } if count == 65_538));
    }

    #[test]
    fn test_full_16_bit_index_range_loads() {
        // 21845 triangles give 65535 vertices; one more triangle adds the 65536th.
        let triangles = usize::from(u16::MAX) / 3;
        let mut obj = String::from("o full\n");
        for i in 0..=triangles * 3 {
            obj.push_str(&format!("v {i} {} 0\n", i % 3));
        }
        for t in 0..triangles {
            obj.push_str(&format!("f {} {} {}\n", 3 * t + 1, 3 * t + 2, 3 * t + 3));
        }
        obj.push_str(&format!("f {} 1 2\n", triangles * 3 + 1));

        let models = ObjLoaderLane.load(obj.as_bytes()).unwrap();
        assert_eq!(models[0].vertices.len(), 65_536);
        assert_eq!(models[0].indices.iter().max(), Some(&u16::MAX));
    }
}
