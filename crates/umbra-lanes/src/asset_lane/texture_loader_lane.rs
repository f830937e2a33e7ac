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

//! RGBA8 texture and cubemap decoding.

use super::{AssetError, AssetLoaderLane};
use std::path::Path;
use umbra_core::scene::{CubemapData, TextureData};

/// Cubemap face file stems, in upload order (+X, -X, +Y, -Y, +Z, -Z).
pub const CUBEMAP_FACES: [&str; 6] = ["posx", "negx", "posy", "negy", "posz", "negz"];

/// Decodes any format the `image` crate reads into tightly packed RGBA8.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextureLoaderLane;

impl AssetLoaderLane<TextureData> for TextureLoaderLane {
    fn load(&self, bytes: &[u8]) -> Result<TextureData, AssetError> {
        let rgba = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = rgba.dimensions();
        TextureData::new(width, height, rgba.into_raw()).ok_or(AssetError::EmptyImage)
    }
}

/// Reads and decodes an image file as RGBA8.
///
/// ## Errors
///
/// A missing or unreadable file is [`AssetError::Io`]; undecodable bytes are
/// [`AssetError::Decode`].
pub fn load_rgba8(path: impl AsRef<Path>) -> Result<TextureData, AssetError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| AssetError::io(path, e))?;
    let texture = TextureLoaderLane.load(&bytes)?;
    log::debug!(
        "Loaded texture {} ({}x{})",
        path.display(),
        texture.width,
        texture.height
    );
    Ok(texture)
}

/// Reads `posx.jpg` .. `negz.jpg` from `dir` into a cubemap.
///
/// ## Errors
///
/// Fails like [`load_rgba8`] for each face, or with [`AssetError::CubemapFaces`] if the
/// faces are not squares of one size.
pub fn load_cubemap(dir: impl AsRef<Path>) -> Result<CubemapData, AssetError> {
    let dir = dir.as_ref();
    let mut faces = Vec::with_capacity(CUBEMAP_FACES.len());
    for stem in CUBEMAP_FACES {
        faces.push(load_rgba8(dir.join(format!("{stem}.jpg")))?);
    }
    let faces: [TextureData; 6] = faces
        .try_into()
        .map_err(|_| AssetError::CubemapFaces(dir.to_path_buf()))?;
    CubemapData::new(faces).ok_or_else(|| AssetError::CubemapFaces(dir.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_rgb_jpg(path: &Path, size: u32) {
        image::RgbImage::from_pixel(size, size, image::Rgb([10, 20, 30]))
            .save(path)
            .unwrap();
    }

    #[test]
    fn test_png_decodes_to_rgba8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("red.png");
        image::RgbaImage::from_pixel(3, 2, image::Rgba([255, 0, 0, 128]))
            .save(&path)
            .unwrap();

        let texture = load_rgba8(&path).unwrap();
        assert_eq!((texture.width, texture.height), (3, 2));
        assert_eq!(texture.pixels.len(), 3 * 2 * 4);
        assert_eq!(&texture.pixels[..4], &[255, 0, 0, 128]);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_rgba8(dir.path().join("nope.png")).unwrap_err();
        assert!(matches!(err, AssetError::Io { .. }));
        assert!(err.to_string().contains("nope.png"));
    }

    #[test]
    fn test_garbage_bytes_are_decode_error() {
        assert!(matches!(
            TextureLoaderLane.load(b"not an image"),
            Err(AssetError::Decode(_))
        ));
    }

    #[test]
    fn test_cubemap_reads_six_faces_in_order() {
        let dir = tempfile::tempdir().unwrap();
        for stem in CUBEMAP_FACES {
            write_rgb_jpg(&dir.path().join(format!("{stem}.jpg")), 4);
        }
        let cubemap = load_cubemap(dir.path()).unwrap();
        assert_eq!(cubemap.size, 4);
        assert!(cubemap.faces.iter().all(|f| f.len() == 4 * 4 * 4));
    }

    #[test]
    fn test_cubemap_rejects_mismatched_faces() {
        let dir = tempfile::tempdir().unwrap();
        for (i, stem) in CUBEMAP_FACES.iter().enumerate() {
            write_rgb_jpg(&dir.path().join(format!("{stem}.jpg")), if i == 3 { 8 } else { 4 });
        }
        assert!(matches!(
            load_cubemap(dir.path()),
            Err(AssetError::CubemapFaces(_))
        ));
    }
}
