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

//! CPU-side pixel data for 2D textures and cubemaps.

use crate::renderer::api::ids::TextureId;
use crate::renderer::api::image::mip_levels;

/// Bytes per RGBA8 pixel.
pub const RGBA8_BYTES: usize = 4;

/// An RGBA8 pixel buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureData {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Tightly packed RGBA8 rows, top to bottom.
    pub pixels: Vec<u8>,
}

impl TextureData {
    /// Wraps an RGBA8 buffer. Returns `None` if its length does not match the size.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        let expected = width as usize * height as usize * RGBA8_BYTES;
        (pixels.len() == expected && expected > 0).then_some(Self {
            width,
            height,
            pixels,
        })
    }

    /// A 1x1 texture of a single color.
    pub fn solid(rgba: [u8; 4]) -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: rgba.to_vec(),
        }
    }

    /// Size of the pixel buffer in bytes.
    pub fn byte_len(&self) -> u64 {
        self.pixels.len() as u64
    }

    /// Number of mip levels of the full chain for this size.
    pub fn mip_levels(&self) -> u32 {
        mip_levels(self.width, self.height)
    }
}

impl Default for TextureData {
    /// The 1x1 all-zero placeholder every material starts with.
    fn default() -> Self {
        Self::solid([0, 0, 0, 0])
    }
}

/// A texture: pixels plus the device texture created from them.
#[derive(Debug, Clone, Default)]
pub struct Texture {
    /// The CPU pixel buffer.
    pub data: TextureData,
    /// The device texture, once uploaded.
    pub gpu: Option<TextureId>,
}

impl Texture {
    /// Creates a texture that has not been uploaded yet.
    pub fn new(data: TextureData) -> Self {
        Self { data, gpu: None }
    }
}

/// Six square RGBA8 faces in the order +X, -X, +Y, -Y, +Z, -Z.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CubemapData {
    /// Side length of every face, in pixels.
    pub size: u32,
    /// The faces, contiguous in upload order.
    pub faces: [Vec<u8>; 6],
}

impl CubemapData {
    /// Builds a cubemap from six faces. Every face must be a `size` x `size` RGBA8 image.
    pub fn new(faces: [TextureData; 6]) -> Option<Self> {
        let size = faces[0].width;
        if faces.iter().any(|f| f.width != size || f.height != size) {
            return None;
        }
        Some(Self {
            size,
            faces: faces.map(|f| f.pixels),
        })
    }

    /// A cubemap whose faces are single pixels of one color.
    pub fn solid(rgba: [u8; 4]) -> Self {
        Self {
            size: 1,
            faces: std::array::from_fn(|_| rgba.to_vec()),
        }
    }

    /// Bytes of one face.
    pub fn face_len(&self) -> u64 {
        self.size as u64 * self.size as u64 * RGBA8_BYTES as u64
    }

    /// The six faces concatenated in upload order, as one staging payload.
    pub fn contiguous(&self) -> Vec<u8> {
        self.faces.concat()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_single_zero_pixel() {
        let t = TextureData::default();
        assert_eq!((t.width, t.height), (1, 1));
        assert_eq!(t.pixels, vec![0, 0, 0, 0]);
        assert_eq!(t.mip_levels(), 1);
    }

    #[test]
    fn test_new_rejects_mismatched_buffer() {
        assert!(TextureData::new(2, 2, vec![0; 15]).is_none());
        assert!(TextureData::new(0, 0, Vec::new()).is_none());
        assert_eq!(TextureData::new(513, 300, vec![0; 513 * 300 * 4]).map(|t| t.mip_levels()), Some(10));
    }

    #[test]
    fn test_cubemap_faces_stay_in_upload_order() {
        let faces: [TextureData; 6] = std::array::from_fn(|i| TextureData::solid([i as u8; 4]));
        let cube = CubemapData::new(faces).unwrap();
        let bytes = cube.contiguous();
        assert_eq!(bytes.len(), 24);
        for face in 0..6 {
            assert_eq!(bytes[face * 4], face as u8);
        }
    }

    #[test]
    fn test_cubemap_rejects_unequal_faces() {
        let mut faces: [TextureData; 6] = std::array::from_fn(|_| TextureData::solid([0; 4]));
        faces[3] = TextureData::new(2, 1, vec![0; 8]).unwrap();
        assert!(CubemapData::new(faces).is_none());
    }
}
