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

//! Bit sets describing buffer usage, memory properties and shader stage visibility.
//!
//! The raw bit values match the explicit graphics API's own encoding, so a backend can
//! convert in either direction with `from_bits_truncate`/`bits` and no lookup table.

use crate::umbra_bitflags;

umbra_bitflags! {
    /// A set of flags describing the allowed usages of a buffer.
    pub struct BufferUsage: u32 {
        /// The buffer can be the source of a copy operation.
        const TRANSFER_SRC = 0x0000_0001;
        /// The buffer can be the destination of a copy operation.
        const TRANSFER_DST = 0x0000_0002;
        /// The buffer can be bound as a uniform buffer.
        const UNIFORM = 0x0000_0010;
        /// The buffer can be bound as an index buffer.
        const INDEX = 0x0000_0040;
        /// The buffer can be bound as a vertex buffer.
        const VERTEX = 0x0000_0080;
    }
}

umbra_bitflags! {
    /// Properties of a device memory type.
    pub struct MemoryPropertyFlags: u32 {
        /// Memory local to the device; fastest for GPU access.
        const DEVICE_LOCAL = 0x0000_0001;
        /// Memory that can be mapped for CPU access.
        const HOST_VISIBLE = 0x0000_0002;
        /// CPU writes become visible without explicit flushes.
        const HOST_COHERENT = 0x0000_0004;
        /// CPU reads are cached.
        const HOST_CACHED = 0x0000_0008;
        /// Memory that may be allocated lazily by the device.
        const LAZILY_ALLOCATED = 0x0000_0010;
    }
}

umbra_bitflags! {
    /// Shader stages that can access a descriptor binding.
    pub struct ShaderStageFlags: u32 {
        /// Vertex shader stage.
        const VERTEX = 0x0000_0001;
        /// Fragment shader stage.
        const FRAGMENT = 0x0000_0010;
    }
}

impl MemoryPropertyFlags {
    /// Host-visible and host-coherent memory, used for persistently mapped staging buffers.
    pub const STAGING: Self = Self::from_bits_truncate(
        Self::HOST_VISIBLE.bits() | Self::HOST_COHERENT.bits(),
    );
}

impl ShaderStageFlags {
    /// Vertex and fragment stages.
    pub const VERTEX_FRAGMENT: Self =
        Self::from_bits_truncate(Self::VERTEX.bits() | Self::FRAGMENT.bits());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staging_properties() {
        assert!(MemoryPropertyFlags::STAGING.contains(MemoryPropertyFlags::HOST_VISIBLE));
        assert!(MemoryPropertyFlags::STAGING.contains(MemoryPropertyFlags::HOST_COHERENT));
        assert!(!MemoryPropertyFlags::STAGING.contains(MemoryPropertyFlags::DEVICE_LOCAL));
    }

    #[test]
    fn test_stage_union() {
        assert_eq!(ShaderStageFlags::VERTEX_FRAGMENT.bits(), 0x11);
    }
}
