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

//! Memory-type selection and the mapping state of a GPU allocation.

use super::flags::MemoryPropertyFlags;
use crate::renderer::error::ResourceError;

/// One memory type as reported by the physical device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryType {
    /// The properties of this memory type.
    pub property_flags: MemoryPropertyFlags,
    /// The heap this type allocates from.
    pub heap_index: u32,
}

/// Selects the memory type for an allocation with a first-fit scan.
///
/// `type_bits` is the resource's memory requirement mask: bit `i` set means memory type
/// `i` is acceptable. The lowest index that is both acceptable and has every flag in
/// `required` wins.
///
/// # Examples
///
/// ```
/// use umbra_core::renderer::api::flags::MemoryPropertyFlags;
/// use umbra_core::renderer::api::memory::{select_memory_type, MemoryType};
///
/// let host = MemoryType { property_flags: MemoryPropertyFlags::STAGING, heap_index: 1 };
/// let local = MemoryType { property_flags: MemoryPropertyFlags::DEVICE_LOCAL, heap_index: 0 };
/// let types = [host, local];
/// assert_eq!(select_memory_type(&types, 0b11, MemoryPropertyFlags::DEVICE_LOCAL).unwrap(), 1);
/// ```
pub fn select_memory_type(
    types: &[MemoryType],
    type_bits: u32,
    required: MemoryPropertyFlags,
) -> Result<u32, ResourceError> {
    types
        .iter()
        .enumerate()
        .take(32)
        .find(|&(i, ty)| type_bits & (1u32 << i) != 0 && ty.property_flags.contains(required))
        .map(|(i, _)| i as u32)
        .ok_or(ResourceError::NoSuitableMemoryType {
            type_bits,
            properties: required,
        })
}

/// Tracks whether an allocation is currently mapped.
///
/// Mapping is strictly nested: a mapped allocation cannot be mapped again, and an
/// unmapped allocation cannot be unmapped.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum MapState {
    /// No CPU pointer is live.
    #[default]
    Unmapped,
    /// A CPU pointer is live.
    Mapped,
}

impl MapState {
    /// Transitions to [`MapState::Mapped`].
    pub fn begin_map(&mut self) -> Result<(), ResourceError> {
        match self {
            MapState::Unmapped => {
                *self = MapState::Mapped;
                Ok(())
            }
            MapState::Mapped => Err(ResourceError::InvalidMapState { operation: "map" }),
        }
    }

    /// Transitions back to [`MapState::Unmapped`].
    pub fn end_map(&mut self) -> Result<(), ResourceError> {
        match self {
            MapState::Mapped => {
                *self = MapState::Unmapped;
                Ok(())
            }
            MapState::Unmapped => Err(ResourceError::InvalidMapState { operation: "unmap" }),
        }
    }

    /// Returns `true` if a CPU pointer is live.
    pub fn is_mapped(&self) -> bool {
        matches!(self, MapState::Mapped)
    }
}

/// Checks that writing `len` bytes at `offset` stays within an allocation of `size` bytes.
pub fn check_write_bounds(size: u64, offset: u64, len: u64) -> Result<(), ResourceError> {
    let end = offset.saturating_add(len);
    if end > size {
        return Err(ResourceError::OutOfBounds {
            size,
            requested: end,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ty(flags: MemoryPropertyFlags) -> MemoryType {
        MemoryType {
            property_flags: flags,
            heap_index: 0,
        }
    }

    #[test]
    fn test_first_fit_selects_only_matching_index() {
        let types = [
            ty(MemoryPropertyFlags::STAGING),
            ty(MemoryPropertyFlags::HOST_VISIBLE),
            ty(MemoryPropertyFlags::HOST_CACHED),
            ty(MemoryPropertyFlags::DEVICE_LOCAL),
            ty(MemoryPropertyFlags::STAGING),
        ];
        let idx = select_memory_type(&types, 0b1_1111, MemoryPropertyFlags::DEVICE_LOCAL).unwrap();
        assert_eq!(idx, 3);
    }

    #[test]
    fn test_first_fit_never_picks_a_later_match() {
        let types = [
            ty(MemoryPropertyFlags::STAGING),
            ty(MemoryPropertyFlags::HOST_VISIBLE),
            ty(MemoryPropertyFlags::HOST_VISIBLE),
            ty(MemoryPropertyFlags::DEVICE_LOCAL),
            ty(MemoryPropertyFlags::DEVICE_LOCAL | MemoryPropertyFlags::HOST_VISIBLE),
            ty(MemoryPropertyFlags::DEVICE_LOCAL),
        ];
        let idx = select_memory_type(&types, 0b11_1111, MemoryPropertyFlags::DEVICE_LOCAL).unwrap();
        assert_eq!(idx, 3);
    }

    #[test]
    fn test_type_bits_exclude_candidates() {
        let types = [
            ty(MemoryPropertyFlags::DEVICE_LOCAL),
            ty(MemoryPropertyFlags::DEVICE_LOCAL),
        ];
        let idx = select_memory_type(&types, 0b10, MemoryPropertyFlags::DEVICE_LOCAL).unwrap();
        assert_eq!(idx, 1);
    }

    #[test]
    fn test_no_match_reports_request() {
        let types = [ty(MemoryPropertyFlags::DEVICE_LOCAL)];
        let err = select_memory_type(&types, 0b1, MemoryPropertyFlags::STAGING).unwrap_err();
        assert_eq!(
            err,
            ResourceError::NoSuitableMemoryType {
                type_bits: 0b1,
                properties: MemoryPropertyFlags::STAGING
            }
        );
    }

    #[test]
    fn test_map_state_is_strictly_nested() {
        let mut state = MapState::default();
        assert!(state.end_map().is_err());
        state.begin_map().unwrap();
        assert!(state.is_mapped());
        assert!(state.begin_map().is_err());
        state.end_map().unwrap();
        assert!(!state.is_mapped());
    }

    #[test]
    fn test_write_bounds() {
        assert!(check_write_bounds(192, 0, 192).is_ok());
        assert!(check_write_bounds(192, 64, 192).is_err());
    }
}
