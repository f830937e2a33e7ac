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

//! Selection policies for the presentable image chain.
//!
//! These are the pure decisions the surface makes at (re)creation time; the backend feeds
//! them the capabilities reported by the driver.

use super::common::Extent2D;

/// Chooses how many presentable images to request: one more than the minimum, clamped
/// to the maximum when the surface reports one (`max == 0` means unbounded).
///
/// # Examples
///
/// ```
/// use umbra_core::renderer::api::present::choose_image_count;
/// assert_eq!(choose_image_count(2, 0), 3);
/// assert_eq!(choose_image_count(3, 3), 3);
/// ```
pub fn choose_image_count(min_image_count: u32, max_image_count: u32) -> u32 {
    let desired = min_image_count + 1;
    if max_image_count > 0 && desired > max_image_count {
        max_image_count
    } else {
        desired
    }
}

/// Chooses the surface format: the first reported format that is not "undefined",
/// or `fallback` when none is.
pub fn choose_surface_format<F: Copy>(
    available: &[F],
    is_undefined: impl Fn(&F) -> bool,
    fallback: F,
) -> F {
    available
        .iter()
        .find(|f| !is_undefined(f))
        .copied()
        .unwrap_or(fallback)
}

/// Chooses the swapchain extent.
///
/// A surface reporting `u32::MAX` as its current width lets the application pick;
/// the window size is then clamped into the supported range.
pub fn choose_extent(current: Extent2D, min: Extent2D, max: Extent2D, window: Extent2D) -> Extent2D {
    if current.width != u32::MAX {
        return current;
    }
    Extent2D {
        width: window.width.clamp(min.width, max.width),
        height: window.height.clamp(min.height, max.height),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_count_is_min_plus_one_clamped() {
        assert_eq!(choose_image_count(1, 0), 2);
        assert_eq!(choose_image_count(2, 8), 3);
        assert_eq!(choose_image_count(2, 2), 2);
    }

    #[test]
    fn test_surface_format_skips_undefined() {
        const UNDEFINED: u32 = 0;
        const BGRA8: u32 = 44;
        const RGBA8: u32 = 37;
        assert_eq!(choose_surface_format(&[UNDEFINED], |f| *f == UNDEFINED, BGRA8), BGRA8);
        assert_eq!(choose_surface_format(&[], |f| *f == UNDEFINED, BGRA8), BGRA8);
        assert_eq!(choose_surface_format(&[RGBA8, BGRA8], |f| *f == UNDEFINED, BGRA8), RGBA8);
        assert_eq!(
            choose_surface_format(&[UNDEFINED, RGBA8], |f| *f == UNDEFINED, BGRA8),
            RGBA8
        );
    }

    #[test]
    fn test_extent_uses_current_when_fixed() {
        let current = Extent2D::new(800, 600);
        let e = choose_extent(current, Extent2D::new(1, 1), Extent2D::new(4096, 4096), Extent2D::new(1280, 720));
        assert_eq!(e, current);
    }

    #[test]
    fn test_extent_clamps_window_when_free() {
        let current = Extent2D::new(u32::MAX, u32::MAX);
        let e = choose_extent(current, Extent2D::new(1, 1), Extent2D::new(1024, 1024), Extent2D::new(1280, 720));
        assert_eq!(e, Extent2D::new(1024, 720));
    }
}
