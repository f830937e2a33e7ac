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

//! Engine configuration.
//!
//! Values come from, in increasing priority: the defaults, an optional `umbra.json` file
//! and the `UMBRA_ASSETS` / `UMBRA_VALIDATION` environment variables. Render constants
//! (clear color, depth bias, projection planes, pool sizes) are not configurable.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use umbra_core::renderer::api::common::SHADOW_MAP_SIZE;
use umbra_infra::VulkanRendererConfig;

/// The configuration file looked up next to the working directory.
pub const CONFIG_FILE: &str = "umbra.json";
/// Overrides [`EngineConfig::assets_root`].
pub const ASSETS_ENV: &str = "UMBRA_ASSETS";
/// Overrides [`EngineConfig::enable_validation`].
pub const VALIDATION_ENV: &str = "UMBRA_VALIDATION";

/// Window, asset and backend settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Window title, also reported to the driver as the application name.
    pub title: String,
    /// Initial window width in physical pixels.
    pub width: u32,
    /// Initial window height in physical pixels.
    pub height: u32,
    /// Root of the shader, texture and mesh files.
    pub assets_root: PathBuf,
    /// Enables the Vulkan validation layer.
    pub enable_validation: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            title: "Umbra".to_string(),
            width: 1280,
            height: 720,
            assets_root: PathBuf::from("assets"),
            enable_validation: cfg!(debug_assertions),
        }
    }
}

impl EngineConfig {
    /// Reads a JSON configuration. A missing file yields the defaults; fields absent from
    /// the file keep their default values.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::debug!("No '{}' found, using the default configuration", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
        let config = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config file '{}'", path.display()))?;
        log::info!("Loaded configuration from '{}'", path.display());
        Ok(config)
    }

    /// Loads [`CONFIG_FILE`] and applies the environment overrides.
    pub fn from_environment() -> Result<Self> {
        let config = Self::load(CONFIG_FILE)?;
        Ok(config.with_overrides(
            std::env::var(ASSETS_ENV).ok(),
            std::env::var(VALIDATION_ENV).ok(),
        ))
    }

    /// Applies raw override values as read from the environment.
    ///
    /// An unrecognized validation value is ignored with a warning.
    pub fn with_overrides(mut self, assets: Option<String>, validation: Option<String>) -> Self {
        if let Some(root) = assets.filter(|s| !s.is_empty()) {
            self.assets_root = PathBuf::from(root);
        }
        if let Some(raw) = validation {
            match parse_flag(&raw) {
                Some(flag) => self.enable_validation = flag,
                None => log::warn!("Ignoring {VALIDATION_ENV}='{raw}': expected a boolean"),
            }
        }
        self
    }

    /// Side of the square shadow map. Fixed.
    pub fn shadow_map_size(&self) -> u32 {
        SHADOW_MAP_SIZE
    }

    /// Directory of the compiled SPIR-V shaders.
    pub fn shader_dir(&self) -> PathBuf {
        self.assets_root.join("shaders")
    }

    /// Resolves `relative` against the assets root.
    pub fn asset_path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.assets_root.join(relative)
    }

    /// The backend settings derived from this configuration.
    pub fn renderer_config(&self) -> VulkanRendererConfig {
        VulkanRendererConfig {
            app_name: self.title.clone(),
            enable_validation: self.enable_validation,
            shader_dir: self.shader_dir(),
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let c = EngineConfig::default();
        assert_eq!((c.width, c.height), (1280, 720));
        assert_eq!(c.shadow_map_size(), 2048);
        assert_eq!(c.shader_dir(), PathBuf::from("assets").join("shaders"));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let c = EngineConfig::load(dir.path().join("absent.json")).unwrap();
        assert_eq!(c, EngineConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "title": "Demo", "width": 640 }}"#).unwrap();
        let c = EngineConfig::load(file.path()).unwrap();
        assert_eq!(c.title, "Demo");
        assert_eq!(c.width, 640);
        assert_eq!(c.height, 720);
        assert_eq!(c.assets_root, PathBuf::from("assets"));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let err = EngineConfig::load(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse config file"));
    }

    #[test]
    fn test_overrides() {
        let c = EngineConfig::default()
            .with_overrides(Some("/data/umbra".into()), Some("Off".into()));
        assert_eq!(c.assets_root, PathBuf::from("/data/umbra"));
        assert!(!c.enable_validation);

        let kept = EngineConfig::default().with_overrides(Some(String::new()), Some("maybe".into()));
        assert_eq!(kept, EngineConfig::default());
    }

    #[test]
    fn test_renderer_config_points_at_shaders() {
        let c = EngineConfig {
            assets_root: PathBuf::from("res"),
            ..EngineConfig::default()
        };
        let r = c.renderer_config();
        assert_eq!(r.shader_dir, PathBuf::from("res").join("shaders"));
        assert_eq!(r.app_name, "Umbra");
    }
}
