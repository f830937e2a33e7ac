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

use serde::Deserialize;
use std::path::PathBuf;

/// The structure of the optional `Shaders.toml` manifest.
#[derive(Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct ShaderManifest {
    /// Directory scanned recursively for GLSL stage sources.
    pub source_dir: PathBuf,
    /// The GLSL to SPIR-V compiler to invoke.
    pub compiler: String,
    /// File extensions treated as shader stages.
    pub stages: Vec<String>,
}

impl Default for ShaderManifest {
    /// `assets/shaders`, compiled with `glslc`.
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("assets/shaders"),
            compiler: "glslc".to_string(),
            stages: vec!["vert".to_string(), "frag".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_manifest_keeps_defaults() {
        let m: ShaderManifest = toml::from_str(r#"compiler = "/opt/vulkan/bin/glslc""#).unwrap();
        assert_eq!(m.compiler, "/opt/vulkan/bin/glslc");
        assert_eq!(m.source_dir, PathBuf::from("assets/shaders"));
        assert_eq!(m.stages, vec!["vert", "frag"]);
    }
}
