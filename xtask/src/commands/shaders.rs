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

use crate::commands::shaders_config::ShaderManifest;
use crate::helpers::*;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Compiles every GLSL stage under the source directory to a `.spv` next to it.
///
/// Stages whose `.spv` is newer than the source are skipped unless `force` is set. Included
/// files (`*.glsl`) are not tracked; use `force` after editing one.
pub fn compile(force: bool) -> Result<()> {
    print_task_start("Compiling Shaders", PRISM, MAGENTA);

    let manifest = load_manifest()?;
    if !manifest.source_dir.exists() {
        print_error(&format!(
            "Shader directory '{}' does not exist.",
            manifest.source_dir.display()
        ));
        anyhow::bail!("missing shader directory");
    }

    let sources = find_stage_sources(&manifest.source_dir, &manifest.stages);
    println!(
        "{}🔎 Found:{} {} shader stages in '{}'.",
        BOLD,
        RESET,
        sources.len(),
        manifest.source_dir.display()
    );

    let mut compiled = 0;
    for source in &sources {
        let output = spirv_path(source);
        if !force && is_up_to_date(source, &output) {
            continue;
        }
        let (src, out) = (path_str(source)?, path_str(&output)?);
        execute_command(
            &manifest.compiler,
            &[src, "-o", out],
            &format!("Compile {}", source.display()),
        )?;
        compiled += 1;
    }

    print_success(&format!(
        "{} compiled, {} up to date",
        compiled,
        sources.len() - compiled
    ));
    Ok(())
}

/// Loads `Shaders.toml` from the workspace root, or the defaults if it does not exist.
fn load_manifest() -> Result<ShaderManifest> {
    let manifest_path = Path::new("Shaders.toml");
    if !manifest_path.exists() {
        print_info("No 'Shaders.toml' found. Using default configuration.");
        return Ok(ShaderManifest::default());
    }
    let text = fs::read_to_string(manifest_path)
        .with_context(|| format!("Failed to read '{}'", manifest_path.display()))?;
    toml::from_str(&text).with_context(|| format!("Failed to parse '{}'", manifest_path.display()))
}

fn find_stage_sources(dir: &Path, stages: &[String]) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| is_stage_source(p, stages))
        .collect();
    files.sort();
    files
}

fn is_stage_source(path: &Path, stages: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| stages.iter().any(|s| s == ext))
}

/// `main.vert` compiles to `main.vert.spv`, the name the renderer loads.
fn spirv_path(source: &Path) -> PathBuf {
    let mut name = source.as_os_str().to_owned();
    name.push(".spv");
    PathBuf::from(name)
}

fn is_up_to_date(source: &Path, output: &Path) -> bool {
    let modified = |p: &Path| fs::metadata(p).and_then(|m| m.modified()).ok();
    match (modified(source), modified(output)) {
        (Some(src), Some(out)) => out >= src,
        _ => false,
    }
}

fn path_str(path: &Path) -> Result<&str> {
    path.to_str()
        .with_context(|| format!("Non UTF-8 path '{}'", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spirv_path_appends_extension() {
        assert_eq!(
            spirv_path(Path::new("assets/shaders/main.vert")),
            PathBuf::from("assets/shaders/main.vert.spv")
        );
    }

    #[test]
    fn test_only_stage_files_are_sources() {
        let stages = ShaderManifest::default().stages;
        assert!(is_stage_source(Path::new("skybox.frag"), &stages));
        assert!(!is_stage_source(Path::new("lighting.glsl"), &stages));
        assert!(!is_stage_source(Path::new("main.vert.spv"), &stages));
    }

    #[test]
    fn test_missing_output_is_stale() {
        assert!(!is_up_to_date(Path::new("Cargo.toml"), Path::new("does-not-exist.spv")));
    }
}
