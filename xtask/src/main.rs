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

// Build automation for the Umbra workspace
// Run with: cargo xtask <command>

mod commands;
mod helpers;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{ci, shaders};

#[derive(Parser)]
#[command(name = "xtask", version, about = "Build automation tool for Umbra")]
struct Cli {
    #[command(subcommand)]
    command: Task,
}

#[derive(Subcommand)]
enum Task {
    /// Build all crates in the workspace.
    Build,
    /// Run all tests in the workspace.
    Test,
    /// Run `cargo check` on all crates.
    Check,
    /// Format all code in the workspace.
    #[command(alias = "format")]
    Fmt,
    /// Run clippy on all crates with warnings as errors.
    Clippy,
    /// Compile the GLSL shaders to SPIR-V with glslc.
    Shaders {
        /// Recompile stages whose SPIR-V is already up to date.
        #[arg(long)]
        force: bool,
    },
    /// Run every task: shaders, build, test, check, format, clippy.
    All,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Task::Build => ci::build(),
        Task::Test => ci::test(),
        Task::Check => ci::check(),
        Task::Fmt => ci::format(),
        Task::Clippy => ci::clippy(),
        Task::Shaders { force } => shaders::compile(force),
        Task::All => ci::all(),
    }
}
