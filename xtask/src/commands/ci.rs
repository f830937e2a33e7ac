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

use crate::helpers::*;
use anyhow::Result;
use std::time::Instant;

pub fn build() -> Result<()> {
    print_task_start("Building All Crates", HAMMER, BLUE);
    print_info("Compiling all workspace crates in debug mode");
    execute_command(
        "cargo",
        &["build", "--workspace", "--exclude", "xtask"],
        "Build",
    )
}

pub fn test() -> Result<()> {
    print_task_start("Running All Tests", TEST_TUBE, GREEN);
    print_info("Running unit tests, integration tests and doc tests (no GPU needed)");
    execute_command("cargo", &["test", "--workspace"], "Tests")
}

pub fn check() -> Result<()> {
    print_task_start("Checking All Crates", MAGNIFIER, CYAN);
    print_info("Checking code for errors without building executables");
    execute_command("cargo", &["check", "--workspace"], "Check")
}

pub fn format() -> Result<()> {
    print_task_start("Formatting Code", BRUSH, MAGENTA);
    print_info("Formatting code using rustfmt with default settings");
    // `fmt` takes `--all`, not `--workspace`.
    execute_command("cargo", &["fmt", "--all"], "Format")
}

pub fn clippy() -> Result<()> {
    print_task_start("Running Clippy", CLIPPY, YELLOW);
    print_info("Running Clippy linter with warnings as errors");
    execute_command(
        "cargo",
        &["clippy", "--workspace", "--", "-D", "warnings"],
        "Clippy",
    )
}

fn shaders() -> Result<()> {
    super::shaders::compile(false)
}

pub fn all() -> Result<()> {
    println!("{}", BANNER);
    println!("{}{}Starting full build pipeline...{}", BOLD, CYAN, RESET);
    println!(
        "{}💡 Pipeline:{} shaders → build → test → check → format → clippy",
        BOLD, RESET
    );

    let start_time = Instant::now();
    let tasks = [
        ("Shader Phase", shaders as fn() -> Result<()>),
        ("Build Phase", build),
        ("Test Phase", test),
        ("Check Phase", check),
        ("Format Phase", format),
        ("Clippy Phase", clippy),
    ];
    let total_tasks = tasks.len();
    let mut success_count = 0;

    for (i, (name, task_fn)) in tasks.iter().enumerate() {
        println!(
            "\n{}{}[{}/{}] {}{}",
            BOLD,
            BLUE,
            i + 1,
            total_tasks,
            name,
            RESET
        );
        if task_fn().is_ok() {
            success_count += 1;
        }
    }

    println!(
        "\n{}{}╔═══════════════════════════════════════╗{}",
        BOLD, CYAN, RESET
    );
    println!(
        "{}{}║            PIPELINE SUMMARY           ║{}",
        BOLD, CYAN, RESET
    );
    println!(
        "{}{}╚═══════════════════════════════════════╝{}",
        BOLD, CYAN, RESET
    );
    println!(
        "{}{}Total time: {:.2}s{}",
        BOLD,
        BLUE,
        start_time.elapsed().as_secs_f64(),
        RESET
    );

    if success_count == total_tasks {
        print_success(&format!("All {} tasks completed successfully! {}", total_tasks, ROCKET));
        Ok(())
    } else {
        anyhow::bail!("{}/{} tasks completed", success_count, total_tasks)
    }
}
