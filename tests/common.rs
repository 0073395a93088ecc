//! Shared helpers for the CLI integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

pub use assert_cmd::Command;

/// Command pointing at the `zipdir` binary built for this test run.
pub fn zipdir_cmd() -> Command {
    Command::cargo_bin("zipdir").expect("Failed to find zipdir binary for testing")
}

/// Create `proj/readme.txt` ("hello") and `proj/src/main.ext` ("body") under `root`.
pub fn sample_project(root: &Path) -> std::path::PathBuf {
    let proj = root.join("proj");
    fs::create_dir_all(proj.join("src")).unwrap();
    fs::write(proj.join("readme.txt"), "hello").unwrap();
    fs::write(proj.join("src/main.ext"), "body").unwrap();
    proj
}
