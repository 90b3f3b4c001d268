//! Shared test utilities for integration tests.
//!
//! Import from integration test files as:
//! ```ignore
//! mod common;
//! ```

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Initialize tracing for tests, respecting RUST_LOG env var.
///
/// Safe to call multiple times, subsequent calls are no-ops.
#[allow(dead_code)]
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

/// Write `content` to `dir/name`, creating parent directories as needed.
#[allow(dead_code)]
pub fn write_record(dir: &Path, name: &str, content: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}

/// Create a test project with the default directory layout:
///
/// ```text
/// <temp_dir>/project/
///   requirements/  M.req (master), R1.req (depends on M), R2.req (depends on R1)
///   constraints/   speed.ctr
/// ```
///
/// Returns the path of the (not yet existing) configuration file `<project>/reqgraph.toml`.
#[allow(dead_code)]
pub fn create_test_project(temp_dir: &TempDir) -> PathBuf {
    let project = temp_dir.path().join("project");
    let requirements = project.join("requirements");
    let constraints = project.join("constraints");

    write_record(
        &requirements,
        "M.req",
        "# The one requirement everything builds on\nName: Master\nType: master requirement\nConstraints: [\"speed(fast)\"]\n",
    );
    write_record(
        &requirements,
        "R1.req",
        "Name: One\nDescription: The first refinement,\n  spanning two lines.\nDepends on: M\n",
    );
    write_record(&requirements, "R2.req", "Name: Two\nDepends on: R1\n");
    write_record(&requirements, "README.txt", "Not a requirement record.\n");
    write_record(&constraints, "speed.ctr", "Name: speed\nCE3: latency <= $1\n");

    project.join("reqgraph.toml")
}
