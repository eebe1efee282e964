#![deny(clippy::all)]
//! Fixture-driven tests for verlock
//!
//! Every `*.lock` file under `fixtures/` is parsed, written back and validated;
//! the package index fixtures drive the solver end to end.

use std::path::{Path, PathBuf};

/// The repository `fixtures/` directory
pub fn fixtures_dir() -> PathBuf {
  Path::new(env!("CARGO_MANIFEST_DIR"))
    .parent()
    .and_then(Path::parent)
    .map(|root| root.join("fixtures"))
    .unwrap_or_else(|| panic!("crate is not inside a workspace"))
}

/// Load a fixture file from the fixtures directory
pub fn load_fixture(filename: &str) -> String {
  load_fixture_from_path(&fixtures_dir().join(filename))
}

/// Load a fixture file from a path
pub fn load_fixture_from_path(fixture_path: &Path) -> String {
  std::fs::read_to_string(fixture_path).unwrap_or_else(|e| {
    panic!(
      "Failed to read fixture file {}: {}",
      fixture_path.display(),
      e
    )
  })
}
