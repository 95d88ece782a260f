//! Static fixtures used across harnesses.

use std::path::Path;

/// Seed used by every harness unless a test says otherwise.
pub const SEED: u64 = 7;

/// Facet values for the `colour` field of the test corpus.
pub const COLOURS: &[&str] = &["red", "green", "blue", "cyan", "magenta"];

/// A user config file that overrides one key per section.
pub const USER_CONFIG_TOML: &str = r#"
[generate]
num_docs = 250
skew     = "uniform"

[index]
batch_size = 25

[search]
rep_n    = 3
ignore_n = 0
timing   = "wall_clock"

[metadata]
engine_version = "9.4.0"
notes          = "fixture"
"#;

/// Write `contents` to `dir/name` and return the path.
pub fn write_file(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("fixture file must be writable");
    path
}

/// A fresh temporary directory, removed on drop.
pub fn temp_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("temp dir must be creatable")
}
