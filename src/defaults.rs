//! Default values for pathdep configuration.
//!
//! This module provides centralized default values used across commands,
//! ensuring consistency and avoiding duplication.

use std::path::PathBuf;

/// Branch recorded by `record --master` and used when a repository does not
/// advertise a default branch of its own.
pub const DEFAULT_BRANCH: &str = "master";

/// Returns the default GOPATH used when neither `--gopath` nor the `GOPATH`
/// environment variable is set.
///
/// Mirrors the Go toolchain: `$HOME/go`. Falls back to `go` in the current
/// directory if the home directory cannot be determined.
pub fn default_gopath() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("go")
}
