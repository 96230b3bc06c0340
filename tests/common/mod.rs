//! Shared test utilities for integration and E2E tests.
//!
//! This module provides a throwaway `$GOPATH` with a project directory, and
//! helpers for building local git repositories to stand in for dependencies.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     if !git_available() {
//!         return;
//!     }
//!     let fixture = TestFixture::new().with_config(configs::EMPTY);
//!     let origin = fixture.origin("dep");
//!     fixture.clone_dep("example.com/dep", &origin);
//!     // ... test code
//! }
//! ```

use assert_fs::prelude::*;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_cmd::cargo::cargo_bin_cmd;
    #[allow(unused_imports)]
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::configs;
    #[allow(unused_imports)]
    pub use super::{git, git_available, should_skip_network_tests};
    #[allow(unused_imports)]
    pub use super::{TestFixture, PROJECT_IMPORT};
}

/// Import identifier of the fixture's project.
pub const PROJECT_IMPORT: &str = "example.com/project";

/// Common configuration YAML snippets for testing.
#[allow(dead_code)]
pub mod configs {
    /// A configuration with no dependencies.
    pub const EMPTY: &str = "version: \"1.0\"\ndependencies: []\n";

    /// One dependency pinned to the first tag of a fixture origin.
    pub const DEP_AT_V1: &str = r#"version: "1.0"
dependencies:
- import: example.com/dep
  tag: v1
"#;

    /// One dependency tracking the default branch of a fixture origin.
    pub const DEP_ON_MASTER: &str = r#"version: "1.0"
dependencies:
- import: example.com/dep
  branch: master
"#;

    /// Invalid YAML for error testing.
    pub const INVALID_YAML: &str = "dependencies: [unclosed";
}

/// Check if network tests should be skipped.
///
/// Returns `true` if the `SKIP_NETWORK_TESTS` environment variable is set.
#[allow(dead_code)]
pub fn should_skip_network_tests() -> bool {
    env::var("SKIP_NETWORK_TESTS").is_ok()
}

/// Returns `true` if a `git` executable can be run.
#[allow(dead_code)]
pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .is_ok_and(|output| output.status.success())
}

/// Runs git in `dir` with a fixed identity, panicking on failure.
#[allow(dead_code)]
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(["-c", "user.name=Pathdep Test", "-c", "user.email=test@example.com"])
        .args(["-c", "commit.gpgsign=false", "-c", "tag.gpgsign=false"])
        .args(args)
        .current_dir(dir)
        .output()
        .expect("Failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed in {}: {}",
        args,
        dir.display(),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// A temporary `$GOPATH` holding a project at `src/example.com/project`.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    /// Create a new fixture with an empty project directory.
    pub fn new() -> Self {
        let temp_dir = assert_fs::TempDir::new().expect("Failed to create temp directory");
        temp_dir
            .child("gopath/src")
            .child(PROJECT_IMPORT)
            .create_dir_all()
            .expect("Failed to create project directory");
        Self { temp_dir }
    }

    /// Add a `pathdep.yaml` to the project with the given content.
    pub fn with_config(self, content: &str) -> Self {
        fs::write(self.config_path(), content).expect("Failed to write config file");
        self
    }

    /// Root of the temporary directory.
    #[allow(dead_code)]
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// The `$GOPATH` entry.
    pub fn gopath(&self) -> PathBuf {
        self.temp_dir.path().join("gopath")
    }

    /// The source root under the `$GOPATH` entry.
    pub fn src(&self) -> PathBuf {
        self.gopath().join("src")
    }

    /// The project directory.
    pub fn project(&self) -> PathBuf {
        self.src().join(PROJECT_IMPORT)
    }

    /// Path to the project's config file.
    pub fn config_path(&self) -> PathBuf {
        self.project().join("pathdep.yaml")
    }

    /// Reads the project's config file.
    #[allow(dead_code)]
    pub fn read_config(&self) -> String {
        fs::read_to_string(self.config_path()).expect("Failed to read config file")
    }

    /// Creates a bare repository `origins/<name>.git` whose `master` branch
    /// has two commits, tagged `v1` and `v2`.
    #[allow(dead_code)]
    pub fn origin(&self, name: &str) -> PathBuf {
        let seed = self.temp_dir.path().join("seeds").join(name);
        fs::create_dir_all(&seed).expect("Failed to create seed directory");
        git(&seed, &["init", "--quiet"]);
        git(&seed, &["symbolic-ref", "HEAD", "refs/heads/master"]);
        for version in ["v1", "v2"] {
            fs::write(seed.join("lib.go"), format!("package lib // {}\n", version))
                .expect("Failed to write seed file");
            git(&seed, &["add", "lib.go"]);
            git(&seed, &["commit", "--quiet", "-m", version]);
            git(&seed, &["tag", version]);
        }

        let origins = self.temp_dir.path().join("origins");
        fs::create_dir_all(&origins).expect("Failed to create origins directory");
        let bare = origins.join(format!("{}.git", name));
        let seed_path = seed.to_string_lossy().into_owned();
        let bare_path = bare.to_string_lossy().into_owned();
        git(
            &origins,
            &["clone", "--quiet", "--bare", &seed_path, &bare_path],
        );
        bare
    }

    /// Clones `origin` to `src/<import>` and returns the checkout.
    #[allow(dead_code)]
    pub fn clone_dep(&self, import: &str, origin: &Path) -> PathBuf {
        let target = self.src().join(import);
        let parent = target.parent().expect("import has a parent directory");
        fs::create_dir_all(parent).expect("Failed to create dependency parent");
        let origin_path = origin.to_string_lossy().into_owned();
        let target_path = target.to_string_lossy().into_owned();
        git(
            parent,
            &["clone", "--quiet", &origin_path, &target_path],
        );
        target
    }

    /// Create a `pathdep` command running in the project directory with this
    /// fixture's `$GOPATH`.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("pathdep");
        cmd.current_dir(self.project())
            .env("GOPATH", self.gopath())
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_creates_project() {
        let fixture = TestFixture::new();
        assert!(fixture.project().is_dir());
        assert!(fixture.project().starts_with(fixture.src()));
    }

    #[test]
    fn test_fixture_with_config() {
        let fixture = TestFixture::new().with_config(configs::EMPTY);
        assert_eq!(fixture.read_config(), configs::EMPTY);
    }

    #[test]
    fn test_configs_are_valid_yaml() {
        for config in [configs::EMPTY, configs::DEP_AT_V1, configs::DEP_ON_MASTER] {
            serde_yaml::from_str::<serde_yaml::Value>(config).expect("Config should be valid YAML");
        }
        assert!(serde_yaml::from_str::<serde_yaml::Value>(configs::INVALID_YAML).is_err());
    }
}
