//! # Configuration File
//!
//! This module defines the `pathdep.yaml` lock file: a version string and an
//! ordered list of dependency declarations, each pinning one import
//! identifier to a commit, tag, or branch.
//!
//! ```yaml
//! version: "1.0"
//! dependencies:
//! - import: github.com/user/lib
//!   tag: v1.2.0
//! - import: golang.org/x/net
//!   commit: 4f2a6b1d0c...
//! ```
//!
//! The file lives in the git root of the project (or the project directory
//! itself when it is not inside a repository). Unset reference fields are
//! omitted when saving, and dependencies are always written sorted by
//! import identifier.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::path::git_root_or_dir;

/// Version written to every saved configuration.
pub const CURRENT_VERSION: &str = "1.0";

/// Name of the configuration file.
pub const CONFIG_FILE_NAME: &str = "pathdep.yaml";

/// A single dependency declaration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Dependency {
    /// The import identifier, unique within a configuration.
    pub import: String,
    /// An exact commit to check out.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
    /// A tag that must point at the checked out commit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// A branch that must point at the checked out commit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

/// The reference a declaration pins, by precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference<'a> {
    Commit(&'a str),
    Tag(&'a str),
    Branch(&'a str),
}

impl Reference<'_> {
    /// The bare reference name.
    pub fn name(&self) -> &str {
        match self {
            Reference::Commit(s) | Reference::Tag(s) | Reference::Branch(s) => s,
        }
    }
}

impl std::fmt::Display for Reference<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reference::Commit(s) => write!(f, "commit {}", s),
            Reference::Tag(s) => write!(f, "tag {}", s),
            Reference::Branch(s) => write!(f, "branch {}", s),
        }
    }
}

impl Dependency {
    /// Creates a declaration with no reference pinned.
    pub fn new(import: impl Into<String>) -> Self {
        Self {
            import: import.into(),
            ..Self::default()
        }
    }

    pub fn with_commit(mut self, commit: impl Into<String>) -> Self {
        self.commit = Some(commit.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    /// The declared reference with the highest precedence:
    /// commit, then tag, then branch.
    pub fn reference(&self) -> Option<Reference<'_>> {
        self.commit
            .as_deref()
            .map(Reference::Commit)
            .or_else(|| self.tag.as_deref().map(Reference::Tag))
            .or_else(|| self.branch.as_deref().map(Reference::Branch))
    }

    /// Treats empty strings as unset.
    fn normalize(&mut self) {
        for field in [&mut self.commit, &mut self.tag, &mut self.branch] {
            if field.as_deref().is_some_and(|s| s.trim().is_empty()) {
                *field = None;
            }
        }
    }
}

/// The configuration for one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Directory the configuration file lives in.
    #[serde(skip)]
    pub dir: PathBuf,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
}

impl Config {
    /// Creates an empty configuration stored under the git root of `path`.
    pub fn for_path(path: &Path) -> Result<Self> {
        Ok(Self {
            dir: git_root_or_dir(path)?,
            version: CURRENT_VERSION.to_string(),
            dependencies: Vec::new(),
        })
    }

    /// Loads the configuration stored under the git root of `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = Self::for_path(path)?;
        let file = config.file_path();
        let content = fs::read_to_string(&file).map_err(|e| Error::ConfigLoad {
            path: file.clone(),
            message: e.to_string(),
            hint: Some(format!(
                "Try running '{} record' to create one.",
                env!("CARGO_PKG_NAME")
            )),
        })?;
        let parsed = parse(&content).map_err(|e| Error::ConfigLoad {
            path: file.clone(),
            message: e.to_string(),
            hint: None,
        })?;
        config.version = parsed.version;
        config.dependencies = parsed.dependencies;
        Ok(config)
    }

    /// Path of the configuration file.
    pub fn file_path(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE_NAME)
    }

    /// Writes the configuration, stamping the current version and sorting
    /// dependencies by import identifier.
    pub fn save(&mut self) -> Result<()> {
        self.version = CURRENT_VERSION.to_string();
        self.dependencies.sort_by(|a, b| a.import.cmp(&b.import));
        let file = self.file_path();
        let data = serde_yaml::to_string(self)?;
        fs::write(&file, data).map_err(|e| Error::ConfigSave {
            path: file,
            message: e.to_string(),
        })
    }
}

/// Parses configuration content. The returned value has no directory set.
pub fn parse(content: &str) -> Result<Config> {
    let mut config: Config = if content.trim().is_empty() {
        Config {
            dir: PathBuf::new(),
            version: String::new(),
            dependencies: Vec::new(),
        }
    } else {
        serde_yaml::from_str(content)?
    };
    config.dependencies.iter_mut().for_each(Dependency::normalize);
    Ok(config)
}
