//! # Source Roots
//!
//! Dependencies live beside the project under the `src` directory of each
//! `$GOPATH` entry. `SourceRoots` maps import identifiers to directories under
//! those roots and back again.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::path::to_import_path;

/// The ordered set of `<gopath entry>/src` directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRoots {
    entries: Vec<PathBuf>,
}

impl SourceRoots {
    /// Builds source roots from a `$GOPATH`-style list of entries.
    pub fn from_gopath(gopath: &OsStr) -> Result<Self> {
        let entries: Vec<PathBuf> = std::env::split_paths(gopath)
            .filter(|entry| !entry.as_os_str().is_empty())
            .collect();
        Self::new(entries)
    }

    /// Builds source roots from GOPATH entries (not their `src` directories).
    pub fn new(gopath_entries: Vec<PathBuf>) -> Result<Self> {
        if gopath_entries.is_empty() {
            return Err(Error::NoSourceRoots);
        }
        let entries = gopath_entries
            .into_iter()
            .map(|entry| std::path::absolute(&entry).map(|abs| abs.join("src")))
            .collect::<std::io::Result<Vec<_>>>()?;
        Ok(Self { entries })
    }

    /// The `src` directories, in search order.
    pub fn paths(&self) -> &[PathBuf] {
        &self.entries
    }

    /// The `$GOPATH` value these roots were derived from, suitable for
    /// passing to the Go toolchain.
    pub fn gopath(&self) -> OsString {
        let parents = self
            .entries
            .iter()
            .map(|src| src.parent().unwrap_or(src).to_path_buf());
        std::env::join_paths(parents).unwrap_or_default()
    }

    /// Returns the first existing directory for `import` under any source
    /// root, or the location it would occupy under the first root.
    pub fn locate(&self, import: &str) -> PathBuf {
        self.entries
            .iter()
            .map(|root| root.join(import))
            .find(|candidate| candidate.is_dir())
            .unwrap_or_else(|| self.entries[0].join(import))
    }

    /// Returns the import identifier for a path under one of the roots.
    pub fn import_path_of(&self, path: &Path) -> Option<String> {
        self.entries
            .iter()
            .find_map(|root| path.strip_prefix(root).ok())
            .map(to_import_path)
            .filter(|import| !import.is_empty())
    }

    /// Formats the roots for error messages.
    pub fn describe(&self) -> String {
        let joined = self
            .entries
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(" ");
        format!("[{}]", joined)
    }
}
