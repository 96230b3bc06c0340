//! Path utilities for locating git repositories on disk

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Name of the directory git keeps its metadata in.
pub const GIT_DIR: &str = ".git";

/// Returns true if a directory walk should not descend into a directory
/// with this name: hidden directories, underscore-prefixed directories, and
/// `vendor`.
pub fn is_skipped_dir(name: &str) -> bool {
    name.starts_with('.') || name.starts_with('_') || name == "vendor"
}

/// Returns true if `dir` directly contains a `.git` directory.
pub fn has_git_dir(dir: &Path) -> bool {
    dir.join(GIT_DIR).is_dir()
}

/// Searches upward from `path` for the nearest directory containing `.git`.
pub fn git_root(path: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(path)?;
    absolute
        .ancestors()
        .find(|dir| has_git_dir(dir))
        .map(Path::to_path_buf)
        .ok_or_else(|| Error::NotInRepo {
            path: path.to_path_buf(),
        })
}

/// Returns the git root for `path`, or `path` itself if it is a directory
/// outside any repository, or the current directory as a last resort.
pub fn git_root_or_dir(path: &Path) -> Result<PathBuf> {
    match git_root(path) {
        Ok(root) => Ok(root),
        Err(_) if path.is_dir() => Ok(std::path::absolute(path)?),
        Err(_) => Ok(std::env::current_dir()?),
    }
}

/// Converts a relative path into a slash-separated import identifier.
pub fn to_import_path(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
