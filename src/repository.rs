//! # Repository Handles
//!
//! A `Repo` is one dependency's git checkout under a source root, named by its
//! import identifier. Every git operation it performs is routed through the
//! workspace's `CommandQueue`, so any number of handles can be driven from
//! concurrent threads without exceeding the process limit.
//!
//! `Repo::state` produces a `RepoState` snapshot: whether the repository can
//! be fetched at all, the commit at HEAD, the tags and tracked branches
//! pointing at it, and whether tracked files are modified.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::defaults::DEFAULT_BRANCH;
use crate::error::{Error, Result};
use crate::exec::CommandSpec;
use crate::path::git_root;
use crate::workspace::Workspace;

/// Prefix of local branch refs.
pub const BRANCH_PREFIX: &str = "refs/heads/";
/// Prefix of tag refs.
pub const TAG_PREFIX: &str = "refs/tags/";
/// Prefix of the remote-tracking refs a local branch must match.
pub const REMOTE_PREFIX: &str = "refs/remotes/origin/";

/// Snapshot of a repository on disk. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoState {
    pub import: String,
    pub exists: bool,
    pub commit: String,
    /// Tags pointing at `commit`.
    pub tags: Vec<String>,
    /// Local branches at `commit` whose `origin` counterpart is also at `commit`.
    pub branches: Vec<String>,
    /// Tracked files differ from HEAD. Untracked files do not count.
    pub dirty: bool,
}

impl RepoState {
    /// The state of a repository that is not on disk.
    pub fn missing(import: impl Into<String>) -> Self {
        Self {
            import: import.into(),
            ..Self::default()
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn has_branch(&self, branch: &str) -> bool {
        self.branches.iter().any(|b| b == branch)
    }
}

/// Handle on one dependency's repository.
#[derive(Debug, Clone)]
pub struct Repo {
    import_path: String,
    ws: Workspace,
}

impl Repo {
    /// Creates a handle for `import`.
    ///
    /// Unless `force` is set the import's directory must be inside a git
    /// repository, and the handle names that repository's root. With `force`
    /// the directory is taken as-is, which is what a clone target needs.
    pub fn from_import_path(ws: &Workspace, import: &str, force: bool) -> Result<Self> {
        let mut root = ws.roots().locate(import);
        if !force {
            root = git_root(&root)?;
        }
        match ws.roots().import_path_of(&root) {
            Some(import_path) => Ok(Self {
                import_path,
                ws: ws.clone(),
            }),
            None => Err(Error::OutsideSourceRoots {
                path: root,
                roots: ws.roots().describe(),
            }),
        }
    }

    /// Creates a handle for a repository root found on disk.
    pub fn from_root(ws: &Workspace, root: &Path) -> Result<Self> {
        let import = ws
            .roots()
            .import_path_of(root)
            .ok_or_else(|| Error::OutsideSourceRoots {
                path: root.to_path_buf(),
                roots: ws.roots().describe(),
            })?;
        Self::from_import_path(ws, &import, false)
    }

    pub fn import_path(&self) -> &str {
        &self.import_path
    }

    /// The repository's directory.
    pub fn root(&self) -> PathBuf {
        self.ws.roots().locate(&self.import_path)
    }

    fn git<const N: usize>(&self, args: [&str; N]) -> Result<String> {
        self.ws.queue().output(CommandSpec::git(&self.root(), args))
    }

    /// Updates remote refs. Fails when the repository is absent.
    pub fn fetch(&self) -> Result<()> {
        self.git(["fetch", "--quiet"]).map(drop)
    }

    pub fn pull(&self) -> Result<()> {
        self.git(["pull", "--quiet"]).map(drop)
    }

    pub fn checkout(&self, reference: &str) -> Result<()> {
        self.git(["checkout", "--quiet", reference]).map(drop)
    }

    /// The URL this repository is cloned from.
    pub fn remote(&self) -> Result<String> {
        self.ws.remotes().resolve(&self.import_path)
    }

    /// Clones the repository into its directory, pinned to `branch_or_tag`
    /// when given.
    pub fn clone_repo(&self, branch_or_tag: Option<&str>) -> Result<()> {
        let root = self.root();
        let parent = root.parent().ok_or_else(|| Error::OutsideSourceRoots {
            path: root.clone(),
            roots: self.ws.roots().describe(),
        })?;
        fs::create_dir_all(parent)?;

        let mut args = vec!["clone".to_string(), "--quiet".to_string()];
        if let Some(reference) = branch_or_tag {
            args.push("--branch".to_string());
            args.push(reference.to_string());
        }
        args.push(self.remote()?);
        args.push(
            root.file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
        );
        self.ws
            .queue()
            .output(CommandSpec::git(parent, args))
            .map(drop)
    }

    /// The branch `origin/HEAD` points at, or `master`.
    pub fn default_branch(&self) -> String {
        self.git(["symbolic-ref", "--quiet", "--short", "refs/remotes/origin/HEAD"])
            .ok()
            .and_then(|name| name.strip_prefix("origin/").map(str::to_string))
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| DEFAULT_BRANCH.to_string())
    }

    /// Resolves the repository's current state. A repository that cannot be
    /// fetched is reported as not existing.
    pub fn state(&self) -> RepoState {
        let mut state = RepoState::missing(&self.import_path);
        if let Err(e) = self.fetch() {
            debug!("{} treated as missing: {}", self.import_path, e);
            return state;
        }
        state.exists = true;

        let Ok(commit) = self.git(["rev-parse", "HEAD"]) else {
            return state;
        };
        state.commit = commit;

        if let Ok(refs) = self.git([
            "for-each-ref",
            "--points-at",
            state.commit.as_str(),
            "--format=%(refname)",
        ]) {
            for line in refs.lines().map(str::trim).filter(|l| !l.is_empty()) {
                if let Some(branch) = line.strip_prefix(BRANCH_PREFIX) {
                    let tracking = format!("{}{}", REMOTE_PREFIX, branch);
                    if self
                        .git(["rev-parse", tracking.as_str()])
                        .is_ok_and(|remote| remote == state.commit)
                    {
                        state.branches.push(branch.to_string());
                    }
                } else if let Some(tag) = line.strip_prefix(TAG_PREFIX) {
                    state.tags.push(tag.to_string());
                }
            }
        }

        state.dirty = match self.git(["status", "--porcelain"]) {
            Ok(status) => has_tracked_changes(&status),
            Err(_) => true,
        };
        state
    }
}

/// True if `git status --porcelain` output lists anything but untracked files.
pub fn has_tracked_changes(porcelain: &str) -> bool {
    porcelain
        .lines()
        .any(|line| !line.is_empty() && !line.starts_with("?? "))
}
