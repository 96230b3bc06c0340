//! Returning every repository under the source roots to its default branch.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Mutex;
use std::thread;

use log::{debug, info};
use walkdir::WalkDir;

use crate::error::Result;
use crate::gopath::SourceRoots;
use crate::path::{has_git_dir, is_skipped_dir};
use crate::repository::Repo;
use crate::workspace::Workspace;

/// What `reset` did to one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetOutcome {
    Updated { import: String, branch: String },
    Modified { import: String },
    Failed { import: String, message: String },
}

impl ResetOutcome {
    pub fn import(&self) -> &str {
        match self {
            ResetOutcome::Updated { import, .. }
            | ResetOutcome::Modified { import }
            | ResetOutcome::Failed { import, .. } => import,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ResetOutcome::Failed { .. })
    }
}

/// Finds every repository root under the source roots. Skipped directories
/// are never entered and nothing below a repository root is visited.
pub fn find_repo_roots(roots: &SourceRoots) -> BTreeSet<PathBuf> {
    let mut found = BTreeSet::new();
    for src in roots.paths() {
        let mut walker = WalkDir::new(src).into_iter().filter_entry(|entry| {
            entry.depth() == 0
                || !(entry.file_type().is_dir()
                    && is_skipped_dir(&entry.file_name().to_string_lossy()))
        });
        while let Some(entry) = walker.next() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if entry.depth() > 0 && entry.file_type().is_dir() && has_git_dir(entry.path()) {
                found.insert(entry.path().to_path_buf());
                walker.skip_current_dir();
            }
        }
    }
    found
}

/// Checks out and pulls the default branch of every clean repository that is
/// not already on it. Modified repositories are reported and left alone.
/// Outcomes are sorted by import identifier; untouched repositories are
/// omitted.
pub fn reset_all(ws: &Workspace) -> Vec<ResetOutcome> {
    let repos: Vec<Repo> = find_repo_roots(ws.roots())
        .iter()
        .filter_map(|root| match Repo::from_root(ws, root) {
            Ok(repo) => Some(repo),
            Err(e) => {
                debug!("{}: {}", root.display(), e);
                None
            }
        })
        .collect();

    let outcomes = Mutex::new(Vec::new());
    thread::scope(|s| {
        for repo in &repos {
            let outcomes = &outcomes;
            s.spawn(move || {
                if let Some(outcome) = reset_one(repo) {
                    if let Ok(mut outcomes) = outcomes.lock() {
                        outcomes.push(outcome);
                    }
                }
            });
        }
    });
    let mut outcomes = outcomes.into_inner().unwrap_or_else(|e| e.into_inner());
    outcomes.sort_by(|a, b| a.import().cmp(b.import()));
    outcomes
}

fn reset_one(repo: &Repo) -> Option<ResetOutcome> {
    let state = repo.state();
    if !state.exists {
        return None;
    }
    let import = repo.import_path().to_string();
    if state.dirty {
        return Some(ResetOutcome::Modified { import });
    }
    let branch = repo.default_branch();
    if state.has_branch(&branch) {
        return None;
    }
    info!("resetting {} to {}", import, branch);
    match checkout_and_pull(repo, &branch) {
        Ok(()) => Some(ResetOutcome::Updated { import, branch }),
        Err(e) => Some(ResetOutcome::Failed {
            import,
            message: e.to_string(),
        }),
    }
}

fn checkout_and_pull(repo: &Repo, branch: &str) -> Result<()> {
    repo.checkout(branch)?;
    repo.pull()
}
