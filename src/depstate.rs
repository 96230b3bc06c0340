//! # Dependency Classification
//!
//! Joins the declarations in a configuration against the resolved state of
//! every repository the project imports, producing one `DepInfo` per import
//! identifier that appears on either side.
//!
//! Classification is a pure function of whether a declaration exists and what
//! state was resolved:
//!
//! | Declared | Resolved state            | Result              |
//! |----------|---------------------------|---------------------|
//! | yes      | none (no longer imported) | `NotNeeded`         |
//! | yes      | not on disk               | `MissingOnDisk`     |
//! | yes      | any declared ref mismatch | `IncorrectVersion`  |
//! | yes      | modified working tree     | `Dirty`             |
//! | yes      | otherwise                 | `Good`              |
//! | no       | on disk                   | `MissingConfig`     |
//! | no       | not on disk               | `MissingOnDiskAndConfig` |

use std::collections::HashMap;
use std::path::Path;

use crate::config::{Config, Dependency};
use crate::error::Result;
use crate::repository::RepoState;
use crate::resolve::repo_states;
use crate::workspace::Workspace;

/// How a dependency's declaration relates to its repository on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepState {
    /// Imported and on disk, but not declared.
    MissingConfig,
    /// Declared, but the repository is not on disk.
    MissingOnDisk,
    /// Imported, but neither declared nor on disk.
    MissingOnDiskAndConfig,
    /// Declared, but no longer imported.
    NotNeeded,
    /// On disk at a different commit, tag, or branch than declared.
    IncorrectVersion,
    /// At the declared version, with modified tracked files.
    Dirty,
    /// At the declared version and clean.
    Good,
}

impl DepState {
    /// Single-character marker shown by `check`.
    pub fn marker(self) -> char {
        match self {
            DepState::MissingConfig => 'C',
            DepState::MissingOnDisk => 'D',
            DepState::MissingOnDiskAndConfig => 'B',
            DepState::NotNeeded => 'X',
            DepState::IncorrectVersion => 'S',
            DepState::Dirty => 'M',
            DepState::Good => '✓',
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            DepState::MissingConfig => "missing from configuration",
            DepState::MissingOnDisk => "missing from $GOPATH",
            DepState::MissingOnDiskAndConfig => "missing from configuration and $GOPATH",
            DepState::NotNeeded => "can be removed from the configuration",
            DepState::IncorrectVersion => "needs to be synced with this configuration",
            DepState::Dirty => "is modified",
            DepState::Good => "",
        }
    }

    /// Whether `check --prune` keeps the declaration.
    pub fn kept_on_prune(self) -> bool {
        matches!(
            self,
            DepState::MissingOnDisk | DepState::IncorrectVersion | DepState::Dirty | DepState::Good
        )
    }
}

/// Classification of one import identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepInfo {
    pub import: String,
    pub dependency: Option<Dependency>,
    pub state: DepState,
}

/// Compares a declaration against an existing repository's state.
///
/// Each declared field is checked on its own; any single mismatch makes the
/// dependency `IncorrectVersion` regardless of the others.
pub fn version_state(dep: &Dependency, state: &RepoState) -> DepState {
    let commit_differs = dep.commit.as_deref().is_some_and(|c| c != state.commit);
    let tag_absent = dep.tag.as_deref().is_some_and(|t| !state.has_tag(t));
    let branch_absent = dep.branch.as_deref().is_some_and(|b| !state.has_branch(b));
    if commit_differs || tag_absent || branch_absent {
        DepState::IncorrectVersion
    } else if state.dirty {
        DepState::Dirty
    } else {
        DepState::Good
    }
}

/// Classifies a declared dependency against its resolved state.
pub fn classify(dep: &Dependency, state: &RepoState) -> DepState {
    if state.exists {
        version_state(dep, state)
    } else {
        DepState::MissingOnDisk
    }
}

/// Joins declarations with resolved states, one record per identifier,
/// sorted by identifier.
pub fn dep_infos(dependencies: &[Dependency], states: Vec<RepoState>) -> Vec<DepInfo> {
    let mut pool: HashMap<String, RepoState> = states
        .into_iter()
        .map(|state| (state.import.clone(), state))
        .collect();
    let mut infos = Vec::with_capacity(dependencies.len().max(pool.len()));

    for dep in dependencies {
        let state = match pool.remove(&dep.import) {
            Some(state) => classify(dep, &state),
            None => DepState::NotNeeded,
        };
        infos.push(DepInfo {
            import: dep.import.clone(),
            dependency: Some(dep.clone()),
            state,
        });
    }
    for (import, state) in pool {
        let state = if state.exists {
            DepState::MissingConfig
        } else {
            DepState::MissingOnDiskAndConfig
        };
        infos.push(DepInfo {
            import,
            dependency: None,
            state,
        });
    }

    infos.sort_by(|a, b| a.import.cmp(&b.import));
    infos
}

/// Resolves the project's imports and classifies them against `config`.
pub fn gather(ws: &Workspace, config: &Config, dir: &Path) -> Result<Vec<DepInfo>> {
    let states = repo_states(ws, dir)?;
    Ok(dep_infos(&config.dependencies, states))
}
