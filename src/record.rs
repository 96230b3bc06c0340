//! Deriving a configuration from the repositories currently on disk.

use std::collections::BTreeMap;

use crate::config::Dependency;
use crate::defaults::DEFAULT_BRANCH;
use crate::repository::RepoState;

/// Options for `record`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordOptions {
    /// Never record tags; always pin exact commits.
    pub no_tags: bool,
    /// Record repositories that are not on disk as tracking the default branch.
    pub default_branch_when_missing: bool,
}

/// Declarations derived from resolved states.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recording {
    /// One declaration per recordable import, sorted by import.
    pub dependencies: Vec<Dependency>,
    /// Imports left out because their repositories could not be found.
    pub missing: Vec<String>,
}

/// Derives one declaration per state: the first tag at HEAD unless tags are
/// disabled, else the exact commit. Repositories not on disk are recorded on
/// the default branch only when requested and are otherwise left out.
pub fn derive(states: &[RepoState], options: RecordOptions) -> Recording {
    let mut recording = Recording::default();
    for state in states {
        let dep = if state.exists {
            match state.tags.first().filter(|_| !options.no_tags) {
                Some(tag) => Some(Dependency::new(&state.import).with_tag(tag)),
                None if !state.commit.is_empty() => {
                    Some(Dependency::new(&state.import).with_commit(&state.commit))
                }
                None => None,
            }
        } else if options.default_branch_when_missing {
            Some(Dependency::new(&state.import).with_branch(DEFAULT_BRANCH))
        } else {
            None
        };
        if !state.exists && dep.is_none() {
            recording.missing.push(state.import.clone());
        }
        recording.dependencies.extend(dep);
    }
    recording.dependencies.sort_by(|a, b| a.import.cmp(&b.import));
    recording.missing.sort();
    recording
}

/// Overlays `existing` declarations on `recorded` ones: existing entries win
/// and newly discovered imports are added.
pub fn preserve(recorded: Vec<Dependency>, existing: &[Dependency]) -> Vec<Dependency> {
    let mut merged: BTreeMap<String, Dependency> = recorded
        .into_iter()
        .map(|dep| (dep.import.clone(), dep))
        .collect();
    for dep in existing {
        merged.insert(dep.import.clone(), dep.clone());
    }
    merged.into_values().collect()
}
