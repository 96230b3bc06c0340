//! Resolving repository state for every import a project depends on.

use std::path::Path;
use std::thread;

use log::debug;

use crate::error::Result;
use crate::imports::collect_root_package_names;
use crate::repository::{Repo, RepoState};
use crate::workspace::Workspace;

/// Resolves the state of each import concurrently, one thread per import.
///
/// Each state is named by the repository root the import resolves to, and
/// the result is sorted and de-duplicated by that name. Imports that do not
/// map to a repository under the source roots get a not-existing state.
pub fn resolve_states(ws: &Workspace, imports: &[String]) -> Vec<RepoState> {
    let mut states: Vec<RepoState> = thread::scope(|s| {
        let handles: Vec<_> = imports
            .iter()
            .map(|import| (import, s.spawn(move || resolve_one(ws, import))))
            .collect();
        handles
            .into_iter()
            .map(|(import, handle)| {
                handle
                    .join()
                    .unwrap_or_else(|_| RepoState::missing(import.as_str()))
            })
            .collect()
    });
    states.sort_by(|a, b| a.import.cmp(&b.import));
    states.dedup_by(|a, b| a.import == b.import);
    states
}

fn resolve_one(ws: &Workspace, import: &str) -> RepoState {
    match Repo::from_import_path(ws, import, false) {
        Ok(repo) => repo.state(),
        Err(e) => {
            debug!("{}: {}", import, e);
            RepoState::missing(import)
        }
    }
}

/// Discovers the imports of the project in `dir` and resolves their states.
pub fn repo_states(ws: &Workspace, dir: &Path) -> Result<Vec<RepoState>> {
    let imports = collect_root_package_names(ws.roots(), ws.loader(), dir)?;
    debug!("resolving {} imports", imports.len());
    Ok(resolve_states(ws, &imports))
}
