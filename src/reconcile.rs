//! # Applying a Configuration
//!
//! Drives every classified dependency toward its declared version,
//! concurrently and independently:
//!
//! - **missing on disk**: clone it, pinned to the declared branch or tag, then
//!   check out the declared commit if one was given instead.
//! - **not needed**: the import is no longer discovered in the project, but
//!   its declaration still applies. Its repository is classified afresh and
//!   handled as whatever that yields.
//! - **incorrect version**: fetch and check out the declared commit, tag, or
//!   branch (the default branch when nothing is declared), pulling when the
//!   target is a branch.
//! - **dirty**: reported as an error and never touched.
//!
//! Per-dependency failures never stop the others; they are collected into one
//! report.

use std::sync::Mutex;
use std::thread;

use log::info;

use crate::config::{Dependency, Reference};
use crate::depstate::{classify, DepInfo, DepState};
use crate::error::Result;
use crate::repository::Repo;
use crate::workspace::Workspace;

/// What happened to one dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Cloned and checked out; holds the description of the target.
    Cloned(String),
    /// Moved to the target; holds the description of the target.
    Updated(String),
    /// Left alone because its working tree is modified.
    ReportedDirty,
    /// Nothing to do.
    NoOp,
    /// Holds the error line for the failure.
    Failed(String),
}

impl Outcome {
    /// The line reported for this outcome, if any.
    pub fn message(&self, import: &str) -> Option<String> {
        match self {
            Outcome::Cloned(target) => Some(format!(
                "Cloned {} and checked out {}",
                import, target
            )),
            Outcome::Updated(target) => Some(format!("Updated {} to {}", import, target)),
            Outcome::ReportedDirty => Some(format!(
                "Error: {} {}",
                import,
                DepState::Dirty.description()
            )),
            Outcome::Failed(message) => Some(message.clone()),
            Outcome::NoOp => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::ReportedDirty | Outcome::Failed(_))
    }
}

/// Outcomes of an apply run, sorted by import identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub outcomes: Vec<(String, Outcome)>,
}

impl ApplyReport {
    /// Every failure line, one per failed dependency.
    pub fn failures(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| outcome.is_failure())
            .filter_map(|(import, outcome)| outcome.message(import))
            .collect()
    }

    /// The aggregated failure report, or `None` if everything succeeded.
    pub fn failure_message(&self) -> Option<String> {
        let failures = self.failures();
        (!failures.is_empty()).then(|| failures.join("\n"))
    }

    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|(_, outcome)| !outcome.is_failure())
    }
}

/// The branch or tag to pass to `git clone`. A declared commit takes
/// precedence and is checked out after cloning instead.
pub fn clone_ref(dep: &Dependency) -> Option<&str> {
    if dep.commit.is_some() {
        None
    } else {
        dep.tag.as_deref().or(dep.branch.as_deref())
    }
}

/// Describes the version a dependency is moved to.
pub fn describe_target(dep: &Dependency, default_branch: &str) -> String {
    match dep.reference() {
        Some(reference) => reference.to_string(),
        None => Reference::Branch(default_branch).to_string(),
    }
}

/// Reconciles every dependency concurrently.
pub fn apply(ws: &Workspace, infos: &[DepInfo]) -> ApplyReport {
    let outcomes = Mutex::new(Vec::with_capacity(infos.len()));
    thread::scope(|s| {
        for info in infos {
            let outcomes = &outcomes;
            s.spawn(move || {
                let outcome = match &info.dependency {
                    Some(dep) => reconcile(ws, dep, info.state),
                    None => Outcome::NoOp,
                };
                if let Ok(mut outcomes) = outcomes.lock() {
                    outcomes.push((info.import.clone(), outcome));
                }
            });
        }
    });
    let mut outcomes = outcomes.into_inner().unwrap_or_else(|e| e.into_inner());
    outcomes.sort_by(|a, b| a.0.cmp(&b.0));
    ApplyReport { outcomes }
}

/// Works one dependency to a terminal outcome. `NotNeeded` is the only state
/// that leads to another state, and re-classification never yields it again,
/// so the loop runs at most twice.
pub fn reconcile(ws: &Workspace, dep: &Dependency, initial: DepState) -> Outcome {
    let mut state = initial;
    loop {
        state = match state {
            DepState::NotNeeded => reclassify(ws, dep),
            DepState::MissingOnDisk => {
                return clone_missing(ws, dep).unwrap_or_else(|e| {
                    Outcome::Failed(format!("Error: Unable to checkout {}: {}", dep.import, e))
                })
            }
            DepState::IncorrectVersion => {
                return update(ws, dep).unwrap_or_else(|e| {
                    Outcome::Failed(format!("Error: Unable to update {}: {}", dep.import, e))
                })
            }
            DepState::Dirty => return Outcome::ReportedDirty,
            DepState::Good | DepState::MissingConfig | DepState::MissingOnDiskAndConfig => {
                return Outcome::NoOp
            }
        };
    }
}

fn reclassify(ws: &Workspace, dep: &Dependency) -> DepState {
    match Repo::from_import_path(ws, &dep.import, false) {
        Ok(repo) => classify(dep, &repo.state()),
        Err(_) => DepState::MissingOnDisk,
    }
}

fn clone_missing(ws: &Workspace, dep: &Dependency) -> Result<Outcome> {
    let repo = Repo::from_import_path(ws, &dep.import, true)?;
    let branch_or_tag = clone_ref(dep);
    info!("cloning {}", dep.import);
    repo.clone_repo(branch_or_tag)?;
    if branch_or_tag.is_none() {
        if let Some(commit) = dep.commit.as_deref() {
            if repo.state().commit != commit {
                repo.checkout(commit)?;
            }
        }
    }
    Ok(Outcome::Cloned(describe_target(dep, &repo.default_branch())))
}

fn update(ws: &Workspace, dep: &Dependency) -> Result<Outcome> {
    let repo = Repo::from_import_path(ws, &dep.import, false)?;
    let default_branch = repo.default_branch();
    let (target, moving) = match dep.reference() {
        Some(Reference::Commit(c)) | Some(Reference::Tag(c)) => (c, false),
        Some(Reference::Branch(b)) => (b, true),
        None => (default_branch.as_str(), true),
    };
    info!("updating {} to {}", dep.import, target);
    repo.fetch()?;
    repo.checkout(target)?;
    if moving {
        repo.pull()?;
    }
    Ok(Outcome::Updated(describe_target(dep, &default_branch)))
}
