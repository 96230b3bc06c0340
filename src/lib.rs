//! # Pathdep Library
//!
//! This library locks the versions of the dependencies a project checks out
//! beside itself under `$GOPATH/src`. A project's `pathdep.yaml` pins each
//! repository it imports to a commit, tag, or branch; the library compares
//! what is on disk against those declarations and converges one onto the
//! other. It backs the `pathdep` command-line tool.
//!
//! ## Quick Example
//!
//! ```
//! use pathdep::config::{self, Dependency};
//! use pathdep::depstate::{classify, DepState};
//! use pathdep::repository::RepoState;
//!
//! let config = config::parse(
//!     "version: \"1.0\"\ndependencies:\n- import: example.com/a\n  tag: v1.0\n",
//! )
//! .unwrap();
//! assert_eq!(config.dependencies[0], Dependency::new("example.com/a").with_tag("v1.0"));
//!
//! let state = RepoState {
//!     import: "example.com/a".to_string(),
//!     exists: true,
//!     commit: "deadbeef".to_string(),
//!     tags: vec!["v1.2".to_string()],
//!     branches: vec![],
//!     dirty: false,
//! };
//! assert_eq!(classify(&config.dependencies[0], &state), DepState::IncorrectVersion);
//! ```
//!
//! ## Core Concepts
//!
//! - **Configuration (`config`)**: the declarations in `pathdep.yaml`.
//! - **Source roots (`gopath`)**: the `src` directory of every `$GOPATH`
//!   entry, and the mapping between import identifiers and directories.
//! - **Command queue (`exec`)**: every git invocation runs through one
//!   dispatcher that caps the number of simultaneous processes.
//! - **Repositories (`repository`, `remote`)**: handles that fetch, clone,
//!   and check out one dependency, and resolve where it is cloned from.
//! - **Import graph (`imports`)**: the transitive set of repositories a
//!   project imports, discovered through package metadata.
//! - **Classification (`resolve`, `depstate`)**: resolved repository states
//!   joined against the declarations.
//! - **Reconciliation (`reconcile`, `record`, `reset`)**: converging disk
//!   onto the configuration, the configuration onto disk, and every
//!   repository onto its default branch.
//!
//! ## Execution Flow
//!
//! 1. **Discovery**: collect the project's external imports.
//! 2. **Resolution**: resolve every import's repository state concurrently.
//! 3. **Classification**: join states with declarations, sorted by import.
//! 4. **Action**: report, apply, or record.

pub mod config;
pub mod defaults;
pub mod depstate;
pub mod error;
pub mod exec;
pub mod gopath;
pub mod imports;
pub mod output;
pub mod path;
pub mod reconcile;
pub mod record;
pub mod remote;
pub mod repository;
pub mod reset;
pub mod resolve;
pub mod suggestions;
pub mod workspace;
