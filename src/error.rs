//! # Error Handling
//!
//! This module defines the centralized error type for the `pathdep`
//! library. It uses the `thiserror` library to create an `Error` enum that
//! covers every failure the library can report, with enough context to tell
//! the user what went wrong and, where possible, how to fix it.
//!
//! Failures fall into a few families:
//!
//! - Configuration errors (missing, unreadable, or malformed `pathdep.yaml`).
//!   These are fatal to the invoking command.
//! - Path errors (a directory is not inside a git repository, or not inside
//!   any `$GOPATH` source root).
//! - Resolution errors (an import cannot be mapped to package metadata).
//!   Callers treat these as non-fatal.
//! - Toolchain errors (the build-metadata tool cannot be run at all). These
//!   abort import collection, since every package would otherwise look
//!   unused.
//! - Git command errors, carrying the combined output of the failed command.
//!   Callers aggregate these per dependency rather than aborting the run.
//!
//! The `Result` type alias is used to return `Result<T, Error>` from
//! functions throughout the crate.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for pathdep operations
#[derive(Error, Debug)]
pub enum Error {
    /// The configuration file could not be opened or parsed.
    #[error("Unable to load {}: {message}{}", path.display(), hint.as_ref().map(|h| format!("\n{}", h)).unwrap_or_default())]
    ConfigLoad {
        path: PathBuf,
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// The configuration file could not be written.
    #[error("Unable to save {}: {message}", path.display())]
    ConfigSave { path: PathBuf, message: String },

    /// No enclosing git repository was found for a path.
    #[error("{} is not part of a git repo", path.display())]
    NotInRepo { path: PathBuf },

    /// A path lies outside every configured source root.
    #[error("{} is outside of $GOPATH {roots}", path.display())]
    OutsideSourceRoots { path: PathBuf, roots: String },

    /// No source roots could be derived from `$GOPATH`.
    #[error("$GOPATH not set")]
    NoSourceRoots,

    /// A git command exited unsuccessfully or could not be started.
    #[error("{output}")]
    GitCommand {
        command: String,
        dir: PathBuf,
        output: String,
    },

    /// Package metadata for an import could not be resolved.
    #[error("Unable to resolve {import}: {message}")]
    Resolution { import: String, message: String },

    /// An external tool needed for package metadata could not be started.
    #[error("Unable to run {program}: {message}\n\nhint: Install the Go toolchain and make sure '{program}' is on PATH")]
    Toolchain { program: String, message: String },

    /// An error occurred during a network operation.
    #[error("Network operation error: {url} - {message}")]
    Network { url: String, message: String },

    /// The command queue dispatcher is no longer running.
    #[error("Command queue unavailable: {message}")]
    Executor { message: String },

    /// An error indicating that a mutex or other lock has been poisoned.
    #[error("Lock poisoned: {context}")]
    LockPoisoned { context: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML error, wrapped from `serde_yaml::Error`.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON parsing error, wrapped from `serde_json::Error`.
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
