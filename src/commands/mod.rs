//! # CLI Command Implementations
//!
//! Each subcommand of the `pathdep` tool lives in its own file and contains:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that takes the parsed `Args` and the shared
//!   `Workspace` and performs the command's logic by calling into the
//!   `pathdep` library.

pub mod apply;
pub mod check;
pub mod record;
pub mod reset;
