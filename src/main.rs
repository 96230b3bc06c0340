//! # Pathdep CLI
//!
//! This is the binary entry point for the `pathdep` command-line tool.
//!
//! Its primary responsibilities are:
//! - Parsing command-line arguments using `clap`.
//! - Setting up logging and the shared workspace services.
//! - Executing the appropriate command and reporting its errors.
//!
//! The core logic lives in the `pathdep` library crate; the binary is a thin
//! wrapper around it.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
