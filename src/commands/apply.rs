//! Apply command implementation
//!
//! Brings every dependency on disk to the version the configuration declares:
//! missing repositories are cloned, stale ones fetched and checked out.
//! Modified repositories are never touched; they are reported as errors.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use pathdep::config::Config;
use pathdep::depstate::gather;
use pathdep::reconcile::{apply, Outcome};
use pathdep::suggestions;
use pathdep::workspace::Workspace;

/// Arguments for the apply command
#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Path to the project
    #[arg(value_name = "PATH", default_value = ".")]
    pub path: PathBuf,
}

/// Execute the apply command
pub fn execute(args: ApplyArgs, ws: &Workspace) -> Result<()> {
    let config = Config::load(&args.path)?;
    let infos = gather(ws, &config, &config.dir)?;
    let report = apply(ws, &infos);

    for (import, outcome) in &report.outcomes {
        if let Outcome::Cloned(_) | Outcome::Updated(_) = outcome {
            if let Some(line) = outcome.message(import) {
                println!("{}", line);
            }
        }
    }

    if report.is_success() {
        Ok(())
    } else {
        Err(suggestions::apply_failed(&report))
    }
}
