//! Reset command implementation
//!
//! Puts every clean repository under the source roots back on its default
//! branch. Modified repositories are listed and left alone.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use pathdep::output::{self, OutputConfig};
use pathdep::reset::{reset_all, ResetOutcome};
use pathdep::suggestions;
use pathdep::workspace::Workspace;

/// Arguments for the reset command
#[derive(Args, Debug)]
pub struct ResetArgs {
    /// Path to the project; reset covers every repository under the source
    /// roots regardless
    #[arg(value_name = "PATH", default_value = ".")]
    pub path: PathBuf,
}

/// Execute the reset command
pub fn execute(args: ResetArgs, ws: &Workspace) -> Result<()> {
    log::debug!("reset invoked from {}", args.path.display());
    let out = OutputConfig::default();
    let outcomes = reset_all(ws);
    for outcome in &outcomes {
        if let Some(line) = format_outcome(&out, outcome) {
            println!("{}", line);
        }
    }
    if outcomes.iter().any(ResetOutcome::is_failure) {
        return Err(suggestions::reset_failed(&outcomes));
    }
    Ok(())
}

/// Formats the report line for one repository; failures are reported
/// separately.
pub fn format_outcome(out: &OutputConfig, outcome: &ResetOutcome) -> Option<String> {
    match outcome {
        ResetOutcome::Modified { import } => Some(format!(
            "{} {} is modified and will not be updated",
            out.paint(output::bad(), 'M'),
            import
        )),
        ResetOutcome::Updated { import, branch } => Some(format!(
            "{} {} has been updated to [{}]",
            out.paint(output::good(), '✓'),
            import,
            out.paint(output::reference(), branch)
        )),
        ResetOutcome::Failed { .. } => None,
    }
}
