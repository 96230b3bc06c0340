//! # Record Command Implementation
//!
//! Scans the project, resolves the state of every repository it imports, and
//! writes a configuration pinning each one to its current tag or commit.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use pathdep::config::Config;
use pathdep::record::{derive, preserve, RecordOptions};
use pathdep::resolve::repo_states;
use pathdep::workspace::Workspace;

/// Record the current state of the dependencies
#[derive(Args, Debug)]
pub struct RecordArgs {
    /// Disables recording of tags matching the current repo state
    #[arg(short, long)]
    pub notags: bool,

    /// Records missing repos as tied to the master branch, rather than
    /// omitting them from the configuration
    #[arg(short, long)]
    pub master: bool,

    /// Preserve existing dependencies and only add new ones
    #[arg(short, long)]
    pub preserve: bool,

    /// Path to the project
    #[arg(value_name = "PATH", default_value = ".")]
    pub path: PathBuf,
}

/// Execute the `record` command.
///
/// Repositories that cannot be found are reported on stderr; they do not
/// fail the command.
pub fn execute(args: RecordArgs, ws: &Workspace) -> Result<()> {
    let mut config = Config::for_path(&args.path)?;
    let states = repo_states(ws, &args.path)?;
    let recording = derive(
        &states,
        RecordOptions {
            no_tags: args.notags,
            default_branch_when_missing: args.master,
        },
    );

    config.dependencies = if args.preserve {
        match Config::load(&args.path) {
            Ok(existing) => preserve(recording.dependencies, &existing.dependencies),
            Err(e) => {
                log::debug!("nothing to preserve: {}", e);
                recording.dependencies
            }
        }
    } else {
        recording.dependencies
    };
    config.save()?;
    log::info!(
        "recorded {} dependencies in {}",
        config.dependencies.len(),
        config.file_path().display()
    );

    if let Some(report) = missing_report(&recording.missing) {
        eprint!("{}", report);
    }
    Ok(())
}

/// Formats the report of repositories that could not be found.
pub fn missing_report(missing: &[String]) -> Option<String> {
    if missing.is_empty() {
        return None;
    }
    let mut report = String::from("The following repos cannot be found and were not added:\n");
    for import in missing {
        report.push_str("    ");
        report.push_str(import);
        report.push('\n');
    }
    Some(report)
}
