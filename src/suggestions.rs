//! # Error Suggestions
//!
//! Helpers that build command-level errors with hints. Errors should tell
//! users what went wrong AND how to fix it.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pathdep::suggestions;
//!
//! let roots = SourceRoots::from_gopath(&gopath).map_err(suggestions::source_roots)?;
//! ```

use crate::error::Error;
use crate::reconcile::{ApplyReport, Outcome};
use crate::reset::ResetOutcome;

/// Wraps a failure to determine the source roots.
pub fn source_roots(error: Error) -> anyhow::Error {
    anyhow::anyhow!(
        "{error}\n\n\
         hint: Set the GOPATH environment variable\n\
         hint: Use --gopath to specify the source roots"
    )
}

/// Builds the aggregated error for a failed apply run.
pub fn apply_failed(report: &ApplyReport) -> anyhow::Error {
    let mut message = report.failures().join("\n");
    if report
        .outcomes
        .iter()
        .any(|(_, outcome)| *outcome == Outcome::ReportedDirty)
    {
        message.push_str(&format!(
            "\n\nhint: Commit or stash the changes in modified repositories, then run '{} apply' again",
            env!("CARGO_PKG_NAME")
        ));
    }
    anyhow::anyhow!(message)
}

/// Builds the aggregated error for repositories `reset` could not update.
pub fn reset_failed(outcomes: &[ResetOutcome]) -> anyhow::Error {
    let lines: Vec<String> = outcomes
        .iter()
        .filter_map(|outcome| match outcome {
            ResetOutcome::Failed { import, message } => {
                Some(format!("Error: Unable to reset {}: {}", import, message))
            }
            _ => None,
        })
        .collect();
    anyhow::anyhow!(lines.join("\n"))
}
