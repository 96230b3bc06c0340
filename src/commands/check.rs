//! # Check Command Implementation
//!
//! Classifies every dependency of the project against its configuration and
//! prints one line per dependency: a state marker, the import identifier,
//! the declared reference (or `?`), and a description of the state.
//!
//! With `--prune`, declarations whose imports are no longer used are removed
//! from the configuration before reporting.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use pathdep::config::Config;
use pathdep::depstate::{gather, DepInfo, DepState};
use pathdep::output::{self, OutputConfig};
use pathdep::workspace::Workspace;

/// Check the dependencies against the configuration
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Use plain output that does not contain color and is suitable for
    /// parsing with scripts
    #[arg(short = 'n', long = "no-color")]
    pub no_color: bool,

    /// Remove imports that are no longer needed from the configuration file
    #[arg(short, long)]
    pub prune: bool,

    /// Suppress output for good imports
    #[arg(short, long)]
    pub errors_only: bool,

    /// Path to the project
    #[arg(value_name = "PATH", default_value = ".")]
    pub path: PathBuf,
}

/// Execute the `check` command.
pub fn execute(args: CheckArgs, ws: &Workspace) -> Result<()> {
    let mut config = Config::load(&args.path)?;
    let infos = gather(ws, &config, &config.dir)?;

    if args.prune {
        config.dependencies = infos
            .iter()
            .filter(|info| info.state.kept_on_prune())
            .filter_map(|info| info.dependency.clone())
            .collect();
        config.save()?;
    }

    let out = OutputConfig::from_env_and_flag(args.no_color);
    for info in &infos {
        if !args.errors_only || info.state != DepState::Good {
            println!("{}", format_line(&out, info, args.prune));
        }
    }
    Ok(())
}

/// Formats the report line for one dependency.
pub fn format_line(out: &OutputConfig, info: &DepInfo, pruned: bool) -> String {
    let reference = info
        .dependency
        .as_ref()
        .and_then(|dep| dep.reference())
        .map(|reference| reference.name().to_string());
    let (reference, reference_style) = match reference {
        Some(name) => (name, output::reference()),
        None => ("?".to_string(), output::bad()),
    };
    let marker_style = if info.state == DepState::Good {
        output::good()
    } else {
        output::bad()
    };

    let mut line = format!(
        "{} {} [{}]",
        out.paint(marker_style, info.state.marker()),
        info.import,
        out.paint(reference_style, reference)
    );
    let description = info.state.description();
    if !description.is_empty() {
        line.push(' ');
        line.push_str(description);
    }
    if pruned && info.state == DepState::NotNeeded {
        line.push_str(&format!(" ({})", out.paint(output::good(), "removed")));
    }
    line
}
