//! CLI argument parsing and command dispatch

use std::ffi::OsString;

use anyhow::Result;
use clap::{Parser, Subcommand};

use pathdep::defaults::default_gopath;
use pathdep::gopath::SourceRoots;
use pathdep::suggestions;
use pathdep::workspace::Workspace;

use crate::commands;

/// Pathdep - Lock the versions of the dependencies checked out on $GOPATH
#[derive(Parser, Debug)]
#[command(name = "pathdep")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    log_level: String,

    /// Source roots to use instead of $HOME/go, as a $GOPATH-style list
    #[arg(long, global = true, value_name = "PATHS", env = "GOPATH")]
    gopath: Option<OsString>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Apply the configuration, cloning and checking out dependencies
    Apply(commands::apply::ApplyArgs),

    /// Check the state of the dependencies against the configuration
    Check(commands::check::CheckArgs),

    /// Record the current state of the dependencies into the configuration
    Record(commands::record::RecordArgs),

    /// Reset all repositories on $GOPATH back to their default branch
    Reset(commands::reset::ResetArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);

        let roots = match &self.gopath {
            Some(gopath) => SourceRoots::from_gopath(gopath),
            None => SourceRoots::new(vec![default_gopath()]),
        }
        .map_err(suggestions::source_roots)?;
        log::debug!("source roots: {}", roots.describe());
        let ws = Workspace::new(roots)?;

        match self.command {
            Commands::Apply(args) => commands::apply::execute(args, &ws),
            Commands::Check(args) => commands::check::execute(args, &ws),
            Commands::Record(args) => commands::record::execute(args, &ws),
            Commands::Reset(args) => commands::reset::execute(args, &ws),
        }
    }
}

/// Initializes `env_logger` at `level`; `RUST_LOG` takes precedence.
fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .try_init();
}
