use std::path::PathBuf;

use clap::Parser;

use crate::logging::Verbosity;

#[derive(Debug, Parser)]
#[command(
    name = "gerritclone",
    version,
    about = "Clone a Gerrit project into a directory mirroring where you stand",
    allow_missing_positional = true
)]
pub struct Cli {
    /// Gerrit instance as defined in ~/.gerritclone.conf. Defaults to the
    /// first instance found in the configuration file.
    pub instance: Option<String>,

    /// Gerrit project name to clone.
    pub project: String,

    /// Configuration file. Falls back to ~/.gerritclone.conf if it exists.
    #[arg(long, value_name = "PATH")]
    pub conf: Option<PathBuf>,

    /// Do not clone, print the git command instead.
    #[arg(long, short = 'n')]
    pub dry_run: bool,

    /// Print debugging output.
    #[arg(long, conflicts_with_all = ["verbose", "quiet"])]
    pub debug: bool,

    /// Print out internal processing.
    #[arg(long, short, conflicts_with_all = ["debug", "quiet"])]
    pub verbose: bool,

    /// Only print warnings and errors.
    #[arg(long, short, conflicts_with_all = ["debug", "verbose"])]
    pub quiet: bool,
}

impl Cli {
    pub fn verbosity(&self) -> Verbosity {
        if self.debug {
            Verbosity::Debug
        } else if self.verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Quiet
        }
    }
}
