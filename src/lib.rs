mod app;
mod cli;
pub(crate) mod config;
pub(crate) mod error;
pub(crate) mod logging;
pub(crate) mod model;
pub(crate) mod pathing;
pub(crate) mod vcs;

use clap::Parser;

pub use crate::cli::Cli;
pub use crate::config::load_profile;
pub use crate::error::ConfigError;
pub use crate::logging::Verbosity;
pub use crate::model::{ClonePlan, Environment, Profile, ResolutionContext, ResolvedProfile};
pub use crate::pathing::{compute_common_part, resolve_destination, resolve_project};

pub fn run(cli: Cli) -> anyhow::Result<i32> {
    let env = Environment::detect()?;
    app::run(cli, &env)
}

pub fn run_with(cli: Cli, env: &Environment) -> anyhow::Result<i32> {
    app::run(cli, env)
}

/// Shared by both binaries: parse arguments, set up logging, run, and map
/// the outcome to a process exit code.
pub fn entrypoint() -> i32 {
    let cli = Cli::parse();
    let outcome = logging::init(cli.verbosity()).and_then(|()| run(cli));
    match outcome {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            1
        }
    }
}
