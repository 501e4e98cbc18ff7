use anyhow::{Context, Result};
use tracing::debug;

use crate::cli::Cli;
use crate::config::{load_profile, select_config_source};
use crate::model::{ClonePlan, Environment, ResolutionContext};
use crate::vcs::CloneCommand;

pub(crate) fn run(cli: Cli, env: &Environment) -> Result<i32> {
    let Cli {
        instance,
        project,
        conf,
        dry_run,
        ..
    } = cli;

    let conf = select_config_source(
        conf.as_deref(),
        instance.as_deref(),
        &env.cwd,
        env.home_dir.as_deref(),
    )?;
    let resolved = load_profile(conf.as_deref(), instance.as_deref())?;
    debug!(
        "config: {}",
        serde_json::to_string(&resolved.profile).context("failed to serialize profile")?
    );

    let ctx = ResolutionContext::new(
        &resolved.profile.base_path,
        &env.cwd,
        env.home_dir.as_deref(),
    );
    let plan = ClonePlan::build(&resolved.profile, &ctx, &project);
    let command = CloneCommand::new(&env.git_program, &plan);

    if dry_run {
        println!("Git command:\n{}", command.render());
        return Ok(0);
    }

    debug!("spawning: {}", command.render());
    command.run()
}
