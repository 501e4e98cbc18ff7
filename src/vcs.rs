use std::ffi::{OsStr, OsString};
use std::iter;
use std::process::{Command, ExitStatus};

use anyhow::{Context, Result};

use crate::model::ClonePlan;

#[cfg(unix)]
use std::os::unix::process::ExitStatusExt;

/// `git clone -o <remote> <url> <destination>`, ready to print or run.
#[derive(Debug, Clone)]
pub(crate) struct CloneCommand {
    program: OsString,
    args: Vec<OsString>,
}

impl CloneCommand {
    pub(crate) fn new(program: &OsStr, plan: &ClonePlan) -> Self {
        let args = vec![
            OsString::from("clone"),
            OsString::from("-o"),
            OsString::from(&plan.remote_name),
            OsString::from(&plan.clone_url),
            plan.destination.clone().into_os_string(),
        ];

        Self {
            program: program.to_os_string(),
            args,
        }
    }

    pub(crate) fn render(&self) -> String {
        iter::once(&self.program)
            .chain(&self.args)
            .map(|arg| arg.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Runs the command to completion and returns its exit code as is.
    pub(crate) fn run(&self) -> Result<i32> {
        let status = Command::new(&self.program)
            .args(&self.args)
            .status()
            .with_context(|| format!("failed to execute {}", self.program.to_string_lossy()))?;

        Ok(exit_code(status))
    }
}

fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    // Killed by a signal: report it the way a shell would.
    #[cfg(unix)]
    {
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    1
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn plan() -> ClonePlan {
        ClonePlan {
            clone_url: "ssh://h:29418/foo.git".to_owned(),
            destination: PathBuf::from("/home/x/projects/foo"),
            remote_name: "origin".to_owned(),
        }
    }

    #[test]
    fn renders_clone_command_on_one_line() {
        let command = CloneCommand::new(OsStr::new("git"), &plan());
        assert_eq!(
            command.render(),
            "git clone -o origin ssh://h:29418/foo.git /home/x/projects/foo"
        );
    }

    #[test]
    fn renders_custom_program_and_remote() {
        let plan = ClonePlan {
            remote_name: "gerrit".to_owned(),
            ..plan()
        };
        let command = CloneCommand::new(OsStr::new("/usr/local/bin/git"), &plan);
        assert_eq!(
            command.render(),
            "/usr/local/bin/git clone -o gerrit ssh://h:29418/foo.git /home/x/projects/foo"
        );
    }
}
