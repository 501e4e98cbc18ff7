use std::env;
use std::ffi::OsString;
use std::path::{MAIN_SEPARATOR, Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::pathing::{absolute_path, expand_home, resolve_destination, resolve_project};

pub(crate) const DEFAULT_PROTOCOL: &str = "ssh";
pub(crate) const DEFAULT_PORT: u16 = 29418;
pub(crate) const DEFAULT_PATH: &str = "/";
pub(crate) const DEFAULT_BASE_PATH: &str = "~/projects";
pub(crate) const DEFAULT_REMOTE_NAME: &str = "origin";

/// Connection parameters of one Gerrit instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Profile {
    pub host: Option<String>,
    pub protocol: String,
    pub user: Option<String>,
    pub port: Option<u16>,
    pub path: String,
    pub base_path: String,
    pub remote_name: String,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            host: None,
            protocol: DEFAULT_PROTOCOL.to_owned(),
            user: None,
            port: Some(DEFAULT_PORT),
            path: DEFAULT_PATH.to_owned(),
            base_path: DEFAULT_BASE_PATH.to_owned(),
            remote_name: DEFAULT_REMOTE_NAME.to_owned(),
        }
    }
}

impl Profile {
    /// `{protocol}://[user@]host[:port]{path}{project}.git`
    pub fn clone_url(&self, project_path: &str) -> String {
        let user_part = match self.user.as_deref() {
            Some(user) if !user.is_empty() => format!("{user}@"),
            _ => String::new(),
        };
        let port_part = match self.port {
            Some(port) if port != 0 => format!(":{port}"),
            _ => String::new(),
        };

        format!(
            "{protocol}://{user_part}{host}{port_part}{path}{project}.git",
            protocol = self.protocol,
            host = self.host.as_deref().unwrap_or_default(),
            path = self.path,
            project = project_path.trim_start_matches(['/', MAIN_SEPARATOR]),
        )
    }
}

/// A profile together with the instance it was read from. `instance` is
/// `None` when the built-in defaults were used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedProfile {
    pub instance: Option<String>,
    pub profile: Profile,
}

/// Base path and working directory, both absolute, as seen by the path
/// resolver. The text forms are what the common part is computed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionContext {
    pub(crate) base_path: PathBuf,
    pub(crate) base_path_text: String,
    pub(crate) cwd_text: String,
}

impl ResolutionContext {
    /// Expands `~` in `base_path` (never in `cwd`) and anchors a relative
    /// base path at `cwd`.
    pub fn new(base_path: &str, cwd: &Path, home_dir: Option<&Path>) -> Self {
        let base_path = if base_path.is_empty() {
            cwd.to_path_buf()
        } else {
            absolute_path(&expand_home(base_path, home_dir), cwd)
        };
        let base_path_text = base_path.to_string_lossy().into_owned();

        Self {
            base_path,
            base_path_text,
            cwd_text: cwd.to_string_lossy().into_owned(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

/// What to clone, where to, and under which remote name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClonePlan {
    pub clone_url: String,
    pub destination: PathBuf,
    pub remote_name: String,
}

impl ClonePlan {
    pub fn build(profile: &Profile, ctx: &ResolutionContext, project: &str) -> Self {
        let project_path = resolve_project(project, ctx);
        Self {
            clone_url: profile.clone_url(&project_path),
            destination: resolve_destination(project, ctx),
            remote_name: profile.remote_name.clone(),
        }
    }
}

/// Process-level inputs of one invocation.
#[derive(Debug, Clone)]
pub struct Environment {
    pub cwd: PathBuf,
    pub home_dir: Option<PathBuf>,
    pub git_program: OsString,
}

impl Environment {
    pub fn detect() -> Result<Self> {
        let cwd = env::current_dir().context("failed to resolve current directory")?;
        Ok(Self {
            cwd,
            home_dir: dirs::home_dir(),
            git_program: OsString::from("git"),
        })
    }
}
