use std::path::{Component, MAIN_SEPARATOR, MAIN_SEPARATOR_STR, Path, PathBuf};

use tracing::{debug, info};

use crate::model::ResolutionContext;

/// Expands a leading `~` or `~/` to `home_dir`. Anything else, including
/// `~user`, is returned untouched.
pub(crate) fn expand_home(raw: &str, home_dir: Option<&Path>) -> PathBuf {
    if let Some(home) = home_dir
        && (raw == "~" || raw.starts_with("~/"))
    {
        let suffix = raw.trim_start_matches('~').trim_start_matches('/');
        let mut path = home.to_path_buf();
        if !suffix.is_empty() {
            path.push(suffix);
        }
        return path;
    }

    PathBuf::from(raw)
}

pub(crate) fn absolute_path(path: &Path, cwd: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

/// Where the working directory sits below the base path: everything after
/// the first literal occurrence of the base path in the working directory,
/// or `""` if it does not occur.
///
/// The match is purely textual. `/src/proj` is found in `/src/projects/a`
/// and yields `ects/a`; a working directory outside the base path yields
/// the same empty result as the base path itself.
pub fn compute_common_part(project: &str, ctx: &ResolutionContext) -> String {
    debug!(
        base = %ctx.base_path_text,
        cwd = %ctx.cwd_text,
        gerrit = %project_to_os_path(project),
        "resolving common part"
    );

    let common = partition_after(&ctx.cwd_text, &ctx.base_path_text).to_owned();
    info!("common part is: {common}");
    common
}

/// Project path as it appears in the clone URL, before leading separators
/// are stripped.
pub fn resolve_project(project: &str, ctx: &ResolutionContext) -> String {
    let common = compute_common_part(project, ctx);
    format!("{common}{MAIN_SEPARATOR}{project}")
}

/// Local directory the project is cloned into: base path, common part and
/// project joined and normalized. Overlapping segments between the common
/// part and the project are kept as they are.
pub fn resolve_destination(project: &str, ctx: &ResolutionContext) -> PathBuf {
    let common = compute_common_part(project, ctx);
    let joined = [ctx.base_path_text.as_str(), common.as_str(), project].join(MAIN_SEPARATOR_STR);
    let destination = normalize_path(Path::new(&joined));

    info!("got destination path: {}", destination.display());
    destination
}

fn partition_after<'a>(haystack: &'a str, separator: &str) -> &'a str {
    if separator.is_empty() {
        return "";
    }
    haystack
        .split_once(separator)
        .map_or("", |(_, after)| after)
}

fn project_to_os_path(project: &str) -> String {
    project.replace('/', MAIN_SEPARATOR_STR)
}

/// Lexical normalization: drops `.` segments and repeated separators and
/// folds `..` into its parent. Never touches the filesystem.
pub(crate) fn normalize_path(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }

    if parts.is_empty() {
        return PathBuf::from(".");
    }
    parts.iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_separators_and_dots() {
        assert_eq!(
            normalize_path(Path::new("/home//x/./projects///foo/")),
            PathBuf::from("/home/x/projects/foo")
        );
        assert_eq!(normalize_path(Path::new("/a/b/../c")), PathBuf::from("/a/c"));
        assert_eq!(normalize_path(Path::new("/../a")), PathBuf::from("/a"));
        assert_eq!(normalize_path(Path::new("a/../..")), PathBuf::from(".."));
        assert_eq!(normalize_path(Path::new("")), PathBuf::from("."));
    }

    #[test]
    fn expand_home_only_handles_bare_tilde() {
        let home = Path::new("/home/x");
        assert_eq!(expand_home("~", Some(home)), PathBuf::from("/home/x"));
        assert_eq!(
            expand_home("~/projects", Some(home)),
            PathBuf::from("/home/x/projects")
        );
        assert_eq!(expand_home("~bob/src", Some(home)), PathBuf::from("~bob/src"));
        assert_eq!(expand_home("~/projects", None), PathBuf::from("~/projects"));
    }

    #[test]
    fn partition_uses_leftmost_match() {
        assert_eq!(partition_after("/x/a/x/b", "/x"), "/a/x/b");
        assert_eq!(partition_after("/y/a", "/x"), "");
        assert_eq!(partition_after("/x", ""), "");
    }
}
