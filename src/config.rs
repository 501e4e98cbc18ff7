use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::ConfigError;
use crate::model::{
    DEFAULT_BASE_PATH, DEFAULT_PATH, DEFAULT_PORT, DEFAULT_PROTOCOL, DEFAULT_REMOTE_NAME, Profile,
    ResolvedProfile,
};
use crate::pathing::absolute_path;

pub(crate) const DEFAULT_CONF_FILE: &str = ".gerritclone.conf";
const DEFAULT_SECTION: &str = "DEFAULT";
const MAX_INTERPOLATION_DEPTH: usize = 10;

type Values = BTreeMap<String, String>;

/// Decides which configuration file to read, if any.
///
/// An explicit `--conf` must exist. Without one, `~/.gerritclone.conf` is
/// used when present. Asking for an instance without any file is an error.
pub(crate) fn select_config_source(
    explicit: Option<&Path>,
    instance: Option<&str>,
    cwd: &Path,
    home_dir: Option<&Path>,
) -> Result<Option<PathBuf>, ConfigError> {
    let conf = match explicit {
        Some(path) => Some(absolute_path(path, cwd)),
        None => home_dir
            .map(|home| home.join(DEFAULT_CONF_FILE))
            .filter(|path| path.is_file()),
    };

    if let Some(path) = &conf
        && !path.is_file()
    {
        return Err(ConfigError::FileMissing(path.clone()));
    }

    if instance.is_some() && conf.is_none() {
        return Err(ConfigError::InstanceWithoutConfig);
    }

    Ok(conf)
}

/// Resolves the profile for `instance` from the configuration file at
/// `conf`, or the built-in defaults when there is no file. Without an
/// instance name the first section of the file is used.
pub fn load_profile(
    conf: Option<&Path>,
    instance: Option<&str>,
) -> Result<ResolvedProfile, ConfigError> {
    let Some(path) = conf else {
        info!("no configuration file, using built-in defaults");
        return Ok(ResolvedProfile {
            instance: None,
            profile: Profile::default(),
        });
    };

    info!("reading configuration from {}", path.display());
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let ini = IniFile::parse(&text, path)?;
    debug!(
        "instances defined: {:?}",
        ini.section_names().collect::<Vec<_>>()
    );

    let name = match instance {
        Some(name) => name.to_owned(),
        None => {
            let first = ini
                .sections
                .first()
                .ok_or_else(|| ConfigError::NoInstancesDefined(path.to_path_buf()))?;
            info!("gerrit instance is {}", first.name);
            first.name.clone()
        }
    };

    let section = ini
        .section(&name)
        .ok_or_else(|| ConfigError::UnknownInstance {
            instance: name.clone(),
            path: path.to_path_buf(),
        })?;
    let profile = ini.profile(section)?;

    Ok(ResolvedProfile {
        instance: Some(name),
        profile,
    })
}

#[derive(Debug, Default)]
pub(crate) struct IniFile {
    defaults: Values,
    sections: Vec<IniSection>,
}

#[derive(Debug)]
pub(crate) struct IniSection {
    name: String,
    values: Values,
}

enum Target {
    Defaults,
    Section(usize),
}

impl IniFile {
    pub(crate) fn parse(text: &str, path: &Path) -> Result<Self, ConfigError> {
        let mut ini = IniFile::default();
        let mut target: Option<Target> = None;
        let mut last_key: Option<String> = None;

        for (index, line) in text.lines().enumerate() {
            let parse_error = |message: &str| ConfigError::Parse {
                path: path.to_path_buf(),
                line: index + 1,
                message: message.to_owned(),
            };

            if line.trim().is_empty() || line.starts_with(['#', ';']) || is_rem_comment(line) {
                continue;
            }

            if line.starts_with(char::is_whitespace)
                && let (Some(target), Some(key)) = (&target, &last_key)
            {
                let value = line.trim();
                if !value.is_empty()
                    && let Some(existing) = ini.values_mut(target).get_mut(key)
                {
                    existing.push('\n');
                    existing.push_str(value);
                }
                continue;
            }

            let line = line.trim_start();
            if let Some(rest) = line.strip_prefix('[') {
                let name = rest
                    .split_once(']')
                    .map(|(name, _)| name)
                    .filter(|name| !name.is_empty())
                    .ok_or_else(|| parse_error("malformed section header"))?;
                target = Some(ini.open_section(name));
                last_key = None;
                continue;
            }

            let Some(current) = &target else {
                return Err(parse_error("option found before any section header"));
            };

            let (key, value) =
                split_option(line).ok_or_else(|| parse_error("expected `key = value`"))?;
            ini.values_mut(current).insert(key.clone(), value);
            last_key = Some(key);
        }

        Ok(ini)
    }

    fn open_section(&mut self, name: &str) -> Target {
        if name == DEFAULT_SECTION {
            return Target::Defaults;
        }
        if let Some(index) = self.sections.iter().position(|section| section.name == name) {
            return Target::Section(index);
        }
        self.sections.push(IniSection {
            name: name.to_owned(),
            values: Values::new(),
        });
        Target::Section(self.sections.len() - 1)
    }

    fn values_mut(&mut self, target: &Target) -> &mut Values {
        match target {
            Target::Defaults => &mut self.defaults,
            Target::Section(index) => &mut self.sections[*index].values,
        }
    }

    pub(crate) fn section(&self, name: &str) -> Option<&IniSection> {
        self.sections.iter().find(|section| section.name == name)
    }

    pub(crate) fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|section| section.name.as_str())
    }

    /// Merges built-in defaults, `[DEFAULT]` and the section, expands
    /// `%(name)s` references and builds the profile.
    pub(crate) fn profile(&self, section: &IniSection) -> Result<Profile, ConfigError> {
        let mut merged = builtin_values();
        merged.extend(self.defaults.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged.extend(section.values.iter().map(|(k, v)| (k.clone(), v.clone())));

        let mut profile = Profile::default();
        for (key, raw) in &merged {
            let value = interpolate(&section.name, key, raw, &merged, 1)?;
            match key.as_str() {
                "host" => profile.host = non_empty(value),
                "protocol" => profile.protocol = value,
                "user" => profile.user = non_empty(value),
                "port" => profile.port = parse_port(&section.name, value)?,
                "path" => profile.path = value,
                "base_path" => profile.base_path = value,
                "remotename" => profile.remote_name = value,
                other => debug!("ignoring unknown key `{other}` in [{}]", section.name),
            }
        }

        Ok(profile)
    }
}

fn builtin_values() -> Values {
    [
        ("base_path", DEFAULT_BASE_PATH.to_owned()),
        ("protocol", DEFAULT_PROTOCOL.to_owned()),
        ("port", DEFAULT_PORT.to_string()),
        ("path", DEFAULT_PATH.to_owned()),
        ("remotename", DEFAULT_REMOTE_NAME.to_owned()),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_owned(), value))
    .collect()
}

fn is_rem_comment(line: &str) -> bool {
    line.starts_with(['r', 'R'])
        && line
            .split_whitespace()
            .next()
            .is_some_and(|word| word.eq_ignore_ascii_case("rem"))
}

/// `key = value` or `key: value`. Keys are lowercased; a `;` preceded by
/// whitespace starts an inline comment; `""` stands for the empty string.
fn split_option(line: &str) -> Option<(String, String)> {
    let delimiter = line.find(['=', ':'])?;
    let key = line[..delimiter].trim();
    if key.is_empty() {
        return None;
    }

    let mut value = &line[delimiter + 1..];
    if let Some(pos) = value.find(';')
        && value[..pos].ends_with(char::is_whitespace)
    {
        value = &value[..pos];
    }
    let value = match value.trim() {
        "\"\"" => "",
        other => other,
    };

    Some((key.to_lowercase(), value.to_owned()))
}

fn interpolate(
    section: &str,
    key: &str,
    raw: &str,
    values: &Values,
    depth: usize,
) -> Result<String, ConfigError> {
    let error = |message: String| ConfigError::Interpolation {
        section: section.to_owned(),
        key: key.to_owned(),
        message,
    };

    if depth > MAX_INTERPOLATION_DEPTH {
        return Err(error(format!(
            "references nest deeper than {MAX_INTERPOLATION_DEPTH} levels"
        )));
    }

    // Values without a `%(` reference are taken verbatim, stray `%` included.
    if !raw.contains("%(") {
        return Ok(raw.to_owned());
    }

    let mut expanded = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(pos) = rest.find('%') {
        expanded.push_str(&rest[..pos]);
        let tail = &rest[pos + 1..];

        if let Some(after) = tail.strip_prefix('%') {
            expanded.push('%');
            rest = after;
        } else if let Some(after) = tail.strip_prefix('(') {
            let close = after
                .find(")s")
                .ok_or_else(|| error(format!("unterminated reference in {raw:?}")))?;
            let name = after[..close].to_lowercase();
            let referenced = values
                .get(&name)
                .ok_or_else(|| error(format!("no option named `{name}`")))?;
            expanded.push_str(&interpolate(section, &name, referenced, values, depth + 1)?);
            rest = &after[close + 2..];
        } else {
            return Err(error(format!("'%' must be followed by '%' or '(' in {raw:?}")));
        }
    }
    expanded.push_str(rest);

    Ok(expanded)
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

fn parse_port(section: &str, value: String) -> Result<Option<u16>, ConfigError> {
    if value.is_empty() {
        return Ok(None);
    }
    match value.parse::<u16>() {
        Ok(0) => Ok(None),
        Ok(port) => Ok(Some(port)),
        Err(_) => Err(ConfigError::InvalidValue {
            section: section.to_owned(),
            key: "port",
            value,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> IniFile {
        IniFile::parse(text, Path::new("test.conf")).expect("parse ini")
    }

    fn profile_of(text: &str, name: &str) -> Profile {
        let ini = parse(text);
        let section = ini.section(name).expect("section exists");
        ini.profile(section).expect("build profile")
    }

    #[test]
    fn sections_keep_file_order_and_skip_default() {
        let ini = parse("[DEFAULT]\nuser = x\n[wikimedia]\nhost = a\n[openstack]\nhost = b\n[wikimedia]\nport = 1\n");
        assert_eq!(ini.section_names().collect::<Vec<_>>(), ["wikimedia", "openstack"]);
        assert_eq!(profile_of("[a]\nhost = h\n[a]\nport = 1\n", "a").port, Some(1));
    }

    #[test]
    fn defaults_merge_per_field() {
        let text = "[DEFAULT]\nuser = alice\nprotocol = https\n\n[gerrit]\nhost = gerrit.example.org\nprotocol = ssh\n";
        let profile = profile_of(text, "gerrit");
        assert_eq!(profile.host.as_deref(), Some("gerrit.example.org"));
        assert_eq!(profile.user.as_deref(), Some("alice"));
        assert_eq!(profile.protocol, "ssh");
        assert_eq!(profile.port, Some(29418));
        assert_eq!(profile.path, "/");
        assert_eq!(profile.base_path, "~/projects");
        assert_eq!(profile.remote_name, "origin");
    }

    #[test]
    fn accepts_colon_delimiter_comments_and_continuations() {
        let text = "# comment\n; other\nrem legacy\n[g]\nHost: example.org ; inline\nremotename = gerrit;kept\npath = /r/\n  extra\nuser = \"\"\n";
        let profile = profile_of(text, "g");
        assert_eq!(profile.host.as_deref(), Some("example.org"));
        assert_eq!(profile.remote_name, "gerrit;kept");
        assert_eq!(profile.path, "/r/\nextra");
        assert_eq!(profile.user, None);
    }

    #[test]
    fn interpolates_references() {
        let text = "[DEFAULT]\nroot = /srv\n[g]\nbase_path = %(root)s/%(remotename)s\npath = /%(root)s/100%%/\n";
        let profile = profile_of(text, "g");
        assert_eq!(profile.base_path, "/srv/origin");
        assert_eq!(profile.path, "//srv/100%/");
    }

    #[test]
    fn percent_without_reference_is_kept_verbatim() {
        let profile = profile_of("[g]\nhost = h\npath = /a%20b/\nremotename = 100%%\n", "g");
        assert_eq!(profile.path, "/a%20b/");
        assert_eq!(profile.remote_name, "100%%");
    }

    #[test]
    fn interpolation_errors_are_reported() {
        let ini = parse("[g]\nhost = %(missing)s\n");
        let section = ini.section("g").expect("section exists");
        assert!(matches!(
            ini.profile(section),
            Err(ConfigError::Interpolation { .. })
        ));

        let ini = parse("[g]\nhost = %(host)s\n");
        let section = ini.section("g").expect("section exists");
        assert!(matches!(
            ini.profile(section),
            Err(ConfigError::Interpolation { .. })
        ));
    }

    #[test]
    fn empty_or_zero_port_is_absent() {
        assert_eq!(profile_of("[g]\nport =\n", "g").port, None);
        assert_eq!(profile_of("[g]\nport = 0\n", "g").port, None);

        let ini = parse("[g]\nport = ssh\n");
        let section = ini.section("g").expect("section exists");
        assert!(matches!(
            ini.profile(section),
            Err(ConfigError::InvalidValue { key: "port", .. })
        ));
    }

    #[test]
    fn rejects_malformed_lines() {
        let err = IniFile::parse("host = x\n", Path::new("c.conf")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { line: 1, .. }));

        let err = IniFile::parse("[g]\njust words\n", Path::new("c.conf")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { line: 2, .. }));

        let err = IniFile::parse("[g\n", Path::new("c.conf")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { line: 1, .. }));
    }
}
