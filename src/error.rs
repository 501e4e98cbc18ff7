use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures of the configuration stage. All of them are detected before a
/// clone URL is built or a process is spawned.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {}", .0.display())]
    FileMissing(PathBuf),
    #[error("could not specify an instance without a configuration file")]
    InstanceWithoutConfig,
    #[error("no gerrit instance defined in {}; you need at least one", .0.display())]
    NoInstancesDefined(PathBuf),
    #[error("no gerrit instance named \"{instance}\" in {}", path.display())]
    UnknownInstance { instance: String, path: PathBuf },
    #[error("failed to read configuration file {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{}:{line}: {message}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },
    #[error("bad interpolation in [{section}] {key}: {message}")]
    Interpolation {
        section: String,
        key: String,
        message: String,
    },
    #[error("invalid {key} in [{section}]: {value:?}")]
    InvalidValue {
        section: String,
        key: &'static str,
        value: String,
    },
}
