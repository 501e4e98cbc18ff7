use std::io;

use anyhow::{Result, anyhow};
use tracing::Level;

/// How chatty the process is on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Debug,
    Verbose,
    Quiet,
}

impl Verbosity {
    fn level(self) -> Level {
        match self {
            Verbosity::Debug => Level::DEBUG,
            Verbosity::Verbose => Level::INFO,
            Verbosity::Quiet => Level::WARN,
        }
    }
}

/// Installs the process-wide subscriber. Must be called once, before
/// anything logs.
pub fn init(verbosity: Verbosity) -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(verbosity.level())
        .with_target(false)
        .without_time()
        .with_writer(io::stderr)
        .try_init()
        .map_err(|err| anyhow!("failed to initialize logging: {err}"))
}
