use std::path::PathBuf;

use arbiter_bt::NodeConfigError;
use thiserror::Error;

/// Failure to read or parse a YAML configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config from {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Fail-fast misconfiguration detected while assembling a [`Scheduler`](crate::Scheduler).
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("invalid behavior in activity `{activity}`: {source}")]
    Node {
        activity: &'static str,
        #[source]
        source: NodeConfigError,
    },
    #[error("activity `{0}` is registered more than once")]
    DuplicateActivity(&'static str),
    #[error("{context} refers to unknown activity `{name}`")]
    UnknownActivity { context: &'static str, name: String },
    #[error("memory slot {index} registered as `{existing}` and as `{requested}`")]
    MemorySlotConflict {
        index: u16,
        existing: &'static str,
        requested: &'static str,
    },
    #[error("core activity `{0}` cannot be the default activity")]
    CoreDefaultActivity(&'static str),
    #[error("schedule has no keyframes")]
    EmptySchedule,
    #[error(transparent)]
    Config(#[from] ConfigError),
}
