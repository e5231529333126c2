//! YAML configuration for schedulers and schedules.

use std::path::Path;

use arbiter_core::{ActorId, DEFAULT_SCAN_RATE};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Tuning knobs for one [`Scheduler`](crate::Scheduler).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Run the start pass and activity refresh every N ticks. Expirations, sensors and running
    /// nodes are still ticked every tick.
    pub arbitrate_every_ticks: u32,

    /// Phase shift for `arbitrate_every_ticks`, so actors sharing a rate spread out.
    pub arbitrate_offset: u32,

    /// Scan rate for sensors that do not declare their own.
    pub default_scan_rate: u32,

    /// Random stream id mixed into the per-tick behavior RNG.
    pub rng_stream: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            arbitrate_every_ticks: 1,
            arbitrate_offset: 0,
            default_scan_rate: DEFAULT_SCAN_RATE,
            rng_stream: 0,
        }
    }
}

impl SchedulerConfig {
    /// Decimated arbitration with the phase derived from the actor id.
    pub fn deterministic(actor: impl ActorId, arbitrate_every_ticks: u32) -> Self {
        let every = arbitrate_every_ticks.max(1);
        let offset = (actor.stable_id() % u64::from(every)) as u32;
        Self {
            arbitrate_every_ticks: every,
            arbitrate_offset: offset,
            ..Self::default()
        }
    }

    pub fn should_arbitrate(&self, tick: u64) -> bool {
        let every = u64::from(self.arbitrate_every_ticks.max(1));
        (tick + u64::from(self.arbitrate_offset)) % every == 0
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        load_yaml(path)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }
}

/// One `(time, activity)` step of a schedule, with the activity named as registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyframeConfig {
    pub at: u64,
    pub activity: String,
}

/// Serialized [`Schedule`](crate::Schedule). Activity names are resolved at build time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Cycle length, e.g. ticks per simulated day. Omit for a one-shot timeline.
    pub period: Option<u64>,
    pub keyframes: Vec<KeyframeConfig>,
}

impl ScheduleConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        load_yaml(path)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }
}

/// Everything a host needs to drive one actor, as read from a single file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArbiterConfig {
    /// Global seed the host puts into every `TickContext`.
    pub seed: u64,
    pub scheduler: SchedulerConfig,
    pub schedule: Option<ScheduleConfig>,
}

impl ArbiterConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        load_yaml(path)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }
}

fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_yaml::from_str(&content)?)
}
