//! Activity arbitration for one actor.
//!
//! An actor's behaviors are grouped into [`ActivityGroup`]s (operating modes such as "idle" or
//! "fight"). The [`Scheduler`] keeps the actor's memory fresh through sensors, starts behaviors of
//! the active activities in priority order, ticks whatever is running, and picks the next primary
//! activity from memory gates and an optional time-keyed [`Schedule`].

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod activity;
pub mod builder;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod schedule;
pub mod scheduler;

pub use activity::{ActivityGroup, ActivityId};
pub use builder::SchedulerBuilder;
pub use config::{ArbiterConfig, KeyframeConfig, ScheduleConfig, SchedulerConfig};
pub use diagnostics::{NodeMatch, NodeVisit};
pub use error::{BuildError, ConfigError};
pub use schedule::Schedule;
pub use scheduler::Scheduler;
