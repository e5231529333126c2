//! Umbrella crate that re-exports the `arbiter-*` building blocks.
//!
//! Most hosts only need [`prelude`]: build a [`Scheduler`](brain::Scheduler) per actor with a
//! [`SchedulerBuilder`](brain::SchedulerBuilder) and call `tick` once per simulation step.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

#[cfg(feature = "core")]
#[cfg_attr(docsrs, doc(cfg(feature = "core")))]
pub use arbiter_core as core;

#[cfg(feature = "tools")]
#[cfg_attr(docsrs, doc(cfg(feature = "tools")))]
pub use arbiter_tools as tools;

#[cfg(feature = "bt")]
#[cfg_attr(docsrs, doc(cfg(feature = "bt")))]
pub use arbiter_bt as bt;

#[cfg(feature = "brain")]
#[cfg_attr(docsrs, doc(cfg(feature = "brain")))]
pub use arbiter_brain as brain;

/// The types a typical host touches.
#[cfg(feature = "brain")]
#[cfg_attr(docsrs, doc(cfg(feature = "brain")))]
pub mod prelude {
    pub use arbiter_brain::{
        ActivityGroup, ActivityId, ArbiterConfig, BuildError, Schedule, Scheduler,
        SchedulerBuilder, SchedulerConfig,
    };
    pub use arbiter_bt::{
        BehaviorCtx, BehaviorNode, DelayedLeaf, FnLeaf, HeldLeaf, Leaf, NodeStatus,
    };
    pub use arbiter_core::{
        ActorId, MemoryKey, MemorySlot, MemoryStatus, MemoryStore, Sensor, TickContext,
        TickSampler, WorldMut, WorldView,
    };
    pub use arbiter_tools::{TraceEvent, TraceKind, TraceLog, TraceSink};
}
