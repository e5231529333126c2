//! Deterministic, engine-agnostic kernel for per-actor behavior arbitration.
//!
//! This crate holds the pieces every other `arbiter-*` crate builds on: the actor/world seams,
//! the per-tick context, deterministic randomness, tick samplers, the typed memory store and the
//! sensor contract.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod actor;
pub mod memory;
pub mod rng;
pub mod sample;
pub mod sensor;
pub mod tick;
pub mod world;

pub use actor::ActorId;
pub use memory::{
    MemoryKey, MemoryRequirement, MemorySlot, MemoryStatus, MemoryStore, MemoryValue, SlotConflict,
};
pub use rng::{DeterministicRng, SplitMix64};
pub use sample::TickSampler;
pub use sensor::{Sensor, SensorRunner, DEFAULT_SCAN_RATE};
pub use tick::TickContext;
pub use world::{WorldMut, WorldView};
