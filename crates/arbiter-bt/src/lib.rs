//! Behavior node runtime built on `arbiter-core`.
//!
//! A [`BehaviorNode`] is a `Stopped`/`Running` state machine with entry-condition gating, a
//! cooldown and an optional deadline. Leaf nodes wrap a [`Leaf`] implementation; composite nodes
//! (first-success and weighted-random selectors, run-all, repeat) delegate to child nodes and
//! nest arbitrarily.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

mod composite;
pub mod context;
pub mod error;
pub mod leaf;
pub mod node;

pub use context::BehaviorCtx;
pub use error::NodeConfigError;
pub use leaf::{DelayedLeaf, FnLeaf, HeldLeaf, Leaf};
pub use node::{BehaviorNode, NodeStatus, NodeVariant, NodeView, DEFAULT_LEAF_RUNTIME};
