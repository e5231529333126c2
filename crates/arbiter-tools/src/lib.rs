//! Tooling primitives for behavior arbitration.
//!
//! This crate is intentionally lightweight and engine-agnostic: it defines the trace events a
//! scheduler emits and a few sinks to collect them. Rendering and inspection live elsewhere.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod trace;

pub use trace::{NullTraceSink, TraceEvent, TraceKind, TraceLog, TraceSink, VecTraceSink};
