use std::fmt;

use arbiter_bt::BehaviorNode;
use arbiter_core::{MemoryKey, MemoryRequirement, MemorySlot, MemoryStatus, WorldMut};

/// Name of an operating mode, e.g. `"idle"` or `"fight"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActivityId(pub &'static str);

impl ActivityId {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn name(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// A named mode bundling prioritized behaviors with the memory conditions that allow it and the
/// memories it owns.
///
/// Lower priority values are attempted first. Behaviors added with
/// [`behavior`](Self::behavior) take consecutive priorities from the group's base.
pub struct ActivityGroup<W>
where
    W: WorldMut + 'static,
{
    id: ActivityId,
    priority_base: i32,
    next_priority: i32,
    behaviors: Vec<(i32, BehaviorNode<W>)>,
    gate: Vec<MemoryRequirement>,
    clear_on_stop: Vec<MemorySlot>,
    core: bool,
}

impl<W> ActivityGroup<W>
where
    W: WorldMut + 'static,
{
    pub fn new(id: ActivityId, priority_base: i32) -> Self {
        Self {
            id,
            priority_base,
            next_priority: priority_base,
            behaviors: Vec::new(),
            gate: Vec::new(),
            clear_on_stop: Vec::new(),
            core: false,
        }
    }

    pub fn behavior(mut self, node: BehaviorNode<W>) -> Self {
        let priority = self.next_priority;
        self.next_priority = self.next_priority.saturating_add(1);
        self.behaviors.push((priority, node));
        self
    }

    pub fn behavior_at(mut self, priority: i32, node: BehaviorNode<W>) -> Self {
        self.behaviors.push((priority, node));
        self
    }

    /// All gates must hold for the activity to be picked as primary.
    pub fn gate<T: 'static>(mut self, key: MemoryKey<T>, status: MemoryStatus) -> Self {
        self.gate.push(key.requires(status));
        self
    }

    /// Erase `key` whenever this activity leaves the active set.
    pub fn clear_on_stop<T: 'static>(mut self, key: MemoryKey<T>) -> Self {
        self.clear_on_stop.push(key.slot());
        self
    }

    /// Core activities are active unconditionally, alongside the primary.
    pub fn core(mut self) -> Self {
        self.core = true;
        self
    }

    pub fn id(&self) -> ActivityId {
        self.id
    }

    pub fn priority_base(&self) -> i32 {
        self.priority_base
    }

    pub fn is_core(&self) -> bool {
        self.core
    }

    pub fn behaviors(&self) -> &[(i32, BehaviorNode<W>)] {
        &self.behaviors
    }

    pub fn gating(&self) -> &[MemoryRequirement] {
        &self.gate
    }

    pub fn cleared_on_stop(&self) -> &[MemorySlot] {
        &self.clear_on_stop
    }

    pub(crate) fn into_parts(self) -> (ActivityInfo, Vec<(i32, BehaviorNode<W>)>) {
        let info = ActivityInfo {
            id: self.id,
            gate: self.gate,
            clear_on_stop: self.clear_on_stop,
            core: self.core,
        };
        (info, self.behaviors)
    }
}

/// What the scheduler keeps about an activity once its behaviors are flattened.
#[derive(Debug, Clone)]
pub(crate) struct ActivityInfo {
    pub(crate) id: ActivityId,
    pub(crate) gate: Vec<MemoryRequirement>,
    pub(crate) clear_on_stop: Vec<MemorySlot>,
    pub(crate) core: bool,
}
