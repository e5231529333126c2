use arbiter_core::{
    MemoryKey, MemoryRequirement, MemorySlot, MemoryStatus, TickSampler, WorldMut,
};

use crate::composite::{Repeat, RunAll, Selector, WeightedChild};
use crate::leaf::{DelayedLeaf, HeldLeaf, Leaf};
use crate::{BehaviorCtx, NodeConfigError};

const DEFAULT_LEAF_TICKS: u32 = 60;

/// Runtime a leaf gets unless configured otherwise.
pub const DEFAULT_LEAF_RUNTIME: TickSampler = TickSampler::Constant(DEFAULT_LEAF_TICKS);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeStatus {
    Stopped,
    Running,
}

/// Which of the closed set of node shapes a [`BehaviorNode`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeVariant {
    Leaf,
    Delayed,
    Held,
    SelectFirst,
    SelectRandom,
    RunAll,
    Repeat,
}

impl NodeVariant {
    pub fn is_composite(self) -> bool {
        matches!(
            self,
            Self::SelectFirst | Self::SelectRandom | Self::RunAll | Self::Repeat
        )
    }
}

/// Borrow-free snapshot of a node, handed to removal predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeView {
    pub name: &'static str,
    pub variant: NodeVariant,
    pub status: NodeStatus,
}

pub(crate) struct Delayed<W>
where
    W: WorldMut + 'static,
{
    leaf: Box<dyn DelayedLeaf<W>>,
    delay: u64,
    pending_at: Option<u64>,
}

pub(crate) struct Held<W>
where
    W: WorldMut + 'static,
{
    leaf: Box<dyn HeldLeaf<W>>,
    since: Option<u64>,
}

enum NodeKind<W>
where
    W: WorldMut + 'static,
{
    Leaf(Box<dyn Leaf<W>>),
    Delayed(Delayed<W>),
    Held(Held<W>),
    SelectFirst(Selector<W>),
    SelectRandom(Selector<W>),
    RunAll(RunAll<W>),
    Repeat(Repeat<W>),
}

impl<W> NodeKind<W>
where
    W: WorldMut + 'static,
{
    fn variant(&self) -> NodeVariant {
        match self {
            Self::Leaf(_) => NodeVariant::Leaf,
            Self::Delayed(_) => NodeVariant::Delayed,
            Self::Held(_) => NodeVariant::Held,
            Self::SelectFirst(_) => NodeVariant::SelectFirst,
            Self::SelectRandom(_) => NodeVariant::SelectRandom,
            Self::RunAll(_) => NodeVariant::RunAll,
            Self::Repeat(_) => NodeVariant::Repeat,
        }
    }

    /// Leaves check their extra condition; composites start their children here.
    fn try_enter(&mut self, cx: &mut BehaviorCtx<'_, W>) -> bool {
        match self {
            Self::Leaf(leaf) => leaf.extra_start_condition(cx),
            Self::Delayed(d) => d.leaf.extra_start_condition(cx),
            Self::Held(h) => h.leaf.extra_start_condition(cx),
            Self::SelectFirst(s) => s.try_enter(cx, false),
            Self::SelectRandom(s) => s.try_enter(cx, true),
            Self::RunAll(r) => r.try_enter(cx),
            Self::Repeat(r) => r.try_enter(cx),
        }
    }

    fn on_start(&mut self, cx: &mut BehaviorCtx<'_, W>) {
        let now = cx.now();
        match self {
            Self::Leaf(leaf) => leaf.on_start(cx),
            Self::Delayed(d) => {
                d.pending_at = Some(now + d.delay);
                d.leaf.on_start(cx);
            }
            Self::Held(h) => {
                h.since = Some(now);
                h.leaf.on_start(cx);
            }
            Self::Repeat(r) => r.on_start(cx),
            Self::SelectFirst(_) | Self::SelectRandom(_) | Self::RunAll(_) => {}
        }
    }

    fn timed_out(&self, now: u64, deadline: u64) -> bool {
        match self {
            Self::Leaf(leaf) => leaf.timed_out(now, deadline),
            Self::Delayed(d) => d.leaf.timed_out(now, deadline),
            _ => now >= deadline,
        }
    }

    fn can_continue(&mut self, owner: &'static str, cx: &mut BehaviorCtx<'_, W>) -> bool {
        match self {
            Self::Leaf(leaf) => leaf.can_continue(cx),
            Self::Delayed(d) => d.pending_at.is_some() || d.leaf.can_continue(cx),
            Self::Held(h) => {
                let now = cx.now();
                let held = now.saturating_sub(h.since.unwrap_or(now));
                h.leaf.keep_holding(cx, held)
            }
            Self::SelectFirst(s) | Self::SelectRandom(s) => s.can_continue(owner),
            Self::RunAll(r) => r.any_running(),
            Self::Repeat(r) => r.can_continue(),
        }
    }

    /// Returns whether the node is still running after this tick's work.
    fn tick(&mut self, cx: &mut BehaviorCtx<'_, W>) -> bool {
        match self {
            Self::Leaf(leaf) => {
                leaf.on_tick(cx);
                true
            }
            Self::Delayed(d) => {
                d.leaf.on_tick(cx);
                if d.pending_at.is_some_and(|at| cx.now() >= at) {
                    d.pending_at = None;
                    d.leaf.on_delayed(cx);
                }
                true
            }
            Self::Held(h) => {
                h.leaf.on_tick(cx);
                true
            }
            Self::SelectFirst(s) | Self::SelectRandom(s) => s.tick(cx),
            Self::RunAll(r) => r.tick(cx),
            Self::Repeat(r) => r.tick(cx),
        }
    }

    fn on_stop(&mut self, cx: &mut BehaviorCtx<'_, W>) {
        match self {
            Self::Leaf(leaf) => leaf.on_stop(cx),
            Self::Delayed(d) => {
                d.pending_at = None;
                d.leaf.on_stop(cx);
            }
            Self::Held(h) => {
                h.since = None;
                h.leaf.on_stop(cx);
            }
            Self::SelectFirst(s) | Self::SelectRandom(s) => s.stop(cx),
            Self::RunAll(r) => r.stop(cx),
            Self::Repeat(r) => r.stop(cx),
        }
    }
}

/// A schedulable behavior: a `Stopped`/`Running` state machine wrapped around one of the node
/// variants.
///
/// Trees are assembled once with the constructors and `with_*` builders below; afterwards only
/// status, timestamps and composite bookkeeping change.
pub struct BehaviorNode<W>
where
    W: WorldMut + 'static,
{
    name: &'static str,
    status: NodeStatus,
    cooldown_until: u64,
    run_until: Option<u64>,
    entry_conditions: Vec<MemoryRequirement>,
    runtime: TickSampler,
    cooldown: TickSampler,
    timeout: bool,
    kind: NodeKind<W>,
}

impl<W> BehaviorNode<W>
where
    W: WorldMut + 'static,
{
    fn with_kind(name: &'static str, kind: NodeKind<W>, timeout: bool) -> Self {
        Self {
            name,
            status: NodeStatus::Stopped,
            cooldown_until: 0,
            run_until: None,
            entry_conditions: Vec::new(),
            runtime: DEFAULT_LEAF_RUNTIME,
            cooldown: TickSampler::ZERO,
            timeout,
            kind,
        }
    }

    pub fn leaf(name: &'static str, leaf: impl Leaf<W>) -> Self {
        let requirements = leaf.memory_requirements();
        let mut node = Self::with_kind(name, NodeKind::Leaf(Box::new(leaf)), true);
        node.entry_conditions = requirements;
        node
    }

    /// `on_delayed` fires `delay` ticks after start. The default runtime leaves room for it.
    pub fn delayed(name: &'static str, delay: u32, leaf: impl DelayedLeaf<W>) -> Self {
        let requirements = leaf.memory_requirements();
        let kind = NodeKind::Delayed(Delayed {
            leaf: Box::new(leaf),
            delay: u64::from(delay),
            pending_at: None,
        });
        let mut node = Self::with_kind(name, kind, true);
        node.entry_conditions = requirements;
        node.runtime = TickSampler::Constant(DEFAULT_LEAF_TICKS.max(delay.saturating_add(1)));
        node
    }

    pub fn held(name: &'static str, leaf: impl HeldLeaf<W>) -> Self {
        let requirements = leaf.memory_requirements();
        let kind = NodeKind::Held(Held {
            leaf: Box::new(leaf),
            since: None,
        });
        let mut node = Self::with_kind(name, kind, false);
        node.entry_conditions = requirements;
        node
    }

    pub fn select_first(name: &'static str, children: Vec<BehaviorNode<W>>) -> Self {
        let children = children.into_iter().map(WeightedChild::unweighted).collect();
        Self::with_kind(name, NodeKind::SelectFirst(Selector::new(children)), false)
    }

    /// Children as `(weight, node)`; higher weights are tried earlier more often.
    pub fn select_random(name: &'static str, children: Vec<(u32, BehaviorNode<W>)>) -> Self {
        let children = children
            .into_iter()
            .map(|(weight, node)| WeightedChild { weight, node })
            .collect();
        Self::with_kind(name, NodeKind::SelectRandom(Selector::new(children)), false)
    }

    pub fn run_all(name: &'static str, children: Vec<BehaviorNode<W>>) -> Self {
        Self::with_kind(name, NodeKind::RunAll(RunAll::new(children)), false)
    }

    /// Restart `child` up to a sampled number of extra times once it stops.
    pub fn repeat(name: &'static str, times: TickSampler, child: BehaviorNode<W>) -> Self {
        Self::with_kind(name, NodeKind::Repeat(Repeat::new(child, times, None)), false)
    }

    pub fn repeat_n_times(name: &'static str, times: u32, child: BehaviorNode<W>) -> Self {
        Self::repeat(name, TickSampler::Constant(times), child)
    }

    /// Like [`BehaviorNode::repeat`], but each restart also needs `predicate` to pass.
    pub fn repeat_while(
        name: &'static str,
        times: TickSampler,
        child: BehaviorNode<W>,
        predicate: impl FnMut(&mut BehaviorCtx<'_, W>) -> bool + 'static,
    ) -> Self {
        let repeat = Repeat::new(child, times, Some(Box::new(predicate)));
        Self::with_kind(name, NodeKind::Repeat(repeat), false)
    }

    /// Sets the runtime budget and turns the deadline on.
    pub fn with_runtime(mut self, runtime: TickSampler) -> Self {
        self.runtime = runtime;
        self.timeout = true;
        self
    }

    pub fn with_cooldown(mut self, cooldown: TickSampler) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn without_timeout(mut self) -> Self {
        self.timeout = false;
        self
    }

    pub fn require<T: 'static>(mut self, key: MemoryKey<T>, status: MemoryStatus) -> Self {
        self.entry_conditions.push(key.requires(status));
        self
    }

    pub fn with_requirement(mut self, requirement: MemoryRequirement) -> Self {
        self.entry_conditions.push(requirement);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn status(&self) -> NodeStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == NodeStatus::Running
    }

    pub fn variant(&self) -> NodeVariant {
        self.kind.variant()
    }

    pub fn view(&self) -> NodeView {
        NodeView {
            name: self.name,
            variant: self.variant(),
            status: self.status,
        }
    }

    pub fn cooldown_until(&self) -> u64 {
        self.cooldown_until
    }

    pub fn run_until(&self) -> Option<u64> {
        self.run_until
    }

    pub fn has_timeout(&self) -> bool {
        self.timeout
    }

    pub fn entry_conditions(&self) -> &[MemoryRequirement] {
        &self.entry_conditions
    }

    /// Ticks spent holding, for a running held node.
    pub fn held_ticks(&self, now: u64) -> Option<u64> {
        match &self.kind {
            NodeKind::Held(h) => h.since.map(|since| now.saturating_sub(since)),
            _ => None,
        }
    }

    /// The child a running selector delegates to.
    pub fn active_child(&self) -> Option<&BehaviorNode<W>> {
        match &self.kind {
            NodeKind::SelectFirst(s) | NodeKind::SelectRandom(s) => s.active(),
            _ => None,
        }
    }

    /// Restarts a running repeat node still has in its budget.
    pub fn repeats_remaining(&self) -> Option<u32> {
        match &self.kind {
            NodeKind::Repeat(r) => Some(r.remaining()),
            _ => None,
        }
    }

    pub fn children(&self) -> Vec<&BehaviorNode<W>> {
        match &self.kind {
            NodeKind::SelectFirst(s) | NodeKind::SelectRandom(s) => s.nodes().collect(),
            NodeKind::RunAll(r) => r.nodes().collect(),
            NodeKind::Repeat(r) => vec![r.child()],
            NodeKind::Leaf(_) | NodeKind::Delayed(_) | NodeKind::Held(_) => Vec::new(),
        }
    }

    pub fn try_start(&mut self, cx: &mut BehaviorCtx<'_, W>) -> bool {
        if self.status == NodeStatus::Running {
            return false;
        }

        let now = cx.now();
        if now < self.cooldown_until {
            return false;
        }
        if !self.entry_conditions.iter().all(|req| cx.memory.meets(req)) {
            return false;
        }
        if !self.kind.try_enter(cx) {
            return false;
        }

        self.status = NodeStatus::Running;
        self.run_until = if self.timeout {
            Some(now + u64::from(self.runtime.sample(&mut *cx.rng)))
        } else {
            None
        };
        self.kind.on_start(cx);
        true
    }

    pub fn tick_or_stop(&mut self, cx: &mut BehaviorCtx<'_, W>) {
        if self.status == NodeStatus::Stopped {
            return;
        }

        let now = cx.now();
        let timed_out = self
            .run_until
            .is_some_and(|deadline| self.kind.timed_out(now, deadline));
        if timed_out || !self.kind.can_continue(self.name, cx) {
            self.do_stop(cx);
            return;
        }

        if !self.kind.tick(cx) {
            self.do_stop(cx);
        }
    }

    pub fn do_stop(&mut self, cx: &mut BehaviorCtx<'_, W>) {
        if self.status == NodeStatus::Stopped {
            return;
        }

        self.cooldown_until = cx.now() + u64::from(self.cooldown.sample(&mut *cx.rng));
        self.kind.on_stop(cx);
        self.status = NodeStatus::Stopped;
        self.run_until = None;
    }

    /// Every slot this node and its descendants gate on.
    pub fn collect_memory_slots(&self, out: &mut Vec<MemorySlot>) {
        out.extend(self.entry_conditions.iter().map(|req| req.slot));
        for child in self.children() {
            child.collect_memory_slots(out);
        }
    }

    pub fn validate(&self) -> Result<(), NodeConfigError> {
        check_range(self.name, "runtime", self.runtime)?;
        check_range(self.name, "cooldown", self.cooldown)?;
        match &self.kind {
            NodeKind::SelectFirst(s) => s.validate(self.name, false)?,
            NodeKind::SelectRandom(s) => s.validate(self.name, true)?,
            NodeKind::RunAll(r) => r.validate(self.name)?,
            NodeKind::Repeat(r) => check_range(self.name, "repeat", r.times())?,
            NodeKind::Delayed(d) if self.timeout => {
                let runtime = match self.runtime {
                    TickSampler::Constant(ticks) => ticks,
                    TickSampler::Uniform { min, .. } => min,
                };
                if u64::from(runtime) <= d.delay {
                    return Err(NodeConfigError::DelayOutlastsRuntime {
                        node: self.name,
                        delay: d.delay,
                        runtime,
                    });
                }
            }
            NodeKind::Leaf(_) | NodeKind::Delayed(_) | NodeKind::Held(_) => {}
        }
        for child in self.children() {
            child.validate()?;
        }
        Ok(())
    }

    /// Depth-first, parents before children.
    pub fn visit<'a>(
        &'a self,
        parent: Option<&'a BehaviorNode<W>>,
        f: &mut dyn FnMut(&'a BehaviorNode<W>, Option<&'a BehaviorNode<W>>),
    ) {
        f(self, parent);
        for child in self.children() {
            child.visit(Some(self), f);
        }
    }

    /// Detach descendants matching `pred(child, parent)`, stopping running ones first.
    ///
    /// Only selector and run-all children can be detached; a repeat node's child is searched but
    /// never removed itself.
    pub fn remove_descendants_where(
        &mut self,
        cx: &mut BehaviorCtx<'_, W>,
        pred: &mut dyn FnMut(NodeView, NodeView) -> bool,
    ) -> usize {
        let parent = self.view();
        match &mut self.kind {
            NodeKind::SelectFirst(s) | NodeKind::SelectRandom(s) => s.remove_where(cx, parent, pred),
            NodeKind::RunAll(r) => r.remove_where(cx, parent, pred),
            NodeKind::Repeat(r) => r.child_mut().remove_descendants_where(cx, pred),
            NodeKind::Leaf(_) | NodeKind::Delayed(_) | NodeKind::Held(_) => 0,
        }
    }
}

fn check_range(
    node: &'static str,
    sampler: &'static str,
    range: TickSampler,
) -> Result<(), NodeConfigError> {
    match range {
        TickSampler::Uniform { min, max } if min > max => Err(NodeConfigError::InvalidRange {
            node,
            sampler,
            min,
            max,
        }),
        _ => Ok(()),
    }
}
