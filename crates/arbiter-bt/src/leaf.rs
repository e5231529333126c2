use arbiter_core::{MemoryKey, MemoryRequirement, MemoryStatus, WorldMut};

use crate::BehaviorCtx;

/// Extension points a concrete behavior implements.
///
/// The owning [`BehaviorNode`](crate::BehaviorNode) handles status, cooldown, entry conditions and
/// deadlines; a leaf only supplies its side effects and predicates.
pub trait Leaf<W>: 'static
where
    W: WorldMut + 'static,
{
    /// Memory gates merged into the node's entry conditions at construction. Slots listed here are
    /// also registered with the actor's memory store at build time, so declare written-only slots
    /// as [`MemoryStatus::Registered`].
    fn memory_requirements(&self) -> Vec<MemoryRequirement> {
        Vec::new()
    }

    fn extra_start_condition(&mut self, _cx: &mut BehaviorCtx<'_, W>) -> bool {
        true
    }

    fn on_start(&mut self, _cx: &mut BehaviorCtx<'_, W>) {}

    fn on_tick(&mut self, _cx: &mut BehaviorCtx<'_, W>) {}

    fn on_stop(&mut self, _cx: &mut BehaviorCtx<'_, W>) {}

    /// Checked every tick while running. The default makes a leaf one-shot: it starts, then stops
    /// on its first tick.
    fn can_continue(&mut self, _cx: &mut BehaviorCtx<'_, W>) -> bool {
        false
    }

    fn timed_out(&self, now: u64, deadline: u64) -> bool {
        now >= deadline
    }
}

/// Wind-up then apply: `on_start` shows the tell, `on_delayed` applies the effect once per
/// activation after the node's delay.
pub trait DelayedLeaf<W>: Leaf<W>
where
    W: WorldMut + 'static,
{
    fn on_delayed(&mut self, cx: &mut BehaviorCtx<'_, W>);
}

/// Runs without a deadline for as long as `keep_holding` says so.
pub trait HeldLeaf<W>: Leaf<W>
where
    W: WorldMut + 'static,
{
    fn keep_holding(&mut self, cx: &mut BehaviorCtx<'_, W>, held_ticks: u64) -> bool;
}

type Hook<W> = Box<dyn FnMut(&mut BehaviorCtx<'_, W>)>;
type Predicate<W> = Box<dyn FnMut(&mut BehaviorCtx<'_, W>) -> bool>;
type HoldPredicate<W> = Box<dyn FnMut(&mut BehaviorCtx<'_, W>, u64) -> bool>;

/// Closure-backed leaf for small behaviors and tests.
pub struct FnLeaf<W>
where
    W: WorldMut + 'static,
{
    requirements: Vec<MemoryRequirement>,
    start_if: Option<Predicate<W>>,
    on_start: Option<Hook<W>>,
    on_tick: Option<Hook<W>>,
    on_stop: Option<Hook<W>>,
    on_delayed: Option<Hook<W>>,
    continue_while: Option<Predicate<W>>,
    hold_while: Option<HoldPredicate<W>>,
}

impl<W> Default for FnLeaf<W>
where
    W: WorldMut + 'static,
{
    fn default() -> Self {
        Self {
            requirements: Vec::new(),
            start_if: None,
            on_start: None,
            on_tick: None,
            on_stop: None,
            on_delayed: None,
            continue_while: None,
            hold_while: None,
        }
    }
}

impl<W> FnLeaf<W>
where
    W: WorldMut + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn require<T: 'static>(mut self, key: MemoryKey<T>, status: MemoryStatus) -> Self {
        self.requirements.push(key.requires(status));
        self
    }

    pub fn start_if(mut self, f: impl FnMut(&mut BehaviorCtx<'_, W>) -> bool + 'static) -> Self {
        self.start_if = Some(Box::new(f));
        self
    }

    pub fn on_start(mut self, f: impl FnMut(&mut BehaviorCtx<'_, W>) + 'static) -> Self {
        self.on_start = Some(Box::new(f));
        self
    }

    pub fn on_tick(mut self, f: impl FnMut(&mut BehaviorCtx<'_, W>) + 'static) -> Self {
        self.on_tick = Some(Box::new(f));
        self
    }

    pub fn on_stop(mut self, f: impl FnMut(&mut BehaviorCtx<'_, W>) + 'static) -> Self {
        self.on_stop = Some(Box::new(f));
        self
    }

    pub fn on_delayed(mut self, f: impl FnMut(&mut BehaviorCtx<'_, W>) + 'static) -> Self {
        self.on_delayed = Some(Box::new(f));
        self
    }

    pub fn continue_while(
        mut self,
        f: impl FnMut(&mut BehaviorCtx<'_, W>) -> bool + 'static,
    ) -> Self {
        self.continue_while = Some(Box::new(f));
        self
    }

    pub fn hold_while(
        mut self,
        f: impl FnMut(&mut BehaviorCtx<'_, W>, u64) -> bool + 'static,
    ) -> Self {
        self.hold_while = Some(Box::new(f));
        self
    }
}

impl<W> Leaf<W> for FnLeaf<W>
where
    W: WorldMut + 'static,
{
    fn memory_requirements(&self) -> Vec<MemoryRequirement> {
        self.requirements.clone()
    }

    fn extra_start_condition(&mut self, cx: &mut BehaviorCtx<'_, W>) -> bool {
        self.start_if.as_mut().map_or(true, |f| f(cx))
    }

    fn on_start(&mut self, cx: &mut BehaviorCtx<'_, W>) {
        if let Some(f) = self.on_start.as_mut() {
            f(cx);
        }
    }

    fn on_tick(&mut self, cx: &mut BehaviorCtx<'_, W>) {
        if let Some(f) = self.on_tick.as_mut() {
            f(cx);
        }
    }

    fn on_stop(&mut self, cx: &mut BehaviorCtx<'_, W>) {
        if let Some(f) = self.on_stop.as_mut() {
            f(cx);
        }
    }

    fn can_continue(&mut self, cx: &mut BehaviorCtx<'_, W>) -> bool {
        self.continue_while.as_mut().is_some_and(|f| f(cx))
    }
}

impl<W> DelayedLeaf<W> for FnLeaf<W>
where
    W: WorldMut + 'static,
{
    fn on_delayed(&mut self, cx: &mut BehaviorCtx<'_, W>) {
        if let Some(f) = self.on_delayed.as_mut() {
            f(cx);
        }
    }
}

impl<W> HeldLeaf<W> for FnLeaf<W>
where
    W: WorldMut + 'static,
{
    fn keep_holding(&mut self, cx: &mut BehaviorCtx<'_, W>, held_ticks: u64) -> bool {
        self.hold_while.as_mut().is_some_and(|f| f(cx, held_ticks))
    }
}
