//! Bookkeeping behind the composite node variants.
//!
//! These types are never exposed directly; [`BehaviorNode`] owns them and forwards its lifecycle
//! calls here.

use arbiter_core::{DeterministicRng, TickSampler, WorldMut};

use crate::node::{BehaviorNode, NodeView};
use crate::{BehaviorCtx, NodeConfigError};

pub(crate) type RepeatPredicate<W> = Box<dyn FnMut(&mut BehaviorCtx<'_, W>) -> bool>;
type RemovePredicate<'p> = &'p mut dyn FnMut(NodeView, NodeView) -> bool;

pub(crate) struct WeightedChild<W>
where
    W: WorldMut + 'static,
{
    pub(crate) weight: u32,
    pub(crate) node: BehaviorNode<W>,
}

impl<W> WeightedChild<W>
where
    W: WorldMut + 'static,
{
    pub(crate) fn unweighted(node: BehaviorNode<W>) -> Self {
        Self { weight: 1, node }
    }
}

/// Shuffle key: `u^(1/weight)`, so heavier children tend to sort earlier. Zero weights sort last.
fn weighted_key<R: DeterministicRng + ?Sized>(rng: &mut R, weight: u32) -> f64 {
    if weight == 0 {
        return -1.0;
    }
    let u = (rng.next_u64() >> 11) as f64 / (1u64 << 53) as f64;
    u.powf(1.0 / f64::from(weight))
}

/// First-success selection over an ordered or weighted-shuffled child list.
pub(crate) struct Selector<W>
where
    W: WorldMut + 'static,
{
    children: Vec<WeightedChild<W>>,
    active: Option<usize>,
}

impl<W> Selector<W>
where
    W: WorldMut + 'static,
{
    pub(crate) fn new(children: Vec<WeightedChild<W>>) -> Self {
        Self {
            children,
            active: None,
        }
    }

    pub(crate) fn nodes(&self) -> impl Iterator<Item = &BehaviorNode<W>> {
        self.children.iter().map(|child| &child.node)
    }

    pub(crate) fn active(&self) -> Option<&BehaviorNode<W>> {
        self.active.map(|idx| &self.children[idx].node)
    }

    fn attempt_order(&self, cx: &mut BehaviorCtx<'_, W>, shuffle: bool) -> Vec<usize> {
        if !shuffle {
            return (0..self.children.len()).collect();
        }

        let rng = &mut *cx.rng;
        let mut keyed: Vec<(usize, f64)> = self
            .children
            .iter()
            .enumerate()
            .map(|(idx, child)| (idx, weighted_key(&mut *rng, child.weight)))
            .collect();
        // Stable, so equal keys keep declaration order.
        keyed.sort_by(|a, b| b.1.total_cmp(&a.1));
        keyed.into_iter().map(|(idx, _)| idx).collect()
    }

    pub(crate) fn try_enter(&mut self, cx: &mut BehaviorCtx<'_, W>, shuffle: bool) -> bool {
        for idx in self.attempt_order(cx, shuffle) {
            if self.children[idx].node.try_start(cx) {
                self.active = Some(idx);
                return true;
            }
        }
        false
    }

    pub(crate) fn can_continue(&self, owner: &'static str) -> bool {
        if self.active.is_some() {
            return true;
        }
        tracing::warn!(selector = owner, "running selector has no active child; forcing stop");
        false
    }

    pub(crate) fn tick(&mut self, cx: &mut BehaviorCtx<'_, W>) -> bool {
        let Some(idx) = self.active else {
            return false;
        };
        let child = &mut self.children[idx].node;
        child.tick_or_stop(cx);
        child.is_running()
    }

    pub(crate) fn stop(&mut self, cx: &mut BehaviorCtx<'_, W>) {
        if let Some(idx) = self.active.take() {
            self.children[idx].node.do_stop(cx);
        }
    }

    pub(crate) fn validate(&self, owner: &'static str, weighted: bool) -> Result<(), NodeConfigError> {
        if self.children.is_empty() {
            return Err(NodeConfigError::EmptyComposite { node: owner });
        }
        if weighted && self.children.iter().all(|child| child.weight == 0) {
            return Err(NodeConfigError::AllWeightsZero { node: owner });
        }
        Ok(())
    }

    pub(crate) fn remove_where(
        &mut self,
        cx: &mut BehaviorCtx<'_, W>,
        parent: NodeView,
        pred: RemovePredicate<'_>,
    ) -> usize {
        let mut removed = 0;
        let mut idx = 0;
        while idx < self.children.len() {
            if pred(self.children[idx].node.view(), parent) {
                self.children[idx].node.do_stop(cx);
                self.children.remove(idx);
                self.active = match self.active {
                    Some(active) if active == idx => None,
                    Some(active) if active > idx => Some(active - 1),
                    other => other,
                };
                removed += 1;
                continue;
            }
            removed += self.children[idx].node.remove_descendants_where(cx, pred);
            idx += 1;
        }
        removed
    }
}

/// Starts every applicable child and runs while any of them does.
pub(crate) struct RunAll<W>
where
    W: WorldMut + 'static,
{
    children: Vec<BehaviorNode<W>>,
}

impl<W> RunAll<W>
where
    W: WorldMut + 'static,
{
    pub(crate) fn new(children: Vec<BehaviorNode<W>>) -> Self {
        Self { children }
    }

    pub(crate) fn nodes(&self) -> impl Iterator<Item = &BehaviorNode<W>> {
        self.children.iter()
    }

    pub(crate) fn try_enter(&mut self, cx: &mut BehaviorCtx<'_, W>) -> bool {
        let mut started = false;
        for child in &mut self.children {
            started |= child.try_start(cx);
        }
        started
    }

    pub(crate) fn any_running(&self) -> bool {
        self.children.iter().any(BehaviorNode::is_running)
    }

    pub(crate) fn tick(&mut self, cx: &mut BehaviorCtx<'_, W>) -> bool {
        for child in self.children.iter_mut().filter(|child| child.is_running()) {
            child.tick_or_stop(cx);
        }
        self.any_running()
    }

    pub(crate) fn stop(&mut self, cx: &mut BehaviorCtx<'_, W>) {
        for child in &mut self.children {
            child.do_stop(cx);
        }
    }

    pub(crate) fn validate(&self, owner: &'static str) -> Result<(), NodeConfigError> {
        if self.children.is_empty() {
            return Err(NodeConfigError::EmptyComposite { node: owner });
        }
        Ok(())
    }

    pub(crate) fn remove_where(
        &mut self,
        cx: &mut BehaviorCtx<'_, W>,
        parent: NodeView,
        pred: RemovePredicate<'_>,
    ) -> usize {
        let mut removed = 0;
        let mut idx = 0;
        while idx < self.children.len() {
            if pred(self.children[idx].view(), parent) {
                self.children[idx].do_stop(cx);
                self.children.remove(idx);
                removed += 1;
                continue;
            }
            removed += self.children[idx].remove_descendants_where(cx, pred);
            idx += 1;
        }
        removed
    }
}

/// Restarts its child from a sampled budget for as long as the optional predicate agrees.
pub(crate) struct Repeat<W>
where
    W: WorldMut + 'static,
{
    child: Box<BehaviorNode<W>>,
    times: TickSampler,
    remaining: u32,
    predicate: Option<RepeatPredicate<W>>,
}

impl<W> Repeat<W>
where
    W: WorldMut + 'static,
{
    pub(crate) fn new(
        child: BehaviorNode<W>,
        times: TickSampler,
        predicate: Option<RepeatPredicate<W>>,
    ) -> Self {
        Self {
            child: Box::new(child),
            times,
            remaining: 0,
            predicate,
        }
    }

    pub(crate) fn child(&self) -> &BehaviorNode<W> {
        &self.child
    }

    pub(crate) fn child_mut(&mut self) -> &mut BehaviorNode<W> {
        &mut self.child
    }

    pub(crate) fn times(&self) -> TickSampler {
        self.times
    }

    pub(crate) fn remaining(&self) -> u32 {
        self.remaining
    }

    pub(crate) fn try_enter(&mut self, cx: &mut BehaviorCtx<'_, W>) -> bool {
        self.child.try_start(cx)
    }

    pub(crate) fn on_start(&mut self, cx: &mut BehaviorCtx<'_, W>) {
        self.remaining = self.times.sample(&mut *cx.rng);
    }

    pub(crate) fn can_continue(&self) -> bool {
        self.child.is_running() || self.remaining > 0
    }

    fn should_repeat(&mut self, cx: &mut BehaviorCtx<'_, W>) -> bool {
        match self.predicate.as_mut() {
            Some(predicate) => predicate(cx),
            None => true,
        }
    }

    pub(crate) fn tick(&mut self, cx: &mut BehaviorCtx<'_, W>) -> bool {
        if self.child.is_running() {
            self.child.tick_or_stop(cx);
            if self.child.is_running() {
                return true;
            }
        }

        if self.remaining == 0 || !self.should_repeat(cx) {
            return false;
        }
        // A child still cooling down is retried next tick.
        if self.child.try_start(cx) {
            self.remaining -= 1;
        }
        true
    }

    pub(crate) fn stop(&mut self, cx: &mut BehaviorCtx<'_, W>) {
        self.child.do_stop(cx);
        self.remaining = 0;
    }
}
