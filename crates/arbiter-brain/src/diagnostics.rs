//! Read-only traversal and targeted removal of scheduled behaviors.

use arbiter_bt::{BehaviorCtx, BehaviorNode, NodeView};
use arbiter_core::{TickContext, WorldMut};
use arbiter_tools::{TraceEvent, TraceKind};

use crate::scheduler::emit;
use crate::{ActivityId, Scheduler};

/// One node reached by [`Scheduler::visit_nodes`].
pub struct NodeVisit<'a, W>
where
    W: WorldMut + 'static,
{
    pub priority: i32,
    pub activity: ActivityId,
    pub node: &'a BehaviorNode<W>,
    /// `None` for top-level behaviors.
    pub parent: Option<&'a BehaviorNode<W>>,
}

/// Candidate handed to [`Scheduler::remove_nodes_where`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeMatch {
    pub priority: i32,
    pub activity: ActivityId,
    pub node: NodeView,
    pub parent: Option<NodeView>,
}

impl<W> Scheduler<W>
where
    W: WorldMut + 'static,
{
    /// Depth-first over every behavior, composite children included, in attempt order.
    pub fn visit_nodes<'s>(&'s self, mut f: impl FnMut(NodeVisit<'s, W>)) {
        for entry in &self.entries {
            let priority = entry.priority;
            let activity = self.activities[entry.activity].id;
            entry.node.visit(None, &mut |node, parent| {
                f(NodeVisit {
                    priority,
                    activity,
                    node,
                    parent,
                })
            });
        }
    }

    /// Stop (if running) and detach every node matching `pred`. Returns how many were removed.
    ///
    /// Top-level behaviors and children of selectors and run-all nodes can be detached. A repeat
    /// node's child is searched but never removed on its own.
    pub fn remove_nodes_where(
        &mut self,
        ctx: &TickContext,
        world: &mut W,
        mut pred: impl FnMut(&NodeMatch) -> bool,
    ) -> usize {
        let Self {
            actor,
            config,
            memory,
            activities,
            entries,
            trace,
            ..
        } = self;
        let now = ctx.tick;
        let mut rng = ctx.rng_for_actor(*actor, config.rng_stream.wrapping_add(now));

        let mut removed = 0;
        let mut idx = 0;
        while idx < entries.len() {
            let priority = entries[idx].priority;
            let activity = activities[entries[idx].activity].id;
            let mut cx = BehaviorCtx::new(ctx, *actor, world, memory, &mut rng);

            let top = NodeMatch {
                priority,
                activity,
                node: entries[idx].node.view(),
                parent: None,
            };
            if pred(&top) {
                let node = &mut entries[idx].node;
                if node.is_running() {
                    node.do_stop(&mut cx);
                    emit(
                        trace,
                        TraceEvent::new(now, TraceKind::NodeStopped, node.name())
                            .with_detail(activity.name()),
                    );
                }
                tracing::debug!(node = node.name(), %activity, "behavior removed");
                entries.remove(idx);
                removed += 1;
                continue;
            }

            removed += entries[idx]
                .node
                .remove_descendants_where(&mut cx, &mut |node, parent| {
                    pred(&NodeMatch {
                        priority,
                        activity,
                        node,
                        parent: Some(parent),
                    })
                });
            idx += 1;
        }
        removed
    }
}
