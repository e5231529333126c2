use arbiter_bt::{BehaviorCtx, BehaviorNode};
use arbiter_core::{MemoryStore, SensorRunner, TickContext, WorldMut};
use arbiter_tools::{TraceEvent, TraceKind, TraceSink};

use crate::activity::ActivityInfo;
use crate::{ActivityId, Schedule, SchedulerConfig};

/// One top-level behavior, flattened out of its activity group.
pub(crate) struct Entry<W>
where
    W: WorldMut + 'static,
{
    pub(crate) priority: i32,
    pub(crate) activity: usize,
    pub(crate) node: BehaviorNode<W>,
}

/// Per-actor arbitration loop.
///
/// Owns the actor's memory, sensors, activities and their behaviors. Each [`tick`](Self::tick):
///
/// 1. counts down expiring memories,
/// 2. runs due sensors,
/// 3. tries to start stopped behaviors of active activities in ascending priority,
/// 4. ticks every running behavior, whichever activity it belongs to,
/// 5. recomputes the active activity set.
///
/// Steps 3 and 5 only run on arbitration ticks (see [`SchedulerConfig::should_arbitrate`]).
pub struct Scheduler<W>
where
    W: WorldMut + 'static,
{
    pub(crate) actor: W::Actor,
    pub(crate) config: SchedulerConfig,
    pub(crate) memory: MemoryStore,
    pub(crate) sensors: Vec<SensorRunner<W>>,
    pub(crate) activities: Vec<ActivityInfo>,
    /// Sorted by priority; ties keep activity declaration then insertion order.
    pub(crate) entries: Vec<Entry<W>>,
    /// Non-core activities in the order they are considered for primary.
    pub(crate) order: Vec<usize>,
    pub(crate) default_activity: Option<usize>,
    pub(crate) schedule: Option<Schedule>,
    pub(crate) primary: Option<usize>,
    pub(crate) active: Vec<bool>,
    pub(crate) trace: Option<Box<dyn TraceSink>>,
}

pub(crate) fn emit(trace: &mut Option<Box<dyn TraceSink>>, event: TraceEvent) {
    if let Some(sink) = trace.as_mut() {
        sink.emit(event);
    }
}

impl<W> Scheduler<W>
where
    W: WorldMut + 'static,
{
    pub fn tick(&mut self, ctx: &TickContext, world: &mut W) {
        let now = ctx.tick;
        let Self {
            actor,
            config,
            memory,
            sensors,
            activities,
            entries,
            active,
            trace,
            ..
        } = self;
        let actor = *actor;

        for slot in memory.tick_expirations() {
            tracing::trace!(slot = slot.name, index = slot.index, "memory expired");
            emit(trace, TraceEvent::new(now, TraceKind::MemoryExpired, slot.name));
        }

        for runner in sensors.iter_mut() {
            if runner.tick(ctx, actor, &*world, memory) {
                emit(trace, TraceEvent::new(now, TraceKind::SensorScanned, runner.name()));
            }
        }

        let arbitrate = config.should_arbitrate(now);
        let mut rng = ctx.rng_for_actor(actor, config.rng_stream.wrapping_add(now));

        if arbitrate {
            for entry in entries.iter_mut() {
                if entry.node.is_running() || !active[entry.activity] {
                    continue;
                }
                let mut cx = BehaviorCtx::new(ctx, actor, world, memory, &mut rng);
                if entry.node.try_start(&mut cx) {
                    let activity = activities[entry.activity].id;
                    tracing::debug!(
                        node = entry.node.name(),
                        %activity,
                        priority = entry.priority,
                        tick = now,
                        "behavior started"
                    );
                    emit(
                        trace,
                        TraceEvent::new(now, TraceKind::NodeStarted, entry.node.name())
                            .with_detail(activity.name()),
                    );
                }
            }
        }

        for entry in entries.iter_mut() {
            if !entry.node.is_running() {
                continue;
            }
            let mut cx = BehaviorCtx::new(ctx, actor, world, memory, &mut rng);
            entry.node.tick_or_stop(&mut cx);
            if !entry.node.is_running() {
                let activity = activities[entry.activity].id;
                tracing::debug!(node = entry.node.name(), %activity, tick = now, "behavior stopped");
                emit(
                    trace,
                    TraceEvent::new(now, TraceKind::NodeStopped, entry.node.name())
                        .with_detail(activity.name()),
                );
            }
        }

        if arbitrate {
            self.refresh_activities(now);
        }
    }

    /// Recompute the primary activity and the active set, clearing memories owned by activities
    /// that leave it.
    pub(crate) fn refresh_activities(&mut self, now: u64) {
        let eligible = |idx: usize| {
            self.activities[idx]
                .gate
                .iter()
                .all(|requirement| self.memory.meets(requirement))
        };

        let mut primary = self.order.iter().copied().find(|&idx| eligible(idx));
        let scheduled = self
            .schedule
            .as_ref()
            .and_then(|schedule| schedule.tick(now))
            .and_then(|id| self.activity_index(id));
        if let Some(candidate) = scheduled {
            if !self.activities[candidate].core && eligible(candidate) {
                primary = Some(candidate);
            }
        }
        if primary.is_none() {
            primary = self
                .default_activity
                .filter(|&idx| eligible(idx))
                .or(self.primary);
        }

        let previous = self.primary;
        self.primary = primary;

        for idx in 0..self.activities.len() {
            let keep = self.activities[idx].core || primary == Some(idx);
            if self.active[idx] && !keep {
                for slot in &self.activities[idx].clear_on_stop {
                    self.memory.clear_slot(*slot);
                }
            }
            self.active[idx] = keep;
        }

        if previous != primary {
            let to = primary.map_or("none", |idx| self.activities[idx].id.name());
            let from = previous.map_or("none", |idx| self.activities[idx].id.name());
            tracing::debug!(from, to, tick = now, "primary activity changed");
            emit(
                &mut self.trace,
                TraceEvent::new(now, TraceKind::ActivityChanged, to).with_detail(from),
            );
        }
    }

    pub(crate) fn activity_index(&self, id: ActivityId) -> Option<usize> {
        self.activities.iter().position(|info| info.id == id)
    }

    pub fn actor(&self) -> W::Actor {
        self.actor
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn memory(&self) -> &MemoryStore {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut MemoryStore {
        &mut self.memory
    }

    pub fn schedule(&self) -> Option<&Schedule> {
        self.schedule.as_ref()
    }

    /// The non-core activity picked by the last refresh.
    pub fn primary(&self) -> Option<ActivityId> {
        self.primary.map(|idx| self.activities[idx].id)
    }

    pub fn is_active(&self, id: ActivityId) -> bool {
        self.activity_index(id).is_some_and(|idx| self.active[idx])
    }

    /// Active activities in declaration order, core ones included.
    pub fn active_activities(&self) -> Vec<ActivityId> {
        self.activities
            .iter()
            .zip(&self.active)
            .filter(|(_, active)| **active)
            .map(|(info, _)| info.id)
            .collect()
    }

    pub fn activities(&self) -> impl Iterator<Item = ActivityId> + '_ {
        self.activities.iter().map(|info| info.id)
    }

    /// Top-level behaviors in attempt order as `(priority, activity, node)`.
    pub fn behaviors(&self) -> impl Iterator<Item = (i32, ActivityId, &BehaviorNode<W>)> + '_ {
        self.entries
            .iter()
            .map(|entry| (entry.priority, self.activities[entry.activity].id, &entry.node))
    }

    /// Top-level behaviors currently running.
    pub fn running_nodes(&self) -> Vec<(ActivityId, &'static str)> {
        self.behaviors()
            .filter(|(_, _, node)| node.is_running())
            .map(|(_, activity, node)| (activity, node.name()))
            .collect()
    }

    pub fn sensor_count(&self) -> usize {
        self.sensors.len()
    }

    /// Replace the trace sink, returning the previous one.
    pub fn set_trace_sink(&mut self, sink: Box<dyn TraceSink>) -> Option<Box<dyn TraceSink>> {
        self.trace.replace(sink)
    }

    pub fn take_trace_sink(&mut self) -> Option<Box<dyn TraceSink>> {
        self.trace.take()
    }
}
