use std::collections::BTreeSet;

use arbiter_core::{ActorId, MemorySlot, MemoryStore, Sensor, SensorRunner, WorldMut};
use arbiter_tools::TraceSink;

use crate::scheduler::Entry;
use crate::{ActivityGroup, ActivityId, BuildError, Schedule, ScheduleConfig, Scheduler, SchedulerConfig};

enum ScheduleSource {
    Built(Schedule),
    Config(ScheduleConfig),
}

/// Assembles a [`Scheduler`] for one actor.
///
/// Everything is checked at [`build`](Self::build): node trees are validated, every memory slot a
/// sensor, activity or behavior mentions is registered, and activity references are resolved.
pub struct SchedulerBuilder<W>
where
    W: WorldMut + 'static,
{
    actor: W::Actor,
    config: SchedulerConfig,
    memory_slots: Vec<MemorySlot>,
    sensors: Vec<Box<dyn Sensor<W>>>,
    groups: Vec<ActivityGroup<W>>,
    order: Option<Vec<ActivityId>>,
    default_activity: Option<ActivityId>,
    schedule: Option<ScheduleSource>,
    trace: Option<Box<dyn TraceSink>>,
}

impl<W> SchedulerBuilder<W>
where
    W: WorldMut + 'static,
{
    pub fn new(actor: W::Actor) -> Self {
        Self {
            actor,
            config: SchedulerConfig::default(),
            memory_slots: Vec::new(),
            sensors: Vec::new(),
            groups: Vec::new(),
            order: None,
            default_activity: None,
            schedule: None,
            trace: None,
        }
    }

    pub fn config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn memory(mut self, slot: impl Into<MemorySlot>) -> Self {
        self.memory_slots.push(slot.into());
        self
    }

    pub fn memory_slots(mut self, slots: impl IntoIterator<Item = MemorySlot>) -> Self {
        self.memory_slots.extend(slots);
        self
    }

    pub fn sensor(mut self, sensor: impl Sensor<W>) -> Self {
        self.sensors.push(Box::new(sensor));
        self
    }

    pub fn sensors(mut self, sensors: impl IntoIterator<Item = Box<dyn Sensor<W>>>) -> Self {
        self.sensors.extend(sensors);
        self
    }

    pub fn activity(mut self, group: ActivityGroup<W>) -> Self {
        self.groups.push(group);
        self
    }

    pub fn activities(mut self, groups: impl IntoIterator<Item = ActivityGroup<W>>) -> Self {
        self.groups.extend(groups);
        self
    }

    /// Order in which non-core activities are considered for primary. Defaults to declaration
    /// order; activities left out can still win through the schedule or as the default.
    pub fn activity_order(mut self, order: impl IntoIterator<Item = ActivityId>) -> Self {
        self.order = Some(order.into_iter().collect());
        self
    }

    /// Fallback primary when nothing in the activity order is eligible.
    pub fn default_activity(mut self, id: ActivityId) -> Self {
        self.default_activity = Some(id);
        self
    }

    pub fn schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = Some(ScheduleSource::Built(schedule));
        self
    }

    pub fn schedule_config(mut self, config: ScheduleConfig) -> Self {
        self.schedule = Some(ScheduleSource::Config(config));
        self
    }

    pub fn trace_sink(mut self, sink: Box<dyn TraceSink>) -> Self {
        self.trace = Some(sink);
        self
    }

    pub fn build(self) -> Result<Scheduler<W>, BuildError> {
        let Self {
            actor,
            config,
            memory_slots,
            sensors,
            groups,
            order,
            default_activity,
            schedule,
            trace,
        } = self;

        let mut seen = BTreeSet::new();
        for group in &groups {
            if !seen.insert(group.id()) {
                return Err(BuildError::DuplicateActivity(group.id().name()));
            }
            for (_, node) in group.behaviors() {
                node.validate().map_err(|source| BuildError::Node {
                    activity: group.id().name(),
                    source,
                })?;
            }
            if group.is_core() && group.behaviors().is_empty() {
                tracing::warn!(activity = %group.id(), "core activity has no behaviors");
            }
        }

        let mut slots = memory_slots;
        for sensor in &sensors {
            slots.extend(sensor.memories_used());
        }
        for group in &groups {
            slots.extend(group.gating().iter().map(|requirement| requirement.slot));
            slots.extend(group.cleared_on_stop().iter().copied());
            for (_, node) in group.behaviors() {
                node.collect_memory_slots(&mut slots);
            }
        }
        let memory = register_all(&slots)?;

        let mut activities = Vec::with_capacity(groups.len());
        let mut entries = Vec::new();
        for (activity, group) in groups.into_iter().enumerate() {
            let (info, behaviors) = group.into_parts();
            activities.push(info);
            entries.extend(behaviors.into_iter().map(|(priority, node)| Entry {
                priority,
                activity,
                node,
            }));
        }
        // Stable: ties keep activity declaration order, then insertion order.
        entries.sort_by_key(|entry| entry.priority);

        let resolve = |context: &'static str, id: ActivityId| {
            activities
                .iter()
                .position(|info| info.id == id)
                .ok_or_else(|| BuildError::UnknownActivity {
                    context,
                    name: id.name().to_string(),
                })
        };

        let order = match order {
            Some(ids) => {
                let mut resolved = Vec::with_capacity(ids.len());
                for id in ids {
                    let idx = resolve("activity order", id)?;
                    if !activities[idx].core {
                        resolved.push(idx);
                    }
                }
                resolved
            }
            None => (0..activities.len())
                .filter(|&idx| !activities[idx].core)
                .collect(),
        };

        let default_activity = default_activity
            .map(|id| resolve("default activity", id))
            .transpose()?;
        if let Some(idx) = default_activity.filter(|&idx| activities[idx].core) {
            return Err(BuildError::CoreDefaultActivity(activities[idx].id.name()));
        }

        let schedule = match schedule {
            None => None,
            Some(ScheduleSource::Built(schedule)) => {
                for (_, id) in schedule.keyframes() {
                    resolve("schedule", *id)?;
                }
                Some(schedule)
            }
            Some(ScheduleSource::Config(config)) => Some(resolve_schedule(&activities, config)?),
        };
        if schedule.as_ref().is_some_and(Schedule::is_empty) {
            return Err(BuildError::EmptySchedule);
        }

        let sensors = sensors
            .into_iter()
            .enumerate()
            .map(|(idx, sensor)| {
                let first_scan_in = (actor.stable_id() as u32).wrapping_add(idx as u32);
                SensorRunner::new(sensor, config.default_scan_rate, first_scan_in)
            })
            .collect();

        let active = vec![false; activities.len()];
        let mut scheduler = Scheduler {
            actor,
            config,
            memory,
            sensors,
            activities,
            entries,
            order,
            default_activity,
            schedule,
            primary: None,
            active,
            trace,
        };
        scheduler.refresh_activities(0);
        Ok(scheduler)
    }
}

fn register_all(slots: &[MemorySlot]) -> Result<MemoryStore, BuildError> {
    let mut memory = MemoryStore::new();
    for slot in slots {
        memory
            .register(*slot)
            .map_err(|conflict| BuildError::MemorySlotConflict {
                index: conflict.existing.index,
                existing: conflict.existing.type_name,
                requested: conflict.requested.type_name,
            })?;
    }
    Ok(memory)
}

fn resolve_schedule(
    activities: &[crate::activity::ActivityInfo],
    config: ScheduleConfig,
) -> Result<Schedule, BuildError> {
    let mut keyframes = Vec::with_capacity(config.keyframes.len());
    for keyframe in config.keyframes {
        let id = activities
            .iter()
            .map(|info| info.id)
            .find(|id| id.name() == keyframe.activity)
            .ok_or(BuildError::UnknownActivity {
                context: "schedule",
                name: keyframe.activity,
            })?;
        keyframes.push((keyframe.at, id));
    }
    let schedule = Schedule::new(keyframes);
    Ok(match config.period {
        Some(period) => schedule.with_period(period),
        None => schedule,
    })
}

impl<W> Scheduler<W>
where
    W: WorldMut + 'static,
{
    /// One-call assembly with default configuration.
    pub fn build(
        actor: W::Actor,
        memory_slots: impl IntoIterator<Item = MemorySlot>,
        sensors: impl IntoIterator<Item = Box<dyn Sensor<W>>>,
        groups: impl IntoIterator<Item = ActivityGroup<W>>,
    ) -> Result<Self, BuildError> {
        SchedulerBuilder::new(actor)
            .memory_slots(memory_slots)
            .sensors(sensors)
            .activities(groups)
            .build()
    }

    pub fn builder(actor: W::Actor) -> SchedulerBuilder<W> {
        SchedulerBuilder::new(actor)
    }
}
