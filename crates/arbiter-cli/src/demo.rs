//! A sentry actor: patrols by day, rests at night, and fights whatever wanders into range.

use arbiter::prelude::*;

pub const PATROL: ActivityId = ActivityId::new("patrol");
pub const FIGHT: ActivityId = ActivityId::new("fight");
pub const REST: ActivityId = ActivityId::new("rest");
pub const VITALS: ActivityId = ActivityId::new("vitals");

pub const THREAT: MemoryKey<u32> = MemoryKey::new(0, "threat");
pub const TARGET: MemoryKey<u64> = MemoryKey::new(1, "target");
pub const TIRED: MemoryKey<bool> = MemoryKey::new(2, "tired");

/// Ticks in one simulated day.
pub const DAY: u64 = 200;

/// Where the sentry stands and what it has done so far.
#[derive(Debug, Default)]
pub struct Outpost {
    /// `(from, until, intruder_id)` windows during which an intruder is in range.
    pub intruders: Vec<(u64, u64, u64)>,
    pub now: u64,
    pub position: i64,
    pub stamina: u32,
    pub strikes: u32,
    pub steps: u32,
}

impl Outpost {
    pub fn new() -> Self {
        Self {
            intruders: vec![(30, 60, 7), (170, 185, 11), (320, 340, 13)],
            stamina: 100,
            ..Self::default()
        }
    }

    fn intruder(&self) -> Option<u64> {
        self.intruders
            .iter()
            .find(|(from, until, _)| (*from..*until).contains(&self.now))
            .map(|(_, _, id)| *id)
    }
}

impl WorldView for Outpost {
    type Actor = u64;
}

impl WorldMut for Outpost {}

/// Spots intruders; the sighting fades unless refreshed.
struct Lookout;

impl Sensor<Outpost> for Lookout {
    fn memories_used(&self) -> Vec<MemorySlot> {
        vec![THREAT.slot(), TARGET.slot()]
    }

    fn scan_rate(&self) -> Option<u32> {
        Some(2)
    }

    fn sense(&mut self, _ctx: &TickContext, _actor: u64, world: &Outpost, memory: &mut MemoryStore) {
        if let Some(id) = world.intruder() {
            memory.set_with_expiry(THREAT, 1, 5);
            memory.set_with_expiry(TARGET, id, 5);
        }
    }
}

/// Reports fatigue from the world into memory.
struct Fatigue;

impl Sensor<Outpost> for Fatigue {
    fn memories_used(&self) -> Vec<MemorySlot> {
        vec![TIRED.slot()]
    }

    fn sense(&mut self, _ctx: &TickContext, _actor: u64, world: &Outpost, memory: &mut MemoryStore) {
        memory.set_optional(TIRED, (world.stamina < 40).then_some(true));
    }
}

fn walk(name: &'static str, step: i64) -> BehaviorNode<Outpost> {
    let leaf = FnLeaf::<Outpost>::new()
        .on_tick(move |cx| {
            cx.world.position += step;
            cx.world.steps += 1;
            cx.world.stamina = cx.world.stamina.saturating_sub(1);
        })
        .continue_while(|_| true);
    BehaviorNode::leaf(name, leaf)
        .with_runtime(TickSampler::uniform(5, 12))
        .with_cooldown(TickSampler::uniform(0, 3))
}

fn patrol() -> ActivityGroup<Outpost> {
    let look = BehaviorNode::leaf(
        "look_around",
        FnLeaf::<Outpost>::new().on_start(|cx| tracing::trace!(tick = cx.now(), "looking around")),
    )
    .with_cooldown(TickSampler::constant(4));
    let route = BehaviorNode::select_random(
        "route",
        vec![(3, walk("walk_east", 1)), (3, walk("walk_west", -1)), (1, look)],
    );
    ActivityGroup::new(PATROL, 20)
        .gate(THREAT, MemoryStatus::Absent)
        .behavior(route)
}

fn fight() -> ActivityGroup<Outpost> {
    let lunge = FnLeaf::<Outpost>::new()
        .require(TARGET, MemoryStatus::Present)
        .on_start(|cx| tracing::debug!(tick = cx.now(), "winding up"))
        .on_delayed(|cx| {
            cx.world.strikes += 1;
            cx.world.stamina = cx.world.stamina.saturating_sub(5);
        });
    let jab = FnLeaf::<Outpost>::new()
        .require(TARGET, MemoryStatus::Present)
        .on_start(|cx| cx.world.strikes += 1);
    let engage = BehaviorNode::select_first(
        "engage",
        vec![
            BehaviorNode::delayed("lunge", 3, lunge).with_cooldown(TickSampler::constant(8)),
            BehaviorNode::repeat_n_times("jabs", 2, BehaviorNode::leaf("jab", jab)),
        ],
    );
    ActivityGroup::new(FIGHT, 0)
        .gate(THREAT, MemoryStatus::Present)
        .clear_on_stop(TARGET)
        .behavior(engage)
}

fn rest() -> ActivityGroup<Outpost> {
    let sit = FnLeaf::<Outpost>::new()
        .on_tick(|cx| cx.world.stamina = (cx.world.stamina + 4).min(100))
        .hold_while(|cx, _held| cx.world.stamina < 100);
    ActivityGroup::new(REST, 10)
        .gate(THREAT, MemoryStatus::Absent)
        .behavior(BehaviorNode::held("sit", sit))
}

fn vitals() -> ActivityGroup<Outpost> {
    let catch_breath = FnLeaf::<Outpost>::new()
        .require(TIRED, MemoryStatus::Present)
        .on_start(|cx| cx.world.stamina = (cx.world.stamina + 10).min(100));
    ActivityGroup::new(VITALS, -10)
        .core()
        .behavior(BehaviorNode::leaf("catch_breath", catch_breath).with_cooldown(TickSampler::constant(30)))
}

/// Default day plan: patrol from dawn, rest at dusk.
pub fn default_schedule() -> Schedule {
    Schedule::cyclic(DAY, [(0, PATROL), (150, REST)])
}

/// Assemble the sentry. Schedule and scheduler settings come from `config` when it has them.
pub fn sentry(actor: u64, config: &ArbiterConfig) -> SchedulerBuilder<Outpost> {
    let builder = SchedulerBuilder::new(actor)
        .config(config.scheduler.clone())
        .sensor(Lookout)
        .sensor(Fatigue)
        .activity(vitals())
        .activity(fight())
        .activity(patrol())
        .activity(rest())
        .activity_order([FIGHT, PATROL])
        .default_activity(PATROL);

    match &config.schedule {
        Some(schedule) => builder.schedule_config(schedule.clone()),
        None => builder.schedule(default_schedule()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simulate(scheduler: &mut Scheduler<Outpost>, world: &mut Outpost, ticks: std::ops::Range<u64>) {
        for tick in ticks {
            world.now = tick;
            scheduler.tick(&TickContext::new(tick), world);
        }
    }

    #[test]
    fn sentry_fights_intruders_and_rests_at_dusk() {
        let mut scheduler = sentry(1, &ArbiterConfig::default()).build().expect("build");
        let mut world = Outpost::new();
        assert_eq!(scheduler.primary(), Some(PATROL));
        assert!(scheduler.is_active(VITALS));

        simulate(&mut scheduler, &mut world, 0..40);
        assert_eq!(scheduler.primary(), Some(FIGHT));

        simulate(&mut scheduler, &mut world, 40..100);
        assert!(world.strikes > 0);
        assert_eq!(scheduler.primary(), Some(PATROL));
        assert!(!scheduler.memory().has(TARGET));

        simulate(&mut scheduler, &mut world, 100..160);
        assert_eq!(scheduler.primary(), Some(REST));
    }

    #[test]
    fn config_schedule_replaces_the_default_day() {
        let config = ArbiterConfig::from_yaml_str(
            "schedule:\n  keyframes:\n    - at: 0\n      activity: rest\n",
        )
        .expect("parse");
        let scheduler = sentry(1, &config).build().expect("build");
        assert_eq!(scheduler.primary(), Some(REST));
        assert_eq!(scheduler.schedule().and_then(Schedule::period), None);
    }
}
