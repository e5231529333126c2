#![cfg(feature = "brain")]

use std::cell::RefCell;
use std::rc::Rc;

use arbiter::prelude::*;

const HUNGER: MemoryKey<u32> = MemoryKey::new(0, "hunger");

#[derive(Debug, Default)]
struct Farm {
    meals: u32,
}

impl WorldView for Farm {
    type Actor = u32;
}

impl WorldMut for Farm {}

#[test]
fn prelude_is_enough_to_drive_an_actor() {
    let eat = FnLeaf::<Farm>::new()
        .require(HUNGER, MemoryStatus::Present)
        .on_start(|cx| {
            cx.world.meals += 1;
            cx.memory.clear(HUNGER);
        });
    let graze = ActivityGroup::new(ActivityId::new("graze"), 0).behavior(BehaviorNode::leaf("eat", eat));

    let trace = Rc::new(RefCell::new(TraceLog::default()));
    let mut scheduler = SchedulerBuilder::new(9u32)
        .activity(graze)
        .trace_sink(Box::new(trace.clone()))
        .build()
        .expect("build");
    let mut farm = Farm::default();

    for tick in 0..10 {
        if tick % 4 == 0 {
            scheduler.memory_mut().set(HUNGER, 1);
        }
        scheduler.tick(&TickContext::new(tick), &mut farm);
    }

    assert_eq!(farm.meals, 3);
    assert_eq!(trace.borrow().of_kind(TraceKind::NodeStarted).count(), 3);
}

#[cfg(feature = "serde")]
#[test]
fn trace_logs_serialize_through_the_umbrella() {
    let mut log = TraceLog::default();
    log.push(TraceEvent::new(3, TraceKind::ActivityChanged, "graze").with_detail("none"));
    let json = serde_json::to_string(&log).expect("serialize");
    assert!(json.contains("\"activity_changed\""));
}
