use arbiter_brain::{ActivityGroup, ActivityId, SchedulerBuilder};
use arbiter_bt::{BehaviorNode, FnLeaf};
use arbiter_core::{MemoryKey, MemoryStatus, TickContext, WorldMut, WorldView};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

const THREAT: MemoryKey<u32> = MemoryKey::new(0, "threat");

#[derive(Default)]
struct World {
    effects: u64,
}

impl WorldView for World {
    type Actor = u64;
}

impl WorldMut for World {}

fn effect(name: &'static str) -> BehaviorNode<World> {
    let leaf = FnLeaf::<World>::new().on_start(|cx| cx.world.effects += 1);
    BehaviorNode::leaf(name, leaf)
}

fn bench_scheduler_tick(c: &mut Criterion) {
    let mut idle = ActivityGroup::new(ActivityId::new("idle"), 100);
    let mut fight = ActivityGroup::new(ActivityId::new("fight"), 0).gate(THREAT, MemoryStatus::Present);
    for _ in 0..16 {
        idle = idle.behavior(effect("idle"));
        fight = fight.behavior(effect("fight"));
    }

    let mut scheduler = SchedulerBuilder::new(1u64)
        .activity(fight)
        .activity(idle)
        .build()
        .expect("build");
    let mut world = World::default();

    let mut tick: u64 = 0;
    c.bench_function("arbiter-brain/tick(behaviors=32)", |b| {
        b.iter(|| {
            if tick % 50 == 0 {
                scheduler.memory_mut().set(THREAT, 1);
            } else if tick % 50 == 25 {
                scheduler.memory_mut().clear(THREAT);
            }
            scheduler.tick(&TickContext::new(tick), &mut world);
            black_box(world.effects);
            tick = tick.wrapping_add(1);
        })
    });
}

criterion_group!(benches, bench_scheduler_tick);
criterion_main!(benches);
