use arbiter_brain::{ActivityGroup, ActivityId, Scheduler, SchedulerBuilder};
use arbiter_bt::{BehaviorNode, FnLeaf, NodeVariant};
use arbiter_core::{TickContext, WorldMut, WorldView};

const IDLE: ActivityId = ActivityId::new("idle");
const FIGHT: ActivityId = ActivityId::new("fight");

#[derive(Debug, Default)]
struct RecordingWorld {
    stopped: Vec<&'static str>,
}

impl WorldView for RecordingWorld {
    type Actor = u64;
}

impl WorldMut for RecordingWorld {}

type Node = BehaviorNode<RecordingWorld>;

fn running(name: &'static str) -> Node {
    let leaf = FnLeaf::<RecordingWorld>::new()
        .continue_while(|_| true)
        .on_stop(move |cx| cx.world.stopped.push(name));
    BehaviorNode::leaf(name, leaf).without_timeout()
}

fn scheduler() -> Scheduler<RecordingWorld> {
    let idle = ActivityGroup::new(IDLE, 0)
        .behavior(BehaviorNode::select_first("pick", vec![running("x"), running("y")]))
        .behavior(running("solo"));
    let fight = ActivityGroup::new(FIGHT, 10)
        .behavior(BehaviorNode::repeat_n_times("again", 2, running("jab")));
    SchedulerBuilder::new(1u64)
        .activity(idle)
        .activity(fight)
        .build()
        .expect("build")
}

#[test]
fn visit_covers_composite_children_with_their_parents() {
    let scheduler = scheduler();
    let mut seen = Vec::new();
    scheduler.visit_nodes(|visit| {
        seen.push((
            visit.priority,
            visit.activity,
            visit.node.name(),
            visit.parent.map(BehaviorNode::name),
        ));
    });

    assert_eq!(
        seen,
        vec![
            (0, IDLE, "pick", None),
            (0, IDLE, "x", Some("pick")),
            (0, IDLE, "y", Some("pick")),
            (1, IDLE, "solo", None),
            (10, FIGHT, "again", None),
            (10, FIGHT, "jab", Some("again")),
        ]
    );
}

#[test]
fn removing_a_running_top_level_behavior_stops_it_first() {
    let mut scheduler = scheduler();
    let mut world = RecordingWorld::default();
    scheduler.tick(&TickContext::new(0), &mut world);
    assert_eq!(scheduler.running_nodes(), vec![(IDLE, "pick"), (IDLE, "solo")]);

    let removed = scheduler.remove_nodes_where(&TickContext::new(1), &mut world, |candidate| {
        candidate.parent.is_none() && candidate.node.name == "solo"
    });
    assert_eq!(removed, 1);
    assert_eq!(world.stopped, vec!["solo"]);
    assert_eq!(scheduler.running_nodes(), vec![(IDLE, "pick")]);
    assert_eq!(scheduler.behaviors().count(), 2);
}

#[test]
fn removing_a_selector_child_makes_the_selector_give_up() {
    let mut scheduler = scheduler();
    let mut world = RecordingWorld::default();
    scheduler.tick(&TickContext::new(0), &mut world);

    let removed = scheduler.remove_nodes_where(&TickContext::new(1), &mut world, |candidate| {
        candidate.parent.is_some_and(|parent| parent.variant == NodeVariant::SelectFirst)
            && candidate.node.name == "x"
    });
    assert_eq!(removed, 1);
    assert_eq!(world.stopped, vec!["x"]);

    scheduler.tick(&TickContext::new(1), &mut world);
    let running: Vec<&str> = scheduler
        .running_nodes()
        .into_iter()
        .map(|(_, name)| name)
        .collect();
    assert_eq!(running, vec!["solo"]);

    // With `x` gone the selector falls back to `y` on its next start.
    scheduler.tick(&TickContext::new(2), &mut world);
    let mut children = Vec::new();
    scheduler.visit_nodes(|visit| {
        if visit.parent.is_some_and(|parent| parent.name() == "pick") {
            children.push((visit.node.name(), visit.node.is_running()));
        }
    });
    assert_eq!(children, vec![("y", true)]);
}
