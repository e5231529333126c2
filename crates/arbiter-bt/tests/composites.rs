use arbiter_bt::{BehaviorCtx, BehaviorNode, FnLeaf, NodeConfigError, NodeVariant};
use arbiter_core::{
    MemoryKey, MemoryStatus, MemoryStore, SplitMix64, TickContext, TickSampler, WorldMut,
    WorldView,
};

const THREAT: MemoryKey<u32> = MemoryKey::new(0, "threat");
const KEEP_GOING: MemoryKey<bool> = MemoryKey::new(1, "keep_going");

#[derive(Debug, Default)]
struct RecordingWorld {
    log: Vec<&'static str>,
    low: u32,
    high: u32,
}

impl WorldView for RecordingWorld {
    type Actor = u64;
}

impl WorldMut for RecordingWorld {}

type Node = BehaviorNode<RecordingWorld>;

struct Harness {
    world: RecordingWorld,
    memory: MemoryStore,
    rng: SplitMix64,
}

impl Harness {
    fn new() -> Self {
        let mut memory = MemoryStore::new();
        memory.register(THREAT.slot()).expect("register threat");
        memory.register(KEEP_GOING.slot()).expect("register keep_going");
        Self {
            world: RecordingWorld::default(),
            memory,
            rng: SplitMix64::new(42),
        }
    }

    fn with_ctx<R>(&mut self, now: u64, f: impl FnOnce(&mut BehaviorCtx<'_, RecordingWorld>) -> R) -> R {
        let tick = TickContext::new(now);
        let mut cx = BehaviorCtx::new(&tick, 1, &mut self.world, &mut self.memory, &mut self.rng);
        f(&mut cx)
    }

    fn start(&mut self, node: &mut Node, now: u64) -> bool {
        self.with_ctx(now, |cx| node.try_start(cx))
    }

    fn tick(&mut self, node: &mut Node, now: u64) {
        self.with_ctx(now, |cx| node.tick_or_stop(cx));
    }
}

fn named(name: &'static str) -> FnLeaf<RecordingWorld> {
    FnLeaf::<RecordingWorld>::new().on_start(move |cx| cx.world.log.push(name))
}

/// Runs for exactly `ticks` ticks after starting.
fn lasting(name: &'static str, ticks: u32) -> Node {
    BehaviorNode::leaf(name, named(name).continue_while(|_| true))
        .with_runtime(TickSampler::constant(ticks))
}

fn statuses(node: &Node) -> Vec<bool> {
    node.children().iter().map(|child| child.is_running()).collect()
}

#[test]
fn run_all_starts_every_eligible_child_and_stops_when_none_remain() {
    let mut h = Harness::new();
    let gated = BehaviorNode::leaf("a", named("a")).require(THREAT, MemoryStatus::Present);
    let mut node = BehaviorNode::run_all("all", vec![gated, lasting("b", 2), lasting("c", 4)]);

    assert!(h.start(&mut node, 0));
    assert_eq!(statuses(&node), vec![false, true, true]);
    assert!(node.is_running());

    h.tick(&mut node, 0);
    h.tick(&mut node, 1);
    h.tick(&mut node, 2);
    assert_eq!(statuses(&node), vec![false, false, true]);
    assert!(node.is_running());

    h.tick(&mut node, 3);
    h.tick(&mut node, 4);
    assert_eq!(statuses(&node), vec![false, false, false]);
    assert!(!node.is_running());
    assert_eq!(h.world.log, vec!["b", "c"]);
}

#[test]
fn run_all_fails_when_no_child_can_start() {
    let mut h = Harness::new();
    let gated = BehaviorNode::leaf("a", named("a")).require(THREAT, MemoryStatus::Present);
    let mut node = BehaviorNode::run_all("all", vec![gated]);

    assert!(!h.start(&mut node, 0));
    assert!(!node.is_running());
}

#[test]
fn select_first_takes_the_first_eligible_child_in_declared_order() {
    let mut h = Harness::new();
    let gated = BehaviorNode::leaf("a", named("a")).require(THREAT, MemoryStatus::Present);
    let mut node = BehaviorNode::select_first("pick", vec![gated, lasting("b", 5), lasting("c", 5)]);

    assert!(h.start(&mut node, 0));
    assert_eq!(node.active_child().map(BehaviorNode::name), Some("b"));
    assert_eq!(h.world.log, vec!["b"]);
}

#[test]
fn select_first_stops_with_its_child_without_falling_through() {
    let mut h = Harness::new();
    let mut node = BehaviorNode::select_first("pick", vec![lasting("b", 2), lasting("c", 5)]);

    assert!(h.start(&mut node, 0));
    h.tick(&mut node, 0);
    h.tick(&mut node, 1);
    assert!(node.is_running());

    h.tick(&mut node, 2);
    assert!(!node.is_running());
    assert!(node.active_child().is_none());
    assert_eq!(h.world.log, vec!["b"]);
}

#[test]
fn stopping_a_selector_stops_its_active_child_once() {
    let mut h = Harness::new();
    let child = BehaviorNode::leaf(
        "b",
        named("b")
            .continue_while(|_| true)
            .on_stop(|cx| cx.world.log.push("b-stop")),
    );
    let mut node = BehaviorNode::select_first("pick", vec![child]);

    assert!(h.start(&mut node, 0));
    h.with_ctx(1, |cx| {
        node.do_stop(cx);
        node.do_stop(cx);
    });
    assert_eq!(h.world.log, vec!["b", "b-stop"]);
    assert!(!node.children()[0].is_running());
}

#[test]
fn weighted_selector_prefers_heavier_children() {
    let mut h = Harness::new();
    let low = BehaviorNode::leaf("low", FnLeaf::<RecordingWorld>::new().on_start(|cx| cx.world.low += 1));
    let high =
        BehaviorNode::leaf("high", FnLeaf::<RecordingWorld>::new().on_start(|cx| cx.world.high += 1));
    let mut node = BehaviorNode::select_random("roll", vec![(1, low), (10, high)]);
    assert_eq!(node.variant(), NodeVariant::SelectRandom);

    for now in 0..10_000u64 {
        assert!(h.start(&mut node, now));
        h.tick(&mut node, now);
        assert!(!node.is_running());
    }

    let (low, high) = (h.world.low, h.world.high);
    assert_eq!(low + high, 10_000);
    assert!(high > low * 5, "high={high} low={low}");
}

#[test]
fn zero_weight_child_is_only_a_fallback() {
    let mut h = Harness::new();
    let never = BehaviorNode::leaf("never", named("never"));
    let gated = BehaviorNode::leaf("gated", named("gated")).require(THREAT, MemoryStatus::Present);
    let mut node = BehaviorNode::select_random("roll", vec![(0, never), (3, gated)]);

    h.memory.set(THREAT, 1);
    for now in 0..200u64 {
        assert!(h.start(&mut node, now));
        h.tick(&mut node, now);
    }
    assert!(h.world.log.iter().all(|name| *name == "gated"));

    h.memory.clear(THREAT);
    assert!(h.start(&mut node, 500));
    assert_eq!(h.world.log.last(), Some(&"never"));
}

#[test]
fn repeat_n_times_runs_an_instant_child_four_times() {
    let mut h = Harness::new();
    let mut node = BehaviorNode::repeat_n_times("again", 3, BehaviorNode::leaf("jab", named("jab")));

    assert!(h.start(&mut node, 0));
    assert_eq!(node.repeats_remaining(), Some(3));

    let mut now = 0;
    while node.is_running() {
        h.tick(&mut node, now);
        now += 1;
        assert!(now < 20, "repeat never finished");
    }
    assert_eq!(h.world.log.len(), 4);
    assert_eq!(node.repeats_remaining(), Some(0));

    // A fresh outer run samples a fresh budget.
    assert!(h.start(&mut node, now));
    while node.is_running() {
        h.tick(&mut node, now);
        now += 1;
    }
    assert_eq!(h.world.log.len(), 8);
}

#[test]
fn repeat_waits_out_a_child_cooldown() {
    let mut h = Harness::new();
    let child = BehaviorNode::leaf("jab", named("jab")).with_cooldown(TickSampler::constant(3));
    let mut node = BehaviorNode::repeat_n_times("again", 1, child);

    assert!(h.start(&mut node, 0));
    h.tick(&mut node, 0);
    assert!(node.is_running(), "budget remains while the child cools down");
    h.tick(&mut node, 1);
    h.tick(&mut node, 2);
    assert_eq!(h.world.log.len(), 1);

    h.tick(&mut node, 3);
    assert_eq!(h.world.log.len(), 2);
    h.tick(&mut node, 4);
    assert!(!node.is_running());
}

#[test]
fn repeat_while_stops_when_its_predicate_fails() {
    let mut h = Harness::new();
    let child = BehaviorNode::leaf("jab", named("jab"));
    let mut node = BehaviorNode::repeat_while("while", TickSampler::constant(10), child, |cx| {
        cx.memory.get(KEEP_GOING).copied().unwrap_or(false)
    });

    h.memory.set(KEEP_GOING, true);
    assert!(h.start(&mut node, 0));
    h.tick(&mut node, 0);
    h.tick(&mut node, 1);
    assert_eq!(h.world.log.len(), 3);

    h.memory.set(KEEP_GOING, false);
    h.tick(&mut node, 2);
    assert!(!node.is_running());
    assert_eq!(h.world.log.len(), 3);
}

#[test]
fn composites_nest() {
    let mut h = Harness::new();
    let inner = BehaviorNode::select_first("inner", vec![lasting("x", 1)]);
    let mut node = BehaviorNode::run_all("outer", vec![inner, lasting("y", 3)]);

    assert!(h.start(&mut node, 0));
    h.tick(&mut node, 0);
    h.tick(&mut node, 1);
    assert_eq!(statuses(&node), vec![false, true]);
    for now in 2..=3 {
        h.tick(&mut node, now);
    }
    assert!(!node.is_running());
    assert_eq!(h.world.log, vec!["x", "y"]);
}

#[test]
fn validation_reports_misconfigured_nodes() {
    let empty: Node = BehaviorNode::select_first("empty", Vec::new());
    assert_eq!(
        empty.validate(),
        Err(NodeConfigError::EmptyComposite { node: "empty" })
    );

    let zero = BehaviorNode::select_random(
        "zero",
        vec![(0, BehaviorNode::leaf("a", named("a"))), (0, BehaviorNode::leaf("b", named("b")))],
    );
    assert_eq!(zero.validate(), Err(NodeConfigError::AllWeightsZero { node: "zero" }));

    let inverted = BehaviorNode::leaf("bad", named("bad")).with_cooldown(TickSampler::uniform(9, 2));
    let nested = BehaviorNode::run_all("outer", vec![lasting("ok", 1), inverted]);
    assert_eq!(
        nested.validate(),
        Err(NodeConfigError::InvalidRange {
            node: "bad",
            sampler: "cooldown",
            min: 9,
            max: 2,
        })
    );

    let repeat = BehaviorNode::repeat("again", TickSampler::uniform(3, 1), lasting("ok", 1));
    assert!(matches!(
        repeat.validate(),
        Err(NodeConfigError::InvalidRange { sampler: "repeat", .. })
    ));

    assert_eq!(lasting("fine", 3).validate(), Ok(()));
}

#[test]
fn memory_slots_are_collected_from_the_whole_tree() {
    let gated = BehaviorNode::leaf("a", named("a")).require(THREAT, MemoryStatus::Present);
    let leaf = FnLeaf::<RecordingWorld>::new().require(KEEP_GOING, MemoryStatus::Registered);
    let node = BehaviorNode::select_first("pick", vec![gated, BehaviorNode::leaf("b", leaf)]);

    let mut slots = Vec::new();
    node.collect_memory_slots(&mut slots);
    assert_eq!(slots, vec![THREAT.slot(), KEEP_GOING.slot()]);
}
