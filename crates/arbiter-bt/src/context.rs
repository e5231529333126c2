use arbiter_core::{MemoryStore, SplitMix64, TickContext, WorldMut};

/// Everything a behavior callback may read or mutate during one call.
pub struct BehaviorCtx<'a, W>
where
    W: WorldMut + 'static,
{
    pub tick: &'a TickContext,
    pub actor: W::Actor,
    pub world: &'a mut W,
    pub memory: &'a mut MemoryStore,
    pub rng: &'a mut SplitMix64,
}

impl<'a, W> BehaviorCtx<'a, W>
where
    W: WorldMut + 'static,
{
    pub fn new(
        tick: &'a TickContext,
        actor: W::Actor,
        world: &'a mut W,
        memory: &'a mut MemoryStore,
        rng: &'a mut SplitMix64,
    ) -> Self {
        Self {
            tick,
            actor,
            world,
            memory,
            rng,
        }
    }

    pub fn now(&self) -> u64 {
        self.tick.tick
    }
}
