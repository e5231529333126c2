use crate::{rng, ActorId, SplitMix64};

/// One discrete simulation step as seen by a scheduler.
///
/// `tick` doubles as the timestamp every cooldown, deadline and schedule lookup is measured in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickContext {
    pub tick: u64,
    pub dt_seconds: f32,
    pub seed: u64,
}

impl TickContext {
    pub fn new(tick: u64) -> Self {
        Self {
            tick,
            dt_seconds: 0.05,
            seed: 0,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn now(&self) -> u64 {
        self.tick
    }

    pub fn rng_for_actor<A: ActorId>(&self, actor: A, stream: u64) -> SplitMix64 {
        let seed = rng::derive_seed(self.seed, actor.stable_id(), stream);
        SplitMix64::new(seed)
    }
}
