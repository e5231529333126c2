use crate::{MemorySlot, MemoryStore, TickContext, WorldMut};

/// Scan interval used when a sensor does not declare its own.
pub const DEFAULT_SCAN_RATE: u32 = 20;

/// Periodic routine that copies world state into an actor's memory.
pub trait Sensor<W>: 'static
where
    W: WorldMut + 'static,
{
    /// Slots this sensor writes; the scheduler registers them at build time.
    fn memories_used(&self) -> Vec<MemorySlot>;

    /// Ticks between scans. `None` defers to the scheduler's configured default.
    fn scan_rate(&self) -> Option<u32> {
        None
    }

    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    fn sense(&mut self, ctx: &TickContext, actor: W::Actor, world: &W, memory: &mut MemoryStore);
}

/// Drives one sensor at its scan rate.
pub struct SensorRunner<W>
where
    W: WorldMut + 'static,
{
    sensor: Box<dyn Sensor<W>>,
    rate: u32,
    countdown: u32,
}

impl<W> SensorRunner<W>
where
    W: WorldMut + 'static,
{
    /// The first scan happens `first_scan_in % rate` ticks after the first `tick` call, which
    /// staggers sensors across actors.
    pub fn new(sensor: Box<dyn Sensor<W>>, default_rate: u32, first_scan_in: u32) -> Self {
        let rate = sensor.scan_rate().unwrap_or(default_rate).max(1);
        Self {
            sensor,
            rate,
            countdown: first_scan_in % rate + 1,
        }
    }

    pub fn rate(&self) -> u32 {
        self.rate
    }

    pub fn name(&self) -> &'static str {
        self.sensor.name()
    }

    /// Returns `true` when the sensor scanned on this tick.
    pub fn tick(
        &mut self,
        ctx: &TickContext,
        actor: W::Actor,
        world: &W,
        memory: &mut MemoryStore,
    ) -> bool {
        self.countdown = self.countdown.saturating_sub(1);
        if self.countdown > 0 {
            return false;
        }

        self.countdown = self.rate;
        self.sensor.sense(ctx, actor, world, memory);
        true
    }
}
