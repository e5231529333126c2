use core::fmt::Debug;

/// Stable identifier for the actor a scheduler drives.
///
/// Deterministic simulation requires:
/// - stable ordering (`Ord`)
/// - a stable numeric ID (`stable_id`) for seeding sensor offsets and random streams
pub trait ActorId: Copy + Ord + Eq + Debug + 'static {
    fn stable_id(self) -> u64;
}

impl ActorId for u64 {
    fn stable_id(self) -> u64 {
        self
    }
}

impl ActorId for u32 {
    fn stable_id(self) -> u64 {
        u64::from(self)
    }
}

impl ActorId for usize {
    fn stable_id(self) -> u64 {
        self as u64
    }
}
