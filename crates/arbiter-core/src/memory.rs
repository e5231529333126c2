//! Typed per-actor blackboard.
//!
//! Slots are fixed indices handed out at build time. A slot must be registered before it accepts
//! writes, which lets gating conditions distinguish "registered but empty" from "unknown".

use std::any::{Any, TypeId};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;
use std::marker::PhantomData;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// State of a memory slot that a behavior or activity can gate on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum MemoryStatus {
    Present,
    Absent,
    /// The slot exists; its value may or may not be set.
    Registered,
}

/// Typed handle to one memory slot.
pub struct MemoryKey<T: 'static> {
    index: u16,
    name: &'static str,
    _phantom: PhantomData<fn() -> T>,
}

impl<T: 'static> Copy for MemoryKey<T> {}

impl<T: 'static> Clone for MemoryKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: 'static> PartialEq for MemoryKey<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T: 'static> Eq for MemoryKey<T> {}

impl<T: 'static> fmt::Debug for MemoryKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryKey")
            .field("index", &self.index)
            .field("name", &self.name)
            .finish()
    }
}

impl<T: 'static> MemoryKey<T> {
    pub const fn new(index: u16, name: &'static str) -> Self {
        Self {
            index,
            name,
            _phantom: PhantomData,
        }
    }

    pub fn index(self) -> u16 {
        self.index
    }

    pub fn name(self) -> &'static str {
        self.name
    }

    /// Type-erased form used for registration and gating.
    pub fn slot(self) -> MemorySlot {
        MemorySlot {
            index: self.index,
            name: self.name,
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        }
    }

    pub fn requires(self, status: MemoryStatus) -> MemoryRequirement {
        MemoryRequirement {
            slot: self.slot(),
            status,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemorySlot {
    pub index: u16,
    pub name: &'static str,
    pub type_id: TypeId,
    pub type_name: &'static str,
}

impl<T: 'static> From<MemoryKey<T>> for MemorySlot {
    fn from(key: MemoryKey<T>) -> Self {
        key.slot()
    }
}

/// One `(slot, status)` gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemoryRequirement {
    pub slot: MemorySlot,
    pub status: MemoryStatus,
}

/// Two registrations claimed the same index with different value types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotConflict {
    pub existing: MemorySlot,
    pub requested: MemorySlot,
}

/// Values that can live in a memory slot.
///
/// Collections report emptiness so that storing an empty one clears the slot instead.
pub trait MemoryValue: 'static {
    fn is_empty_value(&self) -> bool {
        false
    }
}

macro_rules! scalar_memory_values {
    ($($ty:ty),* $(,)?) => {
        $(impl MemoryValue for $ty {})*
    };
}

scalar_memory_values!(
    (),
    bool,
    char,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    f32,
    f64,
    String,
    &'static str,
);

impl<A: 'static, B: 'static> MemoryValue for (A, B) {}

impl<A: 'static, B: 'static, C: 'static> MemoryValue for (A, B, C) {}

impl<T: 'static> MemoryValue for Vec<T> {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<T: 'static> MemoryValue for VecDeque<T> {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<T: 'static> MemoryValue for BTreeSet<T> {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<K: 'static, V: 'static> MemoryValue for BTreeMap<K, V> {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<T: 'static, S: 'static> MemoryValue for HashSet<T, S> {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<K: 'static, V: 'static, S: 'static> MemoryValue for HashMap<K, V, S> {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

struct SlotEntry {
    slot: MemorySlot,
    value: Option<Box<dyn Any>>,
    ticks_remaining: Option<u32>,
}

#[derive(Default)]
pub struct MemoryStore {
    slots: Vec<Option<SlotEntry>>,
    expiring: Vec<u16>,
}

#[cold]
fn type_mismatch(slot: &MemorySlot, requested: &'static str) -> ! {
    panic!(
        "memory type mismatch for slot `{}` (index={}): stored {}, requested {}",
        slot.name, slot.index, slot.type_name, requested
    )
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a slot. Registering the same slot twice is a no-op.
    pub fn register(&mut self, slot: MemorySlot) -> Result<(), SlotConflict> {
        let index = usize::from(slot.index);
        if self.slots.len() <= index {
            self.slots.resize_with(index + 1, || None);
        }

        match &self.slots[index] {
            Some(entry) if entry.slot.type_id != slot.type_id => Err(SlotConflict {
                existing: entry.slot,
                requested: slot,
            }),
            Some(_) => Ok(()),
            None => {
                self.slots[index] = Some(SlotEntry {
                    slot,
                    value: None,
                    ticks_remaining: None,
                });
                Ok(())
            }
        }
    }

    pub fn is_registered(&self, slot: MemorySlot) -> bool {
        self.entry(slot.index).is_some()
    }

    pub fn registered_slots(&self) -> impl Iterator<Item = MemorySlot> + '_ {
        self.slots.iter().flatten().map(|entry| entry.slot)
    }

    /// Unregistered slots match no status.
    pub fn matches(&self, slot: MemorySlot, status: MemoryStatus) -> bool {
        let Some(entry) = self.entry(slot.index) else {
            return false;
        };
        match status {
            MemoryStatus::Registered => true,
            MemoryStatus::Present => entry.value.is_some(),
            MemoryStatus::Absent => entry.value.is_none(),
        }
    }

    pub fn meets(&self, requirement: &MemoryRequirement) -> bool {
        self.matches(requirement.slot, requirement.status)
    }

    pub fn set<T: MemoryValue>(&mut self, key: MemoryKey<T>, value: T) {
        self.write(key, value, None);
    }

    pub fn set_with_expiry<T: MemoryValue>(&mut self, key: MemoryKey<T>, value: T, ticks: u32) {
        self.write(key, value, Some(ticks));
    }

    /// Write or clear depending on `value`.
    pub fn set_optional<T: MemoryValue>(&mut self, key: MemoryKey<T>, value: Option<T>) {
        match value {
            Some(value) => self.set(key, value),
            None => self.clear(key),
        }
    }

    fn write<T: MemoryValue>(&mut self, key: MemoryKey<T>, value: T, ticks: Option<u32>) {
        if value.is_empty_value() {
            self.clear(key);
            return;
        }

        let Some(Some(entry)) = self.slots.get_mut(usize::from(key.index)) else {
            tracing::trace!(slot = key.name, "dropping write to unregistered memory slot");
            return;
        };
        if entry.slot.type_id != TypeId::of::<T>() {
            type_mismatch(&entry.slot, std::any::type_name::<T>());
        }

        entry.value = Some(Box::new(value));
        entry.ticks_remaining = ticks;
        if ticks.is_some() && !self.expiring.contains(&key.index) {
            self.expiring.push(key.index);
        }
    }

    pub fn get<T: 'static>(&self, key: MemoryKey<T>) -> Option<&T> {
        let entry = self.entry(key.index)?;
        let value = entry.value.as_ref()?;
        match value.downcast_ref::<T>() {
            Some(value) => Some(value),
            None => type_mismatch(&entry.slot, std::any::type_name::<T>()),
        }
    }

    pub fn get_mut<T: 'static>(&mut self, key: MemoryKey<T>) -> Option<&mut T> {
        let entry = self.slots.get_mut(usize::from(key.index))?.as_mut()?;
        let slot = entry.slot;
        let value = entry.value.as_mut()?;
        match value.downcast_mut::<T>() {
            Some(value) => Some(value),
            None => type_mismatch(&slot, std::any::type_name::<T>()),
        }
    }

    pub fn has<T: 'static>(&self, key: MemoryKey<T>) -> bool {
        self.matches_index(key.index)
    }

    fn matches_index(&self, index: u16) -> bool {
        self.entry(index).is_some_and(|entry| entry.value.is_some())
    }

    /// Remaining lifetime of an expiring value; `None` when absent or non-expiring.
    pub fn ticks_remaining<T: 'static>(&self, key: MemoryKey<T>) -> Option<u32> {
        let entry = self.entry(key.index)?;
        entry.value.as_ref()?;
        entry.ticks_remaining
    }

    pub fn take<T: 'static>(&mut self, key: MemoryKey<T>) -> Option<T> {
        let entry = self.slots.get_mut(usize::from(key.index))?.as_mut()?;
        entry.ticks_remaining = None;
        let value = entry.value.take()?;
        match value.downcast::<T>() {
            Ok(value) => Some(*value),
            Err(_) => type_mismatch(&entry.slot, std::any::type_name::<T>()),
        }
    }

    pub fn clear<T: 'static>(&mut self, key: MemoryKey<T>) {
        self.clear_index(key.index);
    }

    pub fn clear_slot(&mut self, slot: MemorySlot) {
        self.clear_index(slot.index);
    }

    fn clear_index(&mut self, index: u16) {
        if let Some(Some(entry)) = self.slots.get_mut(usize::from(index)) {
            entry.value = None;
            entry.ticks_remaining = None;
        }
    }

    /// Erase every value, keeping registrations.
    pub fn clear_all(&mut self) {
        for entry in self.slots.iter_mut().flatten() {
            entry.value = None;
            entry.ticks_remaining = None;
        }
        self.expiring.clear();
    }

    /// Advance expiry countdowns by one tick and return the slots erased this tick.
    ///
    /// Slots that were cleared or overwritten with a non-expiring value since they were tracked
    /// are dropped from tracking.
    pub fn tick_expirations(&mut self) -> Vec<MemorySlot> {
        let mut expired = Vec::new();
        let slots = &mut self.slots;
        self.expiring.retain(|&index| {
            let Some(Some(entry)) = slots.get_mut(usize::from(index)) else {
                return false;
            };
            if entry.value.is_none() {
                entry.ticks_remaining = None;
                return false;
            }
            let Some(ticks) = entry.ticks_remaining.as_mut() else {
                return false;
            };

            *ticks = ticks.saturating_sub(1);
            if *ticks > 0 {
                return true;
            }
            entry.value = None;
            entry.ticks_remaining = None;
            expired.push(entry.slot);
            false
        });
        expired
    }

    /// Number of slots currently holding a value.
    pub fn len(&self) -> usize {
        self.slots
            .iter()
            .flatten()
            .filter(|entry| entry.value.is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entry(&self, index: u16) -> Option<&SlotEntry> {
        self.slots.get(usize::from(index))?.as_ref()
    }
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for entry in self.slots.iter().flatten() {
            let state = match (entry.value.is_some(), entry.ticks_remaining) {
                (false, _) => "absent".to_string(),
                (true, None) => "present".to_string(),
                (true, Some(ticks)) => format!("present ({ticks} ticks)"),
            };
            map.entry(&entry.slot.name, &state);
        }
        map.finish()
    }
}
