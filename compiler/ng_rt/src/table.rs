//! Open-addressing hash table with Robin-Hood displacement.
//!
//! One algorithm serves three tables: the symbol interner (keyed by a mixed
//! 64-bit content hash), object dictionaries and sets (keyed by heap objects
//! with cached hashes), and the runtime's class registry.
//!
//! Callers supply the hash and an equality closure; the table never hashes
//! or compares keys on its own. That keeps object equality, which needs the
//! runtime's view of heap layouts, out of this module.
//!
//! # Invariants
//!
//! - Every bucket stores its probe sequence length (`psl`, 1 at the ideal
//!   slot). A bucket with `psl = k` at slot `i` has ideal slot
//!   `(i - (k - 1)) & mask`.
//! - Along any probe chain, a bucket is never poorer than the one following
//!   it by more than one step, so lookup may stop as soon as it meets a
//!   resident richer than the probe.
//! - Deletion shifts the rest of the chain back by one slot; there are no
//!   tombstones.
//! - `len < capacity` always holds: the table doubles when `len` reaches
//!   `capacity * 85 / 100`.

use std::mem;

/// Capacity of a freshly created table.
pub const INITIAL_CAPACITY: usize = 2;

/// Resize threshold as a percentage of capacity.
pub const LOAD_FACTOR_PERCENT: usize = 85;

#[derive(Debug)]
struct Bucket<K, V> {
    key: K,
    value: V,
    hash: u64,
    psl: u32,
}

/// Result of [`RobinHoodTable::insert`].
#[derive(Debug, PartialEq, Eq)]
pub enum Insert<K, V> {
    /// The key was absent and now occupies a slot.
    Inserted,
    /// The key was present. The resident key stays; the rejected key and
    /// the previous value are handed back.
    Replaced { key: K, old: V },
}

/// A Robin-Hood hash table over caller-hashed keys.
#[derive(Debug)]
pub struct RobinHoodTable<K, V> {
    slots: Vec<Option<Bucket<K, V>>>,
    len: usize,
    threshold: usize,
}

impl<K, V> Default for RobinHoodTable<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> RobinHoodTable<K, V> {
    pub fn new() -> Self {
        Self::with_capacity(INITIAL_CAPACITY)
    }

    /// Capacity is rounded up to a power of two, at least [`INITIAL_CAPACITY`].
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(INITIAL_CAPACITY).next_power_of_two();
        RobinHoodTable {
            slots: empty_slots(capacity),
            len: 0,
            threshold: threshold(capacity),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    fn mask(&self) -> usize {
        self.slots.len() - 1
    }

    #[inline]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "only the low bits select a slot"
    )]
    fn ideal_slot(&self, hash: u64) -> usize {
        (hash as usize) & self.mask()
    }

    /// Slot index of the entry matching `hash` and `eq`.
    pub fn find(&self, hash: u64, mut eq: impl FnMut(&K) -> bool) -> Option<usize> {
        let mask = self.mask();
        let mut index = self.ideal_slot(hash);
        let mut psl = 1;
        loop {
            let resident = self.slots[index].as_ref()?;
            if resident.psl < psl {
                return None;
            }
            if resident.hash == hash && eq(&resident.key) {
                return Some(index);
            }
            psl += 1;
            index = (index + 1) & mask;
        }
    }

    pub fn get(&self, hash: u64, eq: impl FnMut(&K) -> bool) -> Option<&V> {
        let index = self.find(hash, eq)?;
        self.slots[index].as_ref().map(|bucket| &bucket.value)
    }

    pub fn get_mut(&mut self, hash: u64, eq: impl FnMut(&K) -> bool) -> Option<&mut V> {
        let index = self.find(hash, eq)?;
        self.slots[index].as_mut().map(|bucket| &mut bucket.value)
    }

    /// Insert or update.
    ///
    /// `eq(resident, candidate)` decides whether a resident key with the same
    /// hash is the key being inserted. Once the candidate has displaced a
    /// resident it cannot match anything further along, so `eq` is only
    /// consulted before the first swap.
    pub fn insert(
        &mut self,
        hash: u64,
        key: K,
        value: V,
        mut eq: impl FnMut(&K, &K) -> bool,
    ) -> Insert<K, V> {
        if self.len >= self.threshold {
            self.grow();
        }

        let mask = self.mask();
        let mut index = self.ideal_slot(hash);
        let mut carried = Bucket {
            key,
            value,
            hash,
            psl: 1,
        };
        let mut carrying_candidate = true;

        loop {
            match self.slots[index] {
                None => {
                    self.slots[index] = Some(carried);
                    self.len += 1;
                    return Insert::Inserted;
                }
                Some(ref mut resident) => {
                    if carrying_candidate
                        && resident.hash == carried.hash
                        && eq(&resident.key, &carried.key)
                    {
                        let old = mem::replace(&mut resident.value, carried.value);
                        return Insert::Replaced {
                            key: carried.key,
                            old,
                        };
                    }
                    if carried.psl > resident.psl {
                        mem::swap(resident, &mut carried);
                        carrying_candidate = false;
                    }
                }
            }
            carried.psl += 1;
            index = (index + 1) & mask;
        }
    }

    /// Remove the matching entry, closing the gap by backward shift.
    pub fn remove(&mut self, hash: u64, eq: impl FnMut(&K) -> bool) -> Option<(K, V)> {
        let mut index = self.find(hash, eq)?;
        let removed = self.slots[index].take()?;
        self.len -= 1;

        let mask = self.mask();
        loop {
            let next = (index + 1) & mask;
            let Some(mut shifted) = self.slots[next].take_if(|bucket| bucket.psl > 1) else {
                break;
            };
            shifted.psl -= 1;
            self.slots[index] = Some(shifted);
            index = next;
        }

        Some((removed.key, removed.value))
    }

    /// Double the capacity and re-place every entry from its ideal slot.
    fn grow(&mut self) {
        let capacity = self.slots.len() * 2;
        let old = mem::replace(&mut self.slots, empty_slots(capacity));
        self.threshold = threshold(capacity);
        for bucket in old.into_iter().flatten() {
            self.place(bucket);
        }
        tracing::trace!(from = capacity / 2, to = capacity, len = self.len, "grew table");
    }

    /// Robin-Hood placement of a key known to be absent.
    fn place(&mut self, mut carried: Bucket<K, V>) {
        let mask = self.mask();
        let mut index = self.ideal_slot(carried.hash);
        carried.psl = 1;
        loop {
            match self.slots[index] {
                None => {
                    self.slots[index] = Some(carried);
                    return;
                }
                Some(ref mut resident) => {
                    if carried.psl > resident.psl {
                        mem::swap(resident, &mut carried);
                    }
                }
            }
            carried.psl += 1;
            index = (index + 1) & mask;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.slots
            .iter()
            .filter_map(|slot| slot.as_ref().map(|bucket| (&bucket.key, &bucket.value)))
    }

    /// Consume the table, yielding entries in slot order.
    pub fn into_entries(self) -> impl Iterator<Item = (K, V)> {
        self.slots
            .into_iter()
            .flatten()
            .map(|bucket| (bucket.key, bucket.value))
    }

    /// Probe sequence length stored at each slot, `0` for empty slots.
    pub fn probe_lengths(&self) -> impl Iterator<Item = u32> + '_ {
        self.slots
            .iter()
            .map(|slot| slot.as_ref().map_or(0, |bucket| bucket.psl))
    }

    /// Check every structural invariant, describing the first violation.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) -> Result<(), String> {
        let mask = self.mask();
        let mut occupied = 0;
        for (index, slot) in self.slots.iter().enumerate() {
            let Some(bucket) = slot else { continue };
            occupied += 1;
            let distance = (bucket.psl - 1) as usize;
            let ideal = index.wrapping_sub(distance) & mask;
            if ideal != self.ideal_slot(bucket.hash) {
                return Err(format!("slot {index}: psl {} does not lead home", bucket.psl));
            }
            if bucket.psl > 1 {
                let previous = self.slots[index.wrapping_sub(1) & mask].as_ref();
                match previous {
                    Some(prev) if prev.psl + 1 >= bucket.psl => {}
                    _ => return Err(format!("slot {index}: gap or richer predecessor")),
                }
            }
        }
        if occupied != self.len {
            return Err(format!("len {} but {occupied} occupied slots", self.len));
        }
        if self.len >= self.capacity() {
            return Err(format!("table full: len {}", self.len));
        }
        Ok(())
    }
}

fn empty_slots<K, V>(capacity: usize) -> Vec<Option<Bucket<K, V>>> {
    std::iter::repeat_with(|| None).take(capacity).collect()
}

fn threshold(capacity: usize) -> usize {
    capacity * LOAD_FACTOR_PERCENT / 100
}

#[cfg(test)]
mod tests;
