//! HashIndex: the open-addressing engine behind every map, set and pool.
//!
//! Layout
//! - One boxed slice of slots whose length is zero (never allocated) or a
//!   power of two ≥ `MIN_CAPACITY`. A slot is either EMPTY (`None`) or an
//!   occupied bucket carrying the key, the value and the key's full hash.
//! - The ideal bucket of a key is `hash & (capacity - 1)`. Collisions are
//!   resolved by linear probing forward, wrapping at the end of the slice.
//!
//! Invariants
//! - `len <= grow_threshold` before every insert, where
//!   `grow_threshold = ceil(capacity * 3 / 4)`; since that is strictly less
//!   than `capacity`, at least one EMPTY slot always terminates a probe.
//! - Every occupied slot is reachable by probing from its ideal bucket
//!   without crossing an EMPTY slot.
//! - No two occupied slots hold equal keys.
//!
//! Removal uses backward-shift deletion, so there are no tombstones and
//! lookups never have to skip over deleted markers.
//!
//! Rehashing reuses the stored hash; `K: Hash` runs once per insert and
//! never during growth.

use crate::error::InsertError;
use crate::guard::DebugReentrancy;
use crate::DefaultHashBuilder;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::mem;

/// Capacity of the first allocation.
pub const MIN_CAPACITY: usize = 4;

#[derive(Clone)]
struct Bucket<K, V> {
    hash: u64,
    key: K,
    value: V,
}

pub struct HashIndex<K, V, S = DefaultHashBuilder> {
    hasher: S,
    slots: Box<[Option<Bucket<K, V>>]>,
    len: usize,
    grow_threshold: usize,
    reentrancy: DebugReentrancy,
}

/// Occupancy at which a table of `capacity` slots must grow before the next
/// insert: `ceil(0.75 * capacity)`.
#[inline]
pub const fn grow_threshold(capacity: usize) -> usize {
    (capacity * 3 + 3) / 4
}

#[inline]
fn ideal_bucket(hash: u64, mask: usize) -> usize {
    (hash as usize) & mask
}

/// True when `x` lies in the circular range `(lo, hi]`.
#[inline]
fn in_cyclic_range(x: usize, lo: usize, hi: usize) -> bool {
    if lo <= hi {
        lo < x && x <= hi
    } else {
        lo < x || x <= hi
    }
}

fn empty_slots<K, V>(capacity: usize) -> Box<[Option<Bucket<K, V>>]> {
    (0..capacity).map(|_| None).collect()
}

#[cfg(any(test, feature = "bench_internal"))]
impl<K, V> HashIndex<K, V> {
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }
}

#[cfg(any(test, feature = "bench_internal"))]
impl<K, V> Default for HashIndex<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over occupied slots in physical order.
pub struct Iter<'a, K, V> {
    it: core::slice::Iter<'a, Option<Bucket<K, V>>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        for slot in self.it.by_ref() {
            if let Some(b) = slot {
                self.remaining -= 1;
                return Some((&b.key, &b.value));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Iter {
            it: self.it.clone(),
            remaining: self.remaining,
        }
    }
}

/// Iterator over occupied slots in physical order, with mutable values.
pub struct IterMut<'a, K, V> {
    it: core::slice::IterMut<'a, Option<Bucket<K, V>>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        for slot in self.it.by_ref() {
            if let Some(b) = slot {
                self.remaining -= 1;
                return Some((&b.key, &mut b.value));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}

/// Owning iterator returned by `HashIndex::drain`. The index is already empty
/// when this is created; dropping it early drops the remaining entries.
pub struct Drain<K, V> {
    it: std::vec::IntoIter<Option<Bucket<K, V>>>,
    remaining: usize,
}

impl<K, V> Iterator for Drain<K, V> {
    type Item = (K, V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let b = self.it.by_ref().flatten().next()?;
        self.remaining -= 1;
        Some((b.key, b.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Drain<K, V> {}

// Structural operations that never call into `K: Hash`/`K: Eq`.
impl<K, V, S> HashIndex<K, V, S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            hasher,
            slots: Box::default(),
            len: 0,
            grow_threshold: 0,
            reentrancy: DebugReentrancy::new(),
        }
    }

    /// Allocate up front so that `capacity` inserts run without growing.
    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        let mut index = Self::with_hasher(hasher);
        if capacity > 0 {
            let mut slots = MIN_CAPACITY;
            while grow_threshold(slots) < capacity {
                slots *= 2;
            }
            index.slots = empty_slots(slots);
            index.grow_threshold = grow_threshold(slots);
        }
        index
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots in the backing array (zero before the first insert).
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[cfg(any(test, feature = "bench_internal"))]
    pub fn grow_threshold(&self) -> usize {
        self.grow_threshold
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            it: self.slots.iter(),
            remaining: self.len,
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            it: self.slots.iter_mut(),
            remaining: self.len,
        }
    }

    /// Take every entry out, returning the index to its unallocated state.
    pub fn drain(&mut self) -> Drain<K, V> {
        let slots = mem::take(&mut self.slots);
        let remaining = mem::replace(&mut self.len, 0);
        self.grow_threshold = 0;
        Drain {
            it: slots.into_vec().into_iter(),
            remaining,
        }
    }

    /// Drop every entry and the backing array.
    pub fn clear(&mut self) {
        self.drain();
    }

    fn bucket_mut(&mut self, slot: usize) -> &mut Bucket<K, V> {
        match self.slots[slot].as_mut() {
            Some(b) => b,
            None => unreachable!("slot {slot} located by probe is empty"),
        }
    }

    /// First EMPTY slot on the probe path of `hash`. Requires an allocated table.
    fn vacant_slot(&self, hash: u64) -> usize {
        let mask = self.slots.len() - 1;
        let mut i = ideal_bucket(hash, mask);
        while self.slots[i].is_some() {
            i = (i + 1) & mask;
        }
        i
    }

    /// Double the table (or allocate `MIN_CAPACITY` slots) and re-place every
    /// bucket by its stored hash. No equality checks are needed: keys in the
    /// old table are already distinct.
    fn grow(&mut self) {
        let old_capacity = self.slots.len();
        let new_capacity = if old_capacity == 0 {
            MIN_CAPACITY
        } else {
            old_capacity * 2
        };
        let old = mem::replace(&mut self.slots, empty_slots(new_capacity));
        self.grow_threshold = grow_threshold(new_capacity);
        for bucket in old.into_vec().into_iter().flatten() {
            let i = self.vacant_slot(bucket.hash);
            self.slots[i] = Some(bucket);
        }
        tracing::trace!(
            old_capacity,
            new_capacity,
            len = self.len,
            "hash index grew"
        );
    }

    /// Store a key known to be absent, growing first when at the threshold.
    fn place(&mut self, hash: u64, key: K, value: V) -> usize {
        if self.len >= self.grow_threshold {
            self.grow();
        }
        let i = self.vacant_slot(hash);
        self.slots[i] = Some(Bucket { hash, key, value });
        self.len += 1;
        i
    }

    /// Empty `slot` and close the gap by shifting later members of the same
    /// probe runs backward.
    fn remove_at(&mut self, slot: usize) -> (K, V) {
        let mask = self.slots.len() - 1;
        let removed = match self.slots[slot].take() {
            Some(b) => b,
            None => unreachable!("slot {slot} located by probe is empty"),
        };
        self.len -= 1;

        let mut gap = slot;
        let mut i = (slot + 1) & mask;
        while let Some(b) = &self.slots[i] {
            // A bucket whose ideal position lies in (gap, i] would become
            // unreachable if moved before its ideal position; leave it.
            if !in_cyclic_range(ideal_bucket(b.hash, mask), gap, i) {
                let moved = self.slots[i].take();
                self.slots[gap] = moved;
                gap = i;
            }
            i = (i + 1) & mask;
        }
        (removed.key, removed.value)
    }
}

impl<K, V, S> HashIndex<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    /// Probe for `q`: `Ok(slot)` when found, `Err(slot)` with the EMPTY slot
    /// that ended the probe otherwise. Requires an allocated table.
    fn probe<Q>(&self, hash: u64, q: &Q) -> Result<usize, usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let mask = self.slots.len() - 1;
        let mut i = ideal_bucket(hash, mask);
        loop {
            match &self.slots[i] {
                None => return Err(i),
                Some(b) if b.hash == hash && b.key.borrow() == q => return Ok(i),
                Some(_) => i = (i + 1) & mask,
            }
        }
    }

    /// Hash `key` and find its slot, if present.
    fn locate(&self, key: &K) -> (u64, Option<usize>) {
        let _g = self.reentrancy.enter();
        let hash = self.make_hash(key);
        if self.slots.is_empty() {
            return (hash, None);
        }
        (hash, self.probe(hash, key).ok())
    }

    /// Slot index holding a key equal to `q`.
    pub fn find<Q>(&self, q: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        if self.len == 0 {
            return None;
        }
        let _g = self.reentrancy.enter();
        let hash = self.make_hash(q);
        self.probe(hash, q).ok()
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find(q).is_some()
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get_key_value(q).map(|(_, v)| v)
    }

    pub fn get_key_value<Q>(&self, q: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let slot = self.find(q)?;
        self.slots[slot].as_ref().map(|b| (&b.key, &b.value))
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let slot = self.find(q)?;
        Some(&mut self.bucket_mut(slot).value)
    }

    /// Insert a key that must not already be present.
    ///
    /// On `DuplicateKey` nothing is modified; the rejected key and value are
    /// dropped.
    pub fn insert_unique(&mut self, key: K, value: V) -> Result<(), InsertError> {
        let (hash, existing) = self.locate(&key);
        if existing.is_some() {
            return Err(InsertError::DuplicateKey);
        }
        self.place(hash, key, value);
        Ok(())
    }

    /// Insert, or overwrite the entry holding an equal key.
    ///
    /// Returns the superseded `(key, value)` when an entry was overwritten.
    /// The existence check runs before the grow check, so overwriting never
    /// resizes the table.
    pub fn insert_or_replace(&mut self, key: K, value: V) -> Option<(K, V)> {
        let (hash, existing) = self.locate(&key);
        match existing {
            Some(slot) => {
                let b = self.bucket_mut(slot);
                let old_key = mem::replace(&mut b.key, key);
                let old_value = mem::replace(&mut b.value, value);
                Some((old_key, old_value))
            }
            None => {
                self.place(hash, key, value);
                None
            }
        }
    }

    /// Value for `q`, inserting the pair built by `make` when absent.
    ///
    /// `q` is hashed and probed once either way. `make` must return a key
    /// equal to `q`.
    pub fn get_or_insert_with<Q, F>(&mut self, q: &Q, make: F) -> &V
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        F: FnOnce() -> (K, V),
    {
        let (hash, existing) = {
            let _g = self.reentrancy.enter();
            let hash = self.make_hash(q);
            if self.slots.is_empty() {
                (hash, None)
            } else {
                (hash, self.probe(hash, q).ok())
            }
        };
        let slot = match existing {
            Some(slot) => slot,
            None => {
                let (key, value) = make();
                debug_assert!(
                    <K as Borrow<Q>>::borrow(&key) == q,
                    "made key differs from the query"
                );
                self.place(hash, key, value)
            }
        };
        match &self.slots[slot] {
            Some(b) => &b.value,
            None => unreachable!("slot {slot} located by probe is empty"),
        }
    }

    /// Remove the entry equal to `q`, returning it. Absent keys are a no-op.
    pub fn remove<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let slot = self.find(q)?;
        Some(self.remove_at(slot))
    }
}

impl<K: Clone, V: Clone, S: Clone> Clone for HashIndex<K, V, S> {
    fn clone(&self) -> Self {
        Self {
            hasher: self.hasher.clone(),
            slots: self.slots.clone(),
            len: self.len,
            grow_threshold: self.grow_threshold,
            reentrancy: DebugReentrancy::new(),
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for HashIndex<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
