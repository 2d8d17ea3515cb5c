//! ProbeSet: key-only container over `HashIndex<T, ()>`.

use crate::error::InsertError;
use crate::hash_index::{self, HashIndex};
use crate::hooks::{DropHooks, EntryHooks, Ownership, OwnershipHooks, Release};
use crate::DefaultHashBuilder;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};

pub struct ProbeSet<T, S = DefaultHashBuilder, H = DropHooks>
where
    H: EntryHooks<T, ()>,
{
    index: HashIndex<T, (), S>,
    hooks: H,
}

/// A set that releases its elements when they leave it (unless the policy is
/// `Ownership::Neither` or `Ownership::Values`).
pub type OwningSet<T, S = DefaultHashBuilder> = ProbeSet<T, S, OwnershipHooks>;

impl<T> ProbeSet<T> {
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            index: HashIndex::with_capacity_and_hasher(capacity, Default::default()),
            hooks: DropHooks,
        }
    }
}

impl<T> Default for ProbeSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Release> OwningSet<T> {
    pub fn owning(ownership: Ownership) -> Self {
        Self::with_hasher_and_hooks(Default::default(), OwnershipHooks::new(ownership))
    }
}

impl<T, S, H> ProbeSet<T, S, H>
where
    H: EntryHooks<T, ()>,
{
    pub fn with_hasher_and_hooks(hasher: S, hooks: H) -> Self {
        Self {
            index: HashIndex::with_hasher(hasher),
            hooks,
        }
    }

    pub fn with_hasher(hasher: S) -> Self
    where
        H: Default,
    {
        Self::with_hasher_and_hooks(hasher, H::default())
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.index.capacity()
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    /// Elements in physical slot order; stable only between mutations.
    pub fn iter(&self) -> SetIter<'_, T> {
        SetIter {
            inner: self.index.iter(),
        }
    }

    pub fn clear(&mut self) {
        let released = self.index.len();
        for (item, ()) in self.index.drain() {
            self.hooks.on_remove(item, ());
        }
        tracing::debug!(released, "set cleared");
    }
}

impl<T, S, H> ProbeSet<T, S, H>
where
    T: Eq + Hash,
    S: BuildHasher,
    H: EntryHooks<T, ()>,
{
    /// Add an element that must not already be present.
    pub fn insert(&mut self, item: T) -> Result<(), InsertError> {
        self.index.insert_unique(item, ())
    }

    /// Add an element, superseding an equal one; the old element goes to
    /// `on_replace`.
    pub fn replace(&mut self, item: T) {
        if let Some((old, ())) = self.index.insert_or_replace(item, ()) {
            self.hooks.on_replace(old, ());
        }
    }

    pub fn contains<Q>(&self, q: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.index.contains_key(q)
    }

    /// The stored element equal to `q`.
    pub fn get<Q>(&self, q: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.index.get_key_value(q).map(|(k, _)| k)
    }

    /// Remove through `on_remove`. Returns whether the element was present.
    pub fn remove<Q>(&mut self, q: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        match self.index.remove(q) {
            Some((item, ())) => {
                self.hooks.on_remove(item, ());
                true
            }
            None => false,
        }
    }

    /// Remove and hand the element to the caller; hooks are not invoked.
    pub fn take<Q>(&mut self, q: &Q) -> Option<T>
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.index.remove(q).map(|(item, ())| item)
    }
}

impl<T, S, H> Drop for ProbeSet<T, S, H>
where
    H: EntryHooks<T, ()>,
{
    fn drop(&mut self) {
        for (item, ()) in self.index.drain() {
            self.hooks.on_remove(item, ());
        }
    }
}

impl<T: Clone, S: Clone> Clone for ProbeSet<T, S, DropHooks> {
    fn clone(&self) -> Self {
        Self {
            index: self.index.clone(),
            hooks: DropHooks,
        }
    }
}

impl<T: fmt::Debug, S, H: EntryHooks<T, ()>> fmt::Debug for ProbeSet<T, S, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T, S, H> Extend<T> for ProbeSet<T, S, H>
where
    T: Eq + Hash,
    S: BuildHasher,
    H: EntryHooks<T, ()>,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.replace(item);
        }
    }
}

impl<T, S, H> FromIterator<T> for ProbeSet<T, S, H>
where
    T: Eq + Hash,
    S: BuildHasher + Default,
    H: EntryHooks<T, ()> + Default,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::with_hasher(S::default());
        set.extend(iter);
        set
    }
}

impl<'a, T, S, H> IntoIterator for &'a ProbeSet<T, S, H>
where
    H: EntryHooks<T, ()>,
{
    type Item = &'a T;
    type IntoIter = SetIter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct SetIter<'a, T> {
    inner: hash_index::Iter<'a, T, ()>,
}

impl<'a, T> Iterator for SetIter<'a, T> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<&'a T> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> ExactSizeIterator for SetIter<'_, T> {}

impl<T> Clone for SetIter<'_, T> {
    fn clone(&self) -> Self {
        SetIter {
            inner: self.inner.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::tests::Tracked;
    use std::cell::RefCell;
    use std::collections::BTreeSet;
    use std::rc::Rc;

    #[test]
    fn insert_contains_remove() {
        let mut s: ProbeSet<String> = ProbeSet::new();
        s.insert("a".to_string()).unwrap();
        s.insert("b".to_string()).unwrap();
        assert_eq!(s.insert("a".to_string()), Err(InsertError::DuplicateKey));
        assert_eq!(s.len(), 2);
        assert!(s.contains("a"));
        assert!(s.remove("a"));
        assert!(!s.remove("a"));
        assert!(!s.contains("a"));
        assert_eq!(s.get("b").map(String::as_str), Some("b"));
    }

    #[test]
    fn collect_deduplicates() {
        let s: ProbeSet<u32> = [1, 2, 2, 3, 3, 3].into_iter().collect();
        assert_eq!(s.len(), 3);
        let items: BTreeSet<u32> = s.iter().copied().collect();
        assert_eq!(items, BTreeSet::from([1, 2, 3]));
        assert_eq!(format!("{:?}", ProbeSet::<u32>::new()), "{}");
    }

    #[test]
    fn replace_keeps_the_newest_equal_element() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut s: OwningSet<Tracked> = OwningSet::owning(Ownership::Keys);
        let first = Tracked::new(1, &log);
        s.insert(first).unwrap();
        let newer_log = Rc::new(RefCell::new(Vec::new()));
        s.replace(Tracked::new(1, &newer_log));
        assert_eq!(*RefCell::borrow(&log), vec![1], "superseded element released");
        assert!(RefCell::borrow(&newer_log).is_empty());
        assert!(Rc::ptr_eq(&s.get(&1u32).unwrap().log, &newer_log));
    }

    #[test]
    fn owning_set_releases_on_remove_and_drop_but_not_take() {
        let log = Rc::new(RefCell::new(Vec::new()));
        {
            let mut s: OwningSet<Tracked> = OwningSet::owning(Ownership::Both);
            for id in 0..4 {
                s.insert(Tracked::new(id, &log)).unwrap();
            }
            assert!(s.remove(&0u32));
            assert_eq!(*RefCell::borrow(&log), vec![0]);
            let taken = s.take(&1u32).unwrap();
            assert_eq!(taken.id, 1);
            assert_eq!(*RefCell::borrow(&log), vec![0]);
        }
        let mut released = RefCell::borrow(&log).clone();
        released.sort_unstable();
        assert_eq!(released, vec![0, 2, 3]);
    }

    #[test]
    fn value_only_policy_leaves_set_elements_alone() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut s: OwningSet<Tracked> = OwningSet::owning(Ownership::Values);
        s.insert(Tracked::new(5, &log)).unwrap();
        s.clear();
        assert!(s.is_empty());
        assert!(RefCell::borrow(&log).is_empty());
    }
}
