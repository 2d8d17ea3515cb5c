//! ProbeMap: key → value map over `HashIndex`.
//!
//! The map adds the public lookup vocabulary (`try_get` vs `get`), the
//! non-owning key/value views, and the `EntryHooks` policy that decides what
//! happens to superseded and removed entries. `OwningMap` is the same type
//! with `OwnershipHooks`.

use crate::error::{InsertError, LookupError};
use crate::hash_index::{self, HashIndex};
use crate::hooks::{DropHooks, EntryHooks, Ownership, OwnershipHooks, Release};
use crate::DefaultHashBuilder;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::ops::Index;

pub struct ProbeMap<K, V, S = DefaultHashBuilder, H = DropHooks>
where
    H: EntryHooks<K, V>,
{
    index: HashIndex<K, V, S>,
    hooks: H,
}

/// A map that releases owned keys and/or values when they leave it.
pub type OwningMap<K, V, S = DefaultHashBuilder> = ProbeMap<K, V, S, OwnershipHooks>;

impl<K, V> ProbeMap<K, V> {
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, Default::default())
    }
}

impl<K, V> Default for ProbeMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Release, V: Release> OwningMap<K, V> {
    pub fn owning(ownership: Ownership) -> Self {
        Self::with_hooks(OwnershipHooks::new(ownership))
    }
}

impl<K, V, S, H> ProbeMap<K, V, S, H>
where
    H: EntryHooks<K, V>,
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

    pub fn with_hooks(hooks: H) -> Self
    where
        S: Default,
    {
        Self::with_hasher_and_hooks(S::default(), hooks)
    }

    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self
    where
        H: Default,
    {
        Self {
            index: HashIndex::with_capacity_and_hasher(capacity, hasher),
            hooks: H::default(),
        }
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

    /// Entries in physical slot order; stable only between mutations.
    pub fn iter(&self) -> hash_index::Iter<'_, K, V> {
        self.index.iter()
    }

    pub fn iter_mut(&mut self) -> hash_index::IterMut<'_, K, V> {
        self.index.iter_mut()
    }

    /// Borrowed view over the keys; iterate it as often as needed.
    pub fn keys(&self) -> KeyView<'_, K, V, S> {
        KeyView { index: &self.index }
    }

    /// Borrowed view over the values; iterate it as often as needed.
    pub fn values(&self) -> ValueView<'_, K, V, S> {
        ValueView { index: &self.index }
    }

    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            inner: self.index.iter_mut(),
        }
    }

    /// O(n) scan for a value.
    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.index.iter().any(|(_, v)| v == value)
    }

    /// Remove every entry through `on_remove` and release the backing array.
    pub fn clear(&mut self) {
        let released = self.index.len();
        for (k, v) in self.index.drain() {
            self.hooks.on_remove(k, v);
        }
        tracing::debug!(released, "map cleared");
    }
}

impl<K, V, S, H> ProbeMap<K, V, S, H>
where
    K: Eq + Hash,
    S: BuildHasher,
    H: EntryHooks<K, V>,
{
    /// Insert a new key. Fails without side effects if an equal key exists.
    pub fn insert(&mut self, key: K, value: V) -> Result<(), InsertError> {
        self.index.insert_unique(key, value)
    }

    /// Insert, or overwrite the entry with an equal key; the superseded pair
    /// goes to `on_replace`.
    pub fn insert_or_replace(&mut self, key: K, value: V) {
        if let Some((old_key, old_value)) = self.index.insert_or_replace(key, value) {
            self.hooks.on_replace(old_key, old_value);
        }
    }

    pub fn try_get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.index.get(q)
    }

    /// Like `try_get`, but a missing key is an error.
    pub fn get<Q>(&self, q: &Q) -> Result<&V, LookupError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.index.get(q).ok_or(LookupError::NotFound)
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.index.get_mut(q)
    }

    pub fn get_key_value<Q>(&self, q: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.index.get_key_value(q)
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.index.contains_key(q)
    }

    /// Remove the entry through `on_remove`. Returns whether it was present.
    pub fn remove<Q>(&mut self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        match self.index.remove(q) {
            Some((k, v)) => {
                self.hooks.on_remove(k, v);
                true
            }
            None => false,
        }
    }

    /// Remove the entry and hand it to the caller; hooks are not invoked.
    pub fn take<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.index.remove(q)
    }
}

impl<K, V, S, H> Drop for ProbeMap<K, V, S, H>
where
    H: EntryHooks<K, V>,
{
    fn drop(&mut self) {
        for (k, v) in self.index.drain() {
            self.hooks.on_remove(k, v);
        }
    }
}

impl<K, Q, V, S, H> Index<&Q> for ProbeMap<K, V, S, H>
where
    K: Eq + Hash + Borrow<Q>,
    Q: ?Sized + Hash + Eq,
    S: BuildHasher,
    H: EntryHooks<K, V>,
{
    type Output = V;

    /// Panics when the key is absent.
    fn index(&self, key: &Q) -> &V {
        match self.index.get(key) {
            Some(v) => v,
            None => panic!("{}", LookupError::NotFound),
        }
    }
}

impl<K: Clone, V: Clone, S: Clone> Clone for ProbeMap<K, V, S, DropHooks> {
    fn clone(&self) -> Self {
        Self {
            index: self.index.clone(),
            hooks: DropHooks,
        }
    }
}

impl<K, V, S, H> fmt::Debug for ProbeMap<K, V, S, H>
where
    K: fmt::Debug,
    V: fmt::Debug,
    H: EntryHooks<K, V>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.index.iter()).finish()
    }
}

impl<K, V, S, H> Extend<(K, V)> for ProbeMap<K, V, S, H>
where
    K: Eq + Hash,
    S: BuildHasher,
    H: EntryHooks<K, V>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert_or_replace(k, v);
        }
    }
}

impl<K, V, S, H> FromIterator<(K, V)> for ProbeMap<K, V, S, H>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
    H: EntryHooks<K, V> + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::with_hasher(S::default());
        map.extend(iter);
        map
    }
}

impl<'a, K, V, S, H> IntoIterator for &'a ProbeMap<K, V, S, H>
where
    H: EntryHooks<K, V>,
{
    type Item = (&'a K, &'a V);
    type IntoIter = hash_index::Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Non-owning view of a map's keys.
pub struct KeyView<'a, K, V, S> {
    index: &'a HashIndex<K, V, S>,
}

impl<K, V, S> Clone for KeyView<'_, K, V, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V, S> Copy for KeyView<'_, K, V, S> {}

impl<'a, K, V, S> KeyView<'a, K, V, S> {
    pub fn iter(&self) -> Keys<'a, K, V> {
        Keys {
            inner: self.index.iter(),
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

impl<K: Eq + Hash, V, S: BuildHasher> KeyView<'_, K, V, S> {
    pub fn contains<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.index.contains_key(q)
    }
}

impl<'a, K, V, S> IntoIterator for KeyView<'a, K, V, S> {
    type Item = &'a K;
    type IntoIter = Keys<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, S> IntoIterator for &KeyView<'a, K, V, S> {
    type Item = &'a K;
    type IntoIter = Keys<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Non-owning view of a map's values.
pub struct ValueView<'a, K, V, S> {
    index: &'a HashIndex<K, V, S>,
}

impl<K, V, S> Clone for ValueView<'_, K, V, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V, S> Copy for ValueView<'_, K, V, S> {}

impl<'a, K, V, S> ValueView<'a, K, V, S> {
    pub fn iter(&self) -> Values<'a, K, V> {
        Values {
            inner: self.index.iter(),
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// O(n) scan.
    pub fn contains(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.iter().any(|v| v == value)
    }
}

impl<'a, K, V, S> IntoIterator for ValueView<'a, K, V, S> {
    type Item = &'a V;
    type IntoIter = Values<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, S> IntoIterator for &ValueView<'a, K, V, S> {
    type Item = &'a V;
    type IntoIter = Values<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct Keys<'a, K, V> {
    inner: hash_index::Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    #[inline]
    fn next(&mut self) -> Option<&'a K> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

pub struct Values<'a, K, V> {
    inner: hash_index::Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    #[inline]
    fn next(&mut self) -> Option<&'a V> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}

pub struct ValuesMut<'a, K, V> {
    inner: hash_index::IterMut<'a, K, V>,
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;

    #[inline]
    fn next(&mut self) -> Option<&'a mut V> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for ValuesMut<'_, K, V> {}
