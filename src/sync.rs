//! Lock-based wrappers: one `parking_lot::Mutex` around a plain container.
//!
//! Every public call takes the same lock for its whole duration. There is
//! no reader/writer split and no per-entry locking; values leave the lock
//! by clone, or callers borrow the container inside `with`/`with_mut`.
//!
//! Entry hooks, key/value `Drop` impls and `with`/`with_mut` closures all run
//! with the lock held. They may use other wrappers, but calling back into the
//! same wrapper deadlocks (`parking_lot::Mutex` is not reentrant).

use crate::error::{InsertError, LookupError};
use crate::hooks::{DropHooks, EntryHooks};
use crate::map::ProbeMap;
use crate::set::ProbeSet;
use crate::DefaultHashBuilder;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use parking_lot::Mutex;

pub struct SyncMap<K, V, S = DefaultHashBuilder, H = DropHooks>
where
    H: EntryHooks<K, V>,
{
    inner: Mutex<ProbeMap<K, V, S, H>>,
}

impl<K, V> SyncMap<K, V> {
    pub fn new() -> Self {
        Self::from_map(ProbeMap::new())
    }
}

impl<K, V> Default for SyncMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S, H> SyncMap<K, V, S, H>
where
    H: EntryHooks<K, V>,
{
    pub fn from_map(map: ProbeMap<K, V, S, H>) -> Self {
        Self {
            inner: Mutex::new(map),
        }
    }

    pub fn into_inner(self) -> ProbeMap<K, V, S, H> {
        self.inner.into_inner()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.inner.lock().contains_value(value)
    }

    /// Run `f` with shared access under the lock.
    pub fn with<R>(&self, f: impl FnOnce(&ProbeMap<K, V, S, H>) -> R) -> R {
        f(&self.inner.lock())
    }

    /// Run `f` with exclusive access under the lock.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut ProbeMap<K, V, S, H>) -> R) -> R {
        f(&mut self.inner.lock())
    }
}

impl<K, V, S, H> SyncMap<K, V, S, H>
where
    K: Eq + Hash,
    S: BuildHasher,
    H: EntryHooks<K, V>,
{
    pub fn insert(&self, key: K, value: V) -> Result<(), InsertError> {
        self.inner.lock().insert(key, value)
    }

    pub fn insert_or_replace(&self, key: K, value: V) {
        self.inner.lock().insert_or_replace(key, value);
    }

    pub fn try_get<Q>(&self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        V: Clone,
    {
        self.inner.lock().try_get(q).cloned()
    }

    pub fn get<Q>(&self, q: &Q) -> Result<V, LookupError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        V: Clone,
    {
        self.inner.lock().get(q).cloned()
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.inner.lock().contains_key(q)
    }

    pub fn remove<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.inner.lock().remove(q)
    }

    pub fn take<Q>(&self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.inner.lock().take(q)
    }
}

impl<K, V, S, H> fmt::Debug for SyncMap<K, V, S, H>
where
    K: fmt::Debug,
    V: fmt::Debug,
    H: EntryHooks<K, V>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncMap").field("map", &*self.inner.lock()).finish()
    }
}

pub struct SyncSet<T, S = DefaultHashBuilder, H = DropHooks>
where
    H: EntryHooks<T, ()>,
{
    inner: Mutex<ProbeSet<T, S, H>>,
}

impl<T> SyncSet<T> {
    pub fn new() -> Self {
        Self::from_set(ProbeSet::new())
    }
}

impl<T> Default for SyncSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, S, H> SyncSet<T, S, H>
where
    H: EntryHooks<T, ()>,
{
    pub fn from_set(set: ProbeSet<T, S, H>) -> Self {
        Self {
            inner: Mutex::new(set),
        }
    }

    pub fn into_inner(self) -> ProbeSet<T, S, H> {
        self.inner.into_inner()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    pub fn with<R>(&self, f: impl FnOnce(&ProbeSet<T, S, H>) -> R) -> R {
        f(&self.inner.lock())
    }

    pub fn with_mut<R>(&self, f: impl FnOnce(&mut ProbeSet<T, S, H>) -> R) -> R {
        f(&mut self.inner.lock())
    }
}

impl<T, S, H> SyncSet<T, S, H>
where
    T: Eq + Hash,
    S: BuildHasher,
    H: EntryHooks<T, ()>,
{
    pub fn insert(&self, item: T) -> Result<(), InsertError> {
        self.inner.lock().insert(item)
    }

    pub fn replace(&self, item: T) {
        self.inner.lock().replace(item);
    }

    pub fn contains<Q>(&self, q: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.inner.lock().contains(q)
    }

    pub fn remove<Q>(&self, q: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.inner.lock().remove(q)
    }

    pub fn take<Q>(&self, q: &Q) -> Option<T>
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.inner.lock().take(q)
    }
}

impl<T, S, H> fmt::Debug for SyncSet<T, S, H>
where
    T: fmt::Debug,
    H: EntryHooks<T, ()>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncSet").field("set", &*self.inner.lock()).finish()
    }
}
