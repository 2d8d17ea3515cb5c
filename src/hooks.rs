//! Entry hooks: per-instance policy for entries leaving a map or set.
//!
//! `ProbeMap` and `ProbeSet` are generic over an `EntryHooks` implementation
//! that sees every superseded or removed entry. `DropHooks` simply drops them.
//! `OwnershipHooks` finalizes the owned side(s) through `Release`, which is
//! how the owning variants (`OwningMap`, `OwningSet`) are built.
//!
//! Hooks run only after the underlying index is consistent again, so a hook
//! may freely call back into other containers.

/// Receives entries that leave a container.
///
/// The defaults drop the entry.
pub trait EntryHooks<K, V> {
    /// An `insert_or_replace` overwrote this key/value pair.
    fn on_replace(&mut self, key: K, value: V) {
        drop((key, value));
    }

    /// The pair was removed by `remove`, `clear`, or the container being dropped.
    fn on_remove(&mut self, key: K, value: V) {
        drop((key, value));
    }
}

/// Default hooks: superseded and removed entries are dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DropHooks;

impl<K, V> EntryHooks<K, V> for DropHooks {}

/// Explicit finalization for elements held by an owning container.
///
/// Dropping still happens afterwards as usual; `release` is the hook for
/// resources that need a deliberate shutdown (returning a handle to a pool,
/// decrementing an external count, closing a descriptor).
pub trait Release {
    fn release(self);
}

impl Release for () {
    fn release(self) {}
}

/// Which side of an entry an owning container is responsible for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Ownership {
    #[default]
    Neither,
    Keys,
    Values,
    Both,
}

impl Ownership {
    pub fn owns_keys(self) -> bool {
        matches!(self, Ownership::Keys | Ownership::Both)
    }

    pub fn owns_values(self) -> bool {
        matches!(self, Ownership::Values | Ownership::Both)
    }
}

/// Hooks that call `Release::release` on owned keys and/or values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OwnershipHooks {
    ownership: Ownership,
}

impl OwnershipHooks {
    pub const fn new(ownership: Ownership) -> Self {
        Self { ownership }
    }

    pub fn ownership(&self) -> Ownership {
        self.ownership
    }

    fn dispose<K: Release, V: Release>(&self, key: K, value: V) {
        if self.ownership.owns_keys() {
            key.release();
        }
        if self.ownership.owns_values() {
            value.release();
        }
    }
}

impl<K: Release, V: Release> EntryHooks<K, V> for OwnershipHooks {
    fn on_replace(&mut self, key: K, value: V) {
        self.dispose(key, value);
    }

    fn on_remove(&mut self, key: K, value: V) {
        self.dispose(key, value);
    }
}
