//! shift-collections: an open-addressing hash index with backward-shift
//! deletion, the maps, sets and string pools built on it, and an unbounded
//! lock-free single-producer/single-consumer queue.
//!
//! Internal Design:
//!
//! Summary
//! - Layers:
//!   - HashIndex<K, V, S>: structural engine. Linear probing over a
//!     power-of-two slot array, stored full hashes, growth at 3/4 load,
//!     backward-shift removal. Knows nothing about ownership policies.
//!   - ProbeMap / ProbeSet: public containers over the index. Entries that
//!     leave them (replace, remove, clear, drop) go through an `EntryHooks`
//!     policy; `take` hands them back without running hooks.
//!   - OwningMap / OwningSet: the same containers with `OwnershipHooks`,
//!     which call `Release::release` on the owned side(s).
//!   - StringPool: interning keyed by the index, with generational `Symbol`
//!     handles backed by a slot map.
//!   - SyncMap / SyncSet: one `parking_lot::Mutex` around a plain container.
//! - `spsc`: a circular ring of blocks shared by a `Producer` and a
//!   `Consumer`; see the module docs.
//!
//! Constraints
//! - The index and its containers are single-threaded values (`Send` when
//!   their contents are, never `Sync` through the index itself).
//! - Duplicate keys are refused by `insert`; `insert_or_replace` supersedes.
//! - A replace, or an insert refused as a duplicate, never resizes the table.
//! - The table never shrinks; `clear` releases its storage.
//!
//! Reentrancy policy
//! - HashIndex guards each probing entry point with a debug-only
//!   reentrancy check, since probing runs user `Hash`/`Eq` code while the
//!   structure may be mid-update.
//! - Hooks run after the index is consistent again, so a hook (or a
//!   key/value `Drop`) may touch other containers freely. The exception is
//!   the `SyncMap`/`SyncSet` that owns the hook: its mutex is held while the
//!   hook runs, and calling back into that same wrapper deadlocks.
//!
//! Hasher and rehashing invariants
//! - Each bucket stores its key's `u64` hash. Growth and backward shifting
//!   use the stored hash only; `K: Hash` runs once per lookup or insert.
//!
//! Notes and non-goals
//! - No tombstones and no iteration order guarantee: iteration follows
//!   physical slot order and is stable only between mutations.
//! - The queue has no backpressure and never frees blocks before it is
//!   dropped.

mod error;
mod guard;
#[cfg(feature = "bench_internal")]
pub mod hash_index;
#[cfg(not(feature = "bench_internal"))]
mod hash_index;
mod hash_index_proptest;
pub mod hooks;
mod map;
mod set;
pub mod spsc;
mod string_pool;
mod sync;

/// Default hash builder for every container in this crate.
pub type DefaultHashBuilder = hashbrown::hash_map::DefaultHashBuilder;

// Public surface
pub use error::{InsertError, LookupError};
pub use hash_index::{Iter, IterMut};
pub use hooks::{DropHooks, EntryHooks, Ownership, OwnershipHooks, Release};
pub use map::{KeyView, Keys, OwningMap, ProbeMap, ValueView, Values, ValuesMut};
pub use set::{OwningSet, ProbeSet, SetIter};
pub use spsc::{channel, channel_with_config, Consumer, Producer, QueueConfig};
pub use string_pool::{StringPool, Symbol};
pub use sync::{SyncMap, SyncSet};
