//! Unbounded single-producer/single-consumer queue.
//!
//! # Internal Design
//!
//! - Storage is a circular, singly-linked ring of blocks. Each block is a
//!   power-of-two ring buffer with a consumer-written `front`, a
//!   producer-written `tail` and a producer-written `next` link. A block is
//!   empty when `front == tail` and full when `(tail + 1) & mask == front`.
//! - `front_block` is written only by the consumer, `tail_block` only by the
//!   producer. Following `next` from `tail_block` always reaches
//!   `front_block`; the blocks after `tail_block` and before `front_block`
//!   are empty and get reused before anything new is allocated.
//! - When the producer runs out of room it allocates a block of twice the
//!   largest capacity so far (capped at `max_block_capacity`) and splices it
//!   in after `tail_block`.
//! - Each handle caches the opposite side's index for its current block and
//!   only reloads it when the cache says "full" (producer) or "empty"
//!   (consumer).
//! - No compare-and-swap anywhere: every shared field has a single writer.
//!   Values are written before a `Release` store of the index that
//!   publishes them, and read after an `Acquire` load of it.
//! - Blocks are freed only when both handles are gone.
//!
//! Debug builds pin each handle to the first thread that uses it.

use crate::guard::DebugRole;
use core::cell::UnsafeCell;
use core::fmt;
use core::marker::PhantomData;
use core::mem::MaybeUninit;
use core::ptr;
use crossbeam_utils::CachePadded;
use std::sync::atomic::{AtomicPtr, AtomicUsize, Ordering};
use std::sync::Arc;

pub const DEFAULT_BLOCK_CAPACITY: usize = 16;
pub const DEFAULT_MAX_BLOCK_CAPACITY: usize = 512;
const MIN_BLOCK_CAPACITY: usize = 2;

/// Block sizing for a new queue. Both capacities are rounded up to a power of
/// two (at least 2); a maximum below the initial capacity is raised to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueConfig {
    pub initial_block_capacity: usize,
    pub max_block_capacity: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            initial_block_capacity: DEFAULT_BLOCK_CAPACITY,
            max_block_capacity: DEFAULT_MAX_BLOCK_CAPACITY,
        }
    }
}

impl QueueConfig {
    fn normalized(self) -> (usize, usize) {
        let initial = block_capacity_for(self.initial_block_capacity);
        let max = block_capacity_for(self.max_block_capacity).max(initial);
        (initial, max)
    }
}

fn block_capacity_for(requested: usize) -> usize {
    requested
        .max(MIN_BLOCK_CAPACITY)
        .checked_next_power_of_two()
        .unwrap_or(1 << (usize::BITS - 1))
}

/// A queue whose first block has `initial_block_capacity` slots.
pub fn channel<T>(initial_block_capacity: usize) -> (Producer<T>, Consumer<T>) {
    channel_with_config(QueueConfig {
        initial_block_capacity,
        ..QueueConfig::default()
    })
}

pub fn channel_with_config<T>(config: QueueConfig) -> (Producer<T>, Consumer<T>) {
    let (initial, max) = config.normalized();
    let first = Box::into_raw(Block::<T>::new(initial));
    // SAFETY: `first` was just allocated and is not shared yet.
    unsafe { (*first).next.store(first, Ordering::Relaxed) };

    let inner = Arc::new(Inner {
        front_block: CachePadded::new(AtomicPtr::new(first)),
        tail_block: CachePadded::new(AtomicPtr::new(first)),
        max_block_capacity: max,
        _owns: PhantomData,
    });
    let producer = Producer {
        inner: Arc::clone(&inner),
        cached_front: 0,
        largest_block_capacity: initial,
        role: DebugRole::new("spsc producer"),
    };
    let consumer = Consumer {
        inner,
        cached_tail: 0,
        role: DebugRole::new("spsc consumer"),
    };
    (producer, consumer)
}

struct Block<T> {
    front: CachePadded<AtomicUsize>,
    tail: CachePadded<AtomicUsize>,
    next: AtomicPtr<Block<T>>,
    mask: usize,
    slots: Box<[UnsafeCell<MaybeUninit<T>>]>,
}

impl<T> Block<T> {
    fn new(capacity: usize) -> Box<Self> {
        debug_assert!(capacity.is_power_of_two() && capacity >= MIN_BLOCK_CAPACITY);
        Box::new(Self {
            front: CachePadded::new(AtomicUsize::new(0)),
            tail: CachePadded::new(AtomicUsize::new(0)),
            next: AtomicPtr::new(ptr::null_mut()),
            mask: capacity - 1,
            slots: (0..capacity)
                .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
                .collect(),
        })
    }

    #[cfg(test)]
    fn capacity(&self) -> usize {
        self.mask + 1
    }

    fn approximate_len(&self) -> usize {
        let tail = self.tail.load(Ordering::Acquire);
        let front = self.front.load(Ordering::Acquire);
        tail.wrapping_sub(front) & self.mask
    }

    /// Store `value` at `tail` and publish it.
    ///
    /// # Safety
    /// Producer only; `tail` is this block's current tail and the block is
    /// not full.
    unsafe fn push(&self, tail: usize, value: T) {
        (*self.slots[tail].get()).write(value);
        self.tail.store((tail + 1) & self.mask, Ordering::Release);
    }

    /// Move the value out of `front` and release the slot.
    ///
    /// # Safety
    /// Consumer only; `front` is this block's current front and an acquired
    /// `tail` showed it occupied.
    unsafe fn pop(&self, front: usize) -> T {
        let value = (*self.slots[front].get()).assume_init_read();
        self.front.store((front + 1) & self.mask, Ordering::Release);
        value
    }
}

impl<T> Drop for Block<T> {
    fn drop(&mut self) {
        let tail = *self.tail.get_mut();
        let mut i = *self.front.get_mut();
        while i != tail {
            // SAFETY: slots in [front, tail) hold initialized values.
            unsafe { self.slots[i].get_mut().assume_init_drop() };
            i = (i + 1) & self.mask;
        }
    }
}

struct Inner<T> {
    front_block: CachePadded<AtomicPtr<Block<T>>>,
    tail_block: CachePadded<AtomicPtr<Block<T>>>,
    max_block_capacity: usize,
    _owns: PhantomData<T>,
}

// SAFETY: each slot is touched by one side at a time, handed over through the
// Release/Acquire pairs on `tail` and `front`; values cross threads, so T: Send.
unsafe impl<T: Send> Send for Inner<T> {}
unsafe impl<T: Send> Sync for Inner<T> {}

impl<T> Inner<T> {
    fn approximate_count(&self) -> usize {
        let start = self.front_block.load(Ordering::Acquire);
        let mut cur = start;
        let mut count = 0;
        loop {
            // SAFETY: blocks stay allocated until `Inner` drops.
            let block = unsafe { &*cur };
            count += block.approximate_len();
            cur = block.next.load(Ordering::Acquire);
            if cur == start {
                return count;
            }
        }
    }

    #[cfg(test)]
    fn block_capacities(&self) -> Vec<usize> {
        let start = self.front_block.load(Ordering::Acquire);
        let mut cur = start;
        let mut caps = Vec::new();
        loop {
            // SAFETY: as in `approximate_count`.
            let block = unsafe { &*cur };
            caps.push(block.capacity());
            cur = block.next.load(Ordering::Acquire);
            if cur == start {
                return caps;
            }
        }
    }
}

impl<T> Drop for Inner<T> {
    fn drop(&mut self) {
        let start = *self.front_block.get_mut();
        let mut cur = start;
        loop {
            // SAFETY: every block came from `Box::into_raw` and appears once in
            // the ring; we hold the last reference to the queue.
            let mut block = unsafe { Box::from_raw(cur) };
            cur = *block.next.get_mut();
            drop(block);
            if cur == start {
                break;
            }
        }
    }
}

/// The enqueueing half. Exactly one thread may use it.
pub struct Producer<T> {
    inner: Arc<Inner<T>>,
    // `front` of the current tail block as last observed.
    cached_front: usize,
    largest_block_capacity: usize,
    role: DebugRole,
}

impl<T> Producer<T> {
    /// Append `value`. Never blocks; allocates when every block is full.
    pub fn enqueue(&mut self, value: T) {
        self.role.check();
        let inner = &*self.inner;
        let block_ptr = inner.tail_block.load(Ordering::Relaxed);
        // SAFETY: blocks stay allocated until `Inner` drops.
        let block = unsafe { &*block_ptr };

        let tail = block.tail.load(Ordering::Relaxed);
        let next_tail = (tail + 1) & block.mask;
        if next_tail == self.cached_front {
            self.cached_front = block.front.load(Ordering::Acquire);
        }
        if next_tail != self.cached_front {
            // SAFETY: we are the producer and the block has room.
            unsafe { block.push(tail, value) };
            return;
        }

        let next_ptr = block.next.load(Ordering::Relaxed);
        if next_ptr != inner.front_block.load(Ordering::Acquire) {
            // The consumer has left `next` and will not return before we do,
            // so it is empty.
            // SAFETY: as above.
            let next = unsafe { &*next_ptr };
            let front = next.front.load(Ordering::Acquire);
            let tail = next.tail.load(Ordering::Relaxed);
            debug_assert_eq!(front, tail, "reused block still holds values");
            // SAFETY: the block is empty and has at least two slots.
            unsafe { next.push(tail, value) };
            self.cached_front = front;
            inner.tail_block.store(next_ptr, Ordering::Release);
            return;
        }

        let capacity = self
            .largest_block_capacity
            .saturating_mul(2)
            .min(inner.max_block_capacity);
        self.largest_block_capacity = capacity;
        let fresh = Block::new(capacity);
        // SAFETY: the block is private to us until it is linked below.
        unsafe { fresh.push(0, value) };
        fresh.next.store(next_ptr, Ordering::Relaxed);
        let fresh_ptr = Box::into_raw(fresh);
        block.next.store(fresh_ptr, Ordering::Release);
        self.cached_front = 0;
        inner.tail_block.store(fresh_ptr, Ordering::Release);
        tracing::trace!(
            capacity,
            max = inner.max_block_capacity,
            "spsc block allocated"
        );
    }

    /// Best-effort count of queued values.
    pub fn approximate_count(&self) -> usize {
        self.inner.approximate_count()
    }

    /// Capacity of the most recently allocated block.
    pub fn largest_block_capacity(&self) -> usize {
        self.largest_block_capacity
    }
}

impl<T> fmt::Debug for Producer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Producer")
            .field("approximate_count", &self.approximate_count())
            .field("largest_block_capacity", &self.largest_block_capacity)
            .finish()
    }
}

/// The dequeueing half. Exactly one thread may use it.
pub struct Consumer<T> {
    inner: Arc<Inner<T>>,
    // `tail` of the current front block as last observed.
    cached_tail: usize,
    role: DebugRole,
}

impl<T> Consumer<T> {
    /// Oldest value, or `None` when the queue is empty. Never blocks.
    pub fn dequeue(&mut self) -> Option<T> {
        self.role.check();
        let inner = &*self.inner;
        let block_ptr = inner.front_block.load(Ordering::Relaxed);
        // SAFETY: blocks stay allocated until `Inner` drops.
        let block = unsafe { &*block_ptr };

        let front = block.front.load(Ordering::Relaxed);
        if front == self.cached_tail {
            self.cached_tail = block.tail.load(Ordering::Acquire);
        }
        if front != self.cached_tail {
            // SAFETY: we are the consumer and `tail` showed the slot filled.
            return Some(unsafe { block.pop(front) });
        }

        if block_ptr == inner.tail_block.load(Ordering::Acquire) {
            return None;
        }

        // The producer has moved past this block; its last values are visible
        // after the acquire above.
        self.cached_tail = block.tail.load(Ordering::Acquire);
        if front != self.cached_tail {
            // SAFETY: as above.
            return Some(unsafe { block.pop(front) });
        }

        let next_ptr = block.next.load(Ordering::Acquire);
        // SAFETY: as above.
        let next = unsafe { &*next_ptr };
        let next_front = next.front.load(Ordering::Relaxed);
        self.cached_tail = next.tail.load(Ordering::Acquire);
        debug_assert_ne!(next_front, self.cached_tail, "advanced into an empty block");
        inner.front_block.store(next_ptr, Ordering::Release);
        // SAFETY: the producer filled `next` before publishing a later block.
        Some(unsafe { next.pop(next_front) })
    }

    /// Iterator that dequeues until the queue looks empty.
    pub fn try_iter(&mut self) -> TryIter<'_, T> {
        TryIter { consumer: self }
    }

    pub fn approximate_count(&self) -> usize {
        self.inner.approximate_count()
    }
}

impl<T> fmt::Debug for Consumer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consumer")
            .field("approximate_count", &self.approximate_count())
            .finish()
    }
}

pub struct TryIter<'a, T> {
    consumer: &'a mut Consumer<T>,
}

impl<T> Iterator for TryIter<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.consumer.dequeue()
    }
}
