//! Debug-only usage guards.
//!
//! - `DebugReentrancy` detects nested entry into a hash index while it runs
//!   user `Hash`/`Eq` code during probing.
//! - `DebugRole` pins a queue role (producer or consumer) to the first thread
//!   that exercises it and flags calls from any other thread.
//!
//! Both panic in debug builds and compile to zero-sized no-ops in release
//! builds.

use core::cell::Cell;
use core::marker::PhantomData;
#[cfg(debug_assertions)]
use std::thread::{self, ThreadId};

/// Per-instance reentrancy tracker. Guard entry points with
/// `let _g = self.reentrancy.enter();`.
///
/// `Send` so that a container can move into a mutex, never `Sync`.
#[derive(Debug)]
pub(crate) struct DebugReentrancy {
    #[cfg(debug_assertions)]
    depth: Cell<u32>,
    _nosync: PhantomData<Cell<()>>,
}

impl DebugReentrancy {
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            depth: Cell::new(0),
            _nosync: PhantomData,
        }
    }

    /// Enter a guarded section. In debug builds, panics if already entered.
    #[inline]
    pub(crate) fn enter(&self) -> ReentrancyGuard<'_> {
        #[cfg(debug_assertions)]
        {
            let d = self.depth.get();
            assert!(d == 0, "reentrancy detected: nested entry into hash index");
            self.depth.set(d + 1);
            ReentrancyGuard { owner: self }
        }

        #[cfg(not(debug_assertions))]
        {
            ReentrancyGuard { _z: PhantomData }
        }
    }
}

impl Default for DebugReentrancy {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII guard returned by `DebugReentrancy::enter`.
pub(crate) struct ReentrancyGuard<'a> {
    #[cfg(debug_assertions)]
    owner: &'a DebugReentrancy,
    #[cfg(not(debug_assertions))]
    _z: PhantomData<&'a ()>,
}

impl Drop for ReentrancyGuard<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        {
            let d = self.owner.depth.get();
            debug_assert!(d > 0);
            self.owner.depth.set(d - 1);
        }
    }
}

/// Thread-affinity tracker for one side of a single-producer/single-consumer
/// structure. The first `check` records the calling thread; later checks from
/// a different thread panic.
#[derive(Debug)]
pub(crate) struct DebugRole {
    #[cfg(debug_assertions)]
    role: &'static str,
    #[cfg(debug_assertions)]
    owner: Option<ThreadId>,
}

impl DebugRole {
    pub(crate) const fn new(role: &'static str) -> Self {
        #[cfg(not(debug_assertions))]
        let _ = role;
        Self {
            #[cfg(debug_assertions)]
            role,
            #[cfg(debug_assertions)]
            owner: None,
        }
    }

    #[inline]
    pub(crate) fn check(&mut self) {
        #[cfg(debug_assertions)]
        {
            let me = thread::current().id();
            match self.owner {
                None => self.owner = Some(me),
                Some(owner) => assert!(
                    owner == me,
                    "{} used from a second thread: {:?} (pinned to {:?})",
                    self.role,
                    me,
                    owner
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DebugReentrancy, DebugRole};

    #[test]
    fn enter_and_exit_is_ok() {
        let r = DebugReentrancy::new();
        {
            let _g = r.enter();
        }
        let _again = r.enter();
    }

    #[cfg(debug_assertions)]
    #[test]
    fn reentrancy_panics_in_debug() {
        let r = DebugReentrancy::new();
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _g1 = r.enter();
            let _g2 = r.enter();
        }));
        assert!(res.is_err(), "expected reentrancy to panic in debug builds");
    }

    #[test]
    fn role_accepts_repeated_calls_from_one_thread() {
        let mut role = DebugRole::new("producer");
        for _ in 0..3 {
            role.check();
        }
    }

    #[cfg(debug_assertions)]
    #[test]
    fn role_rejects_second_thread() {
        let mut role = DebugRole::new("consumer");
        role.check();
        let res = std::thread::spawn(move || {
            std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| role.check())).is_err()
        })
        .join()
        .unwrap();
        assert!(res, "a second thread must be flagged in debug builds");
    }

    #[cfg(not(debug_assertions))]
    #[test]
    fn role_is_noop_in_release() {
        let mut role = DebugRole::new("consumer");
        role.check();
        std::thread::spawn(move || role.check()).join().unwrap();
    }
}
