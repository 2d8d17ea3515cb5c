//! StringPool: string interning over `HashIndex`.
//!
//! Each distinct string is stored once as an `Arc<str>`. Interning returns a
//! `Symbol`, a generational handle into a `SlotMap`, so a symbol released
//! from the pool never resolves again, even when its slot is reused.

use crate::hash_index::HashIndex;
use crate::DefaultHashBuilder;
use core::fmt;
use core::hash::BuildHasher;
use slotmap::{DefaultKey, SlotMap};
use std::sync::Arc;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Symbol(DefaultKey);

impl Symbol {
    /// The interned text, if the symbol is still live in `pool`.
    pub fn resolve<'a, S: BuildHasher>(&self, pool: &'a StringPool<S>) -> Option<&'a str> {
        pool.resolve(*self)
    }
}

pub struct StringPool<S = DefaultHashBuilder> {
    index: HashIndex<Arc<str>, Symbol, S>,
    strings: SlotMap<DefaultKey, Arc<str>>,
}

impl StringPool {
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }
}

impl Default for StringPool {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: BuildHasher> StringPool<S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            index: HashIndex::with_hasher(hasher),
            strings: SlotMap::with_key(),
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Symbol for `s`, adding it to the pool on first sight.
    pub fn intern(&mut self, s: &str) -> Symbol {
        let strings = &mut self.strings;
        *self.index.get_or_insert_with(s, || {
            let text: Arc<str> = Arc::from(s);
            let sym = Symbol(strings.insert(Arc::clone(&text)));
            (text, sym)
        })
    }

    /// The pool's canonical shared instance of `s`, adding it on first sight.
    pub fn intern_shared(&mut self, s: &str) -> Arc<str> {
        let sym = self.intern(s);
        Arc::clone(&self.strings[sym.0])
    }

    /// Symbol for `s` without adding it.
    pub fn lookup(&self, s: &str) -> Option<Symbol> {
        self.index.get(s).copied()
    }

    pub fn contains(&self, s: &str) -> bool {
        self.index.contains_key(s)
    }

    pub fn resolve(&self, sym: Symbol) -> Option<&str> {
        self.strings.get(sym.0).map(|s| &**s)
    }

    /// Drop `sym` from the pool. Returns false for stale or foreign symbols.
    pub fn release(&mut self, sym: Symbol) -> bool {
        let Some(text) = self.strings.remove(sym.0) else {
            return false;
        };
        let removed = self.index.remove(&*text);
        debug_assert!(
            matches!(removed, Some((_, s)) if s == sym),
            "pool index and storage disagree"
        );
        true
    }

    /// Interned strings with their symbols, in index slot order.
    pub fn iter(&self) -> impl Iterator<Item = (Symbol, &str)> + '_ {
        self.index.iter().map(|(text, &sym)| (sym, &**text))
    }

    pub fn clear(&mut self) {
        self.index.clear();
        self.strings.clear();
    }
}

impl<S> fmt::Debug for StringPool<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.index.iter().map(|(text, _)| text)).finish()
    }
}
