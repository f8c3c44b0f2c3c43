//! The global string interner backing [`Symbol`](super::Symbol).
//!
//! Layout: a lock-free `DashMap` maps string contents to their index, and a
//! `RwLock<Vec>` maps indices back to contents. Interned strings are leaked
//! to obtain `'static` references; the table is append-only and lives for
//! the process, so the leak is bounded by the number of distinct
//! identifiers ever seen.
//!
//! Reads (the common case: the string is already interned, or a symbol is
//! being resolved back to text) never contend with each other. Writes take
//! the reverse-table lock briefly and re-check the forward map so that two
//! threads racing to intern the same new string agree on one index.

use ahash::RandomState;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{LazyLock, RwLock};

/// Process-wide interner instance.
pub(super) static INTERNER: LazyLock<Interner> = LazyLock::new(Interner::new);

pub(super) struct Interner {
    /// Contents -> index. AHash keeps hashing cheap for short identifiers.
    map: DashMap<&'static str, u32, RandomState>,
    /// Index -> contents.
    strings: RwLock<Vec<&'static str>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl Interner {
    fn new() -> Self {
        Self {
            map: DashMap::with_capacity_and_hasher(256, RandomState::new()),
            strings: RwLock::new(Vec::with_capacity(256)),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    /// Intern `text`, returning its index.
    pub(super) fn intern(&self, text: &str) -> u32 {
        if let Some(index) = self.map.get(text) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return *index;
        }

        self.misses.fetch_add(1, Ordering::Relaxed);

        let mut strings = self.strings.write().unwrap_or_else(|e| e.into_inner());
        // Another thread may have interned the same text between the lookup
        // above and taking the lock.
        if let Some(index) = self.map.get(text) {
            return *index;
        }

        let owned: &'static str = Box::leak(text.to_owned().into_boxed_str());
        let index = u32::try_from(strings.len()).expect("interner exhausted u32 index space");
        strings.push(owned);
        self.map.insert(owned, index);
        index
    }

    /// Resolve an index back to its text.
    ///
    /// # Panics
    ///
    /// Panics when `index` was not produced by this interner; that indicates
    /// a forged symbol and is a bug in the caller.
    pub(super) fn resolve(&self, index: u32) -> &'static str {
        let strings = self.strings.read().unwrap_or_else(|e| e.into_inner());
        strings[index as usize]
    }

    pub(super) fn stats(&self) -> InternerStats {
        let count = self.strings.read().unwrap_or_else(|e| e.into_inner()).len();
        InternerStats {
            count,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

/// Counters describing interner behavior, for profiling.
#[derive(Clone, Copy, Debug)]
pub struct InternerStats {
    /// Distinct strings interned so far.
    pub count: usize,
    /// Lookups that found an existing entry.
    pub hits: usize,
    /// Lookups that allocated a new entry.
    pub misses: usize,
}

impl InternerStats {
    /// Fraction of lookups served without allocation.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::Symbol;
    use std::thread;

    #[test]
    fn test_concurrent_interning_agrees() {
        let handles: Vec<_> = (0..8)
            .map(|_| thread::spawn(|| Symbol::intern("contended_name")))
            .collect();
        let symbols: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for s in &symbols[1..] {
            assert_eq!(symbols[0], *s);
        }
    }

    #[test]
    fn test_concurrent_distinct_strings() {
        let handles: Vec<_> = (0..16)
            .map(|i| thread::spawn(move || Symbol::intern(&format!("distinct_{i}"))))
            .collect();
        let mut symbols: Vec<_> = handles
            .into_iter()
            .map(|h| h.join().unwrap().as_u32())
            .collect();
        symbols.sort_unstable();
        symbols.dedup();
        assert_eq!(symbols.len(), 16);
    }

    #[test]
    fn test_stats_advance() {
        let before = Symbol::stats();
        let _ = Symbol::intern("stats_probe_entry");
        let _ = Symbol::intern("stats_probe_entry");
        let after = Symbol::stats();
        assert!(after.count >= before.count);
        assert!(after.hits + after.misses > before.hits + before.misses);
        assert!(after.hit_rate() >= 0.0 && after.hit_rate() <= 1.0);
    }

    #[test]
    fn test_long_and_empty_strings() {
        let long = "long_".repeat(500);
        assert_eq!(Symbol::intern(&long).as_str(), long);
        assert_eq!(Symbol::intern("").as_str(), "");
    }
}
