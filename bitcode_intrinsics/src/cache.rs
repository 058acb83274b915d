//! Per-call-site specialization cache.
//!
//! A call site observes concrete operand shapes at run time. For each new
//! shape the cache resolves a specialized value (an executor, a compiled
//! foreign unit, ...) once and installs it behind a guard; later invocations
//! whose shape satisfies a guard reuse that value directly.
//!
//! The cache holds at most `limit` entries. A miss with every slot taken
//! demotes the site to the generic path for the rest of its lifetime.
//!
//! ## Concurrency
//!
//! Entries live in a fixed array of `OnceCell` slots that are filled front
//! to back. Guard checks only read initialized cells, so the hit path takes
//! no lock. Installation is first-writer-wins: a thread that loses a slot
//! race re-checks the winner's guard and otherwise moves to the next slot.
//! Two threads may resolve the same shape concurrently; the loser's value
//! is used once and dropped, the entry count never exceeds `limit`.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use once_cell::sync::OnceCell;

/// Predicate over an observed invocation shape
///
/// Guard evaluation must be side-effect free and must not allocate.
pub trait Guard<Q: ?Sized> {
    fn admits(&self, observed: &Q) -> bool;
}

/// Lifecycle of a call site
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// No invocation has installed anything yet
    Uninitialized,
    /// Holding this many specializations (always `<= limit`)
    Specializing(usize),
    /// Demoted; every invocation runs the generic path. Terminal.
    Generic,
}

/// Instrumentation counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Invocations served by an installed entry
    pub hits: u64,
    /// Entries installed
    pub installs: u64,
    /// Invocations routed to the generic path (including uncached one-offs)
    pub generic_runs: u64,
}

/// Outcome of [`SpecializationCache::get_or_install`]
#[derive(Debug)]
pub enum Lookup<'a, V> {
    /// An existing entry's guard admitted the shape
    Hit(&'a V),
    /// A fresh entry was installed for the shape
    Installed(&'a V),
    /// A value was resolved but lost every slot race; use it once
    Uncached(V),
    /// The site is generic; the caller runs its generic path
    Generic,
}

struct CacheEntry<K, V> {
    guard: K,
    value: V,
}

/// Bounded, ordered, guard-indexed cache owned by one call site
pub struct SpecializationCache<K, V> {
    label: String,
    slots: Box<[OnceCell<CacheEntry<K, V>>]>,
    generic: AtomicBool,
    hits: AtomicU64,
    installs: AtomicU64,
    generic_runs: AtomicU64,
}

impl<K, V> SpecializationCache<K, V> {
    /// Create an empty cache holding at most `limit` entries
    pub fn new(label: impl Into<String>, limit: usize) -> Self {
        let slots = (0..limit).map(|_| OnceCell::new()).collect();
        Self {
            label: label.into(),
            slots,
            generic: AtomicBool::new(false),
            hits: AtomicU64::new(0),
            installs: AtomicU64::new(0),
            generic_runs: AtomicU64::new(0),
        }
    }

    /// Name used in log output
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Maximum number of entries
    pub fn limit(&self) -> usize {
        self.slots.len()
    }

    /// Number of installed entries
    pub fn len(&self) -> usize {
        self.slots.iter().take_while(|slot| slot.get().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True once the site has been demoted
    pub fn is_generic(&self) -> bool {
        self.generic.load(Ordering::Acquire)
    }

    pub fn state(&self) -> CacheState {
        if self.is_generic() {
            return CacheState::Generic;
        }
        match self.len() {
            0 => CacheState::Uninitialized,
            n => CacheState::Specializing(n),
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            installs: self.installs.load(Ordering::Relaxed),
            generic_runs: self.generic_runs.load(Ordering::Relaxed),
        }
    }

    /// Find the first entry, in insertion order, whose guard admits `observed`
    pub fn lookup<Q: ?Sized>(&self, observed: &Q) -> Option<&V>
    where
        K: Guard<Q>,
    {
        self.slots
            .iter()
            .map_while(|slot| slot.get())
            .find(|entry| entry.guard.admits(observed))
            .map(|entry| &entry.value)
    }

    /// Run the cache protocol for one invocation
    ///
    /// 1. A demoted site returns [`Lookup::Generic`] immediately.
    /// 2. Guards are checked in insertion order; the first match is a hit.
    /// 3. On a miss with a free slot, `resolve` produces the guard and value
    ///    for the observed shape, which are installed.
    /// 4. On a miss with no free slot the site is demoted.
    ///
    /// A `resolve` error is returned as-is and installs nothing.
    pub fn get_or_install<Q, R, E>(&self, observed: &Q, resolve: R) -> Result<Lookup<'_, V>, E>
    where
        Q: ?Sized,
        K: Guard<Q>,
        R: FnOnce() -> Result<(K, V), E>,
    {
        if self.is_generic() {
            self.generic_runs.fetch_add(1, Ordering::Relaxed);
            log::trace!("{}: generic", self.label);
            return Ok(Lookup::Generic);
        }

        let mut free = None;
        for (index, slot) in self.slots.iter().enumerate() {
            match slot.get() {
                Some(entry) if entry.guard.admits(observed) => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    log::trace!("{}: hit in slot {}", self.label, index);
                    return Ok(Lookup::Hit(&entry.value));
                }
                Some(_) => {}
                None => {
                    free = Some(index);
                    break;
                }
            }
        }

        let Some(start) = free else {
            self.demote();
            return Ok(Lookup::Generic);
        };

        let (guard, value) = resolve()?;
        let mut candidate = CacheEntry { guard, value };
        for index in start..self.slots.len() {
            match self.slots[index].try_insert(candidate) {
                Ok(entry) => {
                    self.installs.fetch_add(1, Ordering::Relaxed);
                    log::debug!(
                        "{}: installed specialization {}/{}",
                        self.label,
                        index + 1,
                        self.limit()
                    );
                    return Ok(Lookup::Installed(&entry.value));
                }
                Err((existing, rejected)) => {
                    if existing.guard.admits(observed) {
                        self.hits.fetch_add(1, Ordering::Relaxed);
                        return Ok(Lookup::Hit(&existing.value));
                    }
                    candidate = rejected;
                }
            }
        }

        self.demote();
        Ok(Lookup::Uncached(candidate.value))
    }

    fn demote(&self) {
        self.generic_runs.fetch_add(1, Ordering::Relaxed);
        if !self.generic.swap(true, Ordering::AcqRel) {
            log::debug!(
                "{}: {} specializations in use, switching to generic path",
                self.label,
                self.limit()
            );
        }
    }
}

impl<K, V> fmt::Debug for SpecializationCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpecializationCache")
            .field("label", &self.label)
            .field("limit", &self.limit())
            .field("state", &self.state())
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Debug)]
    struct Exact(u32);

    impl Guard<u32> for Exact {
        fn admits(&self, observed: &u32) -> bool {
            self.0 == *observed
        }
    }

    fn install(cache: &SpecializationCache<Exact, String>, shape: u32) -> Option<String> {
        match cache
            .get_or_install(&shape, || Ok::<_, ()>((Exact(shape), format!("spec-{}", shape))))
            .unwrap()
        {
            Lookup::Hit(v) | Lookup::Installed(v) => Some(v.clone()),
            Lookup::Uncached(v) => Some(v),
            Lookup::Generic => None,
        }
    }

    #[test]
    fn test_state_transitions() {
        let cache = SpecializationCache::new("test", 2);
        assert_eq!(cache.state(), CacheState::Uninitialized);

        assert_eq!(install(&cache, 1).as_deref(), Some("spec-1"));
        assert_eq!(cache.state(), CacheState::Specializing(1));

        assert_eq!(install(&cache, 2).as_deref(), Some("spec-2"));
        assert_eq!(cache.state(), CacheState::Specializing(2));

        assert_eq!(install(&cache, 3), None);
        assert_eq!(cache.state(), CacheState::Generic);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_generic_is_terminal() {
        let cache = SpecializationCache::new("test", 1);
        install(&cache, 1);
        install(&cache, 2);
        assert!(cache.is_generic());
        // a previously cached shape also runs generic after demotion
        assert_eq!(install(&cache, 1), None);
        assert_eq!(cache.stats().generic_runs, 2);
    }

    #[test]
    fn test_hits_follow_insertion_order() {
        let cache = SpecializationCache::new("test", 3);
        install(&cache, 7);
        install(&cache, 8);
        install(&cache, 8);
        install(&cache, 7);
        let stats = cache.stats();
        assert_eq!(stats.installs, 2);
        assert_eq!(stats.hits, 2);
        assert_eq!(cache.lookup(&8).map(String::as_str), Some("spec-8"));
        assert!(cache.lookup(&9).is_none());
    }

    #[test]
    fn test_failed_resolution_installs_nothing() {
        let cache: SpecializationCache<Exact, String> = SpecializationCache::new("test", 2);
        let resolved = Cell::new(0);
        for _ in 0..3 {
            let result = cache.get_or_install(&5, || {
                resolved.set(resolved.get() + 1);
                Err("unsupported")
            });
            assert!(matches!(result, Err("unsupported")));
        }
        assert_eq!(resolved.get(), 3);
        assert_eq!(cache.state(), CacheState::Uninitialized);
        assert_eq!(cache.stats(), CacheStats::default());
    }

    #[test]
    fn test_resolver_not_called_on_hit_or_generic() {
        let cache = SpecializationCache::new("test", 1);
        install(&cache, 1);
        let called = Cell::new(false);
        let hit = cache
            .get_or_install(&1, || {
                called.set(true);
                Ok::<_, ()>((Exact(1), String::new()))
            })
            .unwrap();
        assert!(matches!(hit, Lookup::Hit(v) if v == "spec-1"));

        install(&cache, 2);
        let generic = cache
            .get_or_install(&3, || {
                called.set(true);
                Ok::<_, ()>((Exact(3), String::new()))
            })
            .unwrap();
        assert!(matches!(generic, Lookup::Generic));
        assert!(!called.get());
    }

    #[test]
    fn test_concurrent_installs_respect_limit() {
        let cache: SpecializationCache<Exact, String> = SpecializationCache::new("test", 2);
        std::thread::scope(|s| {
            for t in 0..8u32 {
                let cache = &cache;
                s.spawn(move || {
                    for i in 0..100u32 {
                        let shape = (t + i) % 4;
                        if let Some(v) = install(cache, shape) {
                            assert_eq!(v, format!("spec-{}", shape));
                        }
                    }
                });
            }
        });
        assert!(cache.len() <= 2);
        assert_eq!(cache.state(), CacheState::Generic);
    }
}
