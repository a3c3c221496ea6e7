//! Signature-keyed memoization
//!
//! This module provides the run-wide fitness cache and the generic
//! compute-once store it is built on.
//!
//! Each signature owns a slot with a write-once value and a compute gate.
//! Readers never block on the gate; a caller that misses takes the gate,
//! re-checks the value, and only then computes. Concurrent misses on the
//! same signature therefore compute at most once, and every waiter observes
//! the winner's value. Failed computations leave the slot empty so a later
//! caller may retry. Clearing retires each slot under its gate, and a caller
//! that finds its slot retired starts over on the live map.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Signature};

/// Outcome of a cache lookup
#[derive(Clone, Debug, PartialEq)]
pub enum CacheLookup<V> {
    /// The value was already present (possibly computed by a concurrent caller)
    Hit(V),
    /// This caller computed and stored the value
    Computed(V),
}

impl<V> CacheLookup<V> {
    /// Get the value regardless of where it came from
    pub fn value(&self) -> &V {
        match self {
            Self::Hit(v) | Self::Computed(v) => v,
        }
    }

    /// Take the value out of the lookup
    pub fn into_value(self) -> V {
        match self {
            Self::Hit(v) | Self::Computed(v) => v,
        }
    }

    /// Returns true if no computation was needed
    pub fn is_hit(&self) -> bool {
        matches!(self, Self::Hit(_))
    }
}

/// Counters describing cache usage
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Lookups answered from a stored value
    pub hits: usize,
    /// Lookups that had to enter the compute gate
    pub misses: usize,
    /// Computations that succeeded and were stored
    pub computations: usize,
}

struct Slot<V> {
    value: OnceLock<V>,
    gate: Mutex<()>,
    // Set under the gate once the slot has left the map
    retired: AtomicBool,
}

impl<V> Slot<V> {
    fn empty() -> Self {
        Self {
            value: OnceLock::new(),
            gate: Mutex::new(()),
            retired: AtomicBool::new(false),
        }
    }
}

/// Concurrent compute-once store keyed by canonical signature
pub struct SignatureCache<V> {
    slots: DashMap<Signature, Arc<Slot<V>>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
    computations: AtomicUsize,
}

impl<V> SignatureCache<V>
where
    V: Clone + Send + Sync,
{
    /// Create an empty cache
    pub fn new() -> Self {
        Self {
            slots: DashMap::new(),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
            computations: AtomicUsize::new(0),
        }
    }

    fn slot(&self, signature: &str) -> Arc<Slot<V>> {
        if let Some(existing) = self.slots.get(signature) {
            return Arc::clone(existing.value());
        }
        Arc::clone(
            self.slots
                .entry(signature.to_string())
                .or_insert_with(|| Arc::new(Slot::empty()))
                .value(),
        )
    }

    /// Get a stored value without computing
    pub fn get(&self, signature: &str) -> Option<V> {
        self.slots
            .get(signature)
            .and_then(|slot| slot.value.get().cloned())
    }

    /// Check if a value is stored for `signature`
    pub fn contains(&self, signature: &str) -> bool {
        self.get(signature).is_some()
    }

    /// Store a value unless one is already present
    ///
    /// Returns true if this call stored the value.
    pub fn insert(&self, signature: &str, value: V) -> bool {
        loop {
            let slot = self.slot(signature);
            let _guard = slot.gate.lock().unwrap_or_else(PoisonError::into_inner);
            if slot.retired.load(Ordering::Acquire) {
                continue;
            }
            return slot.value.set(value).is_ok();
        }
    }

    /// Get the stored value, computing it under the signature's gate on a miss
    ///
    /// At most one successful computation ever happens per signature. Callers
    /// blocked behind a running computation reuse its result. An error is
    /// returned to the computing caller only and nothing is stored.
    pub fn get_or_try_compute<E, F>(&self, signature: &str, compute: F) -> Result<CacheLookup<V>, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        loop {
            let slot = self.slot(signature);
            if let Some(v) = slot.value.get() {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(CacheLookup::Hit(v.clone()));
            }

            let _guard = slot.gate.lock().unwrap_or_else(PoisonError::into_inner);
            if slot.retired.load(Ordering::Acquire) {
                continue;
            }
            if let Some(v) = slot.value.get() {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(CacheLookup::Hit(v.clone()));
            }

            self.misses.fetch_add(1, Ordering::Relaxed);
            let value = compute()?;
            // The gate is held, so no other caller can have set the value.
            let _ = slot.value.set(value.clone());
            self.computations.fetch_add(1, Ordering::Relaxed);
            return Ok(CacheLookup::Computed(value));
        }
    }

    /// Number of signatures with a stored value
    pub fn len(&self) -> usize {
        self.slots
            .iter()
            .filter(|entry| entry.value().value.get().is_some())
            .count()
    }

    /// Check if no value is stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every entry and reset the counters
    ///
    /// Waits for any computation in flight on a slot before retiring it.
    pub fn clear(&self) {
        let signatures: Vec<Signature> = self.slots.iter().map(|e| e.key().clone()).collect();
        for signature in signatures {
            let Some(slot) = self.slots.get(&signature).map(|e| Arc::clone(e.value())) else {
                continue;
            };
            let _guard = slot.gate.lock().unwrap_or_else(PoisonError::into_inner);
            slot.retired.store(true, Ordering::Release);
            self.slots
                .remove_if(&signature, |_, current| Arc::ptr_eq(current, &slot));
        }
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.computations.store(0, Ordering::Relaxed);
    }

    /// Snapshot of the usage counters
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            computations: self.computations.load(Ordering::Relaxed),
        }
    }

    /// Snapshot of all stored entries
    pub fn entries(&self) -> Vec<(Signature, V)> {
        self.slots
            .iter()
            .filter_map(|entry| {
                entry
                    .value()
                    .value
                    .get()
                    .map(|v| (entry.key().clone(), v.clone()))
            })
            .collect()
    }
}

impl<V> Default for SignatureCache<V>
where
    V: Clone + Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V> std::fmt::Debug for SignatureCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureCache")
            .field("slots", &self.slots.len())
            .field("hits", &self.hits.load(Ordering::Relaxed))
            .field("misses", &self.misses.load(Ordering::Relaxed))
            .finish()
    }
}

/// Run-wide map from canonical signature to final fitness score
pub type FitnessCache = SignatureCache<f64>;

impl SignatureCache<f64> {
    /// Persistable layout: signature to decimal score string
    pub fn to_map(&self) -> BTreeMap<Signature, String> {
        self.entries()
            .into_iter()
            .map(|(signature, score)| (signature, score.to_string()))
            .collect()
    }

    /// Build a cache from the persisted layout
    pub fn from_map(map: &BTreeMap<Signature, String>) -> Result<Self, CacheError> {
        let cache = Self::new();
        for (signature, raw) in map {
            let score: f64 = raw.trim().parse().map_err(|_| CacheError::InvalidScore {
                signature: signature.clone(),
                value: raw.clone(),
            })?;
            if !score.is_finite() {
                return Err(CacheError::InvalidScore {
                    signature: signature.clone(),
                    value: raw.clone(),
                });
            }
            cache.insert(signature, score);
        }
        Ok(cache)
    }

    /// Write the cache to a JSON file
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), CacheError> {
        let file = File::create(path.as_ref())?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &self.to_map())
            .map_err(|e| CacheError::Serialization(e.to_string()))?;
        writer.flush()?;
        log::debug!(
            "saved {} fitness entries to {}",
            self.len(),
            path.as_ref().display()
        );
        Ok(())
    }

    /// Read a cache from a JSON file written by [`save_json`](Self::save_json)
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, CacheError> {
        let file = File::open(path.as_ref())?;
        let map: BTreeMap<Signature, String> = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| CacheError::Deserialization(e.to_string()))?;
        Self::from_map(&map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_miss_then_hit() {
        let cache = FitnessCache::new();
        let first: Result<_, ()> = cache.get_or_try_compute("01", || Ok(0.5));
        assert_eq!(first, Ok(CacheLookup::Computed(0.5)));

        let second: Result<_, ()> = cache.get_or_try_compute("01", || panic!("recomputed"));
        assert_eq!(second, Ok(CacheLookup::Hit(0.5)));

        assert_eq!(
            cache.stats(),
            CacheStats {
                hits: 1,
                misses: 1,
                computations: 1
            }
        );
    }

    #[test]
    fn test_failure_is_not_stored() {
        let cache = FitnessCache::new();
        let failed = cache.get_or_try_compute("10", || Err("boom"));
        assert_eq!(failed, Err("boom"));
        assert!(!cache.contains("10"));
        assert!(cache.is_empty());

        let retried: Result<_, &str> = cache.get_or_try_compute("10", || Ok(0.25));
        assert_eq!(retried, Ok(CacheLookup::Computed(0.25)));
        assert_eq!(cache.get("10"), Some(0.25));
    }

    #[test]
    fn test_insert_keeps_first_value() {
        let cache = FitnessCache::new();
        assert!(cache.insert("a", 1.0));
        assert!(!cache.insert("a", 2.0));
        assert_eq!(cache.get("a"), Some(1.0));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_concurrent_misses_compute_once() {
        let cache = Arc::new(FitnessCache::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let calls = Arc::clone(&calls);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    let lookup: Result<_, ()> = cache.get_or_try_compute("shared", || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        thread::sleep(Duration::from_millis(20));
                        Ok(0.75)
                    });
                    lookup.unwrap().into_value()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 0.75);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.stats().computations, 1);
        assert_eq!(cache.stats().hits, 7);
    }

    #[test]
    fn test_clear_resets() {
        let cache = FitnessCache::new();
        cache.insert("a", 1.0);
        let _: Result<_, ()> = cache.get_or_try_compute("a", || Ok(0.0));
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.stats(), CacheStats::default());
    }

    #[test]
    fn test_clear_waits_for_running_computation() {
        let cache = Arc::new(FitnessCache::new());
        let started = Arc::new(Barrier::new(2));

        let worker = {
            let cache = Arc::clone(&cache);
            let started = Arc::clone(&started);
            thread::spawn(move || {
                let lookup: Result<_, ()> = cache.get_or_try_compute("busy", || {
                    started.wait();
                    thread::sleep(Duration::from_millis(30));
                    Ok(0.4)
                });
                lookup.unwrap()
            })
        };

        started.wait();
        cache.clear();
        assert_eq!(worker.join().unwrap(), CacheLookup::Computed(0.4));
        assert!(cache.is_empty());
        assert_eq!(cache.stats(), CacheStats::default());

        let again: Result<_, ()> = cache.get_or_try_compute("busy", || Ok(0.6));
        assert_eq!(again, Ok(CacheLookup::Computed(0.6)));
        assert_eq!(cache.get("busy"), Some(0.6));
    }

    #[test]
    fn test_map_roundtrip() {
        let cache = FitnessCache::new();
        cache.insert("0110", 0.8);
        cache.insert("1001", -0.125);

        let map = cache.to_map();
        assert_eq!(map.get("0110").map(String::as_str), Some("0.8"));

        let restored = FitnessCache::from_map(&map).unwrap();
        assert_eq!(restored.get("0110"), Some(0.8));
        assert_eq!(restored.get("1001"), Some(-0.125));
    }

    #[test]
    fn test_from_map_rejects_bad_scores() {
        let mut map = BTreeMap::new();
        map.insert("01".to_string(), "not-a-number".to_string());
        assert!(matches!(
            FitnessCache::from_map(&map),
            Err(CacheError::InvalidScore { .. })
        ));

        let mut map = BTreeMap::new();
        map.insert("01".to_string(), "NaN".to_string());
        assert!(FitnessCache::from_map(&map).is_err());
    }

    #[test]
    fn test_json_file_roundtrip() {
        let path = std::env::temp_dir().join(format!(
            "ensemble-evo-cache-{}.json",
            std::process::id()
        ));
        let cache = FitnessCache::new();
        cache.insert("110011", 0.6125);
        cache.save_json(&path).unwrap();

        let loaded = FitnessCache::load_json(&path).unwrap();
        assert_eq!(loaded.get("110011"), Some(0.6125));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_load_missing_file() {
        let result = FitnessCache::load_json("/nonexistent/ensemble-evo/cache.json");
        assert!(matches!(result, Err(CacheError::Io(_))));
    }
}
