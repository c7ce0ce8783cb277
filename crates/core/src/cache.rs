//! Deterministic result cache.
//!
//! A [`ResultCache`] remembers the answer given for each query fingerprint so
//! that repeating a query cannot be used to average the noise away. Mutating
//! methods take `&mut self`: exclusive access is what makes get-or-compute
//! atomic, and shared owners provide it through their own lock rather than a
//! second one inside the map.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::hash::Hash;

/// Fingerprint of a query: (sensitivity, true value, cache bin).
///
/// Sensitivity is compared by bit pattern, so `0.0` and `-0.0` are
/// different keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    sensitivity_bits: u64,
    value: i64,
    cache_bin: i64,
}

impl CacheKey {
    /// Create a key from its three components.
    pub fn new(sensitivity: f64, value: i64, cache_bin: i64) -> Self {
        Self {
            sensitivity_bits: sensitivity.to_bits(),
            value,
            cache_bin,
        }
    }

    /// Sensitivity component.
    pub fn sensitivity(&self) -> f64 {
        f64::from_bits(self.sensitivity_bits)
    }

    /// True-value component.
    pub fn value(&self) -> i64 {
        self.value
    }

    /// Cache-bin component.
    pub fn cache_bin(&self) -> i64 {
        self.cache_bin
    }
}

/// Map from query fingerprint to a previously computed result.
///
/// Entries are never evicted individually; [`ResultCache::clear`] drops all
/// of them at once.
#[derive(Clone, Debug)]
pub struct ResultCache<K = CacheKey, V = i64> {
    entries: HashMap<K, V>,
}

impl<K, V> Default for ResultCache<K, V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash, V: Clone> ResultCache<K, V> {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached value for `key`, running `compute` only on a miss.
    ///
    /// `compute` runs at most once per key for the lifetime of the entry.
    pub fn get_or_compute<F>(&mut self, key: K, compute: F) -> V
    where
        F: FnOnce() -> V,
    {
        match self.entries.entry(key) {
            Entry::Occupied(slot) => slot.get().clone(),
            Entry::Vacant(slot) => slot.insert(compute()).clone(),
        }
    }

    /// Whether `key` has a cached value.
    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Drop every entry, returning how many were removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();
        removed
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
