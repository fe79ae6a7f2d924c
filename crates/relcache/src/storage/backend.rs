//! Pluggable cache backends.
//!
//! A table's storage only needs the small capability set below; eviction
//! and expiration stay entirely inside the backend. The bundled adapter
//! wraps a `moka` cache and layers hit/miss accounting over it, since moka
//! records no statistics of its own.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use moka::sync::{Cache, CacheBuilder};

use crate::row::{CacheKey, RowValue};

/// Builder handed to a table's storage factory.
///
/// Eviction policy is configured here: `max_capacity` for size-based,
/// `time_to_live`/`time_to_idle` for time-based.
pub type StorageBuilder = CacheBuilder<CacheKey, RowValue, Cache<CacheKey, RowValue>>;

/// Capability set a table storage requires from its cache.
///
/// Implementations must be safe for concurrent point operations; this
/// crate adds no locking of its own.
pub trait CacheBackend: Send + Sync {
    /// Store a value under a key, overwriting any existing entry.
    fn put(&self, key: CacheKey, value: RowValue);

    /// Store every entry of a batch.
    fn put_all(&self, entries: Vec<(CacheKey, RowValue)>);

    /// Look up a key.
    fn get(&self, key: &CacheKey) -> Option<RowValue>;

    /// Snapshot of every live entry.
    fn entries(&self) -> Vec<(CacheKey, RowValue)>;

    /// Discard every entry.
    fn invalidate_all(&self);

    /// Current statistics.
    fn stats(&self) -> CacheStats;
}

/// Point-in-time statistics of one table's cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups that found an entry.
    pub hit_count: u64,
    /// Lookups that found nothing.
    pub miss_count: u64,
    /// Entries written.
    pub insert_count: u64,
    /// Entries currently held.
    pub entry_count: u64,
}

impl CacheStats {
    /// Fraction of lookups that hit, 0.0 when nothing was looked up.
    pub fn hit_ratio(&self) -> f64 {
        let lookups = self.hit_count + self.miss_count;
        if lookups == 0 {
            0.0
        } else {
            self.hit_count as f64 / lookups as f64
        }
    }
}

#[derive(Debug, Default)]
struct StatsRecorder {
    hits: AtomicU64,
    misses: AtomicU64,
    inserts: AtomicU64,
}

impl StatsRecorder {
    #[inline]
    fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    fn record_insert(&self, count: u64) {
        self.inserts.fetch_add(count, Ordering::Relaxed);
    }
}

/// [`CacheBackend`] adapter over a `moka` synchronous cache.
pub struct MokaBackend {
    cache: Cache<CacheKey, RowValue>,
    recorder: StatsRecorder,
}

impl MokaBackend {
    /// Wrap an already-configured cache.
    pub fn new(cache: Cache<CacheKey, RowValue>) -> Self {
        Self {
            cache,
            recorder: StatsRecorder::default(),
        }
    }
}

impl fmt::Debug for MokaBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MokaBackend")
            .field("entry_count", &self.cache.entry_count())
            .finish()
    }
}

impl CacheBackend for MokaBackend {
    fn put(&self, key: CacheKey, value: RowValue) {
        self.cache.insert(key, value);
        self.recorder.record_insert(1);
    }

    fn put_all(&self, entries: Vec<(CacheKey, RowValue)>) {
        let count = entries.len() as u64;
        for (key, value) in entries {
            self.cache.insert(key, value);
        }
        self.recorder.record_insert(count);
    }

    fn get(&self, key: &CacheKey) -> Option<RowValue> {
        let value = self.cache.get(key);
        match value {
            Some(_) => self.recorder.record_hit(),
            None => self.recorder.record_miss(),
        }
        value
    }

    fn entries(&self) -> Vec<(CacheKey, RowValue)> {
        self.cache
            .iter()
            .map(|(key, value)| ((*key).clone(), value))
            .collect()
    }

    fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    fn stats(&self) -> CacheStats {
        self.cache.run_pending_tasks();
        CacheStats {
            hit_count: self.recorder.hits.load(Ordering::Relaxed),
            miss_count: self.recorder.misses.load(Ordering::Relaxed),
            insert_count: self.recorder.inserts.load(Ordering::Relaxed),
            entry_count: self.cache.entry_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn backend() -> MokaBackend {
        MokaBackend::new(Cache::builder().build())
    }

    #[test]
    fn test_put_get_roundtrip() {
        let backend = backend();
        backend.put(CacheKey::from(1), Arc::new("one".to_string()));

        let value = backend.get(&CacheKey::from(1)).unwrap();
        assert_eq!(value.downcast_ref::<String>().unwrap(), "one");
        assert!(backend.get(&CacheKey::from(2)).is_none());
    }

    #[test]
    fn test_put_all_and_entries() {
        let backend = backend();
        backend.put_all(vec![
            (CacheKey::from(1), Arc::new(10i32) as RowValue),
            (CacheKey::from(2), Arc::new(20i32) as RowValue),
        ]);

        let mut values: Vec<i32> = backend
            .entries()
            .into_iter()
            .map(|(_, value)| *value.downcast_ref::<i32>().unwrap())
            .collect();
        values.sort();
        assert_eq!(values, vec![10, 20]);
    }

    #[test]
    fn test_invalidate_all_empties_cache() {
        let backend = backend();
        backend.put(CacheKey::from(1), Arc::new(1i32));
        backend.invalidate_all();
        assert!(backend.entries().is_empty());
    }

    #[test]
    fn test_stats_count_hits_misses_inserts() {
        let backend = backend();
        backend.put(CacheKey::from(1), Arc::new(1i32));
        backend.get(&CacheKey::from(1));
        backend.get(&CacheKey::from(1));
        backend.get(&CacheKey::from(9));

        let stats = backend.stats();
        assert_eq!(stats.hit_count, 2);
        assert_eq!(stats.miss_count, 1);
        assert_eq!(stats.insert_count, 1);
        assert_eq!(stats.entry_count, 1);
        assert!((stats.hit_ratio() - 2.0 / 3.0).abs() < f64::EPSILON);
    }
}
