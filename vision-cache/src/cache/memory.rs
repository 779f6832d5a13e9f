//! In-memory cache tier with LRU eviction and per-entry TTL.

use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::cache::config::MemoryTierConfig;
use crate::cache::entry::CacheEntry;
use crate::cache::maintenance::Maintainable;
use crate::cache::stats::TierMetrics;
use crate::cache::traits::{BoxFuture, CacheTier, CacheValue, TierHealth};
use crate::cache::types::{CacheError, TierKind};

/// Bounded in-process cache (L1).
///
/// Entries are kept in an order-preserving LRU map, so recency updates and
/// evictions are O(1). Expiry is checked lazily for the single entry an
/// operation touches; full sweeps happen in [`MemoryTier::purge_expired`],
/// normally driven by a maintenance daemon.
pub struct MemoryTier<V> {
    /// Entry storage, most recently used first
    entries: Mutex<LruCache<String, CacheEntry<V>>>,
    config: MemoryTierConfig,
    /// When the last full sweep ran
    last_sweep: Mutex<Instant>,
    /// Statistics, deliberately separate from the entry lock
    stats: Mutex<TierMetrics>,
}

impl<V: Clone> MemoryTier<V> {
    /// Create a new memory tier.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::InvalidConfig` if `max_size` is zero.
    pub fn new(config: MemoryTierConfig) -> Result<Self, CacheError> {
        let capacity = NonZeroUsize::new(config.max_size).ok_or_else(|| {
            CacheError::InvalidConfig("memory tier max_size must be greater than 0".to_string())
        })?;

        Ok(Self {
            entries: Mutex::new(LruCache::new(capacity)),
            config,
            last_sweep: Mutex::new(Instant::now()),
            stats: Mutex::new(TierMetrics::new()),
        })
    }

    /// Create a memory tier with the given capacity and default settings.
    pub fn with_capacity(max_size: usize) -> Result<Self, CacheError> {
        Self::new(MemoryTierConfig::default().with_max_size(max_size))
    }

    /// Get a cached value.
    ///
    /// On hit the entry becomes most recently used. An expired entry is
    /// removed and counted as both a miss and an eviction.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.entries.lock();

        let expired = match entries.peek(key).map(|entry| entry.is_expired()) {
            Some(expired) => expired,
            None => {
                drop(entries);
                self.stats.lock().record_miss();
                return None;
            }
        };

        if expired {
            entries.pop(key);
            let size = entries.len();
            drop(entries);

            let mut stats = self.stats.lock();
            stats.record_miss();
            stats.record_eviction(1);
            stats.update_size(size);
            return None;
        }

        let value = entries.get_mut(key).map(|entry| {
            entry.touch();
            entry.value.clone()
        });
        drop(entries);

        self.stats.lock().record_hit();
        value
    }

    /// Insert or replace a value.
    ///
    /// `ttl = None` applies the configured default TTL. Inserting a new key
    /// into a full tier evicts the least recently used entry.
    pub fn set(&self, key: &str, value: V, ttl: Option<Duration>) -> bool {
        let ttl = ttl.or(self.config.default_ttl);
        let entry = CacheEntry::new(key, value, ttl);

        let mut entries = self.entries.lock();
        let evicted = entries
            .push(key.to_string(), entry)
            .filter(|(old_key, _)| old_key != key);
        let size = entries.len();
        drop(entries);

        let mut stats = self.stats.lock();
        stats.record_set();
        stats.update_size(size);
        if let Some((evicted_key, _)) = evicted {
            stats.record_eviction(1);
            debug!(key = %evicted_key, "Memory tier evicted LRU entry");
        }

        true
    }

    /// Remove a value. Returns true if the key was present.
    pub fn delete(&self, key: &str) -> bool {
        let mut entries = self.entries.lock();
        let removed = entries.pop(key).is_some();
        let size = entries.len();
        drop(entries);

        let mut stats = self.stats.lock();
        if removed {
            stats.record_delete();
        }
        stats.update_size(size);
        removed
    }

    /// Remove all entries.
    pub fn clear(&self) -> bool {
        self.entries.lock().clear();
        self.stats.lock().update_size(0);
        true
    }

    /// Check for a live entry without affecting recency or hit counters.
    pub fn contains(&self, key: &str) -> bool {
        let mut entries = self.entries.lock();
        match entries.peek(key).map(|entry| entry.is_expired()) {
            Some(false) => true,
            Some(true) => {
                entries.pop(key);
                let size = entries.len();
                drop(entries);

                let mut stats = self.stats.lock();
                stats.record_eviction(1);
                stats.update_size(size);
                false
            }
            None => false,
        }
    }

    /// Number of live entries. Expired entries are purged first.
    pub fn len(&self) -> usize {
        self.purge_expired();
        self.entries.lock().len()
    }

    /// True when no live entries remain.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys of live entries, most recently used first.
    pub fn keys(&self) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .filter(|(_, entry)| !entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Copies of live entries, most recently used first.
    ///
    /// Does not count as access.
    pub fn snapshot(&self) -> Vec<(String, V)> {
        self.entries
            .lock()
            .iter()
            .filter(|(_, entry)| !entry.is_expired())
            .map(|(key, entry)| (key.clone(), entry.value.clone()))
            .collect()
    }

    /// Remaining time-to-live of a live entry.
    pub fn remaining_ttl(&self, key: &str) -> Option<Duration> {
        self.entries
            .lock()
            .peek(key)
            .filter(|entry| !entry.is_expired())
            .and_then(|entry| entry.remaining_ttl())
    }

    /// Remove every expired entry. Returns the number removed.
    pub fn purge_expired(&self) -> usize {
        let mut entries = self.entries.lock();

        let expired: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            entries.pop(key);
        }
        let size = entries.len();
        drop(entries);

        *self.last_sweep.lock() = Instant::now();

        if !expired.is_empty() {
            let mut stats = self.stats.lock();
            stats.record_eviction(expired.len() as u64);
            stats.update_size(size);
            debug!(removed = expired.len(), "Memory tier expiry sweep");
        }

        expired.len()
    }

    /// Run [`purge_expired`](Self::purge_expired) at most once per cleanup interval.
    ///
    /// Returns the number of entries removed, zero when throttled.
    pub fn maybe_purge_expired(&self) -> usize {
        if self.last_sweep.lock().elapsed() < self.config.cleanup_interval {
            return 0;
        }
        self.purge_expired()
    }

    /// Configured maximum number of entries.
    pub fn max_size(&self) -> usize {
        self.config.max_size
    }

    /// Configured default TTL.
    pub fn default_ttl(&self) -> Option<Duration> {
        self.config.default_ttl
    }

    /// Get tier statistics.
    pub fn stats(&self) -> TierMetrics {
        self.stats.lock().clone()
    }
}

impl<V: CacheValue> CacheTier<V> for MemoryTier<V> {
    fn kind(&self) -> TierKind {
        TierKind::Memory
    }

    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Option<V>> {
        Box::pin(async move { MemoryTier::get(self, key) })
    }

    fn set<'a>(&'a self, key: &'a str, value: V, ttl: Option<Duration>) -> BoxFuture<'a, bool> {
        Box::pin(async move { MemoryTier::set(self, key, value, ttl) })
    }

    fn delete<'a>(&'a self, key: &'a str) -> BoxFuture<'a, bool> {
        Box::pin(async move { MemoryTier::delete(self, key) })
    }

    fn clear(&self) -> BoxFuture<'_, bool> {
        Box::pin(async move { MemoryTier::clear(self) })
    }

    fn contains<'a>(&'a self, key: &'a str) -> BoxFuture<'a, bool> {
        Box::pin(async move { MemoryTier::contains(self, key) })
    }

    fn metrics(&self) -> TierMetrics {
        self.stats()
    }

    fn health(&self) -> BoxFuture<'_, TierHealth> {
        Box::pin(async move {
            TierHealth {
                kind: TierKind::Memory,
                enabled: true,
                connected: true,
                size: self
                    .entries
                    .lock()
                    .iter()
                    .filter(|(_, entry)| !entry.is_expired())
                    .count(),
            }
        })
    }
}

impl<V: Clone + Send + Sync> Maintainable for MemoryTier<V> {
    fn name(&self) -> &'static str {
        "memory-tier"
    }

    fn interval(&self) -> Duration {
        self.config.cleanup_interval
    }

    fn run_maintenance(&self) -> BoxFuture<'_, usize> {
        Box::pin(async move { self.maybe_purge_expired() })
    }
}
