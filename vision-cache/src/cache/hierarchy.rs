//! Multi-tier cache hierarchy.
//!
//! Combines the memory (L1), network (L2) and persistent (L3) tiers into
//! one logical cache:
//!
//! - Reads go L1 → L2 → L3; the first hit wins and, with promotion enabled,
//!   is copied into L1
//! - Writes always land in L1; lower tiers are written concurrently on a
//!   best-effort basis
//! - Deletes and clears fan out to every tier
//!
//! Lower tiers are optional. The enabled ones are held as an ordered list
//! of [`CacheTier`] trait objects, so orchestration never special-cases a
//! tier.
//!
//! # Example
//!
//! ```no_run
//! use vision_cache::cache::{CacheHierarchyManager, HierarchyConfig};
//!
//! # async fn example() -> Result<(), vision_cache::cache::CacheError> {
//! let cache: CacheHierarchyManager<String> =
//!     CacheHierarchyManager::new(HierarchyConfig::default(), None).await?;
//! cache.start();
//!
//! cache.set("frame:42", "KA01AB1234".to_string(), None).await;
//! assert_eq!(cache.get("frame:42").await.as_deref(), Some("KA01AB1234"));
//!
//! cache.stop().await;
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::cache::config::{HierarchyConfig, MemoryTierConfig};
use crate::cache::maintenance::{Maintainable, MaintenanceDaemon};
use crate::cache::memory::MemoryTier;
use crate::cache::network::{NetworkTier, SharedStoreClient};
use crate::cache::persistent::PersistentTier;
use crate::cache::stats::{CacheStatistics, HierarchyCounters};
use crate::cache::traits::{CacheTier, CacheValue, TierHealth};
use crate::cache::types::{CacheError, TierKind};

/// One logical cache over up to three tiers.
pub struct CacheHierarchyManager<V: CacheValue> {
    config: HierarchyConfig,
    memory: Arc<MemoryTier<V>>,
    network: Option<Arc<NetworkTier<V>>>,
    persistent: Option<Arc<PersistentTier<V>>>,
    /// Enabled tiers below L1, in lookup order
    lower: Vec<Arc<dyn CacheTier<V>>>,
    counters: Mutex<HierarchyCounters>,
    daemon: Mutex<Option<MaintenanceDaemon>>,
    started_at: Instant,
}

impl<V: CacheValue> CacheHierarchyManager<V> {
    /// Build the hierarchy described by `config`.
    ///
    /// The network tier is only created when it is enabled and a shared
    /// store client is supplied.
    ///
    /// # Errors
    ///
    /// Fails fast on an invalid memory configuration or an unusable
    /// persistent directory.
    pub async fn new(
        config: HierarchyConfig,
        shared_store: Option<Arc<dyn SharedStoreClient>>,
    ) -> Result<Self, CacheError> {
        let memory = Arc::new(MemoryTier::new(config.memory.clone())?);

        let network = match (config.network.enabled, shared_store) {
            (true, Some(client)) => Some(Arc::new(NetworkTier::new(
                client,
                config.network.clone(),
            ))),
            (true, None) => {
                warn!("Network tier enabled but no shared store client supplied, skipping");
                None
            }
            (false, _) => None,
        };

        let persistent = if config.persistent.enabled {
            Some(Arc::new(
                PersistentTier::open(config.persistent.clone()).await?,
            ))
        } else {
            None
        };

        Ok(Self::assemble(config, memory, network, persistent))
    }

    /// Memory-only hierarchy. Needs no runtime to construct.
    pub fn memory_only(memory: MemoryTierConfig) -> Result<Self, CacheError> {
        let config = HierarchyConfig::memory_only(memory);
        let memory = Arc::new(MemoryTier::new(config.memory.clone())?);
        Ok(Self::assemble(config, memory, None, None))
    }

    fn assemble(
        config: HierarchyConfig,
        memory: Arc<MemoryTier<V>>,
        network: Option<Arc<NetworkTier<V>>>,
        persistent: Option<Arc<PersistentTier<V>>>,
    ) -> Self {
        let mut lower: Vec<Arc<dyn CacheTier<V>>> = Vec::new();
        if let Some(tier) = &network {
            lower.push(tier.clone() as Arc<dyn CacheTier<V>>);
        }
        if let Some(tier) = &persistent {
            lower.push(tier.clone() as Arc<dyn CacheTier<V>>);
        }

        info!(
            memory_max = config.memory.max_size,
            network = network.is_some(),
            persistent = persistent.is_some(),
            promote_on_hit = config.promote_on_hit,
            "Cache hierarchy initialized"
        );

        Self {
            config,
            memory,
            network,
            persistent,
            lower,
            counters: Mutex::new(HierarchyCounters::default()),
            daemon: Mutex::new(None),
            started_at: Instant::now(),
        }
    }

    /// The L1 tier.
    pub fn memory_tier(&self) -> &MemoryTier<V> {
        &self.memory
    }

    /// The L2 tier, when enabled.
    pub fn network_tier(&self) -> Option<&NetworkTier<V>> {
        self.network.as_deref()
    }

    /// The L3 tier, when enabled.
    pub fn persistent_tier(&self) -> Option<&PersistentTier<V>> {
        self.persistent.as_deref()
    }

    /// Kinds of every enabled tier, in lookup order.
    pub fn enabled_tiers(&self) -> Vec<TierKind> {
        std::iter::once(TierKind::Memory)
            .chain(self.lower.iter().map(|tier| tier.kind()))
            .collect()
    }

    /// Get a value, searching the tiers in order.
    pub async fn get(&self, key: &str) -> Option<V> {
        if let Some(value) = self.memory.get(key) {
            self.counters.lock().record_hit(TierKind::Memory);
            return Some(value);
        }

        for tier in &self.lower {
            let Some(value) = tier.get(key).await else {
                continue;
            };

            let kind = tier.kind();
            self.counters.lock().record_hit(kind);

            if self.config.promote_on_hit {
                self.memory.set(key, value.clone(), None);
                self.counters.lock().promotions += 1;
                debug!(key = key, from = %kind, "Promoted cache entry to memory tier");
            }
            return Some(value);
        }

        self.counters.lock().misses += 1;
        None
    }

    /// Store a value in every enabled tier.
    ///
    /// Returns the memory tier's result; lower-tier failures are only logged.
    pub async fn set(&self, key: &str, value: V, ttl: Option<Duration>) -> bool {
        let stored = self.memory.set(key, value.clone(), ttl);

        let writes = self
            .lower
            .iter()
            .map(|tier| tier.set(key, value.clone(), ttl));
        let results = join_all(writes).await;

        for (tier, ok) in self.lower.iter().zip(results) {
            if !ok {
                debug!(key = key, tier = %tier.kind(), "Lower tier write failed");
            }
        }

        stored
    }

    /// Remove a value from every tier. Returns the memory tier's result.
    pub async fn delete(&self, key: &str) -> bool {
        let removed = self.memory.delete(key);
        join_all(self.lower.iter().map(|tier| tier.delete(key))).await;
        removed
    }

    /// Remove every entry from every tier. Returns the memory tier's result.
    pub async fn clear(&self) -> bool {
        let cleared = self.memory.clear();
        let results = join_all(self.lower.iter().map(|tier| tier.clear())).await;

        for (tier, ok) in self.lower.iter().zip(results) {
            if !ok {
                warn!(tier = %tier.kind(), "Failed to clear cache tier");
            }
        }

        info!("Cache hierarchy cleared");
        cleared
    }

    /// True if any tier holds a live value for `key`.
    pub async fn contains(&self, key: &str) -> bool {
        if self.memory.contains(key) {
            return true;
        }
        for tier in &self.lower {
            if tier.contains(key).await {
                return true;
            }
        }
        false
    }

    /// Return the cached value, or compute, store and return it.
    pub async fn get_or_set<F, Fut>(&self, key: &str, compute: F, ttl: Option<Duration>) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        if let Some(value) = self.get(key).await {
            return value;
        }

        let value = compute().await;
        self.set(key, value.clone(), ttl).await;
        value
    }

    /// Like [`get_or_set`](Self::get_or_set) for fallible computations.
    ///
    /// Errors are returned to the caller and nothing is cached.
    pub async fn try_get_or_set<F, Fut, E>(
        &self,
        key: &str,
        compute: F,
        ttl: Option<Duration>,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(key).await {
            return Ok(value);
        }

        let value = compute().await?;
        self.set(key, value.clone(), ttl).await;
        Ok(value)
    }

    /// Status of all three tiers; disabled tiers report `enabled: false`.
    pub async fn health_check(&self) -> Vec<TierHealth> {
        let mut report = vec![CacheTier::health(self.memory.as_ref()).await];

        for kind in [TierKind::Network, TierKind::Persistent] {
            match self.lower.iter().find(|tier| tier.kind() == kind) {
                Some(tier) => report.push(tier.health().await),
                None => report.push(TierHealth {
                    kind,
                    enabled: false,
                    connected: false,
                    size: 0,
                }),
            }
        }

        report
    }

    /// Snapshot of per-tier metrics and hierarchy counters.
    pub fn stats(&self) -> CacheStatistics {
        let tiers = std::iter::once((TierKind::Memory, self.memory.stats()))
            .chain(self.lower.iter().map(|tier| (tier.kind(), tier.metrics())))
            .collect();

        CacheStatistics::new(tiers, self.counters.lock().clone(), self.started_at)
    }

    /// Delete every key held in memory whose name contains `pattern`.
    ///
    /// Matching keys are removed from all tiers. Returns the number deleted.
    pub async fn invalidate_pattern(&self, pattern: &str) -> usize {
        let keys: Vec<String> = self
            .memory
            .keys()
            .into_iter()
            .filter(|key| key.contains(pattern))
            .collect();

        for key in &keys {
            self.delete(key).await;
        }

        if !keys.is_empty() {
            info!(pattern = pattern, removed = keys.len(), "Invalidated cache keys");
        }
        keys.len()
    }

    /// Start background maintenance for the memory and persistent tiers.
    ///
    /// Must be called within a tokio runtime. Calling it twice is a no-op.
    pub fn start(&self) {
        let mut daemon = self.daemon.lock();
        if daemon.is_some() {
            return;
        }

        let maintenance = MaintenanceDaemon::new(self.config.shutdown_timeout);
        maintenance.spawn(self.memory.clone() as Arc<dyn Maintainable>);
        if let Some(tier) = &self.persistent {
            maintenance.spawn(tier.clone() as Arc<dyn Maintainable>);
        }

        *daemon = Some(maintenance);
        info!("Cache hierarchy maintenance started");
    }

    /// True between [`start`](Self::start) and [`stop`](Self::stop).
    pub fn is_running(&self) -> bool {
        self.daemon.lock().is_some()
    }

    /// Stop background maintenance and flush the persistent index.
    pub async fn stop(&self) {
        let daemon = self.daemon.lock().take();
        if let Some(daemon) = daemon {
            daemon.stop().await;
        }

        if let Some(tier) = &self.persistent {
            if !tier.flush().await {
                warn!("Failed to flush persistent index during shutdown");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::config::PersistentTierConfig;
    use crate::cache::network::InMemorySharedStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn memory_config(max_size: usize) -> MemoryTierConfig {
        MemoryTierConfig::default().with_max_size(max_size)
    }

    async fn create_two_tier(temp_dir: &TempDir) -> CacheHierarchyManager<String> {
        let config = HierarchyConfig::default()
            .with_memory(memory_config(100))
            .with_persistent(PersistentTierConfig::new(temp_dir.path()));
        CacheHierarchyManager::new(config, None).await.unwrap()
    }

    #[tokio::test]
    async fn test_memory_only_round_trip() {
        let cache = CacheHierarchyManager::memory_only(memory_config(10)).unwrap();

        assert!(cache.set("k", "v".to_string(), None).await);
        assert_eq!(cache.get("k").await, Some("v".to_string()));
        assert_eq!(cache.enabled_tiers(), vec![TierKind::Memory]);
    }

    #[tokio::test]
    async fn test_set_writes_all_tiers() {
        let temp_dir = TempDir::new().unwrap();
        let cache = create_two_tier(&temp_dir).await;

        cache.set("k", "v".to_string(), None).await;

        assert!(cache.memory_tier().contains("k"));
        assert!(cache.persistent_tier().unwrap().contains("k").await);
    }

    #[tokio::test]
    async fn test_promotion_on_hit() {
        let temp_dir = TempDir::new().unwrap();
        let cache = create_two_tier(&temp_dir).await;

        let persistent = cache.persistent_tier().unwrap();
        assert!(persistent.set("deep", "value".to_string(), None).await);
        assert!(!cache.memory_tier().contains("deep"));

        assert_eq!(cache.get("deep").await, Some("value".to_string()));
        assert!(cache.memory_tier().contains("deep"));

        let stats = cache.stats();
        assert_eq!(stats.counters.l3_hits, 1);
        assert_eq!(stats.counters.promotions, 1);
    }

    #[tokio::test]
    async fn test_promotion_disabled() {
        let temp_dir = TempDir::new().unwrap();
        let config = HierarchyConfig::default()
            .with_memory(memory_config(100))
            .with_persistent(PersistentTierConfig::new(temp_dir.path()))
            .with_promote_on_hit(false);
        let cache: CacheHierarchyManager<String> =
            CacheHierarchyManager::new(config, None).await.unwrap();

        cache
            .persistent_tier()
            .unwrap()
            .set("deep", "value".to_string(), None)
            .await;

        assert_eq!(cache.get("deep").await, Some("value".to_string()));
        assert!(!cache.memory_tier().contains("deep"));
        assert_eq!(cache.stats().counters.promotions, 0);
    }

    #[tokio::test]
    async fn test_network_tier_order_and_degradation() {
        let store = Arc::new(InMemorySharedStore::new());
        let config = HierarchyConfig::memory_only(memory_config(10)).with_network(
            crate::cache::config::NetworkTierConfig::new("localhost", 6379)
                .with_timeout(Duration::from_millis(100)),
        );
        let cache: CacheHierarchyManager<String> =
            CacheHierarchyManager::new(config, Some(store.clone()))
                .await
                .unwrap();
        assert_eq!(
            cache.enabled_tiers(),
            vec![TierKind::Memory, TierKind::Network]
        );

        store.set_online(false);
        assert!(cache.set("k", "v".to_string(), None).await);
        assert_eq!(cache.get("k").await, Some("v".to_string()));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_network_enabled_without_client_is_skipped() {
        let config = HierarchyConfig::memory_only(memory_config(10))
            .with_network(crate::cache::config::NetworkTierConfig::new("localhost", 6379));
        let cache: CacheHierarchyManager<String> =
            CacheHierarchyManager::new(config, None).await.unwrap();

        assert!(cache.network_tier().is_none());
    }

    #[tokio::test]
    async fn test_miss_counts() {
        let cache: CacheHierarchyManager<String> =
            CacheHierarchyManager::memory_only(memory_config(10)).unwrap();

        assert!(cache.get("nope").await.is_none());
        assert_eq!(cache.stats().counters.misses, 1);
    }

    #[tokio::test]
    async fn test_delete_and_clear_fan_out() {
        let temp_dir = TempDir::new().unwrap();
        let cache = create_two_tier(&temp_dir).await;

        cache.set("a", "1".to_string(), None).await;
        cache.set("b", "2".to_string(), None).await;

        assert!(cache.delete("a").await);
        assert!(!cache.contains("a").await);
        assert!(!cache.persistent_tier().unwrap().contains("a").await);

        assert!(cache.clear().await);
        assert!(!cache.contains("b").await);
    }

    #[tokio::test]
    async fn test_contains_checks_lower_tiers() {
        let temp_dir = TempDir::new().unwrap();
        let cache = create_two_tier(&temp_dir).await;

        cache
            .persistent_tier()
            .unwrap()
            .set("only-disk", "v".to_string(), None)
            .await;
        assert!(cache.contains("only-disk").await);
    }

    #[tokio::test]
    async fn test_get_or_set_computes_once() {
        let cache: CacheHierarchyManager<String> =
            CacheHierarchyManager::memory_only(memory_config(10)).unwrap();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value = cache
                .get_or_set(
                    "k",
                    || async {
                        calls.fetch_add(1, Ordering::SeqCst);
                        "computed".to_string()
                    },
                    None,
                )
                .await;
            assert_eq!(value, "computed");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_try_get_or_set_does_not_cache_errors() {
        let cache: CacheHierarchyManager<String> =
            CacheHierarchyManager::memory_only(memory_config(10)).unwrap();

        let result: Result<String, &str> = cache
            .try_get_or_set("k", || async { Err("recognition failed") }, None)
            .await;
        assert_eq!(result, Err("recognition failed"));
        assert!(!cache.contains("k").await);

        let result: Result<String, &str> = cache
            .try_get_or_set("k", || async { Ok("ok".to_string()) }, None)
            .await;
        assert_eq!(result, Ok("ok".to_string()));
        assert!(cache.contains("k").await);
    }

    #[tokio::test]
    async fn test_invalidate_pattern() {
        let temp_dir = TempDir::new().unwrap();
        let cache = create_two_tier(&temp_dir).await;

        cache.set("camera1:frame1", "a".to_string(), None).await;
        cache.set("camera1:frame2", "b".to_string(), None).await;
        cache.set("camera2:frame1", "c".to_string(), None).await;

        assert_eq!(cache.invalidate_pattern("camera1").await, 2);
        assert!(!cache.contains("camera1:frame1").await);
        assert!(!cache.contains("camera1:frame2").await);
        assert!(cache.contains("camera2:frame1").await);
    }

    #[tokio::test]
    async fn test_health_check_reports_all_tiers() {
        let temp_dir = TempDir::new().unwrap();
        let cache = create_two_tier(&temp_dir).await;
        cache.set("k", "v".to_string(), None).await;

        let health = cache.health_check().await;
        assert_eq!(health.len(), 3);
        assert_eq!(health[0].kind, TierKind::Memory);
        assert_eq!(health[0].size, 1);
        assert!(!health[1].enabled);
        assert!(health[2].enabled);
        assert!(health[2].connected);
        assert_eq!(health[2].size, 1);
    }

    #[tokio::test]
    async fn test_start_and_stop() {
        let temp_dir = TempDir::new().unwrap();
        let cache = create_two_tier(&temp_dir).await;

        cache.start();
        cache.start();
        assert!(cache.is_running());

        cache.stop().await;
        assert!(!cache.is_running());
    }

    #[tokio::test]
    async fn test_stats_format_lists_enabled_tiers() {
        let temp_dir = TempDir::new().unwrap();
        let cache = create_two_tier(&temp_dir).await;
        cache.set("k", "v".to_string(), None).await;
        cache.get("k").await;

        let stats = cache.stats();
        assert_eq!(stats.tiers.len(), 2);
        assert_eq!(stats.counters.l1_hits, 1);
        assert!(stats.format().contains("L3 (PERSISTENT)"));
    }
}
