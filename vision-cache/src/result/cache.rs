//! Recognition result cache.
//!
//! Policy layer for the vision pipeline on top of the cache tiers:
//!
//! - OCR results are cached only above a confidence threshold, with a TTL
//!   that grows with confidence; the persistent copy lives twice as long
//! - Plate texts are normalized and can be looked up by character-set
//!   similarity
//! - Preprocessed images are cached briefly, in memory only

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::config::ResultCacheConfig;
use super::similarity::{char_set_similarity, normalize_plate};
use super::types::{OcrResult, PlateRecord, SimilarPlate};
use crate::cache::maintenance::{Maintainable, MaintenanceDaemon, DEFAULT_SHUTDOWN_TIMEOUT};
use crate::cache::{
    CacheError, CacheTier, MemoryTier, MemoryTierConfig, NetworkTier, PersistentTier,
    SharedStoreClient, TierHealth, TierKind, TierMetrics,
};

/// Confidence at or above which results get the longest TTL.
pub const HIGH_CONFIDENCE: f64 = 0.95;
/// Confidence at or above which results get the medium TTL.
pub const MEDIUM_CONFIDENCE: f64 = 0.85;

const HIGH_CONFIDENCE_TTL: Duration = Duration::from_secs(1800);
const MEDIUM_CONFIDENCE_TTL: Duration = Duration::from_secs(900);
const LOW_CONFIDENCE_TTL: Duration = Duration::from_secs(300);

/// TTL for an OCR result in the memory and network tiers.
pub fn confidence_ttl(confidence: f64) -> Duration {
    if confidence >= HIGH_CONFIDENCE {
        HIGH_CONFIDENCE_TTL
    } else if confidence >= MEDIUM_CONFIDENCE {
        MEDIUM_CONFIDENCE_TTL
    } else {
        LOW_CONFIDENCE_TTL
    }
}

/// Statistics snapshot for the result cache.
#[derive(Debug, Clone)]
pub struct ResultCacheStats {
    /// OCR result tiers, in lookup order
    pub ocr_tiers: Vec<(TierKind, TierMetrics)>,
    pub plates: TierMetrics,
    pub preprocessing: TierMetrics,
    /// Results refused for low confidence
    pub low_confidence_rejections: u64,
    /// OCR results served from a slower tier and copied into memory
    pub promotions: u64,
}

impl ResultCacheStats {
    /// Format statistics as a human-readable string.
    pub fn format(&self) -> String {
        let mut out = String::from("Result Cache Statistics\n");

        for (kind, m) in &self.ocr_tiers {
            out.push_str(&format!(
                "  OCR {:<16} entries={} hits={} misses={} hit_rate={:.1}%\n",
                kind.to_string(),
                m.size,
                m.hits,
                m.misses,
                m.hit_rate() * 100.0
            ));
        }

        out.push_str(&format!(
            "  Plates               entries={} hits={} misses={}\n",
            self.plates.size, self.plates.hits, self.plates.misses
        ));
        out.push_str(&format!(
            "  Preprocessing        entries={} hits={} misses={}\n",
            self.preprocessing.size, self.preprocessing.hits, self.preprocessing.misses
        ));
        out.push_str(&format!(
            "  Rejected (low conf): {}\n  Promotions:          {}\n",
            self.low_confidence_rejections, self.promotions
        ));

        out
    }
}

/// Cache for recognition results, plate texts and preprocessed images.
pub struct ResultCache {
    config: ResultCacheConfig,
    ocr_memory: Arc<MemoryTier<OcrResult>>,
    ocr_network: Option<Arc<NetworkTier<OcrResult>>>,
    ocr_persistent: Option<Arc<PersistentTier<OcrResult>>>,
    plates: Arc<MemoryTier<PlateRecord>>,
    preprocessed: Arc<MemoryTier<Vec<u8>>>,
    low_confidence_rejections: AtomicU64,
    promotions: AtomicU64,
    daemon: Mutex<Option<MaintenanceDaemon>>,
}

impl ResultCache {
    /// Build the result cache.
    ///
    /// The network tier is created only when `config.network.enabled` is
    /// set and a shared store client is supplied; the persistent tier only
    /// when `config.persistent.enabled` is set.
    ///
    /// # Errors
    ///
    /// Invalid thresholds or capacities, or an unusable persistent directory.
    pub async fn new(
        config: ResultCacheConfig,
        shared_store: Option<Arc<dyn SharedStoreClient>>,
    ) -> Result<Self, CacheError> {
        config.validate()?;

        let ocr_memory = Arc::new(MemoryTier::new(config.memory.clone())?);
        let plates = Arc::new(MemoryTier::new(
            MemoryTierConfig::default()
                .with_max_size(config.max_plates)
                .with_default_ttl(Some(config.plate_ttl)),
        )?);
        let preprocessed = Arc::new(MemoryTier::new(
            MemoryTierConfig::default()
                .with_max_size(config.max_preprocessed)
                .with_default_ttl(Some(config.preprocessing_ttl)),
        )?);

        let ocr_network = match shared_store {
            Some(client) if config.network.enabled => {
                Some(Arc::new(NetworkTier::new(client, config.network.clone())))
            }
            _ => None,
        };

        let ocr_persistent = if config.persistent.enabled {
            Some(Arc::new(
                PersistentTier::open(config.persistent.clone()).await?,
            ))
        } else {
            None
        };

        info!(
            confidence_threshold = config.confidence_threshold,
            similarity_threshold = config.similarity_threshold,
            network = ocr_network.is_some(),
            persistent = ocr_persistent.is_some(),
            "Result cache initialized"
        );

        Ok(Self {
            config,
            ocr_memory,
            ocr_network,
            ocr_persistent,
            plates,
            preprocessed,
            low_confidence_rejections: AtomicU64::new(0),
            promotions: AtomicU64::new(0),
            daemon: Mutex::new(None),
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &ResultCacheConfig {
        &self.config
    }

    /// Cache an OCR result for an image.
    ///
    /// Returns `false` without caching when the confidence lies outside
    /// `[0, 1]` or below the threshold.
    pub async fn cache_ocr_result(&self, image_key: &str, result: OcrResult) -> bool {
        if !(0.0..=1.0).contains(&result.confidence) {
            debug!(
                image_key = image_key,
                confidence = result.confidence,
                "OCR confidence out of range, not caching"
            );
            self.low_confidence_rejections
                .fetch_add(1, Ordering::Relaxed);
            return false;
        }

        if result.confidence < self.config.confidence_threshold {
            debug!(
                image_key = image_key,
                confidence = result.confidence,
                threshold = self.config.confidence_threshold,
                "OCR result below confidence threshold, not caching"
            );
            self.low_confidence_rejections
                .fetch_add(1, Ordering::Relaxed);
            return false;
        }

        let ttl = confidence_ttl(result.confidence);
        let stored = self.ocr_memory.set(image_key, result.clone(), Some(ttl));

        let network = async {
            match &self.ocr_network {
                Some(tier) => tier.set(image_key, result.clone(), Some(ttl)).await,
                None => true,
            }
        };
        let persistent = async {
            match &self.ocr_persistent {
                Some(tier) => tier.set(image_key, result.clone(), Some(ttl * 2)).await,
                None => true,
            }
        };
        let (network_ok, persistent_ok) = tokio::join!(network, persistent);

        if !network_ok || !persistent_ok {
            debug!(
                image_key = image_key,
                network_ok, persistent_ok, "OCR result not stored in every tier"
            );
        }

        stored
    }

    /// Look up the OCR result for an image.
    ///
    /// A hit in a slower tier increments the result's access count and
    /// copies it back into memory.
    pub async fn get_ocr_result(&self, image_key: &str) -> Option<OcrResult> {
        if let Some(result) = self.ocr_memory.get(image_key) {
            return Some(result);
        }

        let mut found = None;
        if let Some(tier) = &self.ocr_network {
            found = tier.get(image_key).await;
        }
        if found.is_none() {
            if let Some(tier) = &self.ocr_persistent {
                found = tier.get(image_key).await;
            }
        }

        let mut result = found?;
        result.access_count += 1;
        self.ocr_memory.set(
            image_key,
            result.clone(),
            Some(confidence_ttl(result.confidence)),
        );
        self.promotions.fetch_add(1, Ordering::Relaxed);
        debug!(image_key = image_key, "Promoted OCR result to memory");

        Some(result)
    }

    /// Store normalized plate text.
    ///
    /// Returns `false` if nothing remains after normalization or the
    /// confidence is not finite.
    pub fn cache_plate_text(
        &self,
        text: &str,
        confidence: f64,
        metadata: Option<HashMap<String, String>>,
    ) -> bool {
        let normalized = normalize_plate(text);
        if normalized.is_empty() || !confidence.is_finite() {
            debug!(text = text, "Ignoring unusable plate text");
            return false;
        }

        let record = PlateRecord {
            text: normalized.clone(),
            confidence,
            metadata: metadata.unwrap_or_default(),
            cached_at: Utc::now(),
        };
        self.plates
            .set(&normalized, record, Some(self.config.plate_ttl))
    }

    /// Plates similar to `text` at or above the configured threshold.
    pub fn get_similar_plates(&self, text: &str) -> Vec<SimilarPlate> {
        self.get_similar_plates_with(text, self.config.similarity_threshold)
    }

    /// Plates similar to `text` at or above `threshold`.
    ///
    /// Scans every held plate (at most `max_plates`). Results are sorted by
    /// descending similarity, ties broken by text.
    pub fn get_similar_plates_with(&self, text: &str, threshold: f64) -> Vec<SimilarPlate> {
        let query = normalize_plate(text);
        if query.is_empty() {
            return Vec::new();
        }

        let mut matches: Vec<SimilarPlate> = self
            .plates
            .snapshot()
            .into_iter()
            .filter_map(|(plate, record)| {
                let similarity = char_set_similarity(&query, &plate);
                (similarity >= threshold).then_some(SimilarPlate {
                    text: plate,
                    similarity,
                    record,
                })
            })
            .collect();

        matches.sort_by(|a, b| {
            b.similarity
                .total_cmp(&a.similarity)
                .then_with(|| a.text.cmp(&b.text))
        });
        matches
    }

    /// Cache a preprocessed image (memory only, short TTL).
    pub fn cache_image_preprocessing(&self, image_key: &str, artifact: Vec<u8>) -> bool {
        self.preprocessed
            .set(image_key, artifact, Some(self.config.preprocessing_ttl))
    }

    /// Get a preprocessed image.
    pub fn get_preprocessed_image(&self, image_key: &str) -> Option<Vec<u8>> {
        self.preprocessed.get(image_key)
    }

    /// Pre-populate plate entries for commonly seen texts.
    ///
    /// Returns the number of plates stored.
    pub fn warmup_cache<I, S>(&self, known_texts: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let metadata: HashMap<String, String> =
            [("source".to_string(), "warmup".to_string())].into();

        let stored = known_texts
            .into_iter()
            .filter(|text| {
                self.cache_plate_text(
                    text.as_ref(),
                    self.config.warmup_confidence,
                    Some(metadata.clone()),
                )
            })
            .count();

        info!(plates = stored, "Result cache warmed up");
        stored
    }

    /// Drop everything cached for one image. Returns true if anything was removed.
    pub async fn invalidate_image(&self, image_key: &str) -> bool {
        let mut removed = self.ocr_memory.delete(image_key);
        removed |= self.preprocessed.delete(image_key);

        if let Some(tier) = &self.ocr_network {
            removed |= tier.delete(image_key).await;
        }
        if let Some(tier) = &self.ocr_persistent {
            removed |= tier.delete(image_key).await;
        }

        removed
    }

    /// Remove all results, plates and preprocessed images.
    pub async fn clear(&self) -> bool {
        let mut cleared = self.ocr_memory.clear();
        cleared &= self.plates.clear();
        cleared &= self.preprocessed.clear();

        if let Some(tier) = &self.ocr_network {
            if !tier.clear().await {
                warn!("Failed to clear network OCR results");
            }
        }
        if let Some(tier) = &self.ocr_persistent {
            cleared &= tier.clear().await;
        }

        cleared
    }

    /// Snapshot of per-store statistics.
    pub fn stats(&self) -> ResultCacheStats {
        let mut ocr_tiers = vec![(TierKind::Memory, self.ocr_memory.stats())];
        if let Some(tier) = &self.ocr_network {
            ocr_tiers.push((TierKind::Network, tier.stats()));
        }
        if let Some(tier) = &self.ocr_persistent {
            ocr_tiers.push((TierKind::Persistent, tier.stats()));
        }

        ResultCacheStats {
            ocr_tiers,
            plates: self.plates.stats(),
            preprocessing: self.preprocessed.stats(),
            low_confidence_rejections: self.low_confidence_rejections.load(Ordering::Relaxed),
            promotions: self.promotions.load(Ordering::Relaxed),
        }
    }

    /// Health of the OCR result tiers; disabled tiers report `enabled: false`.
    pub async fn health_check(&self) -> Vec<TierHealth> {
        let disabled = |kind| TierHealth {
            kind,
            enabled: false,
            connected: false,
            size: 0,
        };

        let network = match &self.ocr_network {
            Some(tier) => CacheTier::health(tier.as_ref()).await,
            None => disabled(TierKind::Network),
        };
        let persistent = match &self.ocr_persistent {
            Some(tier) => CacheTier::health(tier.as_ref()).await,
            None => disabled(TierKind::Persistent),
        };

        vec![
            CacheTier::health(self.ocr_memory.as_ref()).await,
            network,
            persistent,
        ]
    }

    /// Start background expiry sweeps. Must be called within a tokio runtime.
    pub fn start(&self) {
        let mut daemon = self.daemon.lock();
        if daemon.is_some() {
            return;
        }

        let maintenance = MaintenanceDaemon::new(DEFAULT_SHUTDOWN_TIMEOUT);
        maintenance.spawn(self.ocr_memory.clone() as Arc<dyn Maintainable>);
        maintenance.spawn(self.plates.clone() as Arc<dyn Maintainable>);
        maintenance.spawn(self.preprocessed.clone() as Arc<dyn Maintainable>);
        if let Some(tier) = &self.ocr_persistent {
            maintenance.spawn(tier.clone() as Arc<dyn Maintainable>);
        }

        *daemon = Some(maintenance);
        info!("Result cache maintenance started");
    }

    /// Stop background sweeps and flush the persistent index.
    pub async fn stop(&self) {
        let daemon = self.daemon.lock().take();
        if let Some(daemon) = daemon {
            daemon.stop().await;
        }

        if let Some(tier) = &self.ocr_persistent {
            if !tier.flush().await {
                warn!("Failed to flush OCR result index during shutdown");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{InMemorySharedStore, NetworkTierConfig, PersistentTierConfig};
    use tempfile::TempDir;

    async fn create_test_cache(temp_dir: &TempDir) -> ResultCache {
        let config =
            ResultCacheConfig::default().with_cache_dir(temp_dir.path().to_path_buf());
        ResultCache::new(config, None).await.unwrap()
    }

    #[test]
    fn test_confidence_ttl_tiers() {
        assert_eq!(confidence_ttl(0.99), Duration::from_secs(1800));
        assert_eq!(confidence_ttl(0.95), Duration::from_secs(1800));
        assert_eq!(confidence_ttl(0.9), Duration::from_secs(900));
        assert_eq!(confidence_ttl(0.85), Duration::from_secs(900));
        assert_eq!(confidence_ttl(0.8), Duration::from_secs(300));
    }

    #[tokio::test]
    async fn test_ocr_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let cache = create_test_cache(&temp_dir).await;

        assert!(cache
            .cache_ocr_result("img1", OcrResult::new("KA01AB1234", 0.92))
            .await);
        let result = cache.get_ocr_result("img1").await.unwrap();
        assert_eq!(result.text, "KA01AB1234");
        assert_eq!(result.access_count, 0);
    }

    #[tokio::test]
    async fn test_low_confidence_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let cache = create_test_cache(&temp_dir).await;

        assert!(!cache
            .cache_ocr_result("img1", OcrResult::new("???", 0.5))
            .await);
        assert!(cache.get_ocr_result("img1").await.is_none());
        assert_eq!(cache.stats().low_confidence_rejections, 1);
    }

    #[tokio::test]
    async fn test_non_finite_confidence_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let cache = create_test_cache(&temp_dir).await;

        assert!(!cache
            .cache_ocr_result("img1", OcrResult::new("X", f64::NAN))
            .await);
    }

    #[tokio::test]
    async fn test_out_of_range_confidence_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let cache = create_test_cache(&temp_dir).await;

        assert!(!cache
            .cache_ocr_result("over", OcrResult::new("X", 1.5))
            .await);
        assert!(!cache
            .cache_ocr_result("under", OcrResult::new("X", -0.1))
            .await);
        assert!(cache
            .cache_ocr_result("edge", OcrResult::new("X", 1.0))
            .await);

        assert!(cache.get_ocr_result("over").await.is_none());
        assert!(cache.get_ocr_result("under").await.is_none());
        assert_eq!(cache.stats().low_confidence_rejections, 2);
    }

    #[tokio::test]
    async fn test_memory_ttl_follows_confidence() {
        let temp_dir = TempDir::new().unwrap();
        let cache = create_test_cache(&temp_dir).await;

        cache
            .cache_ocr_result("high", OcrResult::new("A", 0.97))
            .await;
        cache
            .cache_ocr_result("low", OcrResult::new("B", 0.81))
            .await;

        let high = cache.ocr_memory.remaining_ttl("high").unwrap();
        let low = cache.ocr_memory.remaining_ttl("low").unwrap();
        assert!(high > Duration::from_secs(1700));
        assert!(low <= Duration::from_secs(300));
    }

    #[tokio::test]
    async fn test_persistent_hit_promotes_and_counts_access() {
        let temp_dir = TempDir::new().unwrap();
        let cache = create_test_cache(&temp_dir).await;

        cache
            .cache_ocr_result("img1", OcrResult::new("KA01", 0.9))
            .await;
        cache.ocr_memory.clear();

        let result = cache.get_ocr_result("img1").await.unwrap();
        assert_eq!(result.access_count, 1);
        assert!(cache.ocr_memory.contains("img1"));
        assert_eq!(cache.stats().promotions, 1);
    }

    #[tokio::test]
    async fn test_network_tier_used_when_supplied() {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(InMemorySharedStore::new());
        let config = ResultCacheConfig::default()
            .with_network(NetworkTierConfig::new("localhost", 6379).with_key_prefix("ocr:"))
            .with_persistent(PersistentTierConfig::new(temp_dir.path()));
        let cache = ResultCache::new(config, Some(store.clone())).await.unwrap();

        cache
            .cache_ocr_result("img1", OcrResult::new("KA01", 0.96))
            .await;
        assert_eq!(store.raw_keys(), vec!["ocr:img1"]);

        let health = cache.health_check().await;
        assert!(health.iter().all(|h| h.enabled));
    }

    #[tokio::test]
    async fn test_lower_tier_ttls_follow_confidence() {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(InMemorySharedStore::new());
        let config = ResultCacheConfig::default()
            .with_network(NetworkTierConfig::new("localhost", 6379).with_key_prefix("ocr:"))
            .with_persistent(PersistentTierConfig::new(temp_dir.path()));
        let cache = ResultCache::new(config, Some(store.clone())).await.unwrap();

        assert!(cache
            .cache_ocr_result("img1", OcrResult::new("KA01", 0.97))
            .await);

        let network = cache.ocr_network.as_ref().unwrap();
        let remaining = network.remaining_ttl("img1").await.unwrap();
        assert!(remaining > Duration::from_secs(1790));
        assert!(remaining <= Duration::from_secs(1800));

        // Disk keeps results twice as long as the faster tiers
        assert!(cache.ocr_persistent.as_ref().unwrap().flush().await);
        let index = std::fs::read(temp_dir.path().join("index.json")).unwrap();
        let records: Vec<crate::cache::CacheEntry<crate::cache::StoredBlob>> =
            serde_json::from_slice(&index).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].key, "img1");
        assert_eq!(records[0].ttl, Some(Duration::from_secs(3600)));
    }

    #[tokio::test]
    async fn test_similar_plates_scenario() {
        let temp_dir = TempDir::new().unwrap();
        let cache = create_test_cache(&temp_dir).await;

        assert!(cache.cache_plate_text("ABC123", 0.9, None));
        assert!(cache.cache_plate_text("ABC128", 0.9, None));

        let matches = cache.get_similar_plates_with("ABC123", 0.7);
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].text, "ABC123");
        assert_eq!(matches[0].similarity, 1.0);
        assert_eq!(matches[1].text, "ABC128");
    }

    #[tokio::test]
    async fn test_similar_plates_default_threshold_filters() {
        let temp_dir = TempDir::new().unwrap();
        let cache = create_test_cache(&temp_dir).await;

        cache.cache_plate_text("ABC123", 0.9, None);
        cache.cache_plate_text("ABC128", 0.9, None);

        let matches = cache.get_similar_plates("abc 123");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].text, "ABC123");
    }

    #[tokio::test]
    async fn test_plate_text_is_normalized_with_metadata() {
        let temp_dir = TempDir::new().unwrap();
        let cache = create_test_cache(&temp_dir).await;

        let metadata: HashMap<String, String> =
            [("camera".to_string(), "gate-1".to_string())].into();
        assert!(cache.cache_plate_text("ka-01 ab 1234", 0.93, Some(metadata)));
        assert!(!cache.cache_plate_text(" - ", 0.93, None));

        let matches = cache.get_similar_plates("KA01AB1234");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].record.text, "KA01AB1234");
        assert_eq!(matches[0].record.metadata["camera"], "gate-1");
    }

    #[tokio::test]
    async fn test_preprocessing_cache() {
        let temp_dir = TempDir::new().unwrap();
        let cache = create_test_cache(&temp_dir).await;

        assert!(cache.cache_image_preprocessing("img1", vec![0, 1, 2]));
        assert_eq!(cache.get_preprocessed_image("img1"), Some(vec![0, 1, 2]));
        assert!(cache.get_preprocessed_image("img2").is_none());

        let remaining = cache.preprocessed.remaining_ttl("img1").unwrap();
        assert!(remaining <= Duration::from_secs(600));
    }

    #[tokio::test]
    async fn test_warmup() {
        let temp_dir = TempDir::new().unwrap();
        let cache = create_test_cache(&temp_dir).await;

        assert_eq!(cache.warmup_cache(["ABC123", "XYZ789", ""]), 2);

        let matches = cache.get_similar_plates("XYZ789");
        assert_eq!(matches[0].record.confidence, 0.9);
        assert_eq!(matches[0].record.metadata["source"], "warmup");
    }

    #[tokio::test]
    async fn test_invalidate_image() {
        let temp_dir = TempDir::new().unwrap();
        let cache = create_test_cache(&temp_dir).await;

        cache
            .cache_ocr_result("img1", OcrResult::new("KA01", 0.9))
            .await;
        cache.cache_image_preprocessing("img1", vec![1]);

        assert!(cache.invalidate_image("img1").await);
        assert!(cache.get_ocr_result("img1").await.is_none());
        assert!(cache.get_preprocessed_image("img1").is_none());
        assert!(!cache.invalidate_image("img1").await);
    }

    #[tokio::test]
    async fn test_clear() {
        let temp_dir = TempDir::new().unwrap();
        let cache = create_test_cache(&temp_dir).await;

        cache
            .cache_ocr_result("img1", OcrResult::new("KA01", 0.9))
            .await;
        cache.cache_plate_text("ABC123", 0.9, None);

        assert!(cache.clear().await);
        assert!(cache.get_ocr_result("img1").await.is_none());
        assert!(cache.get_similar_plates("ABC123").is_empty());
    }

    #[tokio::test]
    async fn test_start_stop_and_stats_format() {
        let temp_dir = TempDir::new().unwrap();
        let cache = create_test_cache(&temp_dir).await;

        cache.start();
        cache
            .cache_ocr_result("img1", OcrResult::new("KA01", 0.9))
            .await;
        cache.get_ocr_result("img1").await;
        cache.stop().await;

        let formatted = cache.stats().format();
        assert!(formatted.contains("Result Cache Statistics"));
        assert!(formatted.contains("L1 (memory)"));
    }
}
