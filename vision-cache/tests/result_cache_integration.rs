//! Integration tests for the recognition result cache.
//!
//! Covers confidence gating, sharing results through the network tier,
//! restart behavior, plate similarity and configuration loading.

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use vision_cache::cache::{
    InMemorySharedStore, NetworkTierConfig, PersistentTierConfig, SharedStoreClient, TierKind,
};
use vision_cache::config::CacheSettings;
use vision_cache::result::{OcrResult, ResultCache, ResultCacheConfig};

// =============================================================================
// Test Helpers
// =============================================================================

fn local_config(temp_dir: &TempDir) -> ResultCacheConfig {
    ResultCacheConfig::default().with_cache_dir(temp_dir.path().to_path_buf())
}

fn shared_config(temp_dir: &TempDir) -> ResultCacheConfig {
    local_config(temp_dir).with_network(
        NetworkTierConfig::new("localhost", 6379)
            .with_timeout(Duration::from_millis(100))
            .with_key_prefix("test:ocr:"),
    )
}

// =============================================================================
// Confidence Gating
// =============================================================================

#[tokio::test]
async fn test_threshold_is_inclusive() {
    let temp_dir = TempDir::new().unwrap();
    let cache = ResultCache::new(local_config(&temp_dir), None).await.unwrap();

    assert!(cache.cache_ocr_result("at", OcrResult::new("AT", 0.8)).await);
    assert!(!cache.cache_ocr_result("below", OcrResult::new("BELOW", 0.79)).await);

    assert!(cache.get_ocr_result("at").await.is_some());
    assert!(cache.get_ocr_result("below").await.is_none());
    assert_eq!(cache.stats().low_confidence_rejections, 1);
}

#[tokio::test]
async fn test_custom_threshold() {
    let temp_dir = TempDir::new().unwrap();
    let config = local_config(&temp_dir).with_confidence_threshold(0.95);
    let cache = ResultCache::new(config, None).await.unwrap();

    assert!(!cache.cache_ocr_result("img", OcrResult::new("KA01", 0.9)).await);
    assert!(cache.cache_ocr_result("img", OcrResult::new("KA01", 0.96)).await);
}

#[tokio::test]
async fn test_invalid_config_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let config = local_config(&temp_dir).with_similarity_threshold(2.0);
    assert!(ResultCache::new(config, None).await.is_err());
}

// =============================================================================
// Sharing and Restarts
// =============================================================================

#[tokio::test]
async fn test_results_shared_through_network_tier() {
    let dir_a = TempDir::new().unwrap();
    let dir_b = TempDir::new().unwrap();
    let store = Arc::new(InMemorySharedStore::new());

    let camera_a = ResultCache::new(shared_config(&dir_a), Some(store.clone()))
        .await
        .unwrap();
    let camera_b = ResultCache::new(shared_config(&dir_b), Some(store.clone()))
        .await
        .unwrap();

    camera_a
        .cache_ocr_result("frame-9", OcrResult::new("MH12DE1433", 0.97))
        .await;
    assert_eq!(store.raw_keys(), vec!["test:ocr:frame-9"]);

    let result = camera_b.get_ocr_result("frame-9").await.unwrap();
    assert_eq!(result.text, "MH12DE1433");
    assert_eq!(result.access_count, 1);
    assert_eq!(camera_b.stats().promotions, 1);

    // Now served from memory without another promotion
    let again = camera_b.get_ocr_result("frame-9").await.unwrap();
    assert_eq!(again.access_count, 1);
    assert_eq!(camera_b.stats().promotions, 1);
}

#[tokio::test]
async fn test_offline_store_falls_back_to_disk() {
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(InMemorySharedStore::new());
    store.set_online(false);

    let cache = ResultCache::new(shared_config(&temp_dir), Some(store.clone()))
        .await
        .unwrap();

    assert!(cache
        .cache_ocr_result("frame-1", OcrResult::new("KA01", 0.9))
        .await);
    assert!(store.is_empty());

    let health = cache.health_check().await;
    assert_eq!(health.len(), 3);
    assert!(!health[1].connected);
    assert!(health[2].connected);
}

#[tokio::test]
async fn test_results_survive_restart() {
    let temp_dir = TempDir::new().unwrap();

    {
        let cache = ResultCache::new(local_config(&temp_dir), None).await.unwrap();
        cache.start();
        cache
            .cache_ocr_result("frame-1", OcrResult::new("KA01AB1234", 0.99))
            .await;
        cache.stop().await;
    }

    let cache = ResultCache::new(local_config(&temp_dir), None).await.unwrap();
    let result = cache.get_ocr_result("frame-1").await.unwrap();
    assert_eq!(result.text, "KA01AB1234");
    assert_eq!(result.confidence, 0.99);
    assert_eq!(result.access_count, 1);
}

#[tokio::test]
async fn test_memory_only_result_cache() {
    let mut config = ResultCacheConfig::default();
    config.persistent.enabled = false;
    let cache = ResultCache::new(config, None).await.unwrap();

    cache
        .cache_ocr_result("frame-1", OcrResult::new("KA01", 0.9))
        .await;
    assert!(cache.get_ocr_result("frame-1").await.is_some());

    let stats = cache.stats();
    assert_eq!(stats.ocr_tiers.len(), 1);
    assert_eq!(stats.ocr_tiers[0].0, TierKind::Memory);

    let health = cache.health_check().await;
    assert!(!health[1].enabled);
    assert!(!health[2].enabled);
}

// =============================================================================
// Plates
// =============================================================================

#[tokio::test]
async fn test_similar_plate_lookup() {
    let temp_dir = TempDir::new().unwrap();
    let cache = ResultCache::new(local_config(&temp_dir), None).await.unwrap();

    cache.cache_plate_text("ABC123", 0.9, None);
    cache.cache_plate_text("ABC128", 0.88, None);
    cache.cache_plate_text("ZZZ999", 0.95, None);

    let matches = cache.get_similar_plates_with("abc-123", 0.7);
    let texts: Vec<&str> = matches.iter().map(|m| m.text.as_str()).collect();
    assert_eq!(texts, vec!["ABC123", "ABC128"]);
    assert!((matches[1].similarity - 5.0 / 7.0).abs() < 1e-9);

    assert!(cache.get_similar_plates("").is_empty());
}

#[tokio::test]
async fn test_plate_capacity_bounds_lookup() {
    let temp_dir = TempDir::new().unwrap();
    let config = local_config(&temp_dir).with_max_plates(2);
    let cache = ResultCache::new(config, None).await.unwrap();

    cache.cache_plate_text("AAA111", 0.9, None);
    cache.cache_plate_text("BBB222", 0.9, None);
    cache.cache_plate_text("CCC333", 0.9, None);

    assert!(cache.get_similar_plates("AAA111").is_empty());
    assert_eq!(cache.get_similar_plates("CCC333").len(), 1);
    assert_eq!(cache.stats().plates.size, 2);
}

// =============================================================================
// Configuration
// =============================================================================

#[tokio::test]
async fn test_result_cache_from_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.ini");

    std::fs::write(
        &config_path,
        format!(
            "[network]\nenabled = true\nkey_prefix = site7:\n\n\
             [persistent]\ndirectory = {}\n\n\
             [result_cache]\nconfidence_threshold = 0.6\n",
            temp_dir.path().join("store").display()
        ),
    )
    .unwrap();

    let settings = CacheSettings::load_from(&config_path).unwrap();
    assert_eq!(
        settings.result_cache.persistent.directory,
        temp_dir.path().join("store").join("ocr-results")
    );

    let store = Arc::new(InMemorySharedStore::new());
    let client: Arc<dyn SharedStoreClient> = store.clone();
    let cache = ResultCache::new(settings.result_cache, Some(client))
        .await
        .unwrap();

    assert!(cache
        .cache_ocr_result("frame-1", OcrResult::new("KA01", 0.65))
        .await);
    assert_eq!(store.raw_keys(), vec!["site7:ocr:frame-1"]);
    assert!(temp_dir.path().join("store").join("ocr-results").is_dir());
}
