//! Result cache configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::cache::{
    CacheError, MemoryTierConfig, NetworkTierConfig, PersistentTierConfig, DEFAULT_KEY_NAMESPACE,
    OCR_RESULT_KEY_SUFFIX,
};

pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.8;
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.9;
pub const DEFAULT_PLATE_TTL_SECS: u64 = 3600;
pub const DEFAULT_PREPROCESSING_TTL_SECS: u64 = 600;
pub const DEFAULT_WARMUP_CONFIDENCE: f64 = 0.9;
pub const DEFAULT_MAX_PLATES: usize = 1000;
pub const DEFAULT_MAX_PREPROCESSED: usize = 500;

/// Configuration for [`ResultCache`](super::ResultCache).
#[derive(Debug, Clone)]
pub struct ResultCacheConfig {
    /// Results below this confidence are never cached
    pub confidence_threshold: f64,
    /// Minimum score returned by similar-plate lookups
    pub similarity_threshold: f64,
    pub plate_ttl: Duration,
    pub preprocessing_ttl: Duration,
    /// Confidence recorded for plates added by warmup
    pub warmup_confidence: f64,
    /// Upper bound on held plates, and so on the similarity scan
    pub max_plates: usize,
    pub max_preprocessed: usize,
    /// OCR result memory tier
    pub memory: MemoryTierConfig,
    /// OCR result network tier (used only with a shared store client)
    pub network: NetworkTierConfig,
    /// OCR result persistent tier
    pub persistent: PersistentTierConfig,
}

impl Default for ResultCacheConfig {
    fn default() -> Self {
        let persistent = PersistentTierConfig::default();
        let directory = persistent.directory.join("ocr-results");

        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            plate_ttl: Duration::from_secs(DEFAULT_PLATE_TTL_SECS),
            preprocessing_ttl: Duration::from_secs(DEFAULT_PREPROCESSING_TTL_SECS),
            warmup_confidence: DEFAULT_WARMUP_CONFIDENCE,
            max_plates: DEFAULT_MAX_PLATES,
            max_preprocessed: DEFAULT_MAX_PREPROCESSED,
            memory: MemoryTierConfig::default(),
            network: NetworkTierConfig::default()
                .with_key_prefix(format!("{DEFAULT_KEY_NAMESPACE}{OCR_RESULT_KEY_SUFFIX}")),
            persistent: PersistentTierConfig {
                directory,
                ..persistent
            },
        }
    }
}

impl ResultCacheConfig {
    pub fn with_confidence_threshold(mut self, threshold: f64) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    pub fn with_similarity_threshold(mut self, threshold: f64) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    pub fn with_max_plates(mut self, max_plates: usize) -> Self {
        self.max_plates = max_plates;
        self
    }

    pub fn with_memory(mut self, memory: MemoryTierConfig) -> Self {
        self.memory = memory;
        self
    }

    pub fn with_network(mut self, network: NetworkTierConfig) -> Self {
        self.network = network;
        self
    }

    pub fn with_persistent(mut self, persistent: PersistentTierConfig) -> Self {
        self.persistent = persistent;
        self
    }

    /// Set the persistent directory for OCR results.
    pub fn with_cache_dir(mut self, dir: PathBuf) -> Self {
        self.persistent.directory = dir;
        self
    }

    /// Check thresholds and capacities.
    pub fn validate(&self) -> Result<(), CacheError> {
        for (name, value) in [
            ("confidence_threshold", self.confidence_threshold),
            ("similarity_threshold", self.similarity_threshold),
            ("warmup_confidence", self.warmup_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(CacheError::InvalidConfig(format!(
                    "{} must be between 0 and 1, got {}",
                    name, value
                )));
            }
        }

        if self.max_plates == 0 || self.max_preprocessed == 0 {
            return Err(CacheError::InvalidConfig(
                "max_plates and max_preprocessed must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ResultCacheConfig::default();
        assert_eq!(config.confidence_threshold, 0.8);
        assert_eq!(config.similarity_threshold, 0.9);
        assert_eq!(config.plate_ttl, Duration::from_secs(3600));
        assert_eq!(config.preprocessing_ttl, Duration::from_secs(600));
        assert_eq!(config.max_plates, 1000);
        assert!(config.persistent.directory.ends_with("ocr-results"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range_threshold() {
        let config = ResultCacheConfig::default().with_confidence_threshold(1.5);
        assert!(matches!(
            config.validate(),
            Err(CacheError::InvalidConfig(_))
        ));

        let config = ResultCacheConfig::default().with_similarity_threshold(f64::NAN);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_plates() {
        let config = ResultCacheConfig::default().with_max_plates(0);
        assert!(config.validate().is_err());
    }
}
