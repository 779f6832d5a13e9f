//! Vision Cache - multi-tier artifact caching for vision pipelines
//!
//! Caches intermediate and final artifacts of an OCR pipeline across an
//! in-process memory tier, an optional shared network store and an on-disk
//! tier, with promotion of lower-tier hits and background expiry.
//!
//! # High-Level API
//!
//! - [`cache::CacheHierarchyManager`] for general artifacts
//! - [`result::ResultCache`] for OCR results, plate lookups and preprocessed
//!   images
//!
//! ```no_run
//! use vision_cache::result::{OcrResult, ResultCache, ResultCacheConfig};
//!
//! # async fn run() -> Result<(), vision_cache::cache::CacheError> {
//! let cache = ResultCache::new(ResultCacheConfig::default(), None).await?;
//! cache
//!     .cache_ocr_result("frame-001", OcrResult::new("ABC123", 0.97))
//!     .await;
//! let hit = cache.get_ocr_result("frame-001").await;
//! assert_eq!(hit.map(|r| r.text).as_deref(), Some("ABC123"));
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod logging;
pub mod result;

/// Version of the vision-cache library.
///
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use cache::{CacheError, CacheHierarchyManager, HierarchyConfig};
pub use config::CacheSettings;
pub use result::{ResultCache, ResultCacheConfig};
