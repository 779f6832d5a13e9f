//! OCR-specific caching policy.
//!
//! [`ResultCache`] gates recognition results on confidence, scales their
//! retention with it, and offers near-duplicate lookup for plate text.

mod cache;
mod config;
mod similarity;
mod types;

pub use cache::{confidence_ttl, ResultCache, ResultCacheStats, HIGH_CONFIDENCE, MEDIUM_CONFIDENCE};
pub use config::ResultCacheConfig;
pub use similarity::{char_set_similarity, normalize_plate};
pub use types::{OcrResult, PlateRecord, SimilarPlate};
