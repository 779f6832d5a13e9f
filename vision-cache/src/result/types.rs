//! Values stored by the result cache.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Text recognized from one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrResult {
    pub text: String,
    /// Recognition confidence in `[0, 1]`
    pub confidence: f64,
    /// When recognition ran
    pub timestamp: DateTime<Utc>,
    /// Times the result was served from a slower tier
    pub access_count: u64,
}

impl OcrResult {
    /// Create a result stamped with the current time.
    pub fn new(text: impl Into<String>, confidence: f64) -> Self {
        Self {
            text: text.into(),
            confidence,
            timestamp: Utc::now(),
            access_count: 0,
        }
    }
}

/// Normalized plate text with caller-supplied metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateRecord {
    /// Normalized text (uppercase, separators removed)
    pub text: String,
    pub confidence: f64,
    pub metadata: HashMap<String, String>,
    pub cached_at: DateTime<Utc>,
}

/// One match returned by a similarity lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarPlate {
    pub text: String,
    /// Score in `[0, 1]`, 1.0 for identical character sets
    pub similarity: f64,
    pub record: PlateRecord,
}
