//! Cache entry: a value plus its expiry and access bookkeeping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A cached value with metadata.
///
/// The memory tier stores `CacheEntry<V>` directly. The persistent tier
/// stores `CacheEntry<StoredBlob>` in its metadata index, with the value
/// itself living in a separate file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<V> {
    /// Key the entry was stored under
    pub key: String,
    /// Cached value
    pub value: V,
    /// When the entry was created (or last replaced)
    pub created_at: DateTime<Utc>,
    /// Time-to-live; `None` means the entry never expires implicitly
    pub ttl: Option<Duration>,
    /// Number of successful reads
    pub access_count: u64,
    /// Time of the last successful read (creation time until first read)
    pub last_access_at: DateTime<Utc>,
}

impl<V> CacheEntry<V> {
    /// Create a new cache entry.
    pub fn new(key: impl Into<String>, value: V, ttl: Option<Duration>) -> Self {
        let now = Utc::now();
        Self {
            key: key.into(),
            value,
            created_at: now,
            ttl,
            access_count: 0,
            last_access_at: now,
        }
    }

    /// Age of the entry. Clock skew into the future counts as zero.
    pub fn age(&self) -> Duration {
        Utc::now()
            .signed_duration_since(self.created_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    /// True when a TTL is set and the entry is older than it.
    pub fn is_expired(&self) -> bool {
        match self.ttl {
            Some(ttl) => self.age() > ttl,
            None => false,
        }
    }

    /// Time left before expiry, `None` for entries without a TTL.
    pub fn remaining_ttl(&self) -> Option<Duration> {
        self.ttl.map(|ttl| ttl.saturating_sub(self.age()))
    }

    /// Update access time and increment access count.
    pub fn touch(&mut self) {
        self.access_count += 1;
        self.last_access_at = Utc::now();
    }
}
