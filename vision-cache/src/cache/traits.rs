//! Tier trait definition for dependency injection.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use crate::cache::stats::TierMetrics;
use crate::cache::types::TierKind;

/// Boxed future returned by tier operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Bounds every cached value type must satisfy.
///
/// Values are cloned between tiers (each tier owns its own copy) and
/// serialized by the tiers that store bytes.
pub trait CacheValue: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}

impl<T> CacheValue for T where T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}

/// Point-in-time status of one tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierHealth {
    pub kind: TierKind,
    pub enabled: bool,
    /// Connected (network) or directory reachable (persistent); always true for memory
    pub connected: bool,
    pub size: usize,
}

/// Common contract of the memory, network and persistent tiers.
///
/// Operations are total: failures are logged by the tier and reported as
/// a miss or `false`.
pub trait CacheTier<V: CacheValue>: Send + Sync {
    /// Which tier this is.
    fn kind(&self) -> TierKind;

    /// Get a value; `None` on miss, expiry, or failure.
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Option<V>>;

    /// Store a value. `ttl = None` uses the tier's default TTL.
    fn set<'a>(&'a self, key: &'a str, value: V, ttl: Option<Duration>) -> BoxFuture<'a, bool>;

    /// Remove a value. Returns true if the key was present.
    fn delete<'a>(&'a self, key: &'a str) -> BoxFuture<'a, bool>;

    /// Remove every entry owned by this tier.
    fn clear(&self) -> BoxFuture<'_, bool>;

    /// True if a live (unexpired) entry exists.
    fn contains<'a>(&'a self, key: &'a str) -> BoxFuture<'a, bool>;

    /// Snapshot of this tier's counters.
    fn metrics(&self) -> TierMetrics;

    /// Status report; must not mutate cached data.
    fn health(&self) -> BoxFuture<'_, TierHealth>;
}
