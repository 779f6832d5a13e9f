//! Network-shared cache tier (L2).
//!
//! A thin adapter over a [`SharedStoreClient`]. The tier connects lazily,
//! bounds every remote call with the configured operation timeout, and
//! degrades to a disconnected state on any transport failure. While
//! disconnected, reads miss and writes report `false`; the next call tries
//! to reconnect.

mod client;
mod memory_store;

pub use client::{SharedStoreClient, SharedStoreError};
pub use memory_store::InMemorySharedStore;

use std::collections::HashMap;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::cache::config::NetworkTierConfig;
use crate::cache::stats::TierMetrics;
use crate::cache::traits::{BoxFuture, CacheTier, CacheValue, TierHealth};
use crate::cache::types::{CacheError, TierKind};

/// Cache tier backed by a shared store.
pub struct NetworkTier<V> {
    client: Arc<dyn SharedStoreClient>,
    config: NetworkTierConfig,
    connected: AtomicBool,
    stats: Mutex<TierMetrics>,
    _value: PhantomData<fn() -> V>,
}

impl<V: CacheValue> NetworkTier<V> {
    /// Create a tier over `client`. No connection is made until first use.
    pub fn new(client: Arc<dyn SharedStoreClient>, config: NetworkTierConfig) -> Self {
        Self {
            client,
            config,
            connected: AtomicBool::new(false),
            stats: Mutex::new(TierMetrics::new()),
            _value: PhantomData,
        }
    }

    /// True while the last remote call succeeded.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Force the disconnected state. The next operation reconnects.
    pub fn mark_disconnected(&self) {
        if self.connected.swap(false, Ordering::SeqCst) {
            info!(endpoint = %self.config.endpoint(), "Network cache tier disconnected");
        }
    }

    /// Get a value.
    pub async fn get(&self, key: &str) -> Option<V> {
        if !self.ensure_connected().await {
            self.stats.lock().record_miss();
            return None;
        }

        let remote_key = self.remote_key(key);
        match self.call(self.client.get(&remote_key)).await {
            Ok(Some(bytes)) => match self.config.serialization_format.decode::<V>(&bytes) {
                Ok(value) => {
                    self.stats.lock().record_hit();
                    Some(value)
                }
                Err(e) => {
                    warn!(key = key, error = %e, "Failed to decode network cache value");
                    let mut stats = self.stats.lock();
                    stats.record_miss();
                    stats.record_error();
                    None
                }
            },
            Ok(None) => {
                self.stats.lock().record_miss();
                None
            }
            Err(e) => {
                warn!(key = key, error = %e, "Network cache get failed");
                let mut stats = self.stats.lock();
                stats.record_miss();
                stats.record_error();
                None
            }
        }
    }

    /// Store a value. `ttl = None` uses the configured default TTL.
    pub async fn set(&self, key: &str, value: V, ttl: Option<Duration>) -> bool {
        if !self.ensure_connected().await {
            return false;
        }

        let bytes = match self.config.serialization_format.encode(&value) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(key = key, error = %e, "Failed to encode value for network tier");
                self.stats.lock().record_error();
                return false;
            }
        };

        let remote_key = self.remote_key(key);
        let ttl = ttl.or(self.config.default_ttl);
        match self.call(self.client.set(&remote_key, bytes, ttl)).await {
            Ok(()) => {
                self.stats.lock().record_set();
                true
            }
            Err(e) => {
                warn!(key = key, error = %e, "Network cache set failed");
                self.stats.lock().record_error();
                false
            }
        }
    }

    /// Remove a value. Returns true if the store held it.
    pub async fn delete(&self, key: &str) -> bool {
        if !self.ensure_connected().await {
            return false;
        }

        let remote_key = self.remote_key(key);
        match self.call(self.client.delete(&remote_key)).await {
            Ok(existed) => {
                if existed {
                    self.stats.lock().record_delete();
                }
                existed
            }
            Err(e) => {
                warn!(key = key, error = %e, "Network cache delete failed");
                self.stats.lock().record_error();
                false
            }
        }
    }

    /// Remove every key under this tier's prefix.
    pub async fn clear(&self) -> bool {
        if !self.ensure_connected().await {
            return false;
        }

        let keys = match self.call(self.client.keys(&self.config.key_prefix)).await {
            Ok(keys) => keys,
            Err(e) => {
                warn!(error = %e, "Network cache clear failed to list keys");
                self.stats.lock().record_error();
                return false;
            }
        };

        for key in &keys {
            if let Err(e) = self.call(self.client.delete(key)).await {
                warn!(key = %key, error = %e, "Network cache clear failed");
                self.stats.lock().record_error();
                return false;
            }
        }

        debug!(removed = keys.len(), "Network cache cleared");
        self.stats.lock().update_size(0);
        true
    }

    /// True if the store holds a live value for `key`.
    pub async fn contains(&self, key: &str) -> bool {
        if !self.ensure_connected().await {
            return false;
        }

        let remote_key = self.remote_key(key);
        match self.call(self.client.exists(&remote_key)).await {
            Ok(exists) => exists,
            Err(e) => {
                debug!(key = key, error = %e, "Network cache exists check failed");
                self.stats.lock().record_error();
                false
            }
        }
    }

    /// Fetch several keys in one round trip.
    ///
    /// Only keys that were found and decoded are returned.
    pub async fn get_many(&self, keys: &[&str]) -> HashMap<String, V> {
        let mut found = HashMap::new();
        if keys.is_empty() || !self.ensure_connected().await {
            return found;
        }

        let remote_keys: Vec<String> = keys.iter().map(|key| self.remote_key(key)).collect();
        let values = match self.call(self.client.get_many(&remote_keys)).await {
            Ok(values) => values,
            Err(e) => {
                warn!(count = keys.len(), error = %e, "Network cache batch get failed");
                self.stats.lock().record_error();
                return found;
            }
        };

        let mut stats = self.stats.lock();
        for (key, bytes) in keys.iter().zip(values) {
            match bytes.map(|b| self.config.serialization_format.decode::<V>(&b)) {
                Some(Ok(value)) => {
                    stats.record_hit();
                    found.insert((*key).to_string(), value);
                }
                Some(Err(e)) => {
                    debug!(key = *key, error = %e, "Skipping undecodable batch value");
                    stats.record_miss();
                    stats.record_error();
                }
                None => stats.record_miss(),
            }
        }
        found
    }

    /// Store several values with a shared TTL.
    ///
    /// Values that fail to encode are skipped. Returns the keys stored.
    pub async fn set_many(&self, items: Vec<(String, V)>, ttl: Option<Duration>) -> Vec<String> {
        if items.is_empty() || !self.ensure_connected().await {
            return Vec::new();
        }

        let mut stored = Vec::with_capacity(items.len());
        let mut encoded = Vec::with_capacity(items.len());
        for (key, value) in items {
            match self.config.serialization_format.encode(&value) {
                Ok(bytes) => {
                    encoded.push((self.remote_key(&key), bytes));
                    stored.push(key);
                }
                Err(e) => {
                    debug!(key = %key, error = %e, "Skipping unencodable batch value");
                    self.stats.lock().record_error();
                }
            }
        }

        if encoded.is_empty() {
            return Vec::new();
        }

        let ttl = ttl.or(self.config.default_ttl);
        match self.call(self.client.set_many(encoded, ttl)).await {
            Ok(()) => {
                let mut stats = self.stats.lock();
                for _ in &stored {
                    stats.record_set();
                }
                stored
            }
            Err(e) => {
                warn!(count = stored.len(), error = %e, "Network cache batch set failed");
                self.stats.lock().record_error();
                Vec::new()
            }
        }
    }

    /// Remaining TTL the store reports for `key`.
    pub async fn remaining_ttl(&self, key: &str) -> Option<Duration> {
        if !self.ensure_connected().await {
            return None;
        }

        let remote_key = self.remote_key(key);
        match self.call(self.client.ttl(&remote_key)).await {
            Ok(ttl) => ttl,
            Err(e) => {
                debug!(key = key, error = %e, "Network cache ttl query failed");
                None
            }
        }
    }

    /// Count the keys under this tier's prefix and record the result as
    /// the tier's size.
    ///
    /// Scans the whole prefix on the shared store. Returns `None` when the
    /// store is unreachable.
    pub async fn refresh_size(&self) -> Option<usize> {
        if !self.ensure_connected().await {
            return None;
        }

        match self.call(self.client.keys(&self.config.key_prefix)).await {
            Ok(keys) => {
                self.stats.lock().update_size(keys.len());
                Some(keys.len())
            }
            Err(e) => {
                debug!(error = %e, "Network cache size scan failed");
                self.stats.lock().record_error();
                None
            }
        }
    }

    /// Get tier statistics.
    pub fn stats(&self) -> TierMetrics {
        self.stats.lock().clone()
    }

    fn remote_key(&self, key: &str) -> String {
        format!("{}{}", self.config.key_prefix, key)
    }

    /// Connect if needed. Returns false when the store is unreachable.
    async fn ensure_connected(&self) -> bool {
        if self.is_connected() {
            return true;
        }

        match tokio::time::timeout(self.config.operation_timeout, self.client.connect()).await {
            Ok(Ok(())) => {
                self.connected.store(true, Ordering::SeqCst);
                info!(endpoint = %self.config.endpoint(), "Network cache tier connected");
                true
            }
            Ok(Err(e)) => {
                debug!(endpoint = %self.config.endpoint(), error = %e, "Network cache tier unavailable");
                false
            }
            Err(_) => {
                debug!(
                    endpoint = %self.config.endpoint(),
                    timeout_ms = self.timeout_ms(),
                    "Network cache tier connect timed out"
                );
                false
            }
        }
    }

    /// Run a remote call under the operation timeout.
    ///
    /// Any failure marks the tier disconnected.
    async fn call<T>(
        &self,
        request: impl Future<Output = Result<T, SharedStoreError>>,
    ) -> Result<T, CacheError> {
        match tokio::time::timeout(self.config.operation_timeout, request).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                self.mark_disconnected();
                Err(CacheError::Connection(e.to_string()))
            }
            Err(_) => {
                self.mark_disconnected();
                Err(CacheError::Timeout(self.timeout_ms()))
            }
        }
    }

    fn timeout_ms(&self) -> u64 {
        self.config.operation_timeout.as_millis() as u64
    }
}

impl<V: CacheValue> CacheTier<V> for NetworkTier<V> {
    fn kind(&self) -> TierKind {
        TierKind::Network
    }

    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Option<V>> {
        Box::pin(NetworkTier::get(self, key))
    }

    fn set<'a>(&'a self, key: &'a str, value: V, ttl: Option<Duration>) -> BoxFuture<'a, bool> {
        Box::pin(NetworkTier::set(self, key, value, ttl))
    }

    fn delete<'a>(&'a self, key: &'a str) -> BoxFuture<'a, bool> {
        Box::pin(NetworkTier::delete(self, key))
    }

    fn clear(&self) -> BoxFuture<'_, bool> {
        Box::pin(NetworkTier::clear(self))
    }

    fn contains<'a>(&'a self, key: &'a str) -> BoxFuture<'a, bool> {
        Box::pin(NetworkTier::contains(self, key))
    }

    fn metrics(&self) -> TierMetrics {
        self.stats()
    }

    /// Reports the connection flag and the last counted size. Makes no
    /// remote calls; see [`NetworkTier::refresh_size`].
    fn health(&self) -> BoxFuture<'_, TierHealth> {
        Box::pin(async move {
            TierHealth {
                kind: TierKind::Network,
                enabled: true,
                connected: self.is_connected(),
                size: self.stats.lock().size,
            }
        })
    }
}
