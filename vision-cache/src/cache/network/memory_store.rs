//! In-process shared store.
//!
//! Implements [`SharedStoreClient`] over a local map so the network tier can
//! run without a server in development and tests. The store can be switched
//! offline and given artificial latency to exercise degradation paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use super::client::{SharedStoreClient, SharedStoreError};
use crate::cache::traits::BoxFuture;

struct StoredValue {
    bytes: Vec<u8>,
    expires_at: Option<Instant>,
}

impl StoredValue {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

/// Shared store living in this process.
#[derive(Default)]
pub struct InMemorySharedStore {
    data: Mutex<HashMap<String, StoredValue>>,
    offline: AtomicBool,
    latency: Mutex<Option<Duration>>,
    connect_attempts: AtomicU64,
}

impl InMemorySharedStore {
    /// Create an empty, online store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an outage (`false`) or recovery (`true`).
    pub fn set_online(&self, online: bool) {
        self.offline.store(!online, Ordering::SeqCst);
    }

    /// Delay every request by `latency`.
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.lock() = latency;
    }

    /// Number of `connect` calls received.
    pub fn connect_attempts(&self) -> u64 {
        self.connect_attempts.load(Ordering::SeqCst)
    }

    /// Number of live keys, regardless of online state.
    pub fn len(&self) -> usize {
        self.data
            .lock()
            .values()
            .filter(|value| !value.is_expired())
            .count()
    }

    /// True when no live keys are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw keys currently stored, for inspection in tests.
    pub fn raw_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.data.lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    async fn simulate_request(&self) -> Result<(), SharedStoreError> {
        let latency = *self.latency.lock();
        if let Some(delay) = latency {
            tokio::time::sleep(delay).await;
        }
        if self.offline.load(Ordering::SeqCst) {
            return Err(SharedStoreError::Unavailable(
                "in-memory store is offline".to_string(),
            ));
        }
        Ok(())
    }

    fn read(&self, key: &str) -> Option<Vec<u8>> {
        let mut data = self.data.lock();
        match data.get(key) {
            Some(value) if value.is_expired() => {
                data.remove(key);
                None
            }
            Some(value) => Some(value.bytes.clone()),
            None => None,
        }
    }

    fn write(&self, key: String, bytes: Vec<u8>, ttl: Option<Duration>) {
        let expires_at = ttl.map(|ttl| Instant::now() + ttl);
        self.data
            .lock()
            .insert(key, StoredValue { bytes, expires_at });
    }
}

impl SharedStoreClient for InMemorySharedStore {
    fn connect(&self) -> BoxFuture<'_, Result<(), SharedStoreError>> {
        Box::pin(async move {
            self.connect_attempts.fetch_add(1, Ordering::SeqCst);
            self.simulate_request().await
        })
    }

    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<Vec<u8>>, SharedStoreError>> {
        Box::pin(async move {
            self.simulate_request().await?;
            Ok(self.read(key))
        })
    }

    fn set<'a>(
        &'a self,
        key: &'a str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> BoxFuture<'a, Result<(), SharedStoreError>> {
        Box::pin(async move {
            self.simulate_request().await?;
            self.write(key.to_string(), value, ttl);
            Ok(())
        })
    }

    fn delete<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<bool, SharedStoreError>> {
        Box::pin(async move {
            self.simulate_request().await?;
            Ok(self.data.lock().remove(key).is_some())
        })
    }

    fn exists<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<bool, SharedStoreError>> {
        Box::pin(async move {
            self.simulate_request().await?;
            Ok(self.read(key).is_some())
        })
    }

    fn ttl<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<Duration>, SharedStoreError>> {
        Box::pin(async move {
            self.simulate_request().await?;
            let data = self.data.lock();
            Ok(data
                .get(key)
                .filter(|value| !value.is_expired())
                .and_then(|value| value.expires_at)
                .map(|at| at.saturating_duration_since(Instant::now())))
        })
    }

    fn get_many<'a>(
        &'a self,
        keys: &'a [String],
    ) -> BoxFuture<'a, Result<Vec<Option<Vec<u8>>>, SharedStoreError>> {
        Box::pin(async move {
            self.simulate_request().await?;
            Ok(keys.iter().map(|key| self.read(key)).collect())
        })
    }

    fn set_many(
        &self,
        items: Vec<(String, Vec<u8>)>,
        ttl: Option<Duration>,
    ) -> BoxFuture<'_, Result<(), SharedStoreError>> {
        Box::pin(async move {
            self.simulate_request().await?;
            for (key, bytes) in items {
                self.write(key, bytes, ttl);
            }
            Ok(())
        })
    }

    fn keys<'a>(&'a self, prefix: &'a str) -> BoxFuture<'a, Result<Vec<String>, SharedStoreError>> {
        Box::pin(async move {
            self.simulate_request().await?;
            Ok(self
                .data
                .lock()
                .iter()
                .filter(|(key, value)| key.starts_with(prefix) && !value.is_expired())
                .map(|(key, _)| key.clone())
                .collect())
        })
    }
}
