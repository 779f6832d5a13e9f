//! On-disk cache tier (L3).
//!
//! Values live one per file, named by the SHA-256 of their key. A JSON
//! metadata index records each key's file, size, TTL and access times and
//! is the source of truth for what the tier holds.
//!
//! # File Layout
//!
//! ```text
//! {directory}/{sha256(key)}.cache   serialized value
//! {directory}/index.json            metadata index
//! {directory}/*.tmp                 in-flight writes (renamed into place)
//! ```
//!
//! # Eviction Strategy
//!
//! - Expired entries are removed lazily on access and by the periodic sweep
//! - When the index exceeds `max_size`, least recently accessed entries are
//!   evicted along with their files
//! - Files not referenced by the index (orphans) are removed by the sweep
//!
//! The data lock is a `tokio::sync::Mutex` held across file I/O, so
//! operations on this tier are serialized.

use std::collections::{HashMap, HashSet};
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cache::config::PersistentTierConfig;
use crate::cache::entry::CacheEntry;
use crate::cache::maintenance::Maintainable;
use crate::cache::path::{
    index_path, is_managed_file, key_file_name, temp_path, CACHE_FILE_EXTENSION,
    TEMP_FILE_EXTENSION,
};
use crate::cache::stats::TierMetrics;
use crate::cache::traits::{BoxFuture, CacheTier, CacheValue, TierHealth};
use crate::cache::types::{CacheError, TierKind};

/// Descriptor of a value file, stored as the value of an index entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredBlob {
    /// File name relative to the tier directory
    pub file_name: String,
    /// Serialized size in bytes
    pub size_bytes: u64,
}

/// Mutable state guarded by the tier's data lock.
struct IndexState {
    entries: HashMap<String, CacheEntry<StoredBlob>>,
    /// Index changed since the last flush
    dirty: bool,
    last_flush: Instant,
    last_sweep: Instant,
}

/// Disk-backed cache tier.
pub struct PersistentTier<V> {
    config: PersistentTierConfig,
    state: tokio::sync::Mutex<IndexState>,
    stats: Mutex<TierMetrics>,
    _value: PhantomData<fn() -> V>,
}

impl<V: CacheValue> PersistentTier<V> {
    /// Open the tier, creating its directory and loading the index.
    ///
    /// A corrupt index is logged and replaced by an empty one. Index entries
    /// whose files are missing are kept and pruned on access.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::InvalidConfig` for a zero `max_size` and
    /// `CacheError::Io` if the directory cannot be created or written.
    pub async fn open(config: PersistentTierConfig) -> Result<Self, CacheError> {
        if config.max_size == 0 {
            return Err(CacheError::InvalidConfig(
                "persistent tier max_size must be greater than 0".to_string(),
            ));
        }

        tokio::fs::create_dir_all(&config.directory).await?;
        Self::verify_writable(&config.directory).await?;

        let entries = Self::load_index(&config.directory).await;

        info!(
            dir = %config.directory.display(),
            entries = entries.len(),
            max_size = config.max_size,
            format = %config.serialization_format,
            "Persistent cache tier opened"
        );

        let stats = TierMetrics {
            size: entries.len(),
            ..TierMetrics::default()
        };

        let now = Instant::now();
        Ok(Self {
            config,
            state: tokio::sync::Mutex::new(IndexState {
                entries,
                dirty: false,
                last_flush: now,
                last_sweep: now,
            }),
            stats: Mutex::new(stats),
            _value: PhantomData,
        })
    }

    /// Directory owned by this tier.
    pub fn directory(&self) -> &Path {
        &self.config.directory
    }

    /// Get a cached value.
    pub async fn get(&self, key: &str) -> Option<V> {
        let mut state = self.state.lock().await;

        let lookup = state
            .entries
            .get(key)
            .map(|entry| (entry.is_expired(), entry.value.file_name.clone()));
        let (expired, file_name) = match lookup {
            Some(found) => found,
            None => {
                drop(state);
                self.stats.lock().record_miss();
                return None;
            }
        };
        let path = self.config.directory.join(&file_name);

        if expired {
            state.entries.remove(key);
            state.dirty = true;
            remove_file_quietly(&path).await;
            let size = state.entries.len();
            drop(state);

            let mut stats = self.stats.lock();
            stats.record_miss();
            stats.record_eviction(1);
            stats.update_size(size);
            return None;
        }

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(key = key, "Persistent value file missing, dropping metadata");
                state.entries.remove(key);
                state.dirty = true;
                let size = state.entries.len();
                drop(state);

                let mut stats = self.stats.lock();
                stats.record_miss();
                stats.update_size(size);
                return None;
            }
            Err(e) => {
                warn!(key = key, error = %e, "Failed to read persistent cache file");
                drop(state);

                let mut stats = self.stats.lock();
                stats.record_miss();
                stats.record_error();
                return None;
            }
        };

        match self.config.serialization_format.decode::<V>(&bytes) {
            Ok(value) => {
                if let Some(entry) = state.entries.get_mut(key) {
                    entry.touch();
                }
                state.dirty = true;
                if state.last_flush.elapsed() >= self.config.flush_interval {
                    self.persist_index(&mut state).await;
                }
                drop(state);

                self.stats.lock().record_hit();
                Some(value)
            }
            Err(e) => {
                warn!(key = key, error = %e, "Corrupt persistent cache entry, removing");
                state.entries.remove(key);
                state.dirty = true;
                remove_file_quietly(&path).await;
                let size = state.entries.len();
                drop(state);

                let mut stats = self.stats.lock();
                stats.record_miss();
                stats.record_error();
                stats.update_size(size);
                None
            }
        }
    }

    /// Store a value.
    ///
    /// Returns `false` without writing anything if the serialized value
    /// exceeds `max_file_size_bytes`, and `false` on any I/O failure.
    pub async fn set(&self, key: &str, value: V, ttl: Option<Duration>) -> bool {
        let bytes = match self.config.serialization_format.encode(&value) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(key = key, error = %e, "Failed to encode value for persistent tier");
                self.stats.lock().record_error();
                return false;
            }
        };

        if bytes.len() > self.config.max_file_size_bytes {
            let err = CacheError::CapacityRejected {
                size: bytes.len(),
                limit: self.config.max_file_size_bytes,
            };
            warn!(key = key, error = %err, "Persistent tier rejected value");
            self.stats.lock().record_rejection();
            return false;
        }

        let file_name = key_file_name(key);
        let path = self.config.directory.join(&file_name);
        let ttl = ttl.or(self.config.default_ttl);

        let mut state = self.state.lock().await;

        if let Err(e) = write_atomic(&path, &bytes).await {
            warn!(key = key, path = %path.display(), error = %e, "Failed to write persistent cache file");
            drop(state);
            self.stats.lock().record_error();
            return false;
        }

        let blob = StoredBlob {
            file_name,
            size_bytes: bytes.len() as u64,
        };
        state
            .entries
            .insert(key.to_string(), CacheEntry::new(key, blob, ttl));
        state.dirty = true;

        let evicted = self.evict_over_capacity(&mut state).await;
        self.persist_index(&mut state).await;
        let size = state.entries.len();
        drop(state);

        let mut stats = self.stats.lock();
        stats.record_set();
        stats.record_eviction(evicted as u64);
        stats.update_size(size);
        true
    }

    /// Remove a value and its file. Returns true if the key was indexed.
    pub async fn delete(&self, key: &str) -> bool {
        let mut state = self.state.lock().await;

        let removed = state.entries.remove(key);
        if let Some(entry) = &removed {
            remove_file_quietly(&self.config.directory.join(&entry.value.file_name)).await;
            state.dirty = true;
            self.persist_index(&mut state).await;
        }
        let size = state.entries.len();
        drop(state);

        let mut stats = self.stats.lock();
        if removed.is_some() {
            stats.record_delete();
        }
        stats.update_size(size);
        removed.is_some()
    }

    /// Remove every managed file and all metadata.
    ///
    /// Files the tier did not create are left in place.
    pub async fn clear(&self) -> bool {
        let mut state = self.state.lock().await;

        let mut dir = match tokio::fs::read_dir(&self.config.directory).await {
            Ok(dir) => dir,
            Err(e) => {
                warn!(dir = %self.config.directory.display(), error = %e, "Failed to read persistent cache directory");
                drop(state);
                self.stats.lock().record_error();
                return false;
            }
        };

        let mut removed = 0usize;
        while let Ok(Some(entry)) = dir.next_entry().await {
            let path = entry.path();
            if is_managed_file(&path) && tokio::fs::remove_file(&path).await.is_ok() {
                removed += 1;
            }
        }

        state.entries.clear();
        state.dirty = false;
        state.last_flush = Instant::now();
        drop(state);

        debug!(files = removed, "Persistent cache cleared");
        self.stats.lock().update_size(0);
        true
    }

    /// True if a live entry exists and its file is present.
    pub async fn contains(&self, key: &str) -> bool {
        let mut state = self.state.lock().await;

        let lookup = state
            .entries
            .get(key)
            .map(|entry| (entry.is_expired(), entry.value.file_name.clone()));
        let (expired, file_name) = match lookup {
            Some(found) => found,
            None => return false,
        };
        let path = self.config.directory.join(&file_name);

        if expired {
            state.entries.remove(key);
            state.dirty = true;
            remove_file_quietly(&path).await;
            let size = state.entries.len();
            drop(state);

            let mut stats = self.stats.lock();
            stats.record_eviction(1);
            stats.update_size(size);
            return false;
        }

        if tokio::fs::metadata(&path).await.is_err() {
            state.entries.remove(key);
            state.dirty = true;
            return false;
        }

        true
    }

    /// Number of live entries in the index.
    pub async fn len(&self) -> usize {
        self.state
            .lock()
            .await
            .entries
            .values()
            .filter(|entry| !entry.is_expired())
            .count()
    }

    /// True when the index holds no live entries.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Remove expired entries and orphaned files, then flush the index.
    ///
    /// Returns the number of expired entries and orphans removed.
    pub async fn purge_expired(&self) -> usize {
        let mut state = self.state.lock().await;
        self.purge_locked(&mut state).await
    }

    /// Run [`purge_expired`](Self::purge_expired) at most once per cleanup interval.
    pub async fn maybe_purge_expired(&self) -> usize {
        let mut state = self.state.lock().await;
        if state.last_sweep.elapsed() < self.config.cleanup_interval {
            return 0;
        }
        self.purge_locked(&mut state).await
    }

    /// Persist the index if it has unsaved changes.
    pub async fn flush(&self) -> bool {
        let mut state = self.state.lock().await;
        if state.dirty {
            self.persist_index(&mut state).await
        } else {
            true
        }
    }

    /// Get tier statistics.
    pub fn stats(&self) -> TierMetrics {
        self.stats.lock().clone()
    }

    async fn purge_locked(&self, state: &mut IndexState) -> usize {
        let expired: Vec<String> = state
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            if let Some(entry) = state.entries.remove(key) {
                remove_file_quietly(&self.config.directory.join(&entry.value.file_name)).await;
            }
        }
        if !expired.is_empty() {
            state.dirty = true;
        }

        let orphans = self.remove_orphans(state).await;

        if state.dirty {
            self.persist_index(state).await;
        }
        state.last_sweep = Instant::now();

        let size = state.entries.len();
        let mut stats = self.stats.lock();
        stats.record_eviction(expired.len() as u64);
        stats.update_size(size);
        drop(stats);

        if !expired.is_empty() || orphans > 0 {
            info!(
                expired = expired.len(),
                orphans = orphans,
                remaining = size,
                "Persistent cache sweep complete"
            );
        }

        expired.len() + orphans
    }

    /// Delete value files the index does not reference, plus leftover temp files.
    async fn remove_orphans(&self, state: &IndexState) -> usize {
        let referenced: HashSet<&str> = state
            .entries
            .values()
            .map(|entry| entry.value.file_name.as_str())
            .collect();

        let mut dir = match tokio::fs::read_dir(&self.config.directory).await {
            Ok(dir) => dir,
            Err(e) => {
                debug!(error = %e, "Failed to scan persistent directory for orphans");
                return 0;
            }
        };

        let mut removed = 0;
        while let Ok(Some(entry)) = dir.next_entry().await {
            let path = entry.path();
            let extension = path.extension().and_then(|e| e.to_str());
            let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");

            let orphaned = match extension {
                Some(CACHE_FILE_EXTENSION) => !referenced.contains(file_name),
                Some(TEMP_FILE_EXTENSION) => true,
                _ => false,
            };

            if orphaned && tokio::fs::remove_file(&path).await.is_ok() {
                debug!(path = %path.display(), "Removed orphaned cache file");
                removed += 1;
            }
        }
        removed
    }

    /// Evict least recently accessed entries until the index fits `max_size`.
    async fn evict_over_capacity(&self, state: &mut IndexState) -> usize {
        let mut evicted = 0;
        while state.entries.len() > self.config.max_size {
            let oldest = state
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_access_at)
                .map(|(key, _)| key.clone());

            let Some(key) = oldest else { break };
            if let Some(entry) = state.entries.remove(&key) {
                remove_file_quietly(&self.config.directory.join(&entry.value.file_name)).await;
                debug!(key = %key, "Persistent tier evicted LRU entry");
                evicted += 1;
            }
        }
        evicted
    }

    /// Write the index atomically. Failures are logged and counted.
    async fn persist_index(&self, state: &mut IndexState) -> bool {
        let records: Vec<&CacheEntry<StoredBlob>> = state.entries.values().collect();
        let result = match serde_json::to_vec(&records) {
            Ok(bytes) => write_atomic(&index_path(&self.config.directory), &bytes)
                .await
                .map_err(CacheError::Io),
            Err(e) => Err(CacheError::Serialization(e.to_string())),
        };

        match result {
            Ok(()) => {
                state.dirty = false;
                state.last_flush = Instant::now();
                true
            }
            Err(e) => {
                warn!(error = %e, "Failed to persist cache index");
                self.stats.lock().record_error();
                false
            }
        }
    }

    async fn load_index(directory: &Path) -> HashMap<String, CacheEntry<StoredBlob>> {
        let path = index_path(directory);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return HashMap::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read cache index, starting empty");
                return HashMap::new();
            }
        };

        match serde_json::from_slice::<Vec<CacheEntry<StoredBlob>>>(&bytes) {
            Ok(records) => records
                .into_iter()
                .map(|entry| (entry.key.clone(), entry))
                .collect(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Corrupt cache index, starting empty");
                HashMap::new()
            }
        }
    }

    async fn verify_writable(directory: &Path) -> Result<(), CacheError> {
        let marker = directory.join(format!(".write-check.{}", TEMP_FILE_EXTENSION));
        tokio::fs::write(&marker, b"marker").await?;
        tokio::fs::remove_file(&marker).await?;
        Ok(())
    }
}

/// Write via a temp file and rename so readers never see partial data.
async fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp: PathBuf = temp_path(path);
    if let Err(e) = tokio::fs::write(&tmp, bytes).await {
        remove_file_quietly(&tmp).await;
        return Err(e);
    }
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        remove_file_quietly(&tmp).await;
        return Err(e);
    }
    Ok(())
}

async fn remove_file_quietly(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != ErrorKind::NotFound {
            debug!(path = %path.display(), error = %e, "Failed to remove cache file");
        }
    }
}

impl<V: CacheValue> CacheTier<V> for PersistentTier<V> {
    fn kind(&self) -> TierKind {
        TierKind::Persistent
    }

    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Option<V>> {
        Box::pin(PersistentTier::get(self, key))
    }

    fn set<'a>(&'a self, key: &'a str, value: V, ttl: Option<Duration>) -> BoxFuture<'a, bool> {
        Box::pin(PersistentTier::set(self, key, value, ttl))
    }

    fn delete<'a>(&'a self, key: &'a str) -> BoxFuture<'a, bool> {
        Box::pin(PersistentTier::delete(self, key))
    }

    fn clear(&self) -> BoxFuture<'_, bool> {
        Box::pin(PersistentTier::clear(self))
    }

    fn contains<'a>(&'a self, key: &'a str) -> BoxFuture<'a, bool> {
        Box::pin(PersistentTier::contains(self, key))
    }

    fn metrics(&self) -> TierMetrics {
        self.stats()
    }

    fn health(&self) -> BoxFuture<'_, TierHealth> {
        Box::pin(async move {
            let connected = tokio::fs::metadata(&self.config.directory)
                .await
                .map(|m| m.is_dir())
                .unwrap_or(false);
            let size = self.state.lock().await.entries.len();

            TierHealth {
                kind: TierKind::Persistent,
                enabled: true,
                connected,
                size,
            }
        })
    }
}

impl<V: CacheValue> Maintainable for PersistentTier<V> {
    fn name(&self) -> &'static str {
        "persistent-tier"
    }

    fn interval(&self) -> Duration {
        self.config.cleanup_interval
    }

    fn run_maintenance(&self) -> BoxFuture<'_, usize> {
        Box::pin(self.maybe_purge_expired())
    }
}
