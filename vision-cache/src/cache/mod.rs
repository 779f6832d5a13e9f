//! Multi-tier cache for vision pipeline artifacts.
//!
//! Provides an in-process LRU tier, a network tier over a shared store
//! client, and a disk tier with a metadata index, combined by
//! [`CacheHierarchyManager`] into one logical cache with promotion on hit.

mod codec;
mod config;
mod entry;
mod hierarchy;
pub(crate) mod maintenance;
mod memory;
mod network;
mod path;
mod persistent;
mod stats;
mod traits;
mod types;

pub use codec::SerializationFormat;
pub use config::{
    HierarchyConfig, MemoryTierConfig, NetworkTierConfig, PersistentTierConfig,
    ARTIFACT_KEY_SUFFIX, DEFAULT_KEY_NAMESPACE, DEFAULT_MAX_FILE_SIZE_BYTES, OCR_RESULT_KEY_SUFFIX,
};
pub use entry::CacheEntry;
pub use hierarchy::CacheHierarchyManager;
pub use maintenance::{Maintainable, MaintenanceDaemon};
pub use memory::MemoryTier;
pub use network::{InMemorySharedStore, NetworkTier, SharedStoreClient, SharedStoreError};
pub use persistent::{PersistentTier, StoredBlob};
pub use stats::{CacheStatistics, HierarchyCounters, TierMetrics};
pub use traits::{BoxFuture, CacheTier, CacheValue, TierHealth};
pub use types::{CacheError, TierKind};

// Re-export path utilities for convenience
pub use path::{key_file_name, value_path};
