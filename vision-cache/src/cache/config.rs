//! Configuration types for the cache tiers and the hierarchy.
//!
//! Every field has a default; builders follow the `with_*` convention.

use std::path::PathBuf;
use std::time::Duration;

use crate::cache::codec::SerializationFormat;

pub const DEFAULT_MEMORY_MAX_SIZE: usize = 1000;
pub const DEFAULT_MEMORY_TTL_SECS: u64 = 3600;
pub const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 60;

pub const DEFAULT_NETWORK_PORT: u16 = 6379;
pub const DEFAULT_NETWORK_MAX_SIZE: usize = 10_000;
pub const DEFAULT_NETWORK_TTL_SECS: u64 = 3600;
pub const DEFAULT_NETWORK_TIMEOUT_MS: u64 = 2000;

/// Root shared by every key this crate writes to the network store.
pub const DEFAULT_KEY_NAMESPACE: &str = "vision_cache:";
/// Appended to the namespace for hierarchy artifacts.
pub const ARTIFACT_KEY_SUFFIX: &str = "artifact:";
/// Appended to the namespace for OCR results. Must not be a prefix of
/// [`ARTIFACT_KEY_SUFFIX`] or the reverse.
pub const OCR_RESULT_KEY_SUFFIX: &str = "ocr:";
pub const DEFAULT_NETWORK_KEY_PREFIX: &str = "vision_cache:artifact:";

pub const DEFAULT_PERSISTENT_MAX_SIZE: usize = 10_000;
pub const DEFAULT_PERSISTENT_TTL_SECS: u64 = 86_400;
pub const DEFAULT_MAX_FILE_SIZE_BYTES: usize = 10 * 1024 * 1024; // 10 MB
pub const DEFAULT_PERSISTENT_CLEANUP_INTERVAL_SECS: u64 = 300;
pub const DEFAULT_INDEX_FLUSH_INTERVAL_SECS: u64 = 30;

/// Memory (L1) tier configuration.
#[derive(Debug, Clone)]
pub struct MemoryTierConfig {
    /// Maximum number of entries; must be at least 1
    pub max_size: usize,
    /// TTL applied when `set` omits one; `None` keeps entries until evicted
    pub default_ttl: Option<Duration>,
    /// Minimum time between expiry sweeps
    pub cleanup_interval: Duration,
}

impl Default for MemoryTierConfig {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MEMORY_MAX_SIZE,
            default_ttl: Some(Duration::from_secs(DEFAULT_MEMORY_TTL_SECS)),
            cleanup_interval: Duration::from_secs(DEFAULT_CLEANUP_INTERVAL_SECS),
        }
    }
}

impl MemoryTierConfig {
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    pub fn with_default_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }
}

/// Network (L2) tier configuration.
///
/// Connection parameters are handed to whichever shared-store client the
/// application constructs; the tier itself only uses the timeout, TTL,
/// prefix and format.
#[derive(Debug, Clone)]
pub struct NetworkTierConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    /// Logical database index on the shared store
    pub database: u32,
    pub credential: Option<String>,
    /// Advisory entry limit, reported in health output
    pub max_size: usize,
    pub default_ttl: Option<Duration>,
    pub serialization_format: SerializationFormat,
    /// Upper bound on any single remote call, including connecting
    pub operation_timeout: Duration,
    /// Namespace prepended to every key on the shared store
    pub key_prefix: String,
}

impl Default for NetworkTierConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: "localhost".to_string(),
            port: DEFAULT_NETWORK_PORT,
            database: 0,
            credential: None,
            max_size: DEFAULT_NETWORK_MAX_SIZE,
            default_ttl: Some(Duration::from_secs(DEFAULT_NETWORK_TTL_SECS)),
            serialization_format: SerializationFormat::Json,
            operation_timeout: Duration::from_millis(DEFAULT_NETWORK_TIMEOUT_MS),
            key_prefix: DEFAULT_NETWORK_KEY_PREFIX.to_string(),
        }
    }
}

impl NetworkTierConfig {
    /// Enabled configuration for the given endpoint.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            enabled: true,
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// `host:port` of the shared store.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    pub fn with_format(mut self, format: SerializationFormat) -> Self {
        self.serialization_format = format;
        self
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// The key prefix without its artifact suffix.
    ///
    /// Prefixes that do not end in [`ARTIFACT_KEY_SUFFIX`] are returned
    /// unchanged.
    pub fn key_namespace(&self) -> &str {
        self.key_prefix
            .strip_suffix(ARTIFACT_KEY_SUFFIX)
            .unwrap_or(&self.key_prefix)
    }

    pub fn with_default_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.default_ttl = ttl;
        self
    }
}

/// Persistent (L3) tier configuration.
#[derive(Debug, Clone)]
pub struct PersistentTierConfig {
    pub enabled: bool,
    /// Directory owned exclusively by the tier
    pub directory: PathBuf,
    /// Maximum number of entries in the metadata index
    pub max_size: usize,
    pub default_ttl: Option<Duration>,
    pub serialization_format: SerializationFormat,
    /// Serialized values larger than this are rejected
    pub max_file_size_bytes: usize,
    pub cleanup_interval: Duration,
    /// Minimum time between index flushes caused by reads
    pub flush_interval: Duration,
}

impl Default for PersistentTierConfig {
    fn default() -> Self {
        let directory = dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vision-cache");

        Self {
            enabled: true,
            directory,
            max_size: DEFAULT_PERSISTENT_MAX_SIZE,
            default_ttl: Some(Duration::from_secs(DEFAULT_PERSISTENT_TTL_SECS)),
            serialization_format: SerializationFormat::Json,
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_BYTES,
            cleanup_interval: Duration::from_secs(DEFAULT_PERSISTENT_CLEANUP_INTERVAL_SECS),
            flush_interval: Duration::from_secs(DEFAULT_INDEX_FLUSH_INTERVAL_SECS),
        }
    }
}

impl PersistentTierConfig {
    /// Enabled configuration rooted at `directory`.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            ..Default::default()
        }
    }

    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    pub fn with_default_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn with_format(mut self, format: SerializationFormat) -> Self {
        self.serialization_format = format;
        self
    }

    pub fn with_max_file_size(mut self, bytes: usize) -> Self {
        self.max_file_size_bytes = bytes;
        self
    }

    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }
}

/// Complete hierarchy configuration.
#[derive(Debug, Clone)]
pub struct HierarchyConfig {
    pub memory: MemoryTierConfig,
    pub network: NetworkTierConfig,
    pub persistent: PersistentTierConfig,
    /// Copy lower-tier hits into L1
    pub promote_on_hit: bool,
    /// Bound on joining background tasks at shutdown
    pub shutdown_timeout: Duration,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            memory: MemoryTierConfig::default(),
            network: NetworkTierConfig::default(),
            persistent: PersistentTierConfig::default(),
            promote_on_hit: true,
            shutdown_timeout: Duration::from_secs(5),
        }
    }
}

impl HierarchyConfig {
    /// Memory-only hierarchy (network and persistent disabled).
    pub fn memory_only(memory: MemoryTierConfig) -> Self {
        let mut config = Self {
            memory,
            ..Default::default()
        };
        config.network.enabled = false;
        config.persistent.enabled = false;
        config
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

    /// Set the persistent directory.
    pub fn with_cache_dir(mut self, dir: PathBuf) -> Self {
        self.persistent.directory = dir;
        self
    }

    pub fn with_promote_on_hit(mut self, promote: bool) -> Self {
        self.promote_on_hit = promote;
        self
    }
}
