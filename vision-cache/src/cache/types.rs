//! Core types shared by every cache tier.

use std::fmt;
use thiserror::Error;

/// Identifies one backing store in the hierarchy.
///
/// The declaration order is the lookup order: memory first, persistent last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TierKind {
    /// L1 - in-process LRU
    Memory,
    /// L2 - shared cache reached through an external client
    Network,
    /// L3 - on-disk files with a metadata index
    Persistent,
}

impl TierKind {
    /// Short lowercase name used in logs and reports.
    pub fn name(&self) -> &'static str {
        match self {
            TierKind::Memory => "memory",
            TierKind::Network => "network",
            TierKind::Persistent => "persistent",
        }
    }

    /// Conventional level label (L1, L2, L3).
    pub fn level(&self) -> &'static str {
        match self {
            TierKind::Memory => "L1",
            TierKind::Network => "L2",
            TierKind::Persistent => "L3",
        }
    }
}

impl fmt::Display for TierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.level(), self.name())
    }
}

/// Cache-related errors.
///
/// Cache operations log these and report a miss or `false`; only
/// constructors return them.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Value could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Remote tier unreachable
    #[error("Connection error: {0}")]
    Connection(String),

    /// Remote operation exceeded its deadline
    #[error("Operation timed out after {0} ms")]
    Timeout(u64),

    /// Value too large for the persistent tier's per-file limit
    #[error("Value rejected: {size} bytes exceeds limit of {limit} bytes")]
    CapacityRejected { size: usize, limit: usize },

    /// I/O error during cache operations
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid cache configuration
    #[error("Invalid cache configuration: {0}")]
    InvalidConfig(String),
}
