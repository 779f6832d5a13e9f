//! Persistent tier path construction and filename handling.

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Extension of value files written by the persistent tier.
pub const CACHE_FILE_EXTENSION: &str = "cache";

/// Extension of in-flight writes before the atomic rename.
pub const TEMP_FILE_EXTENSION: &str = "tmp";

/// File name of the persistent metadata index.
pub const INDEX_FILE_NAME: &str = "index.json";

/// Derive the stable file name for a cache key.
///
/// The name is the lowercase hex SHA-256 digest of the key, so arbitrary
/// keys (slashes, colons, unicode) map to safe, fixed-length names.
///
/// # Example
///
/// ```
/// use vision_cache::cache::key_file_name;
///
/// let name = key_file_name("ocr:frame_0001");
/// assert_eq!(name.len(), 64 + ".cache".len());
/// assert!(name.ends_with(".cache"));
/// ```
pub fn key_file_name(key: &str) -> String {
    let digest = Sha256::digest(key.as_bytes());
    format!("{}.{}", hex::encode(digest), CACHE_FILE_EXTENSION)
}

/// Full path of the value file for a key.
///
/// ```text
/// <cache_dir>/<sha256-hex(key)>.cache
/// ```
pub fn value_path(cache_dir: &Path, key: &str) -> PathBuf {
    cache_dir.join(key_file_name(key))
}

/// Temporary path used while writing `final_path`.
pub fn temp_path(final_path: &Path) -> PathBuf {
    final_path.with_extension(TEMP_FILE_EXTENSION)
}

/// Path of the metadata index.
pub fn index_path(cache_dir: &Path) -> PathBuf {
    cache_dir.join(INDEX_FILE_NAME)
}

/// True if `path` is a file the persistent tier manages.
///
/// Only managed files are ever removed by `clear()`; anything else in the
/// directory is left alone.
pub fn is_managed_file(path: &Path) -> bool {
    if path.file_name().and_then(|n| n.to_str()) == Some(INDEX_FILE_NAME) {
        return true;
    }
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some(CACHE_FILE_EXTENSION) | Some(TEMP_FILE_EXTENSION)
    )
}
