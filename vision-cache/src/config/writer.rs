//! INI serialization logic for converting `CacheSettings` → INI string.
//!
//! Produces the commented representation written to `config.ini`. Result
//! cache tier settings are derived from the hierarchy on load, so only its
//! thresholds are written.

use std::path::Path;
use std::time::Duration;

use super::file::CacheSettings;
use super::size::format_size;

/// Convert `CacheSettings` to a commented INI string for saving.
pub(super) fn to_config_string(settings: &CacheSettings) -> String {
    let memory = &settings.hierarchy.memory;
    let network = &settings.hierarchy.network;
    let persistent = &settings.hierarchy.persistent;
    let result_cache = &settings.result_cache;

    format!(
        r#"[memory]
; Maximum number of entries held in process
max_size = {}
; Default time-to-live in seconds (0 = entries never expire)
default_ttl_secs = {}
; Minimum seconds between expiry sweeps
cleanup_interval_secs = {}

[network]
; Shared key/value store tier, reached through the client the application supplies
enabled = {}
host = {}
port = {}
database = {}
credential = {}
max_size = {}
default_ttl_secs = {}
; Value encoding: json or binary
serialization_format = {}
; Upper bound on each remote call, including connecting
timeout_ms = {}
; Namespace for shared keys; artifacts and OCR results get separate sub-prefixes
key_prefix = {}

[persistent]
enabled = {}
; Directory owned by the cache (supports ~ for home directory)
directory = {}
max_size = {}
default_ttl_secs = {}
serialization_format = {}
; Largest serialized value accepted (e.g. 512KB, 10MB)
max_file_size = {}
cleanup_interval_secs = {}

[hierarchy]
; Copy hits from slower tiers into memory
promote_on_hit = {}
shutdown_timeout_secs = {}

[result_cache]
; OCR results below this confidence are not cached
confidence_threshold = {}
; Minimum score returned by similar-plate lookups
similarity_threshold = {}
max_plates = {}
"#,
        memory.max_size,
        ttl_secs(memory.default_ttl),
        memory.cleanup_interval.as_secs(),
        network.enabled,
        network.host,
        network.port,
        network.database,
        network.credential.as_deref().unwrap_or(""),
        network.max_size,
        ttl_secs(network.default_ttl),
        network.serialization_format,
        network.operation_timeout.as_millis(),
        network.key_namespace(),
        persistent.enabled,
        path_to_string(&persistent.directory),
        persistent.max_size,
        ttl_secs(persistent.default_ttl),
        persistent.serialization_format,
        format_size(persistent.max_file_size_bytes),
        persistent.cleanup_interval.as_secs(),
        settings.hierarchy.promote_on_hit,
        settings.hierarchy.shutdown_timeout.as_secs(),
        result_cache.confidence_threshold,
        result_cache.similarity_threshold,
        result_cache.max_plates,
    )
}

fn ttl_secs(ttl: Option<Duration>) -> u64 {
    ttl.map(|d| d.as_secs()).unwrap_or(0)
}

fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::SerializationFormat;
    use ini::Ini;

    #[test]
    fn test_output_is_valid_ini() {
        let content = to_config_string(&CacheSettings::default());
        let ini = Ini::load_from_str(&content).unwrap();

        for section in ["memory", "network", "persistent", "hierarchy", "result_cache"] {
            assert!(ini.section(Some(section)).is_some(), "missing [{section}]");
        }
    }

    #[test]
    fn test_writes_values() {
        let mut settings = CacheSettings::default();
        settings.hierarchy.memory.default_ttl = None;
        settings.hierarchy.network.credential = Some("secret".to_string());
        settings.hierarchy.network.serialization_format = SerializationFormat::Binary;
        settings.hierarchy.persistent.directory = "/srv/vision".into();

        let ini = Ini::load_from_str(&to_config_string(&settings)).unwrap();

        let memory = ini.section(Some("memory")).unwrap();
        assert_eq!(memory.get("default_ttl_secs"), Some("0"));

        let network = ini.section(Some("network")).unwrap();
        assert_eq!(network.get("credential"), Some("secret"));
        assert_eq!(network.get("serialization_format"), Some("binary"));
        assert_eq!(network.get("timeout_ms"), Some("2000"));

        let persistent = ini.section(Some("persistent")).unwrap();
        assert_eq!(persistent.get("directory"), Some("/srv/vision"));
        assert_eq!(persistent.get("max_file_size"), Some("10MB"));
    }

    #[test]
    fn test_home_directory_written_with_tilde() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(path_to_string(&home.join("cache")), "~/cache");
        }
    }
}
