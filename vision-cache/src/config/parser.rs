//! INI parsing logic for converting `Ini` → `CacheSettings`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use ini::{Ini, Properties};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use super::file::{CacheSettings, ConfigFileError};
use super::size::parse_size;
use crate::cache::{
    NetworkTierConfig, PersistentTierConfig, SerializationFormat, ARTIFACT_KEY_SUFFIX,
    OCR_RESULT_KEY_SUFFIX,
};

/// Subdirectory of the persistent directory used by the OCR result cache.
pub(super) const RESULT_CACHE_SUBDIR: &str = "ocr-results";

/// Parse an `Ini` object into `CacheSettings`.
///
/// Starts from `CacheSettings::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<CacheSettings, ConfigFileError> {
    let mut settings = CacheSettings::default();
    let hierarchy = &mut settings.hierarchy;

    // [memory] section
    if let Some(section) = ini.section(Some("memory")) {
        if let Some(v) = section.get("max_size") {
            hierarchy.memory.max_size = parse_capacity("memory", "max_size", v)?;
        }
        if let Some(v) = section.get("default_ttl_secs") {
            hierarchy.memory.default_ttl = parse_ttl("memory", v)?;
        }
        if let Some(v) = section.get("cleanup_interval_secs") {
            hierarchy.memory.cleanup_interval =
                Duration::from_secs(parse_number("memory", "cleanup_interval_secs", v)?);
        }
    }

    // [network] section
    if let Some(section) = ini.section(Some("network")) {
        parse_network(section, &mut hierarchy.network)?;
    }

    // [persistent] section
    if let Some(section) = ini.section(Some("persistent")) {
        parse_persistent(section, &mut hierarchy.persistent)?;
    }

    // [hierarchy] section
    if let Some(section) = ini.section(Some("hierarchy")) {
        if let Some(v) = section.get("promote_on_hit") {
            hierarchy.promote_on_hit = parse_bool(v);
        }
        if let Some(v) = section.get("shutdown_timeout_secs") {
            hierarchy.shutdown_timeout =
                Duration::from_secs(parse_number("hierarchy", "shutdown_timeout_secs", v)?);
        }
    }

    // Result cache tiers follow the hierarchy, in a sibling key namespace
    // and their own subdirectory.
    let result_cache = &mut settings.result_cache;
    result_cache.memory = settings.hierarchy.memory.clone();
    result_cache.network = NetworkTierConfig {
        key_prefix: format!(
            "{}{}",
            settings.hierarchy.network.key_namespace(),
            OCR_RESULT_KEY_SUFFIX
        ),
        ..settings.hierarchy.network.clone()
    };
    result_cache.persistent = PersistentTierConfig {
        directory: settings.hierarchy.persistent.directory.join(RESULT_CACHE_SUBDIR),
        ..settings.hierarchy.persistent.clone()
    };

    // [result_cache] section
    if let Some(section) = ini.section(Some("result_cache")) {
        if let Some(v) = section.get("confidence_threshold") {
            result_cache.confidence_threshold =
                parse_fraction("result_cache", "confidence_threshold", v)?;
        }
        if let Some(v) = section.get("similarity_threshold") {
            result_cache.similarity_threshold =
                parse_fraction("result_cache", "similarity_threshold", v)?;
        }
        if let Some(v) = section.get("max_plates") {
            result_cache.max_plates = parse_capacity("result_cache", "max_plates", v)?;
        }
    }

    Ok(settings)
}

fn parse_network(
    section: &Properties,
    network: &mut NetworkTierConfig,
) -> Result<(), ConfigFileError> {
    if let Some(v) = section.get("enabled") {
        network.enabled = parse_bool(v);
    }
    if let Some(v) = section.get("host") {
        let v = v.trim();
        if !v.is_empty() {
            network.host = v.to_string();
        }
    }
    if let Some(v) = section.get("port") {
        network.port = v.trim().parse().map_err(|_| ConfigFileError::InvalidValue {
            section: "network".to_string(),
            key: "port".to_string(),
            value: v.to_string(),
            reason: "must be a port number between 0 and 65535".to_string(),
        })?;
    }
    if let Some(v) = section.get("database") {
        network.database = v.trim().parse().map_err(|_| ConfigFileError::InvalidValue {
            section: "network".to_string(),
            key: "database".to_string(),
            value: v.to_string(),
            reason: "must be a non-negative integer".to_string(),
        })?;
    }
    if let Some(v) = section.get("credential") {
        let v = v.trim();
        network.credential = (!v.is_empty()).then(|| v.to_string());
    }
    if let Some(v) = section.get("max_size") {
        network.max_size = parse_capacity("network", "max_size", v)?;
    }
    if let Some(v) = section.get("default_ttl_secs") {
        network.default_ttl = parse_ttl("network", v)?;
    }
    if let Some(v) = section.get("serialization_format") {
        network.serialization_format = parse_format("network", v)?;
    }
    if let Some(v) = section.get("timeout_ms") {
        let ms = parse_number("network", "timeout_ms", v)?;
        if ms == 0 {
            return Err(ConfigFileError::InvalidValue {
                section: "network".to_string(),
                key: "timeout_ms".to_string(),
                value: v.to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }
        network.operation_timeout = Duration::from_millis(ms);
    }
    // The configured prefix is the namespace root shared with the result cache
    if let Some(v) = section.get("key_prefix") {
        network.key_prefix = format!("{}{}", v.trim(), ARTIFACT_KEY_SUFFIX);
    }
    Ok(())
}

fn parse_persistent(
    section: &Properties,
    persistent: &mut PersistentTierConfig,
) -> Result<(), ConfigFileError> {
    if let Some(v) = section.get("enabled") {
        persistent.enabled = parse_bool(v);
    }
    if let Some(v) = section.get("directory") {
        let v = v.trim();
        if !v.is_empty() {
            persistent.directory = expand_tilde(v);
        }
    }
    if let Some(v) = section.get("max_size") {
        persistent.max_size = parse_capacity("persistent", "max_size", v)?;
    }
    if let Some(v) = section.get("default_ttl_secs") {
        persistent.default_ttl = parse_ttl("persistent", v)?;
    }
    if let Some(v) = section.get("serialization_format") {
        persistent.serialization_format = parse_format("persistent", v)?;
    }
    if let Some(v) = section.get("max_file_size") {
        persistent.max_file_size_bytes =
            parse_size(v).map_err(|_| ConfigFileError::InvalidValue {
                section: "persistent".to_string(),
                key: "max_file_size".to_string(),
                value: v.to_string(),
                reason: "expected format like '10MB', '512KB', or '1048576'".to_string(),
            })?;
    }
    if let Some(v) = section.get("cleanup_interval_secs") {
        persistent.cleanup_interval =
            Duration::from_secs(parse_number("persistent", "cleanup_interval_secs", v)?);
    }
    Ok(())
}

fn parse_number(section: &str, key: &str, value: &str) -> Result<u64, ConfigFileError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigFileError::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            reason: "must be a non-negative integer".to_string(),
        })
}

/// Entry-count limit; zero is rejected.
fn parse_capacity(section: &str, key: &str, value: &str) -> Result<usize, ConfigFileError> {
    match value.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigFileError::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            reason: "must be a positive integer".to_string(),
        }),
    }
}

/// TTL in seconds; `0` disables expiry.
fn parse_ttl(section: &str, value: &str) -> Result<Option<Duration>, ConfigFileError> {
    let secs = parse_number(section, "default_ttl_secs", value)?;
    Ok((secs > 0).then(|| Duration::from_secs(secs)))
}

fn parse_fraction(section: &str, key: &str, value: &str) -> Result<f64, ConfigFileError> {
    match value.trim().parse::<f64>() {
        Ok(f) if (0.0..=1.0).contains(&f) => Ok(f),
        _ => Err(ConfigFileError::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            reason: "must be a number between 0.0 and 1.0".to_string(),
        }),
    }
}

fn parse_format(section: &str, value: &str) -> Result<SerializationFormat, ConfigFileError> {
    SerializationFormat::from_str(value).map_err(|_| {
        ConfigFileError::InvalidValue {
            section: section.to_string(),
            key: "serialization_format".to_string(),
            value: value.to_string(),
            reason: "must be 'json' or 'binary'".to_string(),
        }
    })
}

pub(super) fn parse_bool(value: &str) -> bool {
    let v = value.trim().to_lowercase();
    v == "true" || v == "1" || v == "yes" || v == "on"
}

pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
