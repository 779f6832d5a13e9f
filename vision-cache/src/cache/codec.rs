//! Value serialization for tiers that store bytes.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::cache::types::CacheError;

/// Encoding used by the network and persistent tiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SerializationFormat {
    /// Structured text (JSON)
    #[default]
    Json,
    /// Compact binary (bincode)
    Binary,
}

impl SerializationFormat {
    /// Encode a value.
    pub fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, CacheError> {
        match self {
            SerializationFormat::Json => serde_json::to_vec(value)
                .map_err(|e| CacheError::Serialization(format!("JSON encode failed: {}", e))),
            SerializationFormat::Binary => bincode::serialize(value)
                .map_err(|e| CacheError::Serialization(format!("bincode encode failed: {}", e))),
        }
    }

    /// Decode a value. Corrupt or mismatched bytes yield `CacheError::Serialization`.
    pub fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CacheError> {
        match self {
            SerializationFormat::Json => serde_json::from_slice(bytes)
                .map_err(|e| CacheError::Serialization(format!("JSON decode failed: {}", e))),
            SerializationFormat::Binary => bincode::deserialize(bytes)
                .map_err(|e| CacheError::Serialization(format!("bincode decode failed: {}", e))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SerializationFormat::Json => "json",
            SerializationFormat::Binary => "binary",
        }
    }
}

impl fmt::Display for SerializationFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SerializationFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" | "text" => Ok(SerializationFormat::Json),
            "binary" | "bincode" => Ok(SerializationFormat::Binary),
            other => Err(format!("unknown serialization format '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Sample {
        text: String,
        confidence: f64,
    }

    fn sample() -> Sample {
        Sample {
            text: "KA01AB1234".to_string(),
            confidence: 0.93,
        }
    }

    #[test]
    fn test_json_is_readable_text() {
        let bytes = SerializationFormat::Json.encode(&sample()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("KA01AB1234"));
    }

    #[test]
    fn test_binary_decodes_what_it_encodes() {
        let bytes = SerializationFormat::Binary.encode(&sample()).unwrap();
        let decoded: Sample = SerializationFormat::Binary.decode(&bytes).unwrap();
        assert_eq!(decoded, sample());
    }

    #[test]
    fn test_corrupt_bytes_are_serialization_errors() {
        let result: Result<Sample, _> = SerializationFormat::Json.decode(b"{not json");
        assert!(matches!(result, Err(CacheError::Serialization(_))));

        let result: Result<Sample, _> = SerializationFormat::Binary.decode(&[0xff, 0x01]);
        assert!(matches!(result, Err(CacheError::Serialization(_))));
    }

    #[test]
    fn test_format_mismatch_is_error() {
        let bytes = SerializationFormat::Binary.encode(&sample()).unwrap();
        let result: Result<Sample, _> = SerializationFormat::Json.decode(&bytes);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_format() {
        assert_eq!("json".parse(), Ok(SerializationFormat::Json));
        assert_eq!(" Binary ".parse(), Ok(SerializationFormat::Binary));
        assert_eq!("bincode".parse(), Ok(SerializationFormat::Binary));
        assert!("pickle".parse::<SerializationFormat>().is_err());
    }
}
