//! Human-readable size parsing (e.g., "10MB", "512KB").

use thiserror::Error;

const KB: usize = 1024;
const MB: usize = 1024 * KB;
const GB: usize = 1024 * MB;

/// Suffixes in match order; longer spellings first.
const SUFFIXES: [(&str, usize); 6] = [
    ("GB", GB),
    ("MB", MB),
    ("KB", KB),
    ("G", GB),
    ("M", MB),
    ("K", KB),
];

/// Error parsing a size string.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid size '{input}' - expected format like '10MB', '512KB', or '1048576'")]
pub struct SizeParseError {
    input: String,
}

/// Parse a human-readable size string into bytes.
///
/// Accepts bare byte counts and the binary suffixes K/KB, M/MB, G/GB,
/// case-insensitive, with optional whitespace before the suffix.
///
/// # Examples
///
/// ```
/// use vision_cache::config::parse_size;
///
/// assert_eq!(parse_size("4096").unwrap(), 4096);
/// assert_eq!(parse_size("10MB").unwrap(), 10 * 1024 * 1024);
/// assert_eq!(parse_size("512 kb").unwrap(), 512 * 1024);
/// ```
pub fn parse_size(s: &str) -> Result<usize, SizeParseError> {
    let invalid = || SizeParseError {
        input: s.to_string(),
    };

    let trimmed = s.trim();
    let upper = trimmed.to_ascii_uppercase();

    let (digits, multiplier) = SUFFIXES
        .iter()
        .find_map(|(suffix, multiplier)| {
            upper
                .strip_suffix(suffix)
                .map(|rest| (rest.trim_end(), *multiplier))
        })
        .unwrap_or((upper.as_str(), 1));

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    digits
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_mul(multiplier))
        .ok_or_else(invalid)
}

/// Format a byte count using the largest suffix that divides it exactly.
///
/// ```
/// use vision_cache::config::format_size;
///
/// assert_eq!(format_size(10 * 1024 * 1024), "10MB");
/// assert_eq!(format_size(1500), "1500");
/// ```
pub fn format_size(bytes: usize) -> String {
    SUFFIXES[..3]
        .iter()
        .find(|(_, unit)| bytes >= *unit && bytes % unit == 0)
        .map(|(suffix, unit)| format!("{}{}", bytes / unit, suffix))
        .unwrap_or_else(|| bytes.to_string())
}
