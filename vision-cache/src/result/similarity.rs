//! Plate text normalization and similarity scoring.

use std::collections::HashSet;

/// Normalize plate text for storage and lookup.
///
/// Uppercases and drops every character that is not alphanumeric, so
/// `"ka-01 ab.1234"` becomes `"KA01AB1234"`.
pub fn normalize_plate(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_uppercase)
        .collect()
}

/// Intersection over union of the two strings' character sets.
///
/// Case-insensitive and order-insensitive. Returns 0.0 when both strings
/// are empty.
pub fn char_set_similarity(a: &str, b: &str) -> f64 {
    let set_a = char_set(a);
    let set_b = char_set(b);

    let union = set_a.union(&set_b).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = set_a.intersection(&set_b).count();

    intersection as f64 / union as f64
}

fn char_set(text: &str) -> HashSet<char> {
    text.chars().flat_map(char::to_lowercase).collect()
}
