use std::sync::LazyLock;

use regex::Regex;

// digits with optional thousands separators, then an optional decimal part
static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d[\d,]*(?:\.\d+)?").expect("hardcoded"));

/// First number in free-form text such as `"29,900원"` or `"15.5%"`.
///
/// Returns `0.0` when the text holds no digits. Callers treat that as "not
/// found", never as a real zero price.
pub fn extract(text: &str) -> f64 {
    match NUMBER.find(text) {
        Some(x) => x.as_str().replace(',', "").parse().unwrap_or(0.0),
        None => 0.0,
    }
}

/// Stock quantity, truncated to a whole count.
pub fn extract_count(text: &str) -> u32 {
    // float-to-int casts saturate
    extract(text) as u32
}
