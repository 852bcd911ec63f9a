//! Content fingerprints used to collapse duplicate search hits.

/// Lowercases and collapses all whitespace runs to single spaces.
pub fn normalize(content: &str) -> String {
    content
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Number of words in already-normalized content.
pub fn word_count(normalized: &str) -> usize {
    normalized.split(' ').filter(|w| !w.is_empty()).count()
}

/// `md5(normalized_content + "|" + domain)` as lowercase hex.
pub fn fingerprint(normalized: &str, domain: &str) -> String {
    format!("{:x}", md5::compute(format!("{normalized}|{domain}")))
}
