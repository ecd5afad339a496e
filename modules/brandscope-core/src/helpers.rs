use std::collections::HashSet;

use sha2::{Digest, Sha256};

/// Stable cache key for a canonical URL: lowercase hex SHA-256.
/// Must survive process restarts, so no hasher with keyed randomization.
pub fn url_hash(url: &str) -> String {
    hex::encode(Sha256::digest(url.as_bytes()))
}

/// Extract the host from a URL, with any leading `www.` stripped.
pub fn domain_of(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    Some(host.strip_prefix("www.").unwrap_or(host).to_ascii_lowercase())
}

/// Lowercased whitespace-token set of a text body.
pub fn token_set(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Token-based Jaccard similarity over two token sets.
pub fn jaccard_similarity(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

/// Truncate a string to at most `max_bytes` bytes at a character boundary.
pub fn truncate_to_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) && end > 0 {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_hash_is_stable_and_hex() {
        let a = url_hash("https://allbirds.com/");
        let b = url_hash("https://allbirds.com/");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, url_hash("https://allbirds.com/about"));
    }

    #[test]
    fn domain_of_strips_www_and_lowercases() {
        assert_eq!(
            domain_of("https://www.Allbirds.com/about"),
            Some("allbirds.com".to_string())
        );
        assert_eq!(
            domain_of("http://shop.example.org/x?y=1"),
            Some("shop.example.org".to_string())
        );
        assert_eq!(domain_of("not a url"), None);
    }

    #[test]
    fn jaccard_identical_is_one() {
        let a = token_set("sustainable wool shoes");
        assert!((jaccard_similarity(&a, &a) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn jaccard_disjoint_is_zero() {
        let a = token_set("alpha beta");
        let b = token_set("gamma delta");
        assert_eq!(jaccard_similarity(&a, &b), 0.0);
    }

    #[test]
    fn jaccard_empty_sets_are_zero_not_nan() {
        let empty = token_set("");
        assert_eq!(jaccard_similarity(&empty, &empty), 0.0);
    }

    #[test]
    fn jaccard_partial_overlap() {
        // {sustainable, wool, shoes} vs {sustainable, wool, runners}
        // intersection 2, union 4 → 0.5
        let a = token_set("sustainable wool shoes");
        let b = token_set("sustainable wool runners");
        assert!((jaccard_similarity(&a, &b) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let text = "Hello 世界";
        let truncated = truncate_to_char_boundary(text, 8);
        assert!(truncated.len() <= 8);
        assert!(text.starts_with(truncated));
        assert_eq!(truncate_to_char_boundary("short", 100), "short");
    }
}
