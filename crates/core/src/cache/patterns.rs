//! Glob matching for cache keys.
//!
//! `*` matches any run of characters, including none. There is no escape
//! syntax; keys containing `*` cannot be matched literally.

/// Checks if a cache key matches a glob pattern.
///
/// ```
/// use itemstore_core::cache::pattern_matches;
///
/// assert!(pattern_matches("map:42:*", "map:42:21|sk_live_abc"));
/// assert!(pattern_matches("map:*:21|*", "map:7:21|token"));
/// assert!(!pattern_matches("map:42:*", "map:43:21|token"));
/// ```
pub fn pattern_matches(pattern: &str, key: &str) -> bool {
    let mut parts = pattern.split('*');
    let Some(head) = parts.next() else {
        return key.is_empty();
    };
    let Some(mut rest) = key.strip_prefix(head) else {
        return false;
    };

    let tail: Vec<&str> = parts.collect();
    let Some((last, middle)) = tail.split_last() else {
        // No wildcard at all.
        return rest.is_empty();
    };

    for part in middle {
        match rest.find(part) {
            Some(at) => rest = &rest[at + part.len()..],
            None => return false,
        }
    }
    rest.ends_with(last)
}
