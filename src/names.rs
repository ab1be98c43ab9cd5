//! Key normalization shared by every source.
//!
//! Field names, path parameter names and query keys are all compared through
//! [`normalize_key`], so `filterArrInt`, `FILTERARRINT` and `filterArrInt[]`
//! name the same field.

use std::borrow::Cow;

/// Normalize a key for comparison: drop one trailing `[]`, then lowercase.
#[must_use]
pub fn normalize_key(key: &str) -> Cow<'_, str> {
    let key = key.strip_suffix("[]").unwrap_or(key);
    if key.chars().any(char::is_uppercase) {
        Cow::Owned(key.to_lowercase())
    } else {
        Cow::Borrowed(key)
    }
}

/// Whether an external key names the given field.
#[inline]
#[must_use]
pub fn keys_match(field: &str, key: &str) -> bool {
    normalize_key(field) == normalize_key(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("filterArrInt"), "filterarrint");
        assert_eq!(normalize_key("filterArrInt[]"), "filterarrint");
        assert_eq!(normalize_key("id"), "id");
        // only one bracket pair is a suffix marker
        assert_eq!(normalize_key("a[][]"), "a[]");
        assert_eq!(normalize_key("[]"), "");
    }

    #[test]
    fn test_borrowed_when_already_normal() {
        assert!(matches!(normalize_key("postid"), Cow::Borrowed(_)));
        assert!(matches!(normalize_key("postId"), Cow::Owned(_)));
    }

    #[test]
    fn test_keys_match() {
        assert!(keys_match("postId", "POSTID"));
        assert!(keys_match("filterArrInt", "filterarrint[]"));
        assert!(!keys_match("post", "postId"));
        assert!(!keys_match("post_id", "postId"));
    }
}
