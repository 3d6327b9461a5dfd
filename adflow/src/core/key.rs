//! Deterministic content keys.
//!
//! A [`ContentKey`] is the only dedup and merge key used by every store.
//! Parts are trimmed and ASCII-lowercased, joined with `:`, hashed with MD5
//! and truncated to [`ContentKey::LEN`] hex characters. ASCII-only case
//! folding keeps the key independent of locale and of the language that
//! computes it.

use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator placed between normalized parts before hashing.
pub const KEY_DELIMITER: &str = ":";

/// A fixed-length opaque identifier for one logical unit of work.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentKey(String);

impl ContentKey {
    /// Number of hex characters kept from the digest.
    pub const LEN: usize = 12;

    /// Derives a key from the ordered identifying parts of a work item.
    ///
    /// # Examples
    ///
    /// ```
    /// use adflow::core::ContentKey;
    ///
    /// let a = ContentKey::derive(&["p-1", "meta", "2"]);
    /// let b = ContentKey::derive(&[" P-1 ", "META", "2"]);
    /// assert_eq!(a, b);
    /// assert_eq!(a.as_str().len(), ContentKey::LEN);
    /// ```
    #[must_use]
    pub fn derive<S: AsRef<str>>(parts: &[S]) -> Self {
        let normalized: Vec<String> = parts
            .iter()
            .map(|p| p.as_ref().trim().to_ascii_lowercase())
            .collect();
        let digest = Md5::digest(normalized.join(KEY_DELIMITER).as_bytes());
        let mut hex = hex::encode(digest);
        hex.truncate(Self::LEN);
        Self(hex)
    }

    /// Wraps an already-derived key, e.g. one read back from a store.
    #[must_use]
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ContentKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_is_deterministic() {
        let a = ContentKey::derive(&["abc123", "meta", "1"]);
        let b = ContentKey::derive(&["abc123", "meta", "1"]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_any_part_changes_key() {
        let base = ContentKey::derive(&["abc123", "meta", "1"]);
        assert_ne!(base, ContentKey::derive(&["abc124", "meta", "1"]));
        assert_ne!(base, ContentKey::derive(&["abc123", "google", "1"]));
        assert_ne!(base, ContentKey::derive(&["abc123", "meta", "2"]));
    }

    #[test]
    fn test_normalization() {
        assert_eq!(
            ContentKey::derive(&["  Widget ", "SKU-9"]),
            ContentKey::derive(&["widget", "sku-9"])
        );
    }

    #[test]
    fn test_part_order_matters() {
        assert_ne!(
            ContentKey::derive(&["review", "p1"]),
            ContentKey::derive(&["p1", "review"])
        );
    }

    #[test]
    fn test_known_digest() {
        // md5("abc123:meta:1"), first 12 hex chars
        let key = ContentKey::derive(&["abc123", "meta", "1"]);
        let full = hex::encode(Md5::digest(b"abc123:meta:1"));
        assert_eq!(key.as_str(), &full[..12]);
        assert!(key.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_empty_parts_are_valid() {
        let key = ContentKey::derive(&["", ""]);
        assert_eq!(key.as_str().len(), ContentKey::LEN);
        assert_ne!(key, ContentKey::derive(&[""]));
    }

    #[test]
    fn test_serde_transparent() {
        let key = ContentKey::from_raw("0123456789ab");
        assert_eq!(serde_json::to_string(&key).unwrap(), r#""0123456789ab""#);
    }
}
