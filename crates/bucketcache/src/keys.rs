//! Cache key encoding.
//!
//! Logical keys may use `/` to express hierarchy. Each `/`-separated
//! segment is sanitized and percent-encoded on its own and the separators
//! are written back literally, so listings by prefix stay meaningful and
//! empty or repeated segments survive the round trip.

use bucketcache_core::{CacheError, Result};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

const SEPARATOR: char = '/';

/// Characters left unescaped, matching `encodeURIComponent`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Strip characters that are unsafe in object identifiers.
pub fn sanitize_segment(segment: &str) -> String {
    segment.chars().filter(|c| !c.is_control()).collect()
}

fn encode_path(key: &str) -> String {
    key.split(SEPARATOR)
        .map(|segment| utf8_percent_encode(&sanitize_segment(segment), COMPONENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

/// Maps logical cache keys to storage keys under a fixed prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyCodec {
    prefix: String,
}

impl KeyCodec {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Storage key for a logical key.
    pub fn encode(&self, key: &str) -> Result<String> {
        if key.is_empty() {
            return Err(CacheError::Configuration(
                "Cache key must be a non-empty string".to_string(),
            ));
        }

        let encoded = encode_path(key);
        if encoded.is_empty() {
            return Err(CacheError::Configuration(format!(
                "Cache key {:?} is empty after sanitization",
                key
            )));
        }

        Ok(format!("{}{}", self.prefix, encoded))
    }

    /// Listing prefix for a scan pattern. An empty pattern selects the whole namespace.
    pub fn encode_pattern(&self, pattern: &str) -> String {
        format!("{}{}", self.prefix, encode_path(pattern))
    }

    /// Logical key for a storage key found by a listing.
    pub fn decode(&self, storage_key: &str) -> Result<String> {
        let encoded = storage_key.strip_prefix(self.prefix.as_str()).ok_or_else(|| {
            CacheError::Configuration(format!(
                "Storage key {:?} is outside prefix {:?}",
                storage_key, self.prefix
            ))
        })?;

        percent_decode_str(encoded)
            .decode_utf8()
            .map(|key| key.into_owned())
            .map_err(|e| {
                CacheError::Configuration(format!(
                    "Storage key {:?} is not valid UTF-8: {}",
                    storage_key, e
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bucketcache_core::ErrorKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_hierarchy_preserved() {
        let codec = KeyCodec::default();
        let encoded = codec.encode("a/b/c").unwrap();
        assert_eq!(encoded, "a/b/c");
        assert_eq!(codec.decode(&encoded).unwrap(), "a/b/c");
    }

    #[test]
    fn test_boundary_and_repeated_separators() {
        let codec = KeyCodec::default();
        for key in ["/leading", "trailing/", "a//b", "//", "/"] {
            let encoded = codec.encode(key).unwrap();
            assert_eq!(encoded, key);
            assert_eq!(codec.decode(&encoded).unwrap(), key);
        }
    }

    #[test]
    fn test_unsafe_characters_are_encoded() {
        let codec = KeyCodec::default();
        assert_eq!(codec.encode("user:1 name").unwrap(), "user%3A1%20name");
        assert_eq!(codec.encode("caf\u{e9}").unwrap(), "caf%C3%A9");
        assert_eq!(codec.encode("100%").unwrap(), "100%25");
        assert_eq!(codec.decode("user%3A1%20name").unwrap(), "user:1 name");
    }

    #[test]
    fn test_control_characters_are_removed() {
        let codec = KeyCodec::default();
        assert_eq!(codec.encode("a\nb/c\u{0}d").unwrap(), "ab/cd");
    }

    #[test]
    fn test_prefix_is_prepended_and_stripped() {
        let codec = KeyCodec::new("app/cache/");
        let encoded = codec.encode("scan:1").unwrap();
        assert_eq!(encoded, "app/cache/scan%3A1");
        assert_eq!(codec.decode(&encoded).unwrap(), "scan:1");
    }

    #[test]
    fn test_empty_key_rejected() {
        let codec = KeyCodec::default();
        assert_eq!(codec.encode("").unwrap_err().kind(), ErrorKind::Configuration);
        assert_eq!(
            codec.encode("\n\t").unwrap_err().kind(),
            ErrorKind::Configuration
        );
    }

    #[test]
    fn test_decode_outside_prefix() {
        let codec = KeyCodec::new("app/");
        assert!(codec.decode("other/key").is_err());
    }

    #[test]
    fn test_pattern_encoding() {
        let codec = KeyCodec::new("p/");
        assert_eq!(codec.encode_pattern(""), "p/");
        assert_eq!(codec.encode_pattern("scan:"), "p/scan%3A");
    }
}
