use crate::error::{CoreError, Result};
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

const HEX_LEN: usize = 32;

/// Deterministic digest of a long URL, used to detect duplicate submissions.
///
/// The digest is the lowercase hex MD5 of the exact URL bytes. It is not a
/// security boundary: uniqueness is enforced by the store, the hash only
/// gives the duplicate check a fixed-width key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentHash(String);

impl ContentHash {
    /// Hashes a long URL.
    pub fn of(long_url: &str) -> Self {
        let digest = Md5::digest(long_url.as_bytes());
        Self(format!("{digest:x}"))
    }

    /// Wraps an already computed hex digest, e.g. one read back from storage.
    pub fn from_hex(hex: impl Into<String>) -> Result<Self> {
        let hex = hex.into();
        let valid = hex.len() == HEX_LEN
            && hex
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if !valid {
            return Err(CoreError::InvalidHash(format!(
                "expected {HEX_LEN} lowercase hex characters, got '{hex}'"
            )));
        }
        Ok(Self(hex))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ContentHash {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        Self::from_hex(value)
    }
}

impl From<ContentHash> for String {
    fn from(value: ContentHash) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_digest() {
        assert_eq!(
            ContentHash::of("https://example.com/a").as_str().len(),
            HEX_LEN
        );
        assert_eq!(
            ContentHash::of("").as_str(),
            "d41d8cd98f00b204e9800998ecf8427e"
        );
    }

    #[test]
    fn deterministic_and_distinct() {
        let a = ContentHash::of("https://example.com/a");
        assert_eq!(a, ContentHash::of("https://example.com/a"));
        assert_ne!(a, ContentHash::of("https://example.com/b"));
    }

    #[test]
    fn from_hex_validates() {
        let hash = ContentHash::of("https://example.com");
        assert_eq!(ContentHash::from_hex(hash.as_str()).unwrap(), hash);
        assert!(ContentHash::from_hex("abc").is_err());
        assert!(ContentHash::from_hex("D41D8CD98F00B204E9800998ECF8427E").is_err());
    }
}
