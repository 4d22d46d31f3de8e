use crate::codec;
use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt::Display;
use std::str::FromStr;

/// A validated short code: the canonical base62 form of a sequence number.
///
/// Every value of this type decodes back to exactly one `u64`, so two codes
/// are equal if and only if they were issued from the same sequence number.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ShortCode(SmolStr);

impl ShortCode {
    /// Encodes a sequence number into its short code.
    pub fn from_sequence(seq: u64) -> Self {
        Self(SmolStr::new(codec::encode(seq)))
    }

    /// Parses and validates a short code.
    ///
    /// Returns [`CoreError::MalformedCode`] if the input is not a canonical
    /// base62 string.
    pub fn parse(code: impl AsRef<str>) -> Result<Self> {
        let code = code.as_ref();
        codec::decode(code)?;
        Ok(Self(SmolStr::new(code)))
    }

    /// Returns the sequence number this code was issued from.
    pub fn sequence(&self) -> u64 {
        // Validated on construction.
        codec::decode(&self.0).unwrap_or_default()
    }

    /// Generates the full shortened URL based on the provided short domain.
    pub fn to_url(&self, short_domain: &str) -> String {
        format!("{}/{}", short_domain.trim_end_matches('/'), self)
    }

    /// Returns the short code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ShortCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ShortCode").field(&self.0).finish()
    }
}

impl Display for ShortCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ShortCode {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl FromStr for ShortCode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for ShortCode {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ShortCode {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = SmolStr::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_sequence_encodes_base62() {
        assert_eq!(ShortCode::from_sequence(1).as_str(), "1");
        assert_eq!(ShortCode::from_sequence(6347).as_str(), "1eN");
    }

    #[test]
    fn sequence_round_trips() {
        let code = ShortCode::from_sequence(987_654_321);
        assert_eq!(code.sequence(), 987_654_321);
    }

    #[test]
    fn parse_accepts_canonical_codes() {
        assert!(ShortCode::parse("1En").is_ok());
        assert!(ShortCode::parse("z").is_ok());
        assert!(ShortCode::parse("0").is_ok());
    }

    #[test]
    fn parse_rejects_malformed_codes() {
        assert!(ShortCode::parse("").is_err());
        assert!(ShortCode::parse("abc-def").is_err());
        assert!(ShortCode::parse("01").is_err());
        assert!(ShortCode::parse("fn9PEG?x").is_err());
    }

    #[test]
    fn display() {
        let code = ShortCode::parse("fn9PEG").unwrap();
        assert_eq!(code.to_string(), "fn9PEG");
    }

    #[test]
    fn to_url() {
        let code = ShortCode::parse("1En").unwrap();
        assert_eq!(code.to_url("https://rb.it"), "https://rb.it/1En");
        assert_eq!(code.to_url("https://rb.it/"), "https://rb.it/1En");
    }

    #[test]
    fn deserialize_validates() {
        let ok: ShortCode = serde_json::from_str("\"1En\"").unwrap();
        assert_eq!(ok.as_str(), "1En");

        let err = serde_json::from_str::<ShortCode>("\"no/slash\"");
        assert!(err.is_err());
    }
}
