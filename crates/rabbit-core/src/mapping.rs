use crate::hash::ContentHash;
use crate::shortcode::ShortCode;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// Longest `long_url`, in bytes, that every store can hold.
pub const MAX_URL_LEN: usize = 65_535;

/// The durable record of one shortening operation.
///
/// Records are written once and never mutated or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlMapping {
    /// The original URL that was shortened.
    pub long_url: String,
    /// Digest of `long_url`, unique across all records.
    pub content_hash: ContentHash,
    /// The issued short code, unique across all records.
    pub short_code: ShortCode,
    /// When the record was created.
    pub created_at: Timestamp,
}

impl UrlMapping {
    /// Builds a new record stamped with the current time.
    pub fn new(long_url: impl Into<String>, content_hash: ContentHash, short_code: ShortCode) -> Self {
        Self {
            long_url: long_url.into(),
            content_hash,
            short_code,
            created_at: Timestamp::now(),
        }
    }
}
