use crate::error::ConvertError;
use async_trait::async_trait;
use rabbit_core::{ShortCode, UrlMapping};
use serde::{Deserialize, Serialize};

/// Result of a successful conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertResponse {
    /// `short_domain + "/" + short_code`.
    pub short_url: String,
    pub short_code: ShortCode,
}

#[async_trait]
pub trait Converter: Send + Sync + 'static {
    /// Issues a short URL for `long_url`.
    ///
    /// Fails with [`ConvertError::AlreadyShortened`] if the URL was converted
    /// before and with [`ConvertError::AlreadyAShortUrl`] if it is itself one
    /// of the issued short URLs.
    async fn convert(&self, long_url: &str) -> Result<ConvertResponse, ConvertError>;

    /// Looks up the mapping behind a short code.
    ///
    /// Fails with [`ConvertError::MalformedCode`] if `code` is not a
    /// canonical base62 string.
    async fn resolve(&self, code: &str) -> Result<Option<UrlMapping>, ConvertError>;
}
