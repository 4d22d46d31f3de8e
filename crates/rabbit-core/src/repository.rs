use crate::error::StorageError;
use crate::hash::ContentHash;
use crate::mapping::UrlMapping;
use crate::shortcode::ShortCode;
use async_trait::async_trait;
use std::sync::Arc;

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// One page of stored short codes, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CodePage {
    pub codes: Vec<ShortCode>,
    /// Cursor to pass to the next [`ReadRepository::list_codes`] call.
    /// `None` once the last page has been returned.
    pub next_cursor: Option<u64>,
}

/// A read-only view of the mapping store.
#[async_trait]
pub trait ReadRepository: Send + Sync + 'static {
    /// Looks up a mapping by the digest of its long URL.
    async fn find_by_hash(&self, hash: &ContentHash) -> Result<Option<UrlMapping>>;

    /// Looks up a mapping by its short code.
    async fn find_by_code(&self, code: &ShortCode) -> Result<Option<UrlMapping>>;

    /// Lists stored codes inserted after `cursor` (use `0` to start).
    async fn list_codes(&self, cursor: u64, limit: usize) -> Result<CodePage>;
}

#[async_trait]
pub trait Repository: ReadRepository {
    /// Inserts a new mapping.
    ///
    /// Returns `Err(StorageError::Conflict)` if either the content hash or the
    /// short code already exists. The check is enforced by the store itself,
    /// so of two racing inserts exactly one wins.
    async fn insert(&self, mapping: UrlMapping) -> Result<()>;
}

#[async_trait]
impl<T: ReadRepository + ?Sized> ReadRepository for Arc<T> {
    async fn find_by_hash(&self, hash: &ContentHash) -> Result<Option<UrlMapping>> {
        (**self).find_by_hash(hash).await
    }

    async fn find_by_code(&self, code: &ShortCode) -> Result<Option<UrlMapping>> {
        (**self).find_by_code(code).await
    }

    async fn list_codes(&self, cursor: u64, limit: usize) -> Result<CodePage> {
        (**self).list_codes(cursor, limit).await
    }
}

#[async_trait]
impl<T: Repository + ?Sized> Repository for Arc<T> {
    async fn insert(&self, mapping: UrlMapping) -> Result<()> {
        (**self).insert(mapping).await
    }
}
