use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rabbit_core::repository::{CodePage, ReadRepository, Repository, Result};
use rabbit_core::{ContentHash, ShortCode, StorageError, UrlMapping};
use std::sync::atomic::{AtomicU64, Ordering};

/// A mapping together with its insertion id, used as the listing cursor.
#[derive(Debug, Clone)]
struct Stored {
    id: u64,
    mapping: UrlMapping,
}

/// In-memory implementation of the Repository trait using DashMap.
///
/// Both unique indexes are enforced by the insert itself: the hash slot and
/// the code slot are locked together (always in that order) before either is
/// written, so two racing inserts on the same key resolve to one winner.
#[derive(Debug)]
pub struct InMemoryRepository {
    by_hash: DashMap<ContentHash, Stored>,
    by_code: DashMap<ShortCode, Stored>,
    last_id: AtomicU64,
}

impl InMemoryRepository {
    /// Creates a new in-memory repository.
    pub fn new() -> Self {
        Self {
            by_hash: DashMap::new(),
            by_code: DashMap::new(),
            last_id: AtomicU64::new(0),
        }
    }

    /// Creates a new in-memory repository with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            by_hash: DashMap::with_capacity(capacity),
            by_code: DashMap::with_capacity(capacity),
            last_id: AtomicU64::new(0),
        }
    }

    /// Number of stored mappings.
    pub fn len(&self) -> usize {
        self.by_hash.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_hash.is_empty()
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReadRepository for InMemoryRepository {
    async fn find_by_hash(&self, hash: &ContentHash) -> Result<Option<UrlMapping>> {
        Ok(self.by_hash.get(hash).map(|s| s.mapping.clone()))
    }

    async fn find_by_code(&self, code: &ShortCode) -> Result<Option<UrlMapping>> {
        Ok(self.by_code.get(code).map(|s| s.mapping.clone()))
    }

    async fn list_codes(&self, cursor: u64, limit: usize) -> Result<CodePage> {
        let mut page: Vec<(u64, ShortCode)> = self
            .by_code
            .iter()
            .filter(|s| s.id > cursor)
            .map(|s| (s.id, s.key().clone()))
            .collect();
        page.sort_unstable_by_key(|(id, _)| *id);
        page.truncate(limit);

        let next_cursor = match page.last() {
            Some((id, _)) if page.len() == limit => Some(*id),
            _ => None,
        };

        Ok(CodePage {
            codes: page.into_iter().map(|(_, code)| code).collect(),
            next_cursor,
        })
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn insert(&self, mapping: UrlMapping) -> Result<()> {
        let hash_slot = match self.by_hash.entry(mapping.content_hash.clone()) {
            Entry::Occupied(_) => {
                return Err(StorageError::Conflict(format!(
                    "content hash '{}'",
                    mapping.content_hash
                )))
            }
            Entry::Vacant(slot) => slot,
        };

        let code_slot = match self.by_code.entry(mapping.short_code.clone()) {
            Entry::Occupied(_) => {
                return Err(StorageError::Conflict(format!(
                    "short code '{}'",
                    mapping.short_code
                )))
            }
            Entry::Vacant(slot) => slot,
        };

        let id = self.last_id.fetch_add(1, Ordering::Relaxed) + 1;
        let stored = Stored { id, mapping };
        code_slot.insert(stored.clone());
        hash_slot.insert(stored);
        Ok(())
    }
}
