use rabbit_core::{ExistenceGuard, GuardError, ReadRepository, StorageError};
use thiserror::Error;
use tracing::{debug, info};

/// Errors raised while re-synchronizing a guard from the store.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("failed to list stored codes: {0}")]
    Storage(#[from] StorageError),
    #[error("failed to register codes: {0}")]
    Guard(#[from] GuardError),
}

/// Registers every stored code in `guard`, then marks it synchronized.
///
/// Pages through [`ReadRepository::list_codes`] `page_size` codes at a time.
/// The guard is marked unsynchronized for the duration and stays that way if
/// any page fails, so callers keep falling back to the store. Returns the
/// number of codes registered.
///
/// Codes inserted while the sync is running are registered by their own
/// conversion; both paths are idempotent.
pub async fn sync_from_repository<G, R>(
    guard: &G,
    repository: &R,
    page_size: usize,
) -> Result<u64, SyncError>
where
    G: ExistenceGuard + ?Sized,
    R: ReadRepository + ?Sized,
{
    let page_size = page_size.max(1);
    guard.set_synchronized(false).await?;

    let mut cursor = 0;
    let mut total: u64 = 0;
    loop {
        let page = repository.list_codes(cursor, page_size).await?;
        guard.register_many(&page.codes).await?;
        total += page.codes.len() as u64;
        debug!(cursor, count = page.codes.len(), total, "synced page into guard");

        match page.next_cursor {
            Some(next) => cursor = next,
            None => break,
        }
    }

    guard.set_synchronized(true).await?;
    info!(total, "existence guard synchronized from store");
    Ok(total)
}
