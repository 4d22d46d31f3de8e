use async_trait::async_trait;
use rabbit_core::{ExistenceGuard, GuardError, ShortCode};

/// A guard that remembers nothing.
///
/// It reports every code as absent and is never synchronized, so callers
/// that honour [`ExistenceGuard::is_synchronized`] always consult the store.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullGuard;

#[async_trait]
impl ExistenceGuard for NullGuard {
    async fn probably_exists(&self, _code: &ShortCode) -> bool {
        false
    }

    async fn register(&self, _code: &ShortCode) -> Result<(), GuardError> {
        Ok(())
    }

    fn is_synchronized(&self) -> bool {
        false
    }

    async fn set_synchronized(&self, _synchronized: bool) -> Result<(), GuardError> {
        Ok(())
    }
}
