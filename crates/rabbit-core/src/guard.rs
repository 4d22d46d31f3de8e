use crate::error::GuardError;
use crate::shortcode::ShortCode;
use async_trait::async_trait;
use std::sync::Arc;

/// A probabilistic set of issued short codes in front of the mapping store.
///
/// The guard may report a code as present when it is not, but never the
/// other way round for a code it has seen. It is advisory: a positive answer
/// must always be confirmed against the store.
///
/// A negative answer is only meaningful while the guard is synchronized,
/// i.e. it has seen every code in the store. Guards start unsynchronized
/// unless built for an empty store, and callers must fall back to the store
/// while [`ExistenceGuard::is_synchronized`] is `false`.
#[async_trait]
pub trait ExistenceGuard: Send + Sync + 'static {
    /// Returns `false` only if the code has definitely never been registered.
    ///
    /// Backends that cannot answer (e.g. a network error) return `true`.
    async fn probably_exists(&self, code: &ShortCode) -> bool;

    /// Adds a code to the set. Registering the same code twice is a no-op.
    async fn register(&self, code: &ShortCode) -> Result<(), GuardError>;

    /// Adds a batch of codes to the set.
    async fn register_many(&self, codes: &[ShortCode]) -> Result<(), GuardError> {
        for code in codes {
            self.register(code).await?;
        }
        Ok(())
    }

    /// Whether every stored code is known to have been registered.
    fn is_synchronized(&self) -> bool;

    /// Marks the guard as (un)synchronized with the store.
    ///
    /// Guards shared between processes publish the state so that a missed
    /// registration in one process makes every process consult the store.
    async fn set_synchronized(&self, synchronized: bool) -> Result<(), GuardError>;
}

#[async_trait]
impl<T: ExistenceGuard + ?Sized> ExistenceGuard for Arc<T> {
    async fn probably_exists(&self, code: &ShortCode) -> bool {
        (**self).probably_exists(code).await
    }

    async fn register(&self, code: &ShortCode) -> Result<(), GuardError> {
        (**self).register(code).await
    }

    async fn register_many(&self, codes: &[ShortCode]) -> Result<(), GuardError> {
        (**self).register_many(codes).await
    }

    fn is_synchronized(&self) -> bool {
        (**self).is_synchronized()
    }

    async fn set_synchronized(&self, synchronized: bool) -> Result<(), GuardError> {
        (**self).set_synchronized(synchronized).await
    }
}
