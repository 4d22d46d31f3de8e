use crate::error::SequenceError;
use async_trait::async_trait;
use std::sync::Arc;

/// A source of strictly increasing numbers shared by every issuer instance.
///
/// Implementations delegate atomicity to an external store, so any number of
/// processes can issue concurrently without coordinating with each other.
#[async_trait]
pub trait Sequence: Send + Sync + 'static {
    /// Issues the next number.
    ///
    /// The value is positive and strictly greater than every value returned
    /// before, to this caller or any other. Errors are never retried here.
    async fn next(&self) -> Result<u64, SequenceError>;
}

#[async_trait]
impl<T: Sequence + ?Sized> Sequence for Arc<T> {
    async fn next(&self) -> Result<u64, SequenceError> {
        (**self).next().await
    }
}
