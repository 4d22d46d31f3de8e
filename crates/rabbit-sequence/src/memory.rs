use async_trait::async_trait;
use rabbit_core::{Sequence, SequenceError};
use std::sync::atomic::{AtomicU64, Ordering};

/// An in-process sequence backed by an atomic counter.
///
/// Strictly increasing within one instance only: it does not survive a
/// restart and is not shared between processes. Use it for tests and for
/// single-node deployments whose store is also in memory.
#[derive(Debug, Default)]
pub struct AtomicSequence {
    counter: AtomicU64,
}

impl AtomicSequence {
    /// Creates a sequence whose first value is `1`.
    pub fn new() -> Self {
        Self::with_offset(0)
    }

    /// Creates a sequence whose first value is `offset + 1`.
    ///
    /// Useful for resuming from a known high-water mark.
    pub fn with_offset(offset: u64) -> Self {
        Self {
            counter: AtomicU64::new(offset),
        }
    }

    /// The last value issued, or the offset if nothing was issued yet.
    pub fn current(&self) -> u64 {
        self.counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Sequence for AtomicSequence {
    async fn next(&self) -> Result<u64, SequenceError> {
        self.counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_add(1))
            .map(|previous| previous + 1)
            .map_err(|_| SequenceError::Exhausted)
    }
}
