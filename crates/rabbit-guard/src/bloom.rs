//! In-process bloom filter guard.
//!
//! The filter lives in process memory behind a read/write lock, so lookups
//! are lock-cheap and never touch the network. Each process has its own
//! filter: a code issued by another instance is unknown here until the
//! filter is re-synchronized from the store. Deployments with more than one
//! writer should use [`crate::RedisBloomGuard`] instead, or keep this guard
//! unsynchronized.

use async_trait::async_trait;
use parking_lot::RwLock;
use rabbit_core::{ExistenceGuard, GuardError, ShortCode};
use std::sync::atomic::{AtomicBool, Ordering};
use typed_builder::TypedBuilder;

/// Configuration for the bloom filter.
#[derive(Debug, Clone, TypedBuilder)]
pub struct BloomGuardConfig {
    /// Expected number of codes to be registered.
    ///
    /// Registering many more than this raises the false positive rate; the
    /// filter never produces false negatives either way.
    #[builder(default = 1_000_000)]
    pub expected_items: usize,

    /// Desired false positive rate, between 0.0 and 1.0 exclusive.
    #[builder(default = 0.001)]
    pub false_positive_rate: f64,

    /// Whether the filter starts out synchronized.
    ///
    /// Only set this when the store is known to be empty.
    #[builder(default = false)]
    pub synchronized: bool,
}

impl Default for BloomGuardConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// An [`ExistenceGuard`] backed by an in-process bloom filter.
pub struct BloomGuard {
    bloom: RwLock<bloomfilter::Bloom<ShortCode>>,
    synchronized: AtomicBool,
}

impl BloomGuard {
    /// Creates an empty filter.
    ///
    /// # Errors
    ///
    /// Returns `GuardError::Initialization` if the sizing parameters are
    /// rejected (zero items, or a rate outside `(0, 1)`).
    pub fn new(config: BloomGuardConfig) -> Result<Self, GuardError> {
        if config.expected_items == 0 {
            return Err(GuardError::Initialization(
                "expected_items must be greater than zero".to_string(),
            ));
        }
        if !(config.false_positive_rate > 0.0 && config.false_positive_rate < 1.0) {
            return Err(GuardError::Initialization(format!(
                "false_positive_rate must be in (0, 1), got {}",
                config.false_positive_rate
            )));
        }

        let bloom =
            bloomfilter::Bloom::new_for_fp_rate(config.expected_items, config.false_positive_rate)
                .map_err(|e| GuardError::Initialization(e.to_string()))?;
        Ok(Self {
            bloom: RwLock::new(bloom),
            synchronized: AtomicBool::new(config.synchronized),
        })
    }

    /// Empties the filter and marks it unsynchronized.
    pub fn clear(&self) {
        self.bloom.write().clear();
        self.synchronized.store(false, Ordering::Release);
    }
}

impl std::fmt::Debug for BloomGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BloomGuard")
            .field("synchronized", &self.is_synchronized())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ExistenceGuard for BloomGuard {
    async fn probably_exists(&self, code: &ShortCode) -> bool {
        self.bloom.read().check(code)
    }

    async fn register(&self, code: &ShortCode) -> Result<(), GuardError> {
        self.bloom.write().set(code);
        Ok(())
    }

    async fn register_many(&self, codes: &[ShortCode]) -> Result<(), GuardError> {
        let mut bloom = self.bloom.write();
        for code in codes {
            bloom.set(code);
        }
        Ok(())
    }

    fn is_synchronized(&self) -> bool {
        self.synchronized.load(Ordering::Acquire)
    }

    async fn set_synchronized(&self, synchronized: bool) -> Result<(), GuardError> {
        self.synchronized.store(synchronized, Ordering::Release);
        Ok(())
    }
}
