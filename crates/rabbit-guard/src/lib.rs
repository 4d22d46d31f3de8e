//! Existence guard backends.
//!
//! A guard answers "has this short code possibly been issued?" without a
//! round-trip to the mapping store. Every backend implements
//! [`rabbit_core::ExistenceGuard`]:
//!
//! - [`BloomGuard`]: an in-process bloom filter.
//! - [`RedisBloomGuard`]: a bloom filter kept as a Redis bitmap, shared by
//!   every process pointed at the same key.
//! - [`NullGuard`]: never knows anything, so callers always ask the store.
//!
//! A guard built over a non-empty store must be warmed up with
//! [`sync_from_repository`] before its negative answers can be trusted.

pub mod bloom;
pub mod null;
pub mod redis;
pub mod sync;

pub use self::bloom::{BloomGuard, BloomGuardConfig};
pub use self::null::NullGuard;
pub use self::redis::{RedisBloomGuard, RedisBloomGuardConfig};
pub use self::sync::{sync_from_repository, SyncError};
pub use rabbit_core::{ExistenceGuard, GuardError};
