//! Sequence issuer backends.
//!
//! Every backend implements [`rabbit_core::Sequence`]: a call returns a number
//! strictly greater than anything returned before, across all processes that
//! share the backend. Pick one at startup:
//!
//! - [`RedisSequence`]: `INCR` on a single key.
//! - [`MySqlSequence`]: `REPLACE INTO` a one-row table and read the
//!   auto-increment id from the statement result.
//! - [`AtomicSequence`]: an in-process counter for tests and single-node use.

pub mod memory;
pub mod mysql;
pub mod redis;

pub use self::memory::AtomicSequence;
pub use self::mysql::MySqlSequence;
pub use self::redis::RedisSequence;
pub use rabbit_core::{Sequence, SequenceError};

/// DDL for the `sequence` table used by [`MySqlSequence`].
pub const MYSQL_SEQUENCE_DDL: &str = include_str!("../ddl/mysql/sequence.sql");
