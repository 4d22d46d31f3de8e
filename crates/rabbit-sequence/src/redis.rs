use async_trait::async_trait;
use rabbit_core::{Sequence, SequenceError};
use redis::AsyncCommands;
use tracing::{error, trace};

/// Key holding the shared counter.
pub const DEFAULT_KEY: &str = "shortener:id";

/// A sequence backed by Redis `INCR` on a single shared key.
///
/// `INCR` increments and returns the new value in one atomic command, so the
/// value handed out is exactly the one this call produced; no second read is
/// involved that could observe another caller's increment. If the reply is
/// lost after Redis applied the increment, that value is burned: the error
/// is surfaced and the next call gets a larger number.
#[derive(Debug, Clone)]
pub struct RedisSequence {
    conn: redis::aio::MultiplexedConnection,
    key: String,
}

impl RedisSequence {
    /// Creates a sequence on [`DEFAULT_KEY`].
    pub fn new(conn: redis::aio::MultiplexedConnection) -> Self {
        Self::with_key(conn, DEFAULT_KEY)
    }

    /// Creates a sequence on a custom key.
    pub fn with_key(conn: redis::aio::MultiplexedConnection, key: impl Into<String>) -> Self {
        Self {
            conn,
            key: key.into(),
        }
    }

    /// Opens a connection to `redis_url` and creates a sequence on [`DEFAULT_KEY`].
    pub async fn connect(redis_url: &str) -> Result<Self, SequenceError> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| map_redis_error("failed to open Redis client", e))?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| map_redis_error("failed to connect to Redis", e))?;
        Ok(Self::new(conn))
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

fn map_redis_error(operation: &str, err: redis::RedisError) -> SequenceError {
    let message = format!("{operation}: {err}");
    if err.is_timeout() {
        SequenceError::Timeout(message)
    } else if err.is_io_error() {
        SequenceError::Unavailable(message)
    } else {
        SequenceError::Backend(message)
    }
}

#[async_trait]
impl Sequence for RedisSequence {
    async fn next(&self) -> Result<u64, SequenceError> {
        let mut conn = self.conn.clone();
        let value: i64 = conn.incr(&self.key, 1).await.map_err(|e| {
            error!(key = %self.key, error = %e, "redis INCR failed");
            map_redis_error("failed to increment sequence", e)
        })?;

        trace!(key = %self.key, value, "issued sequence value");

        u64::try_from(value)
            .ok()
            .filter(|v| *v > 0)
            .ok_or_else(|| {
                SequenceError::InvalidData(format!(
                    "key '{}' holds non-positive value {value}",
                    self.key
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn timeouts_are_classified_by_kind() {
        let err = redis::RedisError::from(io::Error::new(io::ErrorKind::TimedOut, "slow"));
        assert!(matches!(
            map_redis_error("failed to increment sequence", err),
            SequenceError::Timeout(_)
        ));
    }

    #[test]
    fn io_errors_are_unavailable() {
        let err = redis::RedisError::from(io::Error::new(
            io::ErrorKind::ConnectionRefused,
            "operation timed out earlier",
        ));
        assert!(matches!(
            map_redis_error("failed to connect to Redis", err),
            SequenceError::Unavailable(message) if message.starts_with("failed to connect")
        ));
    }
}
