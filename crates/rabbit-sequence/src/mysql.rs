use async_trait::async_trait;
use rabbit_core::{Sequence, SequenceError};
use sqlx::MySqlPool;
use tracing::{error, trace};

const DEFAULT_STUB: &str = "a";

/// A sequence backed by a one-row MySQL table with an auto-increment id.
///
/// Each call runs `REPLACE INTO sequence (stub) VALUES (?)`. Replacing the
/// row deletes it and inserts a new one, which allocates the next
/// auto-increment id. The id is read from the statement's own result
/// (`last_insert_id`), which is per-connection, so a concurrent caller's
/// write can never be read by mistake.
#[derive(Debug, Clone)]
pub struct MySqlSequence {
    pool: MySqlPool,
    stub: String,
}

impl MySqlSequence {
    /// Creates a sequence from an existing MySQL connection pool.
    pub fn new(pool: MySqlPool) -> Self {
        Self {
            pool,
            stub: DEFAULT_STUB.to_string(),
        }
    }

    /// Creates a sequence by opening a new MySQL connection pool.
    pub async fn connect(database_url: &str) -> Result<Self, SequenceError> {
        let pool = MySqlPool::connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    /// Creates the `sequence` table if it does not exist.
    pub async fn ensure_schema(&self) -> Result<(), SequenceError> {
        sqlx::query(crate::MYSQL_SEQUENCE_DDL)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

fn map_sqlx_error(err: sqlx::Error) -> SequenceError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => SequenceError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => SequenceError::Unavailable(message),
        _ => SequenceError::Backend(message),
    }
}

#[async_trait]
impl Sequence for MySqlSequence {
    async fn next(&self) -> Result<u64, SequenceError> {
        let result = sqlx::query("REPLACE INTO sequence (stub) VALUES (?)")
            .bind(self.stub.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!(error = %e, "REPLACE INTO sequence failed");
                map_sqlx_error(e)
            })?;

        let value = result.last_insert_id();
        trace!(value, "issued sequence value");

        if value == 0 {
            return Err(SequenceError::InvalidData(
                "REPLACE INTO sequence returned no auto-increment id".to_string(),
            ));
        }
        Ok(value)
    }
}
