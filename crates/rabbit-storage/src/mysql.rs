use async_trait::async_trait;
use jiff::Timestamp;
use rabbit_core::repository::{CodePage, ReadRepository, Repository, Result};
use rabbit_core::{ContentHash, ShortCode, StorageError, UrlMapping};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};
use tracing::trace;

/// MySQL implementation of the repository contract.
///
/// Uniqueness of `md5` and `surl` is enforced by unique indexes (see
/// `ddl/mysql/short_url_map.sql`); a duplicate insert surfaces as
/// [`StorageError::Conflict`].
#[derive(Debug, Clone)]
pub struct MySqlRepository {
    pool: MySqlPool,
}

impl MySqlRepository {
    /// Creates a repository from an existing MySQL connection pool.
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Creates a repository by opening a new MySQL connection pool.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = MySqlPool::connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    /// Creates the `short_url_map` table if it does not exist.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(crate::MYSQL_SHORT_URL_MAP_DDL)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    async fn find_one(&self, column: Column, key: &str) -> Result<Option<UrlMapping>> {
        let sql = match column {
            Column::Md5 => "SELECT lurl, md5, surl, create_at FROM short_url_map WHERE md5 = ? LIMIT 1",
            Column::Surl => "SELECT lurl, md5, surl, create_at FROM short_url_map WHERE surl = ? LIMIT 1",
        };

        let row = sqlx::query(sql)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.map(|row| parse_mapping(&row)).transpose()
    }
}

#[derive(Debug, Clone, Copy)]
enum Column {
    Md5,
    Surl,
}

fn parse_mapping(row: &MySqlRow) -> Result<UrlMapping> {
    let long_url: String = row.try_get("lurl").map_err(map_sqlx_error)?;
    let md5: String = row.try_get("md5").map_err(map_sqlx_error)?;
    let surl: String = row.try_get("surl").map_err(map_sqlx_error)?;
    let create_at: i64 = row.try_get("create_at").map_err(map_sqlx_error)?;

    let content_hash =
        ContentHash::from_hex(md5).map_err(|e| StorageError::InvalidData(e.to_string()))?;
    let short_code =
        ShortCode::parse(&surl).map_err(|e| StorageError::InvalidData(e.to_string()))?;
    let created_at = Timestamp::from_second(create_at).map_err(|e| {
        StorageError::InvalidData(format!("invalid create_at timestamp '{create_at}': {e}"))
    })?;

    Ok(UrlMapping {
        long_url,
        content_hash,
        short_code,
        created_at,
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

#[async_trait]
impl ReadRepository for MySqlRepository {
    async fn find_by_hash(&self, hash: &ContentHash) -> Result<Option<UrlMapping>> {
        trace!(hash = %hash, "looking up mapping by content hash");
        self.find_one(Column::Md5, hash.as_str()).await
    }

    async fn find_by_code(&self, code: &ShortCode) -> Result<Option<UrlMapping>> {
        trace!(code = %code, "looking up mapping by short code");
        self.find_one(Column::Surl, code.as_str()).await
    }

    async fn list_codes(&self, cursor: u64, limit: usize) -> Result<CodePage> {
        let rows = sqlx::query(
            r#"
            SELECT id, surl
            FROM short_url_map
            WHERE id > ?
            ORDER BY id
            LIMIT ?
            "#,
        )
        .bind(cursor)
        .bind(limit as u64)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let mut codes = Vec::with_capacity(rows.len());
        let mut last_id = None;
        for row in &rows {
            let id: u64 = row.try_get("id").map_err(map_sqlx_error)?;
            let surl: String = row.try_get("surl").map_err(map_sqlx_error)?;
            codes.push(
                ShortCode::parse(&surl).map_err(|e| StorageError::InvalidData(e.to_string()))?,
            );
            last_id = Some(id);
        }

        let next_cursor = if codes.len() == limit { last_id } else { None };
        Ok(CodePage { codes, next_cursor })
    }
}

#[async_trait]
impl Repository for MySqlRepository {
    async fn insert(&self, mapping: UrlMapping) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO short_url_map (create_at, lurl, md5, surl)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(mapping.created_at.as_second())
        .bind(mapping.long_url.as_str())
        .bind(mapping.content_hash.as_str())
        .bind(mapping.short_code.as_str())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) if is_unique_violation(&err) => Err(StorageError::Conflict(format!(
                "short code '{}' or content hash '{}'",
                mapping.short_code, mapping.content_hash
            ))),
            Err(err) => Err(map_sqlx_error(err)),
        }
    }
}
