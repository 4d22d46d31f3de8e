//! Bloom filter guard kept as a Redis bitmap.
//!
//! The filter is a single string key manipulated with `SETBIT`/`GETBIT`, so
//! every process pointed at the same key shares one filter and a code
//! registered by any instance is visible to all of them.
//!
//! Bit positions come from double hashing an MD5 digest of the code:
//! `h1 + i * h2 (mod m)` for `i` in `0..k`, where `h1` and `h2` are the two
//! little-endian halves of the digest. The layout is deterministic, so any
//! process computing the same `(m, k)` reads the same bits.
//!
//! Whether the bitmap is complete is shared too. Marking the guard
//! unsynchronized sets a `<key>:stale` marker, and while the marker exists
//! every process answers "present" so its callers fall back to the store.
//! [`crate::sync_from_repository`] removes the marker once the bitmap has
//! been rebuilt.

use async_trait::async_trait;
use md5::{Digest, Md5};
use redis::AsyncCommands;
use rabbit_core::{ExistenceGuard, GuardError, ShortCode};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, trace, warn};
use typed_builder::TypedBuilder;

/// Key holding the shared bitmap.
pub const DEFAULT_KEY: &str = "shortener:bloom";

/// Suffix of the key marking the bitmap as missing codes.
const STALE_SUFFIX: &str = ":stale";

/// Largest bitmap Redis accepts (offsets are limited to `2^32 - 1`).
const MAX_BITS: u64 = 1 << 32;

/// Configuration for the shared bloom filter.
///
/// Every process sharing a key must use the same sizing, otherwise they
/// disagree on bit positions.
#[derive(Debug, Clone, TypedBuilder)]
pub struct RedisBloomGuardConfig {
    #[builder(default = DEFAULT_KEY.to_string(), setter(into))]
    pub key: String,

    /// Expected number of codes to be registered.
    #[builder(default = 1_000_000)]
    pub expected_items: u64,

    /// Desired false positive rate, between 0.0 and 1.0 exclusive.
    #[builder(default = 0.001)]
    pub false_positive_rate: f64,

    /// Whether the filter starts out synchronized.
    #[builder(default = false)]
    pub synchronized: bool,
}

/// An [`ExistenceGuard`] backed by a Redis bitmap.
#[derive(Debug, Clone)]
pub struct RedisBloomGuard {
    conn: redis::aio::MultiplexedConnection,
    key: String,
    stale_key: String,
    num_bits: u64,
    num_hashes: u32,
    synchronized: Arc<AtomicBool>,
}

impl RedisBloomGuard {
    /// Creates a guard over an existing connection.
    ///
    /// The bitmap itself is created lazily by the first `SETBIT`.
    pub fn new(
        conn: redis::aio::MultiplexedConnection,
        config: RedisBloomGuardConfig,
    ) -> Result<Self, GuardError> {
        let (num_bits, num_hashes) =
            optimal_params(config.expected_items, config.false_positive_rate)?;
        debug!(
            key = %config.key,
            num_bits,
            num_hashes,
            "configured redis bloom filter"
        );
        Ok(Self {
            conn,
            stale_key: format!("{}{STALE_SUFFIX}", config.key),
            key: config.key,
            num_bits,
            num_hashes,
            synchronized: Arc::new(AtomicBool::new(config.synchronized)),
        })
    }

    /// Opens a connection to `redis_url` and creates a guard over it.
    pub async fn connect(
        redis_url: &str,
        config: RedisBloomGuardConfig,
    ) -> Result<Self, GuardError> {
        let client = redis::Client::open(redis_url).map_err(|e| {
            GuardError::Initialization(format!("failed to open Redis client: {e}"))
        })?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| GuardError::Unavailable(format!("failed to connect to Redis: {e}")))?;
        Self::new(conn, config)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Key whose presence marks the bitmap as missing codes.
    pub fn stale_key(&self) -> &str {
        &self.stale_key
    }

    pub fn num_bits(&self) -> u64 {
        self.num_bits
    }

    pub fn num_hashes(&self) -> u32 {
        self.num_hashes
    }

    /// Deletes the bitmap and marks it stale for every process.
    pub async fn clear(&self) -> Result<(), GuardError> {
        self.synchronized.store(false, Ordering::Release);
        let mut conn = self.conn.clone();
        let _: () = redis::pipe()
            .atomic()
            .cmd("DEL")
            .arg(&self.key)
            .ignore()
            .cmd("SET")
            .arg(&self.stale_key)
            .arg(1)
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(map_redis_error)?;
        Ok(())
    }

    fn offsets(&self, code: &ShortCode) -> impl Iterator<Item = u64> {
        bit_offsets(code.as_str(), self.num_bits, self.num_hashes)
    }
}

/// Sizes a filter for `n` items at false positive rate `p`.
///
/// Returns `(m, k)`: `m = ceil(-n ln p / ln(2)^2)` bits clamped to what Redis
/// can address, and `k = round(m / n * ln 2)` hash functions, at least one.
fn optimal_params(n: u64, p: f64) -> Result<(u64, u32), GuardError> {
    if n == 0 {
        return Err(GuardError::Initialization(
            "expected_items must be greater than zero".to_string(),
        ));
    }
    if !(p > 0.0 && p < 1.0) {
        return Err(GuardError::Initialization(format!(
            "false_positive_rate must be in (0, 1), got {p}"
        )));
    }

    let ln2 = std::f64::consts::LN_2;
    let bits = (-(n as f64) * p.ln() / (ln2 * ln2)).ceil();
    let num_bits = (bits as u64).clamp(8, MAX_BITS);
    let num_hashes = ((num_bits as f64 / n as f64) * ln2).round().max(1.0) as u32;
    Ok((num_bits, num_hashes))
}

fn bit_offsets(item: &str, num_bits: u64, num_hashes: u32) -> impl Iterator<Item = u64> {
    let digest = Md5::digest(item.as_bytes());
    let mut lo = [0u8; 8];
    let mut hi = [0u8; 8];
    lo.copy_from_slice(&digest[..8]);
    hi.copy_from_slice(&digest[8..]);
    let h1 = u64::from_le_bytes(lo);
    let h2 = u64::from_le_bytes(hi);

    (0..u64::from(num_hashes)).map(move |i| h1.wrapping_add(i.wrapping_mul(h2)) % num_bits)
}

fn map_redis_error(err: redis::RedisError) -> GuardError {
    if err.is_io_error() || err.is_timeout() {
        GuardError::Unavailable(err.to_string())
    } else {
        GuardError::Operation(err.to_string())
    }
}

#[async_trait]
impl ExistenceGuard for RedisBloomGuard {
    async fn probably_exists(&self, code: &ShortCode) -> bool {
        let mut pipe = redis::pipe();
        pipe.cmd("EXISTS").arg(&self.stale_key);
        for offset in self.offsets(code) {
            pipe.cmd("GETBIT").arg(&self.key).arg(offset);
        }

        let mut conn = self.conn.clone();
        let replies: Vec<i64> = match pipe.query_async(&mut conn).await {
            Ok(replies) => replies,
            Err(e) => {
                warn!(code = %code, error = %e, "redis bloom lookup failed, assuming present");
                return true;
            }
        };

        let Some((stale, bits)) = replies.split_first() else {
            return true;
        };
        if *stale != 0 {
            trace!(code = %code, "redis bloom is stale, assuming present");
            return true;
        }
        let present = bits.iter().all(|bit| *bit == 1);
        trace!(code = %code, present, "redis bloom lookup");
        present
    }

    async fn register(&self, code: &ShortCode) -> Result<(), GuardError> {
        self.register_many(std::slice::from_ref(code)).await
    }

    async fn register_many(&self, codes: &[ShortCode]) -> Result<(), GuardError> {
        if codes.is_empty() {
            return Ok(());
        }

        let mut pipe = redis::pipe();
        for code in codes {
            for offset in self.offsets(code) {
                pipe.cmd("SETBIT").arg(&self.key).arg(offset).arg(1).ignore();
            }
        }

        let mut conn = self.conn.clone();
        let _: () = pipe.query_async(&mut conn).await.map_err(|e| {
            warn!(
                key = %self.key,
                count = codes.len(),
                error = %e,
                "redis bloom registration failed"
            );
            map_redis_error(e)
        })?;
        trace!(key = %self.key, count = codes.len(), "registered codes in redis bloom");
        Ok(())
    }

    fn is_synchronized(&self) -> bool {
        self.synchronized.load(Ordering::Acquire)
    }

    async fn set_synchronized(&self, synchronized: bool) -> Result<(), GuardError> {
        let mut conn = self.conn.clone();
        if synchronized {
            let _: () = conn.del(&self.stale_key).await.map_err(map_redis_error)?;
            self.synchronized.store(true, Ordering::Release);
        } else {
            self.synchronized.store(false, Ordering::Release);
            let _: () = conn
                .set(&self.stale_key, 1)
                .await
                .map_err(|e| {
                    warn!(key = %self.stale_key, error = %e, "failed to mark redis bloom stale");
                    map_redis_error(e)
                })?;
            debug!(key = %self.stale_key, "marked redis bloom stale");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn sizing_matches_textbook_formula() {
        // 1M items at 0.1% needs ~14.38M bits and 10 hashes.
        let (m, k) = optimal_params(1_000_000, 0.001).unwrap();
        assert!((14_377_000..14_378_000).contains(&m), "m = {m}");
        assert_eq!(k, 10);

        let (m, k) = optimal_params(1_000, 0.01).unwrap();
        assert_eq!(m, 9_586);
        assert_eq!(k, 7);
    }

    #[test]
    fn sizing_is_clamped_to_redis_limits() {
        let (m, k) = optimal_params(u64::MAX / 2, 0.000_001).unwrap();
        assert_eq!(m, MAX_BITS);
        assert!(k >= 1);
    }

    #[test]
    fn sizing_rejects_bad_input() {
        assert!(matches!(
            optimal_params(0, 0.01),
            Err(GuardError::Initialization(_))
        ));
        assert!(matches!(
            optimal_params(10, 0.0),
            Err(GuardError::Initialization(_))
        ));
        assert!(matches!(
            optimal_params(10, 1.0),
            Err(GuardError::Initialization(_))
        ));
    }

    #[test]
    fn offsets_are_deterministic_and_in_range() {
        let a: Vec<_> = bit_offsets("1eN", 9_586, 7).collect();
        let b: Vec<_> = bit_offsets("1eN", 9_586, 7).collect();
        assert_eq!(a, b);
        assert_eq!(a.len(), 7);
        assert!(a.iter().all(|o| *o < 9_586));
    }

    #[test]
    fn offsets_depend_on_case() {
        let lower: HashSet<_> = bit_offsets("ab", MAX_BITS, 10).collect();
        let upper: HashSet<_> = bit_offsets("AB", MAX_BITS, 10).collect();
        assert_ne!(lower, upper);
    }
}
