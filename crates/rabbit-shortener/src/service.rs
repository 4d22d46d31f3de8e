use crate::converter::{ConvertResponse, Converter};
use crate::error::ConvertError;
use crate::reachability::Reachability;
use async_trait::async_trait;
use rabbit_core::url::base_path;
use rabbit_core::{
    ContentHash, ExistenceGuard, Repository, ReservedCodes, Sequence, ShortCode, StorageError,
    UrlMapping, MAX_URL_LEN,
};
use tracing::{debug, error, instrument, trace, warn};
use typed_builder::TypedBuilder;

/// Settings fixed for the lifetime of a [`ConverterService`].
#[derive(Debug, Clone, TypedBuilder)]
pub struct ConverterSettings {
    /// Prefix of every issued short URL, e.g. `https://rb.it`.
    #[builder(setter(into))]
    pub short_domain: String,

    /// Codes that are skipped when issued.
    #[builder(default)]
    pub reserved: ReservedCodes,

    /// Longer URLs are rejected before any backend is touched.
    #[builder(default = MAX_URL_LEN)]
    pub max_url_len: usize,
}

/// The conversion pipeline.
///
/// Each call to [`Converter::convert`] runs these steps in order and stops
/// at the first failure:
///
/// 1. reject the URL if it is too long to store or the reachability checker
///    refuses it;
/// 2. reject it if its content hash is already stored;
/// 3. reject it if its last path segment is an issued short code;
/// 4. draw sequence numbers until one encodes to a non-reserved code;
/// 5. insert the mapping, surfacing a uniqueness conflict as-is;
/// 6. register the code in the existence guard (best effort).
///
/// Steps 2 and 3 are plain reads before the write. Two concurrent requests
/// for the same URL can both pass them; the store's uniqueness constraints
/// decide which insert wins and the loser gets [`ConvertError::Conflict`].
#[derive(Debug)]
pub struct ConverterService<R, S, G, C> {
    repository: R,
    sequence: S,
    guard: G,
    checker: C,
    settings: ConverterSettings,
}

impl<R, S, G, C> ConverterService<R, S, G, C>
where
    R: Repository,
    S: Sequence,
    G: ExistenceGuard,
    C: Reachability,
{
    pub fn new(
        repository: R,
        sequence: S,
        guard: G,
        checker: C,
        settings: ConverterSettings,
    ) -> Self {
        Self {
            repository,
            sequence,
            guard,
            checker,
            settings,
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn guard(&self) -> &G {
        &self.guard
    }

    pub fn settings(&self) -> &ConverterSettings {
        &self.settings
    }

    /// Looks a code up in the store unless the guard rules it out.
    async fn lookup_code(&self, code: &ShortCode) -> Result<Option<UrlMapping>, ConvertError> {
        if self.guard.is_synchronized() && !self.guard.probably_exists(code).await {
            trace!(code = %code, "guard rules code out");
            return Ok(None);
        }

        self.repository.find_by_code(code).await.map_err(|e| {
            error!(code = %code, error = %e, "failed to look up mapping by code");
            ConvertError::dependency("find mapping by code")(e)
        })
    }

    async fn ensure_not_a_short_url(&self, long_url: &str) -> Result<(), ConvertError> {
        let segment = match base_path(long_url) {
            Ok(segment) => segment,
            Err(e) => {
                debug!(error = %e, "no base path, skipping self-reference check");
                return Ok(());
            }
        };

        let code = match ShortCode::parse(&segment) {
            Ok(code) => code,
            Err(_) => {
                debug!(
                    segment = %segment,
                    "base path is not a short code, skipping self-reference check"
                );
                return Ok(());
            }
        };

        if self.lookup_code(&code).await?.is_some() {
            debug!(code = %code, "input is an issued short url");
            return Err(ConvertError::AlreadyAShortUrl);
        }
        Ok(())
    }

    async fn issue_code(&self) -> Result<ShortCode, ConvertError> {
        loop {
            let seq = self.sequence.next().await.map_err(|e| {
                error!(error = %e, "failed to issue sequence number");
                ConvertError::dependency("issue sequence")(e)
            })?;

            let code = ShortCode::from_sequence(seq);
            if self.settings.reserved.is_reserved(code.as_str()) {
                debug!(seq, code = %code, "skipping reserved code");
                continue;
            }
            trace!(seq, code = %code, "issued code");
            return Ok(code);
        }
    }
}

#[async_trait]
impl<R, S, G, C> Converter for ConverterService<R, S, G, C>
where
    R: Repository,
    S: Sequence,
    G: ExistenceGuard,
    C: Reachability,
{
    #[instrument(skip_all, fields(long_url = %long_url))]
    async fn convert(&self, long_url: &str) -> Result<ConvertResponse, ConvertError> {
        if long_url.len() > self.settings.max_url_len {
            debug!(len = long_url.len(), "url is too long");
            return Err(ConvertError::InvalidInput(format!(
                "url is {} bytes long, the limit is {}",
                long_url.len(),
                self.settings.max_url_len
            )));
        }

        if !self.checker.check(long_url).await {
            debug!("url is not reachable");
            return Err(ConvertError::InvalidInput(format!(
                "url is not reachable: {long_url}"
            )));
        }

        let content_hash = ContentHash::of(long_url);
        let existing = self
            .repository
            .find_by_hash(&content_hash)
            .await
            .map_err(|e| {
                error!(error = %e, "failed to look up mapping by hash");
                ConvertError::dependency("find mapping by hash")(e)
            })?;
        if let Some(existing) = existing {
            debug!(code = %existing.short_code, "url already shortened");
            return Err(ConvertError::AlreadyShortened {
                short_url: existing.short_code.to_url(&self.settings.short_domain),
            });
        }

        self.ensure_not_a_short_url(long_url).await?;

        let short_code = self.issue_code().await?;

        let mapping = UrlMapping::new(long_url, content_hash, short_code.clone());
        match self.repository.insert(mapping).await {
            Ok(()) => {}
            Err(StorageError::Conflict(message)) => {
                debug!(code = %short_code, message = %message, "insert lost a uniqueness race");
                return Err(ConvertError::Conflict(message));
            }
            Err(e) => {
                error!(code = %short_code, error = %e, "failed to insert mapping");
                return Err(ConvertError::dependency("insert mapping")(e));
            }
        }

        if let Err(e) = self.guard.register(&short_code).await {
            warn!(
                code = %short_code,
                error = %e,
                "failed to register code in existence guard, bypassing guard until resync"
            );
            if let Err(e) = self.guard.set_synchronized(false).await {
                warn!(code = %short_code, error = %e, "failed to mark existence guard stale");
            }
        }

        let short_url = short_code.to_url(&self.settings.short_domain);
        debug!(code = %short_code, short_url = %short_url, "converted");
        Ok(ConvertResponse {
            short_url,
            short_code,
        })
    }

    async fn resolve(&self, code: &str) -> Result<Option<UrlMapping>, ConvertError> {
        let code = ShortCode::parse(code)?;
        self.lookup_code(&code).await
    }
}
