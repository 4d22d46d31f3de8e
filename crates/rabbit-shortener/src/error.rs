use rabbit_core::{CoreError, SequenceError, StorageError};
use thiserror::Error;

/// A failed call to the store or the sequence issuer.
#[derive(Debug, Clone, Error)]
pub enum DependencyError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Sequence(#[from] SequenceError),
}

impl DependencyError {
    /// Stable category of the underlying failure.
    pub fn kind(&self) -> &'static str {
        match self {
            DependencyError::Storage(e) => match e {
                StorageError::Conflict(_) => "conflict",
                StorageError::Unavailable(_) => "unavailable",
                StorageError::Timeout(_) => "timeout",
                StorageError::Query(_) => "query",
                StorageError::InvalidData(_) => "invalid_data",
            },
            DependencyError::Sequence(e) => match e {
                SequenceError::Unavailable(_) => "unavailable",
                SequenceError::Timeout(_) => "timeout",
                SequenceError::Backend(_) => "backend",
                SequenceError::InvalidData(_) => "invalid_data",
                SequenceError::Exhausted => "exhausted",
            },
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum ConvertError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("url has already been shortened as {short_url}")]
    AlreadyShortened { short_url: String },
    #[error("url is already a short url")]
    AlreadyAShortUrl,
    #[error("concurrent conversion conflict: {0}")]
    Conflict(String),
    #[error("{operation} failed: {source}")]
    DependencyFailure {
        operation: &'static str,
        #[source]
        source: DependencyError,
    },
    #[error("malformed short code: {0}")]
    MalformedCode(String),
}

impl ConvertError {
    /// Stable machine-readable identifier of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ConvertError::InvalidInput(_) => "invalid_input",
            ConvertError::AlreadyShortened { .. } => "already_shortened",
            ConvertError::AlreadyAShortUrl => "already_a_short_url",
            ConvertError::Conflict(_) => "conflict",
            ConvertError::DependencyFailure { .. } => "dependency_failure",
            ConvertError::MalformedCode(_) => "malformed_code",
        }
    }

    /// Whether the same request may succeed if repeated.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ConvertError::Conflict(_) | ConvertError::DependencyFailure { .. }
        )
    }

    /// Wraps a backend error, tagging it with the operation that failed.
    pub fn dependency<E: Into<DependencyError>>(
        operation: &'static str,
    ) -> impl FnOnce(E) -> ConvertError {
        move |source| ConvertError::DependencyFailure {
            operation,
            source: source.into(),
        }
    }
}

impl From<CoreError> for ConvertError {
    fn from(value: CoreError) -> Self {
        match value {
            CoreError::MalformedCode(message) => Self::MalformedCode(message),
            CoreError::InvalidUrl(message) | CoreError::InvalidHash(message) => {
                Self::InvalidInput(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage_failure(e: StorageError) -> ConvertError {
        ConvertError::dependency("find mapping by hash")(e)
    }

    #[test]
    fn kinds_are_stable() {
        assert_eq!(ConvertError::InvalidInput("x".into()).kind(), "invalid_input");
        assert_eq!(
            ConvertError::AlreadyShortened {
                short_url: "https://rb.it/1".into()
            }
            .kind(),
            "already_shortened"
        );
        assert_eq!(ConvertError::AlreadyAShortUrl.kind(), "already_a_short_url");
        assert_eq!(ConvertError::Conflict("x".into()).kind(), "conflict");
        assert_eq!(
            storage_failure(StorageError::Timeout("slow".into())).kind(),
            "dependency_failure"
        );
        assert_eq!(ConvertError::MalformedCode("x".into()).kind(), "malformed_code");
    }

    #[test]
    fn only_conflict_and_dependency_failures_are_retryable() {
        assert!(ConvertError::Conflict("x".into()).is_retryable());
        assert!(storage_failure(StorageError::Unavailable("down".into())).is_retryable());
        assert!(!ConvertError::InvalidInput("x".into()).is_retryable());
        assert!(!ConvertError::AlreadyAShortUrl.is_retryable());
        assert!(!ConvertError::MalformedCode("x".into()).is_retryable());
        assert!(!ConvertError::AlreadyShortened {
            short_url: "https://rb.it/1".into()
        }
        .is_retryable());
    }

    #[test]
    fn dependency_failure_keeps_operation_and_kind() {
        let err = ConvertError::dependency("issue sequence")(SequenceError::Timeout(
            "redis".into(),
        ));

        match &err {
            ConvertError::DependencyFailure { operation, source } => {
                assert_eq!(*operation, "issue sequence");
                assert_eq!(source.kind(), "timeout");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().starts_with("issue sequence failed: "));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn messages_are_stable() {
        assert_eq!(
            ConvertError::AlreadyShortened {
                short_url: "https://rb.it/1".into()
            }
            .to_string(),
            "url has already been shortened as https://rb.it/1"
        );
        assert_eq!(
            ConvertError::AlreadyAShortUrl.to_string(),
            "url is already a short url"
        );
    }

    #[test]
    fn core_errors_convert() {
        let err: ConvertError = CoreError::MalformedCode("0a".into()).into();
        assert!(matches!(err, ConvertError::MalformedCode(_)));

        let err: ConvertError = CoreError::InvalidUrl("nope".into()).into();
        assert!(matches!(err, ConvertError::InvalidInput(_)));
    }
}
