//! URL helpers used by the self-reference check.

use crate::error::{CoreError, Result};
use url::Url;

/// Returns the last non-empty path segment of `raw`.
///
/// `https://rb.it/fn9PEG?name=Mike` yields `"fn9PEG"`. A URL without a path
/// yields an empty string. Fails if the URL cannot be parsed or has no host.
pub fn base_path(raw: &str) -> Result<String> {
    let parsed = Url::parse(raw).map_err(|e| CoreError::InvalidUrl(format!("'{raw}': {e}")))?;

    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(CoreError::InvalidUrl(format!("'{raw}' has no host")));
    }

    let segment = parsed
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .unwrap_or_default();

    Ok(segment.to_string())
}
