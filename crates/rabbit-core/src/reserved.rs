use std::collections::HashSet;

/// Codes that are never issued when no list is configured: words that look
/// like service paths, and a few words nobody wants in their short link.
pub const DEFAULT_RESERVED_CODES: &[&str] = &[
    "api", "admin", "assets", "convert", "health", "login", "metrics", "show", "static",
    "version", "fuck", "shit", "stupid",
];

/// An immutable set of codes that must never be assigned.
///
/// Matching is exact and case-sensitive, like the codes themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservedCodes {
    codes: HashSet<String>,
}

impl ReservedCodes {
    pub fn new<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            codes: codes.into_iter().map(Into::into).collect(),
        }
    }

    /// A set that reserves nothing.
    pub fn none() -> Self {
        Self {
            codes: HashSet::new(),
        }
    }

    pub fn is_reserved(&self, code: &str) -> bool {
        self.codes.contains(code)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.codes.iter().map(String::as_str)
    }
}

impl Default for ReservedCodes {
    fn default() -> Self {
        Self::new(DEFAULT_RESERVED_CODES.iter().copied())
    }
}

impl<S: Into<String>> FromIterator<S> for ReservedCodes {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}
