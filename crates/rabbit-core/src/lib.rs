//! Core types and traits for the Rabbit URL shortener.
//!
//! This crate provides the domain model shared by every other crate in the
//! workspace: the base62 [`codec`], validated [`ShortCode`]s, content hashes,
//! the [`UrlMapping`] record and the seams ([`Sequence`], [`ExistenceGuard`],
//! [`Repository`]) that backends plug into.

pub mod codec;
pub mod error;
pub mod guard;
pub mod hash;
pub mod mapping;
pub mod repository;
pub mod reserved;
pub mod sequence;
pub mod shortcode;
pub mod url;

pub use error::{CoreError, GuardError, SequenceError, StorageError};
pub use guard::ExistenceGuard;
pub use hash::ContentHash;
pub use mapping::{UrlMapping, MAX_URL_LEN};
pub use repository::{CodePage, ReadRepository, Repository};
pub use reserved::ReservedCodes;
pub use sequence::Sequence;
pub use shortcode::ShortCode;
