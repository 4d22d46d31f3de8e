//! Long URL to short URL conversion.
//!
//! [`ConverterService`] wires a mapping store, a sequence issuer, an
//! existence guard and a reachability checker into the conversion pipeline.
//! The `shortener` binary in this crate builds one from command-line
//! configuration.

pub mod converter;
pub mod error;
pub mod reachability;
pub mod service;

pub use converter::{ConvertResponse, Converter};
pub use error::{ConvertError, DependencyError};
pub use reachability::{
    HttpChecker, HttpCheckerConfig, PermissiveChecker, Reachability, ReachabilityError,
};
pub use service::{ConverterService, ConverterSettings};
