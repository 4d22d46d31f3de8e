//! Tracing subscriber setup shared by the workspace binaries.
//!
//! Log level comes from `RUST_LOG` when set, falling back to
//! [`TelemetryConfig::default_directive`]. Records emitted through the `log`
//! facade (e.g. by driver crates) are forwarded into `tracing`.

use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;
use tracing_subscriber::EnvFilter;
use typed_builder::TypedBuilder;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("invalid log filter '{directive}': {reason}")]
    InvalidFilter { directive: String, reason: String },
    #[error("failed to install tracing subscriber: {0}")]
    Install(String),
}

/// Output format of the log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable, one line per event.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl Display for LogFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Pretty => write!(f, "pretty"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

#[derive(Debug, Clone, TypedBuilder)]
pub struct TelemetryConfig {
    #[builder(default)]
    pub format: LogFormat,

    /// Filter used when `RUST_LOG` is unset.
    #[builder(default = String::from("info"), setter(into))]
    pub default_directive: String,

    /// Write to stderr instead of stdout, leaving stdout for program output.
    #[builder(default = true)]
    pub stderr: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Builds the level filter: `RUST_LOG` if present, else `default_directive`.
pub fn env_filter(default_directive: &str) -> Result<EnvFilter, TelemetryError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(default_directive).map_err(|e| {
            TelemetryError::InvalidFilter {
                directive: default_directive.to_string(),
                reason: e.to_string(),
            }
        }),
    }
}

/// Installs the global subscriber. Fails if one is already installed.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = env_filter(&config.default_directive)?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let installed = match (config.format, config.stderr) {
        (LogFormat::Pretty, true) => builder.with_writer(std::io::stderr).try_init(),
        (LogFormat::Pretty, false) => builder.try_init(),
        (LogFormat::Json, true) => builder.json().with_writer(std::io::stderr).try_init(),
        (LogFormat::Json, false) => builder.json().try_init(),
    };
    installed.map_err(|e| TelemetryError::Install(e.to_string()))
}
