use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use rabbit_telemetry::LogFormat;
use std::fmt::{Display, Formatter};

pub const SHORT_DOMAIN_ENV: &str = "RABBIT_SHORT_DOMAIN";
pub const RESERVED_CODES_ENV: &str = "RABBIT_RESERVED_CODES";
pub const SEQUENCE_BACKEND_ENV: &str = "RABBIT_SEQUENCE_BACKEND";
pub const STORAGE_BACKEND_ENV: &str = "RABBIT_STORAGE_BACKEND";
pub const GUARD_BACKEND_ENV: &str = "RABBIT_GUARD_BACKEND";
pub const REDIS_URL_ENV: &str = "RABBIT_REDIS_URL";
pub const MYSQL_DSN_ENV: &str = "RABBIT_MYSQL_DSN";
pub const ENSURE_SCHEMA_ENV: &str = "RABBIT_ENSURE_SCHEMA";
pub const BLOOM_EXPECTED_ITEMS_ENV: &str = "RABBIT_BLOOM_EXPECTED_ITEMS";
pub const BLOOM_FALSE_POSITIVE_RATE_ENV: &str = "RABBIT_BLOOM_FALSE_POSITIVE_RATE";
pub const WARM_GUARD_ENV: &str = "RABBIT_WARM_GUARD";
pub const GUARD_PAGE_SIZE_ENV: &str = "RABBIT_GUARD_PAGE_SIZE";
pub const REACHABILITY_ENV: &str = "RABBIT_REACHABILITY";
pub const PROBE_TIMEOUT_MS_ENV: &str = "RABBIT_PROBE_TIMEOUT_MS";
pub const LOG_FORMAT_ENV: &str = "RABBIT_LOG_FORMAT";
pub const OUTPUT_ENV: &str = "RABBIT_OUTPUT";

pub const DEFAULT_SHORT_DOMAIN: &str = "http://localhost:8080";
pub const DEFAULT_BLOOM_EXPECTED_ITEMS: usize = 1_000_000;
pub const DEFAULT_BLOOM_FALSE_POSITIVE_RATE: f64 = 0.001;
pub const DEFAULT_GUARD_PAGE_SIZE: usize = 1_000;
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SequenceBackendArg {
    #[value(name = "memory")]
    Memory,
    #[value(name = "redis")]
    Redis,
    #[value(name = "mysql")]
    Mysql,
}

impl Display for SequenceBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SequenceBackendArg::Memory => write!(f, "memory"),
            SequenceBackendArg::Redis => write!(f, "redis"),
            SequenceBackendArg::Mysql => write!(f, "mysql"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "memory")]
    Memory,
    #[value(name = "mysql")]
    Mysql,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::Memory => write!(f, "memory"),
            StorageBackendArg::Mysql => write!(f, "mysql"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GuardBackendArg {
    #[value(name = "none")]
    None,
    #[value(name = "bloom")]
    Bloom,
    #[value(name = "redis")]
    Redis,
}

impl Display for GuardBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            GuardBackendArg::None => write!(f, "none"),
            GuardBackendArg::Bloom => write!(f, "bloom"),
            GuardBackendArg::Redis => write!(f, "redis"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReachabilityArg {
    /// Probe with an HTTP GET and require `200 OK`.
    #[value(name = "http")]
    Http,
    /// Accept any http(s) URL with a host, without network access.
    #[value(name = "permissive")]
    Permissive,
}

impl Display for ReachabilityArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ReachabilityArg::Http => write!(f, "http"),
            ReachabilityArg::Permissive => write!(f, "permissive"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    #[value(name = "pretty")]
    Pretty,
    #[value(name = "json")]
    Json,
}

impl Display for LogFormatArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormatArg::Pretty => write!(f, "pretty"),
            LogFormatArg::Json => write!(f, "json"),
        }
    }
}

impl From<LogFormatArg> for LogFormat {
    fn from(value: LogFormatArg) -> Self {
        match value {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputArg {
    /// Tab-separated, one line per input.
    #[value(name = "text")]
    Text,
    /// One JSON object per input.
    #[value(name = "json")]
    Json,
}

impl Display for OutputArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputArg::Text => write!(f, "text"),
            OutputArg::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Convert long URLs into short URLs.
    Convert {
        #[arg(required = true)]
        urls: Vec<String>,
    },
    /// Look up the long URLs behind short codes.
    Resolve {
        #[arg(required = true)]
        codes: Vec<String>,
    },
    /// Register every stored code in the existence guard.
    SyncGuard,
}

#[derive(Debug, Parser)]
#[command(name = "shortener", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Prefix of every issued short URL.
    #[arg(long, env = SHORT_DOMAIN_ENV, default_value = DEFAULT_SHORT_DOMAIN)]
    pub short_domain: String,

    /// Comma-separated codes never to issue. Defaults to the built-in set.
    #[arg(long, env = RESERVED_CODES_ENV, value_delimiter = ',')]
    pub reserved_codes: Option<Vec<String>>,

    #[arg(
        long,
        env = SEQUENCE_BACKEND_ENV,
        value_enum,
        default_value_t = SequenceBackendArg::Memory
    )]
    pub sequence: SequenceBackendArg,

    #[arg(
        long,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::Memory
    )]
    pub storage: StorageBackendArg,

    #[arg(
        long,
        env = GUARD_BACKEND_ENV,
        value_enum,
        default_value_t = GuardBackendArg::Bloom
    )]
    pub guard: GuardBackendArg,

    #[arg(
        long,
        env = REDIS_URL_ENV,
        required_if_eq_any([("sequence", "redis"), ("guard", "redis")])
    )]
    pub redis_url: Option<String>,

    #[arg(
        long,
        env = MYSQL_DSN_ENV,
        required_if_eq_any([("sequence", "mysql"), ("storage", "mysql")])
    )]
    pub mysql_dsn: Option<String>,

    /// Create the MySQL tables if they do not exist.
    #[arg(long, env = ENSURE_SCHEMA_ENV)]
    pub ensure_schema: bool,

    #[arg(
        long,
        env = BLOOM_EXPECTED_ITEMS_ENV,
        default_value_t = DEFAULT_BLOOM_EXPECTED_ITEMS
    )]
    pub bloom_expected_items: usize,

    #[arg(
        long,
        env = BLOOM_FALSE_POSITIVE_RATE_ENV,
        default_value_t = DEFAULT_BLOOM_FALSE_POSITIVE_RATE
    )]
    pub bloom_false_positive_rate: f64,

    /// Load every stored code into the guard before serving requests.
    #[arg(
        long,
        env = WARM_GUARD_ENV,
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    pub warm_guard: bool,

    #[arg(long, env = GUARD_PAGE_SIZE_ENV, default_value_t = DEFAULT_GUARD_PAGE_SIZE)]
    pub guard_page_size: usize,

    #[arg(
        long,
        env = REACHABILITY_ENV,
        value_enum,
        default_value_t = ReachabilityArg::Http
    )]
    pub reachability: ReachabilityArg,

    #[arg(long, env = PROBE_TIMEOUT_MS_ENV, default_value_t = DEFAULT_PROBE_TIMEOUT_MS)]
    pub probe_timeout_ms: u64,

    #[arg(
        long,
        env = LOG_FORMAT_ENV,
        value_enum,
        default_value_t = LogFormatArg::Pretty
    )]
    pub log_format: LogFormatArg,

    #[arg(long, env = OUTPUT_ENV, value_enum, default_value_t = OutputArg::Text)]
    pub output: OutputArg,
}

impl Cli {
    /// Rejects backend combinations that cannot keep codes unique or the
    /// guard complete once the store outlives the process.
    pub fn validate(&self) -> Result<(), clap::Error> {
        if self.storage == StorageBackendArg::Memory {
            return Ok(());
        }
        if self.sequence == SequenceBackendArg::Memory {
            return Err(Cli::command().error(
                ErrorKind::ArgumentConflict,
                format!(
                    "--sequence memory restarts at 1 on every run and cannot be used with \
                     --storage {}; choose --sequence redis or --sequence mysql",
                    self.storage
                ),
            ));
        }
        if self.guard == GuardBackendArg::Bloom {
            return Err(Cli::command().error(
                ErrorKind::ArgumentConflict,
                format!(
                    "--guard bloom only sees codes issued by this process and cannot be used \
                     with --storage {}; choose --guard redis or --guard none",
                    self.storage
                ),
            ));
        }
        Ok(())
    }
}
