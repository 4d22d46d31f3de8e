mod cli;

use crate::cli::{
    Cli, Command, GuardBackendArg, OutputArg, ReachabilityArg, SequenceBackendArg,
    StorageBackendArg,
};
use anyhow::{bail, Context};
use clap::Parser;
use rabbit_core::{ExistenceGuard, ReservedCodes, Sequence};
use rabbit_guard::{
    sync_from_repository, BloomGuard, BloomGuardConfig, NullGuard, RedisBloomGuard,
    RedisBloomGuardConfig,
};
use rabbit_sequence::{AtomicSequence, MySqlSequence, RedisSequence};
use rabbit_shortener::{
    ConvertError, Converter, ConverterService, ConverterSettings, HttpChecker, HttpCheckerConfig,
    PermissiveChecker, Reachability,
};
use rabbit_storage::{InMemoryRepository, MySqlRepository, Repository};
use rabbit_telemetry::TelemetryConfig;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

type Service = ConverterService<
    Arc<dyn Repository>,
    Arc<dyn Sequence>,
    Arc<dyn ExistenceGuard>,
    Arc<dyn Reachability>,
>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Cli::parse();
    if let Err(e) = config.validate() {
        e.exit();
    }

    rabbit_telemetry::init(
        &TelemetryConfig::builder()
            .format(config.log_format.into())
            .build(),
    )?;

    info!(
        short_domain = %config.short_domain,
        sequence_backend = %config.sequence,
        storage_backend = %config.storage,
        guard_backend = %config.guard,
        reachability = %config.reachability,
        "starting shortener"
    );

    let repository = build_repository(&config).await?;
    let sequence = build_sequence(&config, &repository).await?;
    let guard = build_guard(&config).await?;

    if let Command::SyncGuard = config.command {
        let total = sync_from_repository(&guard, &repository.repository, config.guard_page_size)
            .await
            .context("failed to synchronize existence guard")?;
        println!("{total}");
        return Ok(());
    }

    if config.warm_guard && config.guard != GuardBackendArg::None {
        sync_from_repository(&guard, &repository.repository, config.guard_page_size)
            .await
            .context("failed to warm up existence guard")?;
    }

    let service: Arc<Service> = Arc::new(ConverterService::new(
        repository.repository,
        sequence,
        guard,
        build_checker(&config)?,
        ConverterSettings::builder()
            .short_domain(config.short_domain.clone())
            .reserved(reserved_codes(config.reserved_codes.as_deref()))
            .build(),
    ));

    match config.command {
        Command::Convert { urls } => convert(&service, urls, config.output).await,
        Command::Resolve { codes } => resolve(&service, codes, config.output).await,
        Command::SyncGuard => Ok(()),
    }
}

/// The chosen store, plus its pool when it is MySQL so the sequence can
/// share it.
struct RepositoryHandle {
    repository: Arc<dyn Repository>,
    mysql: Option<MySqlRepository>,
}

async fn build_repository(config: &Cli) -> anyhow::Result<RepositoryHandle> {
    match config.storage {
        StorageBackendArg::Memory => Ok(RepositoryHandle {
            repository: Arc::new(InMemoryRepository::new()),
            mysql: None,
        }),
        StorageBackendArg::Mysql => {
            let dsn = config
                .mysql_dsn
                .as_deref()
                .context("mysql dsn is required when storage backend is mysql")?;
            let repository = MySqlRepository::connect(dsn)
                .await
                .context("failed to connect to mysql")?;
            if config.ensure_schema {
                repository
                    .ensure_schema()
                    .await
                    .context("failed to create short_url_map table")?;
            }
            Ok(RepositoryHandle {
                repository: Arc::new(repository.clone()),
                mysql: Some(repository),
            })
        }
    }
}

async fn build_sequence(
    config: &Cli,
    repository: &RepositoryHandle,
) -> anyhow::Result<Arc<dyn Sequence>> {
    match config.sequence {
        SequenceBackendArg::Memory => Ok(Arc::new(AtomicSequence::new())),
        SequenceBackendArg::Redis => {
            let url = config
                .redis_url
                .as_deref()
                .context("redis url is required when sequence backend is redis")?;
            let sequence = RedisSequence::connect(url)
                .await
                .context("failed to connect sequence to redis")?;
            Ok(Arc::new(sequence))
        }
        SequenceBackendArg::Mysql => {
            let sequence = match &repository.mysql {
                Some(mysql) => MySqlSequence::new(mysql.pool().clone()),
                None => {
                    let dsn = config
                        .mysql_dsn
                        .as_deref()
                        .context("mysql dsn is required when sequence backend is mysql")?;
                    MySqlSequence::connect(dsn)
                        .await
                        .context("failed to connect sequence to mysql")?
                }
            };
            if config.ensure_schema {
                sequence
                    .ensure_schema()
                    .await
                    .context("failed to create sequence table")?;
            }
            Ok(Arc::new(sequence))
        }
    }
}

async fn build_guard(config: &Cli) -> anyhow::Result<Arc<dyn ExistenceGuard>> {
    match config.guard {
        GuardBackendArg::None => Ok(Arc::new(NullGuard)),
        GuardBackendArg::Bloom => {
            let guard = BloomGuard::new(
                BloomGuardConfig::builder()
                    .expected_items(config.bloom_expected_items)
                    .false_positive_rate(config.bloom_false_positive_rate)
                    .build(),
            )?;
            Ok(Arc::new(guard))
        }
        GuardBackendArg::Redis => {
            let url = config
                .redis_url
                .as_deref()
                .context("redis url is required when guard backend is redis")?;
            let guard = RedisBloomGuard::connect(
                url,
                RedisBloomGuardConfig::builder()
                    .expected_items(config.bloom_expected_items as u64)
                    .false_positive_rate(config.bloom_false_positive_rate)
                    .build(),
            )
            .await?;
            Ok(Arc::new(guard))
        }
    }
}

fn build_checker(config: &Cli) -> anyhow::Result<Arc<dyn Reachability>> {
    match config.reachability {
        ReachabilityArg::Permissive => Ok(Arc::new(PermissiveChecker)),
        ReachabilityArg::Http => {
            let checker = HttpChecker::new(
                HttpCheckerConfig::builder()
                    .timeout(Duration::from_millis(config.probe_timeout_ms))
                    .build(),
            )?;
            Ok(Arc::new(checker))
        }
    }
}

fn reserved_codes(configured: Option<&[String]>) -> ReservedCodes {
    match configured {
        Some(codes) => ReservedCodes::new(codes.iter().map(|c| c.trim()).filter(|c| !c.is_empty())),
        None => ReservedCodes::default(),
    }
}

fn print_error(input: &str, err: &ConvertError, output: OutputArg) {
    match output {
        OutputArg::Text => println!("{input}\terror[{}]: {err}", err.kind()),
        OutputArg::Json => println!(
            "{}",
            json!({
                "input": input,
                "error": err.kind(),
                "message": err.to_string(),
                "retryable": err.is_retryable(),
            })
        ),
    }
}

async fn convert(
    service: &Arc<Service>,
    urls: Vec<String>,
    output: OutputArg,
) -> anyhow::Result<()> {
    let total = urls.len();
    let mut handles = Vec::with_capacity(total);
    for url in urls {
        let service = Arc::clone(service);
        handles.push(tokio::spawn(async move {
            let result = service.convert(&url).await;
            (url, result)
        }));
    }

    let mut failed = 0;
    for handle in handles {
        let (url, result) = handle.await.context("conversion task panicked")?;
        match result {
            Ok(response) => match output {
                OutputArg::Text => println!("{url}\t{}", response.short_url),
                OutputArg::Json => println!(
                    "{}",
                    json!({
                        "input": url,
                        "short_url": response.short_url,
                        "short_code": response.short_code,
                    })
                ),
            },
            Err(e) => {
                failed += 1;
                print_error(&url, &e, output);
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {total} conversions failed");
    }
    Ok(())
}

async fn resolve(
    service: &Arc<Service>,
    codes: Vec<String>,
    output: OutputArg,
) -> anyhow::Result<()> {
    let total = codes.len();
    let mut failed = 0;
    for code in codes {
        match service.resolve(&code).await {
            Ok(Some(mapping)) => match output {
                OutputArg::Text => println!("{code}\t{}", mapping.long_url),
                OutputArg::Json => println!("{}", serde_json::to_string(&mapping)?),
            },
            Ok(None) => {
                failed += 1;
                match output {
                    OutputArg::Text => println!("{code}\tnot found"),
                    OutputArg::Json => {
                        println!("{}", json!({ "input": code, "error": "not_found" }))
                    }
                }
            }
            Err(e) => {
                failed += 1;
                print_error(&code, &e, output);
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {total} codes could not be resolved");
    }
    Ok(())
}
