use anyhow::{bail, Context, Result};
use chrono::Utc;
use referra::infrastructure::sync::metrics;
use referra::{
    ActionPayload, AppConfig, ConnectivityMonitor, HttpReferralGateway, OfflineQueue,
    ReferralDraft, SqliteKeyValueStore, SyncService,
};
use sqlx::sqlite::SqlitePoolOptions;
use std::env;
use std::sync::Arc;
use tokio::runtime::Runtime;

#[derive(Debug, Clone)]
struct CliOptions {
    database_url: Option<String>,
    api_url: Option<String>,
    enqueue: usize,
    offline: bool,
    pretty: bool,
}

#[derive(Debug, serde::Serialize)]
struct SyncPassReport {
    generated_at_ms: i64,
    online: bool,
    pending_before: usize,
    success: u32,
    failed: u32,
    pending_after: usize,
    metrics: metrics::ReplayMetricsSnapshot,
}

fn usage() -> &'static str {
    "Usage: sync_harness [--database-url <url>] [--api-url <url>] [--enqueue <n>] [--offline] [--pretty]"
}

fn parse_args() -> Result<CliOptions> {
    let mut options = CliOptions {
        database_url: None,
        api_url: None,
        enqueue: 0,
        offline: false,
        pretty: false,
    };

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--database-url" => {
                options.database_url = Some(
                    args.next()
                        .with_context(|| format!("--database-url needs a value\n{}", usage()))?,
                );
            }
            "--api-url" => {
                options.api_url = Some(
                    args.next()
                        .with_context(|| format!("--api-url needs a value\n{}", usage()))?,
                );
            }
            "--enqueue" => {
                let raw = args
                    .next()
                    .with_context(|| format!("--enqueue needs a value\n{}", usage()))?;
                options.enqueue = raw
                    .parse()
                    .with_context(|| format!("invalid --enqueue value: {raw}"))?;
            }
            "--offline" => options.offline = true,
            "--pretty" => options.pretty = true,
            "--help" | "-h" => {
                println!("{}", usage());
                std::process::exit(0);
            }
            other => bail!("unknown argument: {other}\n{}", usage()),
        }
    }

    Ok(options)
}

fn sample_payload(index: usize) -> ActionPayload {
    ActionPayload::CreateReferral(ReferralDraft {
        referrer_id: "harness".to_string(),
        referee_name: format!("Harness Referee {index}"),
        referee_phone: format!("555-9{index:03}"),
        referee_email: None,
        notes: Some("enqueued by sync_harness".to_string()),
    })
}

async fn run(options: CliOptions) -> Result<SyncPassReport> {
    let mut config = AppConfig::from_env();
    if let Some(url) = &options.database_url {
        config.storage.database_url = url.clone();
    }
    if let Some(url) = &options.api_url {
        config.api.base_url = url.clone();
    }
    config.validate().map_err(anyhow::Error::msg)?;

    let pool = SqlitePoolOptions::new()
        .max_connections(config.storage.max_connections)
        .connect(&with_create_mode(&config.storage.database_url))
        .await
        .with_context(|| format!("failed to open {}", config.storage.database_url))?;

    let store = SqliteKeyValueStore::new(pool);
    store.initialize().await?;

    let monitor = Arc::new(ConnectivityMonitor::new(!options.offline));
    let gateway = Arc::new(HttpReferralGateway::new(config.api.base_url.clone()));
    let queue = Arc::new(OfflineQueue::new(
        Arc::new(store),
        gateway,
        monitor.clone(),
        &config.sync,
    ));

    for index in 0..options.enqueue {
        queue.enqueue(sample_payload(index)).await;
    }

    let pending_before = queue.pending_count().await;
    let service = SyncService::new(queue.clone(), monitor.clone());
    let outcome = service.sync_now().await;
    let pending_after = queue.pending_count().await;

    Ok(SyncPassReport {
        generated_at_ms: Utc::now().timestamp_millis(),
        online: !options.offline,
        pending_before,
        success: outcome.success,
        failed: outcome.failed,
        pending_after,
        metrics: metrics::snapshot(),
    })
}

fn with_create_mode(database_url: &str) -> String {
    if database_url.contains('?') || database_url.contains(":memory:") {
        database_url.to_string()
    } else {
        format!("{database_url}?mode=rwc")
    }
}

fn main() -> Result<()> {
    referra::init_logging();

    let options = parse_args()?;
    let pretty = options.pretty;

    let runtime = Runtime::new().context("failed to start tokio runtime")?;
    let report = runtime.block_on(run(options))?;

    let rendered = if pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{rendered}");

    Ok(())
}
