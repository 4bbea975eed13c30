use std::fs::File;
use std::io::{stderr, stdout, BufReader, BufWriter};
use std::process::exit;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer};

use pix_reconciler::config::ConsoleConfig;
use pix_reconciler::console::Console;
use pix_reconciler::export::write_csv;
use pix_reconciler::replay::{OfflineCollaborators, ReplayFile};

#[tokio::main]
async fn main() -> Result<()> {
    //NOTE: A replay file stands in for the provider clients and the push channel, which live
    //      outside this crate. Anything richer than two positional arguments would warrant clap.
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: pix-reconciler [replay].json [log_level:optional] > [export].csv");
        eprintln!("Available log levels: error, warn, info, debug, trace (default: error)");
        exit(1);
    }

    let path = &args[1];
    let log_level = args.get(2)
        .map(|s| parse_log_level(s)).unwrap_or_else(|| LevelFilter::ERROR);

    setup_logging(log_level);

    let replay = load_replay(path)?;
    let config = replay.configure(ConsoleConfig::default());
    let request = replay.page_request(&config);
    let offline = Arc::new(OfflineCollaborators);
    let console = Console::new(config, offline.clone(), offline);

    let timer = Instant::now();

    let report = console.refresh(&replay.source(), &replay.filter, request).await;

    if let Some(error) = &report.error {
        warn!("Replay fetch failed: {error}");
    }

    let (sender, receiver) = mpsc::channel(256);
    let live_merge = console.spawn_live_merge(replay.push_provider(), receiver);

    for event in replay.push.iter().cloned() {
        if sender.send(event).await.is_err() {
            break;
        }
    }

    drop(sender);

    let stats = live_merge.await?;
    let duration = timer.elapsed();

    info!("Fetched [{}] records from [{}] pages, merged [{}] of [{}] push events in: {duration:?}", report.fetched, report.pages_fetched, stats.merged, stats.received);

    let metrics = console.get_metrics(&replay.filter).await;
    info!(
        "Deposits: [{}] totalling [{}] | Withdrawals: [{}] totalling [{}]",
        metrics.deposit_count, metrics.deposit_total, metrics.withdrawal_count, metrics.withdrawal_total
    );

    let view = console.get_filtered_sorted_page(&replay.filter, &replay.sort, request).await;
    info!("Page [{}] of [{}] showing [{}] of [{}] records", view.meta.current_page, view.meta.total_pages, view.rows.len(), view.meta.total_records);

    let output = BufWriter::new(stdout().lock());
    write_csv(&view.rows, output)?;

    Ok(())
}

fn load_replay(path: &str) -> Result<ReplayFile> {
    let file = File::open(path).with_context(|| format!("Error opening replay file at path: {path}"))?;
    let replay = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Replay file at path {path} is not valid"))?;

    Ok(replay)
}

fn parse_log_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        _ => {
            eprintln!("Invalid log level '{}', defaulting to 'error'", level);
            LevelFilter::ERROR
        }
    }
}

fn setup_logging(level: LevelFilter) {
    //NOTE: The export goes to stdout, so logging has to use stderr
    let terminal_log = fmt::layer()
        .with_target(false)
        .with_writer(stderr)
        .with_filter(level);

    tracing_subscriber::registry()
        .with(terminal_log)
        .init();
}
