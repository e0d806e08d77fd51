//! CLI entry point for the crowdspeed monitoring pipeline.
//!
//! Provides subcommands for one-shot dashboard snapshots, a periodic watch
//! loop, single-feed analysis, and the GMT+7 clock line.

use anyhow::Result;
use clap::{Parser, Subcommand};
use crowdspeed::{
    config::Settings,
    dashboard::build_snapshot,
    fetch::{BasicClient, fetch_text},
    output::{RefreshSummary, append_record, write_snapshot},
    parser::parse_series,
    report,
};
use std::ffi::OsStr;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "crowdspeed")]
#[command(about = "Speed and crowd monitoring pipeline for the bus-stop dashboard", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one fetch-clean-join-aggregate pass and emit a snapshot
    Snapshot {
        /// Write the snapshot JSON here instead of stdout
        #[arg(short, long)]
        output: Option<String>,

        /// CSV file to append a refresh summary row to
        #[arg(short, long)]
        log: Option<String>,
    },
    /// Refresh the snapshot periodically
    Watch {
        /// Seconds between refreshes
        #[arg(short = 'r', long, default_value_t = 60)]
        interval_secs: u64,

        /// Number of refreshes to run (0 = until interrupted)
        #[arg(short = 'n', long, default_value_t = 1)]
        num_samples: usize,

        /// Write each snapshot JSON here (overwritten per refresh)
        #[arg(short, long)]
        output: Option<String>,

        /// CSV file to append one refresh summary row per pass to
        #[arg(short, long, default_value = "refresh_log.csv")]
        log: String,
    },
    /// Normalize a single feed from a file or URL and report its stats
    Analyze {
        /// Path to file or URL to fetch
        #[arg(value_name = "FILE_OR_URL")]
        source: String,

        /// Header cell holding the timestamps
        #[arg(short, long, default_value = "Timestamp")]
        timestamp_column: String,

        /// Header cell holding the measurement
        #[arg(short, long, default_value = "Count")]
        value_column: String,

        /// Unit label for the announcement line
        #[arg(short, long, default_value = "units")]
        unit: String,
    },
    /// Print the GMT+7 clock line
    Clock {
        /// Number of one-second ticks to print (0 = until interrupted)
        #[arg(short, long, default_value_t = 1)]
        ticks: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/crowdspeed.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("crowdspeed.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Snapshot { output, log } => {
            let settings = Settings::from_env();
            let client = BasicClient::new();

            let snapshot = build_snapshot(&client, &settings).await;
            write_snapshot(output.as_deref(), &snapshot)?;

            if let Some(log_path) = log {
                append_record(&log_path, &RefreshSummary::from_snapshot(&snapshot))?;
            }
        }
        Commands::Watch {
            interval_secs,
            num_samples,
            output,
            log,
        } => {
            watch(interval_secs, num_samples, output.as_deref(), &log).await?;
        }
        Commands::Analyze {
            source,
            timestamp_column,
            value_column,
            unit,
        } => {
            let body = fetcher(&source).await?;
            let series = parse_series(&body, &source, &timestamp_column, &value_column)?;

            info!(
                rows = series.len(),
                first = %series.readings[0].timestamp,
                last = %series.readings[series.len() - 1].timestamp,
                "series normalized"
            );
            if let Some(line) = report::extremum_line(&series, &unit) {
                info!("{line}");
            }
        }
        Commands::Clock { ticks } => {
            clock(ticks).await;
        }
    }

    Ok(())
}

/// Loads feed text from a local file path or fetches it over HTTP.
#[tracing::instrument(fields(source = %source))]
async fn fetcher(source: &str) -> Result<String> {
    let body = if source.starts_with("http") {
        let client = BasicClient::new();
        fetch_text(&client, source).await?
    } else {
        std::fs::read_to_string(source)?
    };
    Ok(body)
}

/// Rebuilds the snapshot at a fixed interval, appending one summary row per
/// pass. A sample limit of 0 runs until interrupted.
#[tracing::instrument(skip(output, log), fields(interval_secs, num_samples))]
async fn watch(
    interval_secs: u64,
    num_samples: usize,
    output: Option<&str>,
    log: &str,
) -> Result<()> {
    let settings = Settings::from_env();
    let client = BasicClient::new();

    if num_samples == 0 {
        info!(interval_secs, "Refreshing indefinitely. Press Ctrl+C to stop.");
    } else {
        info!(num_samples, interval_secs, "Starting watch");
    }

    let mut sample_count = 0;
    loop {
        if num_samples > 0 && sample_count >= num_samples {
            break;
        }
        sample_count += 1;

        info!(
            sample = sample_count,
            total = if num_samples == 0 {
                None
            } else {
                Some(num_samples)
            },
            "Refreshing snapshot"
        );

        let snapshot = build_snapshot(&client, &settings).await;
        write_snapshot(output, &snapshot)?;
        append_record(log, &RefreshSummary::from_snapshot(&snapshot))?;

        if num_samples == 0 || sample_count < num_samples {
            tokio::time::sleep(tokio::time::Duration::from_secs(interval_secs)).await;
        }
    }

    info!(log, "Watch finished");
    Ok(())
}

/// Prints the GMT+7 clock line once per second for `ticks` ticks. Replaces
/// the dashboard's old unbounded busy-wait loop with a bounded refresh; a
/// tick count of 0 runs until interrupted.
async fn clock(ticks: usize) {
    let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(1));
    let mut printed = 0;

    loop {
        if ticks > 0 && printed >= ticks {
            break;
        }
        interval.tick().await;
        println!("{}", report::clock_line(chrono::Utc::now()));
        printed += 1;
    }
}
