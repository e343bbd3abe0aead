//! opsrun - runs the expensive operations through every interception strategy

mod runner;
mod strategy;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use opscache::{EventKind, JsonReporter, RecordingReporter, Reporter, TracingReporter};
use tracing::info;

use crate::runner::{run_ops, Workload};
use crate::strategy::Strategy;

/// Where decorator events go
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    /// Debug-level log lines
    Tracing,
    /// One JSON object per event on stdout
    Json,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number tested for primality (twice, then number + 2)
    #[arg(short, long, default_value_t = 1_000_000_005_721, allow_negative_numbers = true)]
    number: i64,

    /// Directory hashed twice
    #[arg(short, long, default_value = ".")]
    root: PathBuf,

    /// Directory hashed once
    #[arg(short, long, default_value = "src")]
    other: PathBuf,

    /// Strategies to run (default: all)
    #[arg(short, long, value_enum)]
    strategy: Vec<Strategy>,

    /// Event reporting format
    #[arg(long, value_enum, default_value_t = ReportFormat::Tracing)]
    report: ReportFormat,

    /// Threads issuing the first is_prime call at once
    #[arg(short, long, default_value_t = 1)]
    concurrency: usize,

    /// Default log level when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: tracing::Level,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(args.log_level.into()),
        )
        .with_writer(io::stderr)
        .init();

    info!("Starting opsrun v{}", env!("CARGO_PKG_VERSION"));

    let sink: Arc<dyn Reporter> = match args.report {
        ReportFormat::Tracing => Arc::new(TracingReporter),
        ReportFormat::Json => Arc::new(JsonReporter::new(io::stdout())),
    };

    let strategies = if args.strategy.is_empty() {
        Strategy::all()
    } else {
        args.strategy.clone()
    };

    let work = Workload {
        number: args.number,
        root: args.root.clone(),
        other: args.other.clone(),
        concurrency: args.concurrency.max(1),
    };

    let mut failed_calls = 0;
    for strategy in strategies {
        let recorder = Arc::new(RecordingReporter::forwarding(sink.clone()));
        let built = strategy.build(recorder.clone());

        let summary = run_ops(built.ops.as_ref(), strategy.description(), &work);
        failed_calls += summary.failures;

        info!(
            "{:?}: {} enter, {} exit, {} timing events",
            strategy,
            recorder.count(EventKind::Enter),
            recorder.count(EventKind::Exit),
            recorder.count(EventKind::Timing),
        );
        if let Some((primes, hashes)) = built.stats() {
            info!(
                "{:?}: is_prime hits={} misses={} coalesced={}, hash_directory hits={} misses={} failures={}",
                strategy,
                primes.hits(),
                primes.misses(),
                primes.coalesced(),
                hashes.hits(),
                hashes.misses(),
                hashes.failures(),
            );
        }
    }

    if failed_calls > 0 {
        info!("{} call(s) failed, see warnings above", failed_calls);
    }

    Ok(())
}
