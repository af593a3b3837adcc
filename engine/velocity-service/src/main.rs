//! Velocity Limits Batch Service
//!
//! Reads newline-delimited JSON fund-load requests from a file or
//! stdin, evaluates each against per-customer velocity limits, and
//! writes accept/reject response lines to a file or stdout in input
//! order. Duplicate load ids produce no response line at all.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncWrite, BufReader, BufWriter};
use tracing::info;

use account_store::AccountStore;
use load_gateway::LoadHandler;
use velocity_core::LimitEvaluator;
use velocity_service::{initialize_logging, load_config, Pipeline};

#[derive(Parser, Debug)]
#[command(
    name = "velocity-limits",
    version,
    about = "Evaluate fund-load requests against per-customer velocity limits"
)]
struct Cli {
    /// Input file of newline-delimited JSON load requests (defaults to stdin)
    input: Option<PathBuf>,

    /// Output file for response lines (defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the configured worker count
    #[arg(long)]
    workers: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(workers) = cli.workers {
        anyhow::ensure!(workers > 0, "--workers must be at least 1");
        config.pipeline.workers = workers;
    }

    initialize_logging(&config.logging)?;
    info!("Starting velocity-limits v{}", env!("CARGO_PKG_VERSION"));
    info!(
        workers = config.pipeline.workers,
        store_ttl_secs = config.store.ttl_secs,
        "Configuration loaded"
    );

    let input: Box<dyn AsyncBufRead + Unpin + Send> = match &cli.input {
        Some(path) => {
            let file = File::open(path)
                .await
                .with_context(|| format!("Failed to open input file: {}", path.display()))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(BufReader::new(tokio::io::stdin())),
    };
    let output: Box<dyn AsyncWrite + Unpin + Send> = match &cli.output {
        Some(path) => {
            let file = File::create(path)
                .await
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(tokio::io::stdout()),
    };

    let store = Arc::new(AccountStore::new(config.store.clone()));
    let handler = LoadHandler::new(LimitEvaluator::new(config.limits.clone()), store);
    let pipeline = Pipeline::new(handler, config.pipeline.clone());

    let stats = pipeline.run(input, output).await.context("Pipeline run failed")?;

    info!(
        lines_read = stats.lines_read,
        accepted = stats.accepted,
        rejected = stats.rejected,
        duplicates = stats.duplicates,
        malformed = stats.malformed,
        responses_written = stats.responses_written,
        "Run complete"
    );

    Ok(())
}
