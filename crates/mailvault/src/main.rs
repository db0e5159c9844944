//! `mailvault` - OpenSMTPD archive filter
//!
//! Speaks the filter protocol on stdin/stdout and stores every message,
//! plus a metadata file, below the archive path.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{BufReader, stdin, stdout};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use mailvault_core::{ArchiveConfig, ArchiveStore, Dispatcher, Filter};

#[derive(Parser, Debug)]
#[command(
    name = "mailvault",
    about = "OpenSMTPD filter archiving every message to disk",
    version
)]
struct Cli {
    /// Use flat filesystem path storage instead of <path>/YYYY-MM/DD
    #[arg(short = 'f', long)]
    flat: bool,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Archive storage path (e.g. /var/db/mail-archive)
    path: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // stdout carries the protocol; logs must go to stderr.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = ArchiveConfig::builder(cli.path).flat(cli.flat).build();
    info!(root = %config.root().display(), layout = ?config.layout, "Starting mailvault");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_io()
        .build()
        .context("Failed to start runtime")?;

    let mut filter = Filter::new(Dispatcher::new(ArchiveStore::new(config)));
    runtime
        .block_on(filter.run(BufReader::new(stdin()), stdout()))
        .context("Filter stopped")
}
