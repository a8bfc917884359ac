//! stagesql CLI entry point.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use stagesql::cli::{run_events, Args, DriverConfig, JsonLinesEmitter, UnmappedArg};
use stagesql_core::StagingOperator;
use stagesql_sqlite::SqliteEngine;

fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr; stdout carries result rows only
    let filter = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with_writer(io::stderr)
        .init();

    let mut config = DriverConfig::load(&args.config)
        .with_context(|| format!("Failed to load config: {}", args.config.display()))?;
    if let Some(query) = args.query {
        config.query = Some(query);
    }
    if let Some(mode) = args.bind_mode {
        config.bind_mode = mode;
    }
    if args.reject_unmapped {
        config.unmapped_fields = UnmappedArg::Reject;
    }

    let engine = SqliteEngine::open_in_memory().context("Failed to open SQLite")?;
    let mut op = StagingOperator::setup(
        engine,
        config.registry(),
        config.query()?,
        config.operator_config(),
    )
    .context("Failed to set up staging operator")?;

    let input: Box<dyn BufRead> = match &args.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Failed to open input: {}", path.display()))?,
        )),
        None => Box::new(io::stdin().lock()),
    };
    let mut output = JsonLinesEmitter::new(BufWriter::new(io::stdout().lock()));

    let outcome = run_events(&mut op, input, &mut output);
    let flushed = output.flush();

    // Teardown problems are reported but do not decide the exit status
    if let Err(e) = op.teardown() {
        warn!(error = %e, "Teardown failed");
        eprintln!("Warning: {e}");
    }

    let summaries = outcome.context("Window processing failed")?;
    flushed.context("Failed to write results")?;

    info!(
        windows = summaries.len(),
        rows = output.rows_written(),
        "Done"
    );
    Ok(())
}
