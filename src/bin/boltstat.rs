//! boltstat - print structural statistics for a bolt store file
//!
//! Usage:
//!   boltstat <path> [--timeout <secs>] [-v]
//!
//! Opens the file read-only under a shared lock, walks every bucket in one
//! read transaction, and logs one JSON stats line per top-level bucket, one
//! for the pooled fixed-id log buckets, one for the global total, followed by
//! a human-readable summary. Exits non-zero on any I/O, format or
//! transaction error.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use boltstat::config::{AuditConfig, CliArgs};
use boltstat::report;
use boltstat::{audit_partition, AuditError, AuditReport, BoltDb, Partition};

fn main() -> ExitCode {
    let args = CliArgs::parse();
    setup_logging(args.verbose);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let kind = e
                .chain()
                .find_map(|cause| cause.downcast_ref::<AuditError>())
                .map_or("other", AuditError::kind);
            error!(kind, "{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: CliArgs) -> Result<()> {
    let config = AuditConfig::from_args(args).context("Invalid configuration")?;

    let file_size = std::fs::metadata(&config.path)
        .with_context(|| format!("Failed to stat {}", config.path.display()))?
        .len();
    report::emit_header(&config.path, file_size);

    let db = BoltDb::open(&config.path, config.store_options()).context("Unable to open DB")?;
    let outcome = audit_db(&db);
    if let Err(e) = db.close() {
        warn!("Error closing db: {}", e);
    }

    let report = outcome?;
    report::emit(&report, file_size)?;
    Ok(())
}

fn audit_db(db: &BoltDb) -> Result<AuditReport> {
    let tx = db.begin().context("Unable to begin read transaction")?;
    let outcome = Partition::scan(&tx).and_then(|partition| {
        report::emit_listing(&partition);
        info!("Reading top-level buckets...");
        audit_partition(&tx, &partition)
    });
    if let Err(e) = tx.rollback() {
        warn!("Error rolling back tx: {}", e);
    }
    outcome.with_context(|| format!("Failed to audit {}", db.path().display()))
}

fn setup_logging(verbose: bool) {
    let default = if verbose {
        "boltstat=debug,warn"
    } else {
        "boltstat=info,warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stdout)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
