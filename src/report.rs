//! Report output: JSON stats lines and the human-readable summary.

use std::path::Path;

use tracing::info;

use crate::audit::AuditReport;
use crate::error::Result;
use crate::router::Partition;
use crate::stats::Stats;

const UNIT: u64 = 1024;
const PREFIXES: &[u8] = b"KMGTPE";

/// Format a byte count with IEC binary prefixes (`1.50 KiB`, `3.00 GiB`).
/// Counts below 1024 are printed as plain bytes.
pub fn humanize_bytes(bytes: u64) -> String {
    if bytes < UNIT {
        return format!("{} B", bytes);
    }
    let mut div = UNIT;
    let mut exp = 0;
    let mut n = bytes / UNIT;
    while n >= UNIT && exp + 1 < PREFIXES.len() {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }
    format!(
        "{:.2} {}iB",
        bytes as f64 / div as f64,
        PREFIXES[exp] as char
    )
}

/// One-line JSON rendering of a stats record.
pub fn stats_line(stats: &Stats) -> Result<String> {
    Ok(serde_json::to_string(stats)?)
}

/// Log the file header line.
pub fn emit_header(path: &Path, file_size: u64) {
    info!(
        "Auditing {} (total file size: {})",
        path.display(),
        humanize_bytes(file_size)
    );
}

/// Log every stats line, then the summary.
pub fn emit(report: &AuditReport, file_size: u64) -> Result<()> {
    for stats in &report.named {
        info!("{}", stats_line(stats)?);
    }
    info!("{}", stats_line(&report.pooled)?);
    info!("{}", stats_line(&report.global)?);

    for line in summary_lines(&report.global, file_size) {
        info!("{}", line);
    }
    Ok(())
}

/// Log the top-level key counts and the sorted named-bucket listing.
pub fn emit_listing(partition: &Partition) {
    info!(
        "Found {} top-level buckets and {} fixed-id log buckets",
        partition.named.len(),
        partition.pooled.len()
    );
    info!("Top-level buckets: {}", partition.sorted_names().join(", "));
}

/// Human-readable totals.
pub fn summary_lines(global: &Stats, file_size: u64) -> Vec<String> {
    vec![
        "Totals:".to_string(),
        format!("Max depth: {}", global.max_depth),
        format!("Buckets: {}", global.buckets),
        format!("Keys: {}", global.keys),
        format!("Total key size: {}", humanize_bytes(global.total_key_size)),
        format!("Total value size: {}", humanize_bytes(global.total_value_size)),
        format!("Total file size: {}", humanize_bytes(file_size)),
    ]
}
