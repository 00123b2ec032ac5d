//! Whole-store audit: route top-level namespaces, walk each one, and fold
//! the results into per-namespace, pooled and global totals.

use tracing::{debug, warn};

use crate::error::Result;
use crate::router::{display_name, Partition};
use crate::stats::Stats;
use crate::store::ReadTxn;
use crate::walker::traverse;

/// Label of the pooled fixed-id log aggregate.
pub const POOLED_LABEL: &str = "fixed-id-logs";

/// Label of the global total.
pub const GLOBAL_LABEL: &str = "global-stats";

/// Depth of a top-level namespace below the transaction root.
const NAMESPACE_DEPTH: u64 = 1;

/// Result of auditing one read transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditReport {
    /// Top-level keys routed to named buckets, buckets or not.
    pub named_count: usize,
    /// Top-level keys routed to the fixed-id log pool, buckets or not.
    pub pooled_count: usize,
    /// Sorted display names of the named buckets.
    pub names: Vec<String>,
    /// Per-namespace stats, in cursor order.
    pub named: Vec<Stats>,
    /// Display names of top-level keys that were not buckets.
    pub skipped: Vec<String>,
    pub pooled: Stats,
    pub global: Stats,
}

/// Audit every bucket reachable from the root of `txn`.
///
/// Fails on the first store error; no partial report is produced.
pub fn audit<T: ReadTxn>(txn: &T) -> Result<AuditReport> {
    let partition = Partition::scan(txn)?;
    audit_partition(txn, &partition)
}

/// Walk the namespaces of an already scanned root.
pub fn audit_partition<T: ReadTxn>(txn: &T, partition: &Partition) -> Result<AuditReport> {
    let root = txn.root();
    debug!(
        named = partition.named.len(),
        pooled = partition.pooled.len(),
        "Walking top-level keys"
    );

    let mut named = Vec::with_capacity(partition.named.len());
    let mut skipped = Vec::new();
    for key in &partition.named {
        let name = display_name(key);
        let Some(bucket) = txn.resolve_bucket(&root, key)? else {
            warn!("{} is not a bucket", name);
            skipped.push(name);
            continue;
        };
        let mut stats = Stats::named(name);
        stats.absorb(&traverse(txn, bucket, NAMESPACE_DEPTH)?);
        named.push(stats);
    }

    let mut pooled = Stats::named(POOLED_LABEL);
    for key in &partition.pooled {
        let Some(bucket) = txn.resolve_bucket(&root, key)? else {
            let name = display_name(key);
            warn!("{} is not a bucket", name);
            skipped.push(name);
            continue;
        };
        pooled.record_bucket();
        pooled.absorb(&traverse(txn, bucket, NAMESPACE_DEPTH)?);
    }

    let global = named
        .iter()
        .fold(Stats::named(GLOBAL_LABEL), |acc, s| acc.merge(s))
        .merge(&pooled);

    Ok(AuditReport {
        named_count: partition.named.len(),
        pooled_count: partition.pooled.len(),
        names: partition.sorted_names(),
        named,
        skipped,
        pooled,
        global,
    })
}
