//! Depth-first bucket traversal.
//!
//! [`traverse`] walks a bucket subtree with an explicit stack of frames
//! instead of recursion, so a pathologically deep store cannot exhaust the
//! call stack. Each frame owns its cursor and its accumulator; a frame's
//! `Stats` is folded into its parent only after the frame's cursor is
//! exhausted, which gives the same totals as the recursive formulation and
//! the same pre-order visitation.
//!
//! A nested bucket that resolves to one of the buckets still open on the
//! descent path would never terminate; it is reported as a format error.

use std::collections::HashSet;

use crate::classify::{classify, EntryKind};
use crate::error::{AuditError, Result};
use crate::stats::Stats;
use crate::store::ReadTxn;

struct Frame<'a, T: ReadTxn + 'a> {
    bucket: T::Bucket,
    cursor: T::Cursor<'a>,
    depth: u64,
    stats: Stats,
}

impl<'a, T: ReadTxn + 'a> Frame<'a, T> {
    fn open(txn: &'a T, bucket: T::Bucket, depth: u64) -> Self {
        let cursor = txn.cursor(&bucket);
        Self {
            bucket,
            cursor,
            depth,
            stats: Stats::at_depth(depth),
        }
    }
}

/// Collect statistics for the subtree rooted at `bucket`.
///
/// `depth` is the depth of `bucket` itself relative to the transaction root
/// (1 for a top-level namespace). The returned `Stats` is unnamed.
pub fn traverse<T: ReadTxn>(txn: &T, bucket: T::Bucket, depth: u64) -> Result<Stats> {
    let mut open: HashSet<T::Bucket> = HashSet::new();
    open.insert(bucket.clone());

    let mut current = Frame::open(txn, bucket, depth);
    let mut parents: Vec<Frame<'_, T>> = Vec::new();

    loop {
        let Some(entry) = current.cursor.next() else {
            // Exhausted: finish at the starting bucket, else fold into the parent.
            let Some(parent) = parents.pop() else {
                return Ok(current.stats);
            };
            open.remove(&current.bucket);
            let done = std::mem::replace(&mut current, parent);
            current.stats.absorb(&done.stats);
            continue;
        };
        let entry = entry?;

        match classify(txn, &current.bucket, &entry)? {
            EntryKind::Bucket(child) => {
                let child_depth = current.depth + 1;
                if !open.insert(child.clone()) {
                    return Err(AuditError::InvalidFormat(format!(
                        "Bucket cycle: nested bucket at depth {} re-enters an open ancestor",
                        child_depth
                    )));
                }
                current.stats.record_bucket();
                let child = Frame::open(txn, child, child_depth);
                parents.push(std::mem::replace(&mut current, child));
            }
            kind => {
                current.stats.record_key(entry.key.len(), kind.value_len());
            }
        }
    }
}
