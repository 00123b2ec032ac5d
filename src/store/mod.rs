//! Read-side interface to a hierarchical bucket store.
//!
//! The audit only ever needs three things from a store: the root bucket of a
//! read transaction, a cursor over a bucket's entries in native key order,
//! and bucket-handle resolution by key. [`ReadTxn`] captures exactly that, so
//! the traversal runs unchanged over a bolt file ([`crate::bolt::BoltTx`]) or
//! an in-memory tree ([`memory::MemStore`]).

pub mod memory;

use std::hash::Hash;
use std::time::Duration;

use crate::error::Result;

pub use memory::{MemBucket, MemStore};

/// Default time to wait for the shared file lock.
pub const DEFAULT_OPEN_TIMEOUT: Duration = Duration::from_secs(5);

/// One entry as returned by a cursor.
///
/// `value` is `None` when the store reports no value bytes for the key. That
/// covers nested buckets and zero-length values alike; telling the two apart
/// is the classifier's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawEntry<'a> {
    pub key: &'a [u8],
    pub value: Option<&'a [u8]>,
}

/// Options for opening a store file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    pub read_only: bool,
    pub timeout: Duration,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            read_only: true,
            timeout: DEFAULT_OPEN_TIMEOUT,
        }
    }
}

/// A snapshot-isolated, read-only view of a store.
pub trait ReadTxn {
    /// Handle to a bucket inside this transaction. Handles own nothing the
    /// cursor borrows, so a traversal frame can keep one next to its cursor.
    /// Two handles are equal when they address the same bucket storage.
    type Bucket: Clone + Eq + Hash;

    /// Cursor over one bucket's entries.
    type Cursor<'a>: Iterator<Item = Result<RawEntry<'a>>>
    where
        Self: 'a;

    /// The transaction root, whose entries are the top-level namespaces.
    fn root(&self) -> Self::Bucket;

    /// Iterate `bucket` in the store's native key order.
    fn cursor<'a>(&'a self, bucket: &Self::Bucket) -> Self::Cursor<'a>;

    /// Resolve `key` inside `container` to a nested bucket, if it is one.
    fn resolve_bucket(&self, container: &Self::Bucket, key: &[u8]) -> Result<Option<Self::Bucket>>;
}
