//! In-memory bucket tree implementing [`ReadTxn`].
//!
//! Used by tests and benchmarks to build arbitrary bucket shapes without
//! going through a file. Buckets live in an arena and are addressed by
//! index; each bucket keeps its entries in a `BTreeMap`, which gives the same
//! lexicographic byte order a bolt cursor produces.

use std::collections::btree_map;
use std::collections::{BTreeMap, HashMap};

use crate::error::{AuditError, Result};
use crate::store::{RawEntry, ReadTxn};

/// Handle to a bucket in a [`MemStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemBucket(usize);

#[derive(Debug, Clone)]
enum MemEntry {
    Bucket(usize),
    Value(Vec<u8>),
}

#[derive(Debug, Clone)]
pub struct MemStore {
    buckets: Vec<BTreeMap<Vec<u8>, MemEntry>>,
    /// Buckets whose cursor fails after yielding the given number of entries.
    failures: HashMap<usize, usize>,
}

impl MemStore {
    /// Create a store holding only an empty root bucket.
    pub fn new() -> Self {
        Self {
            buckets: vec![BTreeMap::new()],
            failures: HashMap::new(),
        }
    }

    /// Create (or return the existing) nested bucket `key` under `parent`.
    ///
    /// A plain value already stored under `key` is replaced.
    pub fn create_bucket(&mut self, parent: MemBucket, key: impl Into<Vec<u8>>) -> MemBucket {
        let key = key.into();
        if let Some(MemEntry::Bucket(id)) = self.buckets[parent.0].get(&key) {
            return MemBucket(*id);
        }
        let id = self.buckets.len();
        self.buckets.push(BTreeMap::new());
        self.buckets[parent.0].insert(key, MemEntry::Bucket(id));
        MemBucket(id)
    }

    /// Store a terminal key under `bucket`. An empty value is allowed.
    pub fn put(&mut self, bucket: MemBucket, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        self.buckets[bucket.0].insert(key.into(), MemEntry::Value(value.into()));
    }

    /// Make the cursor over `bucket` fail once `after` entries were yielded.
    pub fn fail_iteration(&mut self, bucket: MemBucket, after: usize) {
        self.failures.insert(bucket.0, after);
    }

    /// Store `target` as a nested bucket of `parent` under `key`, so one
    /// bucket is reachable through two keys.
    #[cfg(test)]
    pub(crate) fn link_bucket(&mut self, parent: MemBucket, key: impl Into<Vec<u8>>, target: MemBucket) {
        self.buckets[parent.0].insert(key.into(), MemEntry::Bucket(target.0));
    }

    /// Number of buckets in the arena, root included.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Cursor over one [`MemStore`] bucket.
pub struct MemCursor<'a> {
    bucket: usize,
    entries: btree_map::Iter<'a, Vec<u8>, MemEntry>,
    fail_after: Option<usize>,
    yielded: usize,
    exhausted: bool,
}

impl<'a> Iterator for MemCursor<'a> {
    type Item = Result<RawEntry<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        if self.fail_after == Some(self.yielded) {
            self.exhausted = true;
            return Some(Err(AuditError::InvalidFormat(format!(
                "cursor failure in bucket #{} after {} entries",
                self.bucket, self.yielded
            ))));
        }

        let (key, entry) = self.entries.next()?;
        self.yielded += 1;
        let value = match entry {
            MemEntry::Value(v) if !v.is_empty() => Some(v.as_slice()),
            _ => None,
        };
        Some(Ok(RawEntry {
            key: key.as_slice(),
            value,
        }))
    }
}

impl ReadTxn for MemStore {
    type Bucket = MemBucket;
    type Cursor<'a> = MemCursor<'a> where Self: 'a;

    fn root(&self) -> MemBucket {
        MemBucket(0)
    }

    fn cursor<'a>(&'a self, bucket: &MemBucket) -> MemCursor<'a> {
        MemCursor {
            bucket: bucket.0,
            entries: self.buckets[bucket.0].iter(),
            fail_after: self.failures.get(&bucket.0).copied(),
            yielded: 0,
            exhausted: false,
        }
    }

    fn resolve_bucket(&self, container: &MemBucket, key: &[u8]) -> Result<Option<MemBucket>> {
        Ok(match self.buckets[container.0].get(key) {
            Some(MemEntry::Bucket(id)) => Some(MemBucket(*id)),
            _ => None,
        })
    }
}
