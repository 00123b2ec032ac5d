//! Entry classification.
//!
//! A cursor cannot tell a nested bucket from a key holding an empty value:
//! both come back without value bytes. The only way to decide is to try to
//! open the key as a bucket, and that lookup has to happen before an entry
//! is counted as an empty terminal key.

use crate::error::Result;
use crate::store::{RawEntry, ReadTxn};

/// What a cursor entry turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind<B> {
    /// A nested bucket, resolved to its handle.
    Bucket(B),
    /// A terminal key whose value is empty.
    EmptyValue,
    /// A terminal key with value bytes of the given length.
    Value(usize),
}

impl<B> EntryKind<B> {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, EntryKind::Bucket(_))
    }

    /// Value byte-length counted for a terminal entry.
    pub fn value_len(&self) -> usize {
        match self {
            EntryKind::Value(len) => *len,
            _ => 0,
        }
    }
}

/// Classify `entry`, found while iterating `container`.
pub fn classify<T: ReadTxn>(
    txn: &T,
    container: &T::Bucket,
    entry: &RawEntry<'_>,
) -> Result<EntryKind<T::Bucket>> {
    match entry.value {
        Some(value) => Ok(EntryKind::Value(value.len())),
        None => Ok(match txn.resolve_bucket(container, entry.key)? {
            Some(bucket) => EntryKind::Bucket(bucket),
            None => EntryKind::EmptyValue,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemStore;

    #[test]
    fn test_absent_value_resolving_to_bucket() {
        let mut store = MemStore::new();
        let root = store.root();
        let child = store.create_bucket(root, "child");

        let entry = RawEntry {
            key: b"child",
            value: None,
        };
        let kind = classify(&store, &root, &entry).unwrap();
        assert_eq!(kind, EntryKind::Bucket(child));
        assert!(!kind.is_terminal());
    }

    #[test]
    fn test_absent_value_without_bucket_is_empty_key() {
        let mut store = MemStore::new();
        let root = store.root();
        store.put(root, "k", "");

        let entry = RawEntry {
            key: b"k",
            value: None,
        };
        let kind = classify(&store, &root, &entry).unwrap();
        assert_eq!(kind, EntryKind::EmptyValue);
        assert!(kind.is_terminal());
        assert_eq!(kind.value_len(), 0);
    }

    #[test]
    fn test_present_value_is_terminal_even_if_zero_length() {
        let mut store = MemStore::new();
        let root = store.root();
        // A bucket with the same key must not win over explicit value bytes.
        store.create_bucket(root, "k");

        let entry = RawEntry {
            key: b"k",
            value: Some(b""),
        };
        assert_eq!(classify(&store, &root, &entry).unwrap(), EntryKind::Value(0));

        let entry = RawEntry {
            key: b"k",
            value: Some(b"abc"),
        };
        assert_eq!(classify(&store, &root, &entry).unwrap(), EntryKind::Value(3));
    }
}
