//! Top-level namespace routing.
//!
//! Top-level keys whose raw length is exactly [`FIXED_ID_KEY_LEN`] bytes are
//! fixed-id log namespaces; they are pooled into one aggregate instead of
//! being reported one by one. Every other top-level key is a named bucket.

use std::fmt::Write;

use crate::error::Result;
use crate::store::ReadTxn;

/// Raw key length of a fixed-id log namespace.
pub const FIXED_ID_KEY_LEN: usize = 68;

/// Destination of a top-level key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Traversed into the shared fixed-id log aggregate.
    Pooled,
    /// Traversed and reported on its own.
    Named,
}

/// Route a top-level key by its raw byte length.
pub fn route(key: &[u8]) -> Route {
    if key.len() == FIXED_ID_KEY_LEN {
        Route::Pooled
    } else {
        Route::Named
    }
}

/// Render a key for display: verbatim when it is valid UTF-8, lowercase hex
/// otherwise.
pub fn display_name(key: &[u8]) -> String {
    match std::str::from_utf8(key) {
        Ok(s) => s.to_string(),
        Err(_) => {
            let mut out = String::with_capacity(key.len() * 2);
            for b in key {
                let _ = write!(&mut out, "{:02x}", b);
            }
            out
        }
    }
}

/// Top-level keys split by route, each list in cursor order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    pub named: Vec<Vec<u8>>,
    pub pooled: Vec<Vec<u8>>,
}

impl Partition {
    /// Read every top-level key with one pass of the root cursor.
    pub fn scan<T: ReadTxn>(txn: &T) -> Result<Self> {
        let mut partition = Partition::default();
        for entry in txn.cursor(&txn.root()) {
            let key = entry?.key;
            match route(key) {
                Route::Pooled => partition.pooled.push(key.to_vec()),
                Route::Named => partition.named.push(key.to_vec()),
            }
        }
        Ok(partition)
    }

    /// Display names of the named buckets, sorted by rendered name.
    ///
    /// Only used for the printed listing; traversal keeps cursor order.
    pub fn sorted_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.named.iter().map(|k| display_name(k)).collect();
        names.sort();
        names
    }
}
