//! boltstat - structural statistics for bolt key-value store files
//!
//! Walks every bucket reachable from a read transaction's root and reports,
//! per top-level namespace and globally, the maximum nesting depth, the
//! number of nested buckets and terminal keys, and the cumulative key and
//! value sizes. The store is never modified.
//!
//! # Architecture
//!
//! ```text
//!   BoltDb ──begin──► BoltTx (ReadTxn)
//!                        │
//!                        ▼
//!   router::Partition::scan      one pass over the root cursor
//!                        │        68-byte keys → pooled, others → named
//!                        ▼
//!   walker::traverse             explicit-stack DFS per namespace
//!     └─ classify::classify      bucket vs. empty value vs. value
//!                        │
//!                        ▼
//!   stats::Stats::merge          named + pooled → global
//!                        │
//!                        ▼
//!   report::emit                 JSON lines + IEC summary
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use boltstat::{audit, BoltDb, StoreOptions};
//!
//! let db = BoltDb::open(Path::new("channel.db"), StoreOptions::default())?;
//! let tx = db.begin()?;
//! let report = audit(&tx)?;
//! println!("{} keys", report.global.keys);
//! # Ok::<(), boltstat::AuditError>(())
//! ```

pub mod audit;
pub mod bolt;
pub mod classify;
pub mod config;
pub mod error;
pub mod report;
pub mod router;
pub mod stats;
pub mod store;
pub mod walker;

pub use audit::{audit, audit_partition, AuditReport, GLOBAL_LABEL, POOLED_LABEL};
pub use bolt::{BoltDb, BoltTx};
pub use classify::{classify, EntryKind};
pub use config::{AuditConfig, CliArgs};
pub use error::{AuditError, Result};
pub use router::{display_name, route, Partition, Route, FIXED_ID_KEY_LEN};
pub use stats::Stats;
pub use store::{MemStore, RawEntry, ReadTxn, StoreOptions};
pub use walker::traverse;
