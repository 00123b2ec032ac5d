//! Read-only access to bolt-format store files.
//!
//! The file is memory-mapped once and held under a shared advisory lock for
//! the lifetime of [`BoltDb`]. A read transaction ([`BoltTx`]) pins the meta
//! page that was current when it began and resolves every page through it,
//! so a traversal sees one consistent tree.

pub mod builder;
pub mod cursor;
pub mod page;

use std::fs::File;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::time::Duration;

use memmap2::Mmap;
use tracing::debug;

use crate::error::{AuditError, Result};
use crate::store::{RawEntry, ReadTxn, StoreOptions};

pub use builder::{BucketSpec, ImageBuilder};
pub use cursor::BoltCursor;
pub use page::{Meta, PageRef};

use page::{bucket_root, select_meta, LeafElement, Page, PAGE_HEADER_SIZE, META_SIZE};

/// Interval between attempts to take the shared lock.
const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(50);

// ── BoltDb ─────────────────────────────────────────────────────────

/// An open, read-only bolt file.
pub struct BoltDb {
    path: PathBuf,
    file: File,
    mmap: Mmap,
}

impl BoltDb {
    /// Open `path` read-only, waiting up to `options.timeout` for a shared
    /// lock.
    pub fn open(path: &Path, options: StoreOptions) -> Result<Self> {
        if !options.read_only {
            return Err(AuditError::WriteAccessUnsupported);
        }

        let file = File::open(path).map_err(|e| AuditError::io("open", path, e))?;
        lock_shared(&file, path, options.timeout)?;

        let len = file
            .metadata()
            .map_err(|e| AuditError::io("stat", path, e))?
            .len();
        if (len as usize) < PAGE_HEADER_SIZE + META_SIZE {
            return Err(AuditError::InvalidFormat(format!(
                "File too small for a bolt store: {} bytes",
                len
            )));
        }

        let mmap = unsafe { Mmap::map(&file) }.map_err(|e| AuditError::io("map", path, e))?;
        let meta = select_meta(&mmap)?;
        debug!(
            path = %path.display(),
            page_size = meta.page_size,
            txid = meta.txid,
            "Opened bolt file"
        );

        Ok(Self {
            path: path.to_path_buf(),
            file,
            mmap,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Begin a read-only transaction on the current meta page.
    pub fn begin(&self) -> Result<BoltTx<'_>> {
        let meta = select_meta(&self.mmap)?;
        Ok(BoltTx {
            data: &self.mmap,
            meta,
        })
    }

    /// Release the lock and the mapping.
    pub fn close(self) -> Result<()> {
        let BoltDb { path, file, mmap } = self;
        drop(mmap);
        unlock(&file, &path)
    }
}

#[cfg(unix)]
fn lock_shared(file: &File, path: &Path, timeout: Duration) -> Result<()> {
    use std::os::unix::io::AsRawFd;
    use std::time::Instant;

    let started = Instant::now();
    loop {
        let rc = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_SH | libc::LOCK_NB) };
        if rc == 0 {
            return Ok(());
        }
        let err = std::io::Error::last_os_error();
        if err.raw_os_error() != Some(libc::EWOULDBLOCK) {
            return Err(AuditError::io("lock", path, err));
        }
        if started.elapsed() >= timeout {
            return Err(AuditError::Timeout {
                path: path.to_path_buf(),
                timeout,
            });
        }
        std::thread::sleep(LOCK_RETRY_INTERVAL);
    }
}

#[cfg(not(unix))]
fn lock_shared(_file: &File, _path: &Path, _timeout: Duration) -> Result<()> {
    Ok(())
}

#[cfg(unix)]
fn unlock(file: &File, path: &Path) -> Result<()> {
    use std::os::unix::io::AsRawFd;

    let rc = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_UN) };
    if rc != 0 {
        return Err(AuditError::io("unlock", path, std::io::Error::last_os_error()));
    }
    Ok(())
}

#[cfg(not(unix))]
fn unlock(_file: &File, _path: &Path) -> Result<()> {
    Ok(())
}

// ── BoltTx ─────────────────────────────────────────────────────────

/// Handle to a bucket's root page inside a [`BoltTx`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoltBucket {
    root: PageRef,
}

/// A read-only snapshot of a [`BoltDb`].
pub struct BoltTx<'db> {
    data: &'db [u8],
    meta: Meta,
}

impl<'db> BoltTx<'db> {
    /// Build a transaction over an in-memory image.
    pub fn from_bytes(data: &'db [u8]) -> Result<Self> {
        let meta = select_meta(data)?;
        Ok(Self { data, meta })
    }

    pub fn txid(&self) -> u64 {
        self.meta.txid
    }

    pub fn page_size(&self) -> usize {
        self.meta.page_size as usize
    }

    /// Release the snapshot.
    pub fn rollback(self) -> Result<()> {
        debug!(txid = self.meta.txid, "Read transaction released");
        Ok(())
    }

    pub(crate) fn page_ref(&self, pgid: u64) -> Result<PageRef> {
        PageRef::paged(pgid, &self.meta, self.data.len())
    }

    pub(crate) fn page(&self, at: PageRef) -> Result<Page<'db>> {
        Page::read(self.data, at, self.page_size())
    }

    fn bytes(&self, range: Range<usize>) -> &'db [u8] {
        &self.data[range]
    }

    pub(crate) fn entry(&self, elem: &LeafElement) -> RawEntry<'db> {
        let value = if elem.is_bucket() || elem.value.is_empty() {
            None
        } else {
            Some(self.bytes(elem.value.clone()))
        };
        RawEntry {
            key: self.bytes(elem.key.clone()),
            value,
        }
    }
}

impl<'db> ReadTxn for BoltTx<'db> {
    type Bucket = BoltBucket;
    type Cursor<'a> = BoltCursor<'a> where Self: 'a;

    fn root(&self) -> BoltBucket {
        BoltBucket {
            root: PageRef {
                offset: (self.meta.root as usize).saturating_mul(self.page_size()),
                limit: self.data.len(),
            },
        }
    }

    fn cursor<'a>(&'a self, bucket: &BoltBucket) -> BoltCursor<'a> {
        BoltCursor::new(self, bucket.root)
    }

    fn resolve_bucket(&self, container: &BoltBucket, key: &[u8]) -> Result<Option<BoltBucket>> {
        match cursor::seek(self, container.root, key)? {
            Some(elem) if elem.is_bucket() => {
                let root = bucket_root(self.data, elem.value, &self.meta)?;
                Ok(Some(BoltBucket { root }))
            }
            _ => Ok(None),
        }
    }
}
