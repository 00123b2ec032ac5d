//! Bolt page layout: page headers, meta pages and page elements.
//!
//! ```text
//! Page header (16 bytes)
//! Offset  Size  Field
//! 0       8     id: u64
//! 8       2     flags: u16 (branch 0x01, leaf 0x02, meta 0x04, freelist 0x10)
//! 10      2     count: u16
//! 12      4     overflow: u32 (extra contiguous pages)
//!
//! Meta (64 bytes, directly after the header of pages 0 and 1)
//! 0       4     magic: u32 = 0xED0CDAED
//! 4       4     version: u32 = 2
//! 8       4     page_size: u32
//! 12      4     flags: u32
//! 16      8     root bucket page: u64
//! 24      8     root bucket sequence: u64
//! 32      8     freelist page: u64
//! 40      8     pgid high-water mark: u64
//! 48      8     txid: u64
//! 56      8     checksum: u64 (FNV-1a 64 over bytes 0..56)
//!
//! Branch element (16 bytes): pos u32, ksize u32, pgid u64
//! Leaf element   (16 bytes): flags u32, pos u32, ksize u32, vsize u32
//! ```
//!
//! `pos` is relative to the element's own address. All integers are little
//! endian. Every read is bounds checked against the page's addressable span;
//! a violation is reported as [`AuditError::InvalidFormat`].

use std::io::Write;
use std::ops::Range;

use crate::error::{AuditError, Result};

// ── Constants ──────────────────────────────────────────────────────

pub const MAGIC: u32 = 0xED0C_DAED;
pub const VERSION: u32 = 2;

pub const PAGE_HEADER_SIZE: usize = 16;
pub const ELEMENT_SIZE: usize = 16;
pub const META_SIZE: usize = 64;
pub const BUCKET_HEADER_SIZE: usize = 16;

/// Page size assumed when meta page 0 is unreadable.
pub const DEFAULT_PAGE_SIZE: usize = 4096;

pub const BRANCH_PAGE_FLAG: u16 = 0x01;
pub const LEAF_PAGE_FLAG: u16 = 0x02;
pub const META_PAGE_FLAG: u16 = 0x04;
pub const FREELIST_PAGE_FLAG: u16 = 0x10;

/// Leaf element flag marking a nested bucket.
pub const BUCKET_LEAF_FLAG: u32 = 0x01;

// ── Helpers ────────────────────────────────────────────────────────

fn slice_at(data: &[u8], offset: usize, len: usize, limit: usize) -> Result<&[u8]> {
    let end = offset
        .checked_add(len)
        .filter(|&end| end <= limit.min(data.len()))
        .ok_or_else(|| {
            AuditError::InvalidFormat(format!(
                "read of {} bytes at offset {} exceeds bound {}",
                len, offset, limit
            ))
        })?;
    Ok(&data[offset..end])
}

fn read_u16_at(data: &[u8], offset: usize, limit: usize) -> Result<u16> {
    let b = slice_at(data, offset, 2, limit)?;
    Ok(u16::from_le_bytes([b[0], b[1]]))
}

fn read_u32_at(data: &[u8], offset: usize, limit: usize) -> Result<u32> {
    let b = slice_at(data, offset, 4, limit)?;
    Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

fn read_u64_at(data: &[u8], offset: usize, limit: usize) -> Result<u64> {
    let b = slice_at(data, offset, 8, limit)?;
    let mut buf = [0u8; 8];
    buf.copy_from_slice(b);
    Ok(u64::from_le_bytes(buf))
}

/// FNV-1a 64-bit hash, used for the meta checksum.
pub fn fnv1a64(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    bytes.iter().fold(OFFSET_BASIS, |hash, &b| {
        (hash ^ b as u64).wrapping_mul(PRIME)
    })
}

// ── Page Header ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageHeader {
    pub id: u64,
    pub flags: u16,
    pub count: u16,
    pub overflow: u32,
}

impl PageHeader {
    pub fn read(data: &[u8], offset: usize, limit: usize) -> Result<Self> {
        Ok(Self {
            id: read_u64_at(data, offset, limit)?,
            flags: read_u16_at(data, offset + 8, limit)?,
            count: read_u16_at(data, offset + 10, limit)?,
            overflow: read_u32_at(data, offset + 12, limit)?,
        })
    }

    pub fn is_branch(&self) -> bool {
        self.flags & BRANCH_PAGE_FLAG != 0
    }

    pub fn is_leaf(&self) -> bool {
        self.flags & LEAF_PAGE_FLAG != 0
    }

    pub fn to_bytes(&self) -> [u8; PAGE_HEADER_SIZE] {
        let mut buf = [0u8; PAGE_HEADER_SIZE];
        buf[0..8].copy_from_slice(&self.id.to_le_bytes());
        buf[8..10].copy_from_slice(&self.flags.to_le_bytes());
        buf[10..12].copy_from_slice(&self.count.to_le_bytes());
        buf[12..16].copy_from_slice(&self.overflow.to_le_bytes());
        buf
    }

    /// Write header to writer (exactly PAGE_HEADER_SIZE bytes).
    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(&self.to_bytes())
    }
}

// ── Meta ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Meta {
    pub magic: u32,
    pub version: u32,
    pub page_size: u32,
    pub flags: u32,
    pub root: u64,
    pub sequence: u64,
    pub freelist: u64,
    pub pgid: u64,
    pub txid: u64,
    pub checksum: u64,
}

impl Meta {
    pub fn new(page_size: u32, root: u64, freelist: u64, pgid: u64, txid: u64) -> Self {
        let mut meta = Self {
            magic: MAGIC,
            version: VERSION,
            page_size,
            flags: 0,
            root,
            sequence: 0,
            freelist,
            pgid,
            txid,
            checksum: 0,
        };
        meta.checksum = meta.sum64();
        meta
    }

    /// Parse and validate the meta stored in the page at `page_offset`.
    pub fn read(data: &[u8], page_offset: usize) -> Result<Self> {
        let start = page_offset
            .checked_add(PAGE_HEADER_SIZE)
            .ok_or_else(|| AuditError::InvalidFormat("meta offset overflow".into()))?;
        let limit = data.len();
        let meta = Self {
            magic: read_u32_at(data, start, limit)?,
            version: read_u32_at(data, start + 4, limit)?,
            page_size: read_u32_at(data, start + 8, limit)?,
            flags: read_u32_at(data, start + 12, limit)?,
            root: read_u64_at(data, start + 16, limit)?,
            sequence: read_u64_at(data, start + 24, limit)?,
            freelist: read_u64_at(data, start + 32, limit)?,
            pgid: read_u64_at(data, start + 40, limit)?,
            txid: read_u64_at(data, start + 48, limit)?,
            checksum: read_u64_at(data, start + 56, limit)?,
        };
        meta.validate()?;
        Ok(meta)
    }

    pub fn validate(&self) -> Result<()> {
        if self.magic != MAGIC {
            return Err(AuditError::InvalidFormat(format!(
                "Not a bolt file: bad magic 0x{:08x}",
                self.magic
            )));
        }
        if self.version != VERSION {
            return Err(AuditError::InvalidFormat(format!(
                "Unsupported bolt version: {}",
                self.version
            )));
        }
        if self.checksum != self.sum64() {
            return Err(AuditError::InvalidFormat("Meta checksum mismatch".into()));
        }
        if (self.page_size as usize) < PAGE_HEADER_SIZE + META_SIZE {
            return Err(AuditError::InvalidFormat(format!(
                "Implausible page size: {}",
                self.page_size
            )));
        }
        Ok(())
    }

    /// Checksum over every field before `checksum`.
    pub fn sum64(&self) -> u64 {
        let mut buf = Vec::with_capacity(META_SIZE);
        self.write_fields(&mut buf);
        fnv1a64(&buf)
    }

    fn write_fields(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.magic.to_le_bytes());
        buf.extend_from_slice(&self.version.to_le_bytes());
        buf.extend_from_slice(&self.page_size.to_le_bytes());
        buf.extend_from_slice(&self.flags.to_le_bytes());
        buf.extend_from_slice(&self.root.to_le_bytes());
        buf.extend_from_slice(&self.sequence.to_le_bytes());
        buf.extend_from_slice(&self.freelist.to_le_bytes());
        buf.extend_from_slice(&self.pgid.to_le_bytes());
        buf.extend_from_slice(&self.txid.to_le_bytes());
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(META_SIZE);
        self.write_fields(&mut buf);
        buf.extend_from_slice(&self.checksum.to_le_bytes());
        buf
    }

    /// Write meta to writer (exactly META_SIZE bytes).
    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(&self.to_bytes())
    }
}

/// Pick the meta a reader should use: the valid one with the higher txid.
pub fn select_meta(data: &[u8]) -> Result<Meta> {
    let meta0 = Meta::read(data, 0);
    let page_size = match &meta0 {
        Ok(m) => m.page_size as usize,
        Err(_) => DEFAULT_PAGE_SIZE,
    };
    let meta1 = Meta::read(data, page_size);
    match (meta0, meta1) {
        (Ok(a), Ok(b)) => Ok(if b.txid > a.txid { b } else { a }),
        (Ok(a), Err(_)) => Ok(a),
        (Err(_), Ok(b)) => Ok(b),
        (Err(e), Err(_)) => Err(e),
    }
}

// ── Pages ──────────────────────────────────────────────────────────

/// Location of a page: absolute offset of its header and the end of the
/// bytes it may address. Inline bucket pages end with their parent value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRef {
    pub offset: usize,
    pub limit: usize,
}

impl PageRef {
    /// A regular page addressed by id.
    pub fn paged(pgid: u64, meta: &Meta, data_len: usize) -> Result<Self> {
        if pgid >= meta.pgid {
            return Err(AuditError::InvalidFormat(format!(
                "Page {} beyond high-water mark {}",
                pgid, meta.pgid
            )));
        }
        let offset = (pgid as usize)
            .checked_mul(meta.page_size as usize)
            .filter(|&off| off < data_len)
            .ok_or_else(|| {
                AuditError::InvalidFormat(format!("Page {} lies outside the file", pgid))
            })?;
        Ok(Self {
            offset,
            limit: data_len,
        })
    }

    /// An inline page embedded in a bucket value.
    pub fn inline(value: Range<usize>) -> Result<Self> {
        if value.len() < BUCKET_HEADER_SIZE + PAGE_HEADER_SIZE {
            return Err(AuditError::InvalidFormat(format!(
                "Inline bucket value too small: {} bytes",
                value.len()
            )));
        }
        Ok(Self {
            offset: value.start + BUCKET_HEADER_SIZE,
            limit: value.end,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafElement {
    pub flags: u32,
    pub key: Range<usize>,
    pub value: Range<usize>,
}

impl LeafElement {
    pub fn is_bucket(&self) -> bool {
        self.flags & BUCKET_LEAF_FLAG != 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchElement {
    pub key: Range<usize>,
    pub pgid: u64,
}

/// A parsed page header plus its addressable span.
#[derive(Debug, Clone, Copy)]
pub struct Page<'a> {
    data: &'a [u8],
    offset: usize,
    limit: usize,
    pub header: PageHeader,
}

impl<'a> Page<'a> {
    pub fn read(data: &'a [u8], at: PageRef, page_size: usize) -> Result<Self> {
        let header = PageHeader::read(data, at.offset, at.limit)?;
        let span = (header.overflow as usize + 1).saturating_mul(page_size);
        let limit = at.limit.min(at.offset.saturating_add(span)).min(data.len());
        let page = Self {
            data,
            offset: at.offset,
            limit,
            header,
        };
        if !(header.is_leaf() || header.is_branch()) {
            return Err(AuditError::InvalidFormat(format!(
                "Unexpected page flags 0x{:02x} at offset {}",
                header.flags, at.offset
            )));
        }
        Ok(page)
    }

    pub fn count(&self) -> usize {
        self.header.count as usize
    }

    fn element_offset(&self, index: usize) -> Result<usize> {
        if index >= self.count() {
            return Err(AuditError::InvalidFormat(format!(
                "Element {} out of range ({} elements)",
                index,
                self.count()
            )));
        }
        Ok(self.offset + PAGE_HEADER_SIZE + index * ELEMENT_SIZE)
    }

    fn span(&self, start: usize, len: usize) -> Result<Range<usize>> {
        slice_at(self.data, start, len, self.limit)?;
        Ok(start..start + len)
    }

    pub fn leaf(&self, index: usize) -> Result<LeafElement> {
        let at = self.element_offset(index)?;
        let flags = read_u32_at(self.data, at, self.limit)?;
        let pos = read_u32_at(self.data, at + 4, self.limit)? as usize;
        let ksize = read_u32_at(self.data, at + 8, self.limit)? as usize;
        let vsize = read_u32_at(self.data, at + 12, self.limit)? as usize;
        let key = self.span(at + pos, ksize)?;
        let value = self.span(key.end, vsize)?;
        Ok(LeafElement { flags, key, value })
    }

    pub fn branch(&self, index: usize) -> Result<BranchElement> {
        let at = self.element_offset(index)?;
        let pos = read_u32_at(self.data, at, self.limit)? as usize;
        let ksize = read_u32_at(self.data, at + 4, self.limit)? as usize;
        let pgid = read_u64_at(self.data, at + 8, self.limit)?;
        let key = self.span(at + pos, ksize)?;
        Ok(BranchElement { key, pgid })
    }

    /// Key of element `index`, leaf or branch.
    pub fn key(&self, index: usize) -> Result<&'a [u8]> {
        let range = if self.header.is_leaf() {
            self.leaf(index)?.key
        } else {
            self.branch(index)?.key
        };
        Ok(&self.data[range])
    }

    /// First element whose key is `>= key`, and whether it matched exactly.
    pub fn search(&self, key: &[u8]) -> Result<(usize, bool)> {
        let (mut lo, mut hi) = (0, self.count());
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.key(mid)? < key {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        let exact = lo < self.count() && self.key(lo)? == key;
        Ok((lo, exact))
    }
}

/// Read the bucket header stored in a bucket value and locate its root page.
pub fn bucket_root(data: &[u8], value: Range<usize>, meta: &Meta) -> Result<PageRef> {
    let root = read_u64_at(data, value.start, value.end)?;
    if root == 0 {
        PageRef::inline(value)
    } else {
        PageRef::paged(root, meta, data.len())
    }
}
