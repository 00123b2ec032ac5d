//! Assembles small bolt images from a bucket description.
//!
//! Used to produce fixture files for tests and benchmarks. The builder writes
//! a fresh image (two metas, an empty freelist page, then the bucket pages);
//! it never modifies an existing store. Buckets are written bottom-up so
//! every child page exists before the leaf that points at it. Leaves hold at
//! most `leaf_capacity` elements; larger buckets get branch levels above
//! their leaves. Pages larger than the page size spill into overflow pages.

use std::collections::BTreeMap;
use std::path::Path;

use crate::bolt::page::{
    Meta, PageHeader, BRANCH_PAGE_FLAG, BUCKET_LEAF_FLAG, DEFAULT_PAGE_SIZE, ELEMENT_SIZE,
    FREELIST_PAGE_FLAG, LEAF_PAGE_FLAG, META_PAGE_FLAG, PAGE_HEADER_SIZE,
};

const FREELIST_PGID: u64 = 2;
const FIRST_DATA_PGID: usize = 3;

#[derive(Debug, Clone)]
enum SpecEntry {
    Value(Vec<u8>),
    Bucket(BucketSpec),
}

/// Description of one bucket's contents.
#[derive(Debug, Clone, Default)]
pub struct BucketSpec {
    entries: BTreeMap<Vec<u8>, SpecEntry>,
    inline: bool,
}

impl BucketSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store this bucket inline in its parent's leaf instead of on its own
    /// pages.
    pub fn inline(mut self) -> Self {
        self.inline = true;
        self
    }

    pub fn put(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> &mut Self {
        self.entries.insert(key.into(), SpecEntry::Value(value.into()));
        self
    }

    pub fn bucket(&mut self, key: impl Into<Vec<u8>>, child: BucketSpec) -> &mut Self {
        self.entries.insert(key.into(), SpecEntry::Bucket(child));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

struct Image {
    bytes: Vec<u8>,
    page_size: usize,
}

impl Image {
    /// Append an encoded page (plus overflow) and return its page id.
    fn append(&mut self, mut page: Vec<u8>) -> u64 {
        let pgid = (self.bytes.len() / self.page_size) as u64;
        let pages = ((page.len() + self.page_size - 1) / self.page_size).max(1);
        page[0..8].copy_from_slice(&pgid.to_le_bytes());
        page[12..16].copy_from_slice(&((pages - 1) as u32).to_le_bytes());
        page.resize(pages * self.page_size, 0);
        self.bytes.extend_from_slice(&page);
        pgid
    }

    fn write_at(&mut self, pgid: u64, bytes: &[u8]) {
        let offset = pgid as usize * self.page_size;
        self.bytes[offset..offset + bytes.len()].copy_from_slice(bytes);
    }
}

struct LeafItem {
    key: Vec<u8>,
    flags: u32,
    value: Vec<u8>,
}

fn encode_leaf(items: &[LeafItem]) -> Vec<u8> {
    let data_start = PAGE_HEADER_SIZE + items.len() * ELEMENT_SIZE;
    let mut elements = Vec::with_capacity(items.len() * ELEMENT_SIZE);
    let mut data = Vec::new();
    for (i, item) in items.iter().enumerate() {
        let elem_at = PAGE_HEADER_SIZE + i * ELEMENT_SIZE;
        let pos = data_start + data.len() - elem_at;
        elements.extend_from_slice(&item.flags.to_le_bytes());
        elements.extend_from_slice(&(pos as u32).to_le_bytes());
        elements.extend_from_slice(&(item.key.len() as u32).to_le_bytes());
        elements.extend_from_slice(&(item.value.len() as u32).to_le_bytes());
        data.extend_from_slice(&item.key);
        data.extend_from_slice(&item.value);
    }

    let header = PageHeader {
        id: 0,
        flags: LEAF_PAGE_FLAG,
        count: items.len() as u16,
        overflow: 0,
    };
    let mut page = header.to_bytes().to_vec();
    page.extend_from_slice(&elements);
    page.extend_from_slice(&data);
    page
}

fn encode_branch(children: &[(Vec<u8>, u64)]) -> Vec<u8> {
    let data_start = PAGE_HEADER_SIZE + children.len() * ELEMENT_SIZE;
    let mut elements = Vec::with_capacity(children.len() * ELEMENT_SIZE);
    let mut data = Vec::new();
    for (i, (key, pgid)) in children.iter().enumerate() {
        let elem_at = PAGE_HEADER_SIZE + i * ELEMENT_SIZE;
        let pos = data_start + data.len() - elem_at;
        elements.extend_from_slice(&(pos as u32).to_le_bytes());
        elements.extend_from_slice(&(key.len() as u32).to_le_bytes());
        elements.extend_from_slice(&pgid.to_le_bytes());
        data.extend_from_slice(key);
    }

    let header = PageHeader {
        id: 0,
        flags: BRANCH_PAGE_FLAG,
        count: children.len() as u16,
        overflow: 0,
    };
    let mut page = header.to_bytes().to_vec();
    page.extend_from_slice(&elements);
    page.extend_from_slice(&data);
    page
}

/// Builds bolt images.
#[derive(Debug, Clone)]
pub struct ImageBuilder {
    page_size: usize,
    leaf_capacity: usize,
}

impl Default for ImageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageBuilder {
    pub fn new() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            leaf_capacity: 64,
        }
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Maximum elements per leaf and per branch page (at least 2 for
    /// branches).
    pub fn leaf_capacity(mut self, capacity: usize) -> Self {
        self.leaf_capacity = capacity.clamp(1, u16::MAX as usize);
        self
    }

    /// Encode `root` as the transaction root bucket of a new image.
    pub fn build(&self, root: &BucketSpec) -> Vec<u8> {
        let mut image = Image {
            bytes: vec![0u8; FIRST_DATA_PGID * self.page_size],
            page_size: self.page_size,
        };
        let root_pgid = self.write_tree(&mut image, root);

        let freelist = PageHeader {
            id: FREELIST_PGID,
            flags: FREELIST_PAGE_FLAG,
            count: 0,
            overflow: 0,
        };
        image.write_at(FREELIST_PGID, &freelist.to_bytes());

        let high_water = (image.bytes.len() / self.page_size) as u64;
        for (pgid, txid) in [(0u64, 1u64), (1, 2)] {
            let header = PageHeader {
                id: pgid,
                flags: META_PAGE_FLAG,
                count: 0,
                overflow: 0,
            };
            let meta = Meta::new(
                self.page_size as u32,
                root_pgid,
                FREELIST_PGID,
                high_water,
                txid,
            );
            let mut page = header.to_bytes().to_vec();
            page.extend_from_slice(&meta.to_bytes());
            image.write_at(pgid, &page);
        }
        image.bytes
    }

    /// Build and write the image to `path`.
    pub fn write_to(&self, root: &BucketSpec, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, self.build(root))
    }

    fn leaf_items(&self, image: &mut Image, spec: &BucketSpec) -> Vec<LeafItem> {
        let mut items = Vec::with_capacity(spec.entries.len());
        for (key, entry) in &spec.entries {
            let item = match entry {
                SpecEntry::Value(value) => LeafItem {
                    key: key.clone(),
                    flags: 0,
                    value: value.clone(),
                },
                SpecEntry::Bucket(child) => LeafItem {
                    key: key.clone(),
                    flags: BUCKET_LEAF_FLAG,
                    value: self.bucket_value(image, child),
                },
            };
            items.push(item);
        }
        items
    }

    /// Bucket header (root page, sequence) followed by the inline page, if
    /// any. An inline bucket with more entries than one page header can count
    /// is written to its own pages instead.
    fn bucket_value(&self, image: &mut Image, child: &BucketSpec) -> Vec<u8> {
        let mut value = Vec::new();
        if child.inline && child.len() <= u16::MAX as usize {
            let items = self.leaf_items(image, child);
            value.extend_from_slice(&0u64.to_le_bytes());
            value.extend_from_slice(&0u64.to_le_bytes());
            value.extend_from_slice(&encode_leaf(&items));
        } else {
            let root = self.write_tree(image, child);
            value.extend_from_slice(&root.to_le_bytes());
            value.extend_from_slice(&0u64.to_le_bytes());
        }
        value
    }

    /// Write a bucket's pages and return the page id of its root.
    fn write_tree(&self, image: &mut Image, spec: &BucketSpec) -> u64 {
        let items = self.leaf_items(image, spec);

        let mut level: Vec<(Vec<u8>, u64)> = Vec::new();
        for chunk in items.chunks(self.leaf_capacity) {
            let first = chunk[0].key.clone();
            level.push((first, image.append(encode_leaf(chunk))));
        }
        if level.is_empty() {
            level.push((Vec::new(), image.append(encode_leaf(&[]))));
        }

        let fanout = self.leaf_capacity.max(2);
        while level.len() > 1 {
            let mut parents = Vec::with_capacity(level.len() / fanout + 1);
            for chunk in level.chunks(fanout) {
                let first = chunk[0].0.clone();
                parents.push((first, image.append(encode_branch(chunk))));
            }
            level = parents;
        }
        level[0].1
    }
}
