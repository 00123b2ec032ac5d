//! In-order iteration and key lookup over a bucket's page tree.

use crate::bolt::page::{LeafElement, Page, PageRef};
use crate::bolt::BoltTx;
use crate::error::{AuditError, Result};
use crate::store::RawEntry;

/// Deepest branch nesting accepted before the tree is considered corrupt.
/// Also bounds cycles between branch pages.
const MAX_TREE_HEIGHT: usize = 64;

struct Position<'a> {
    page: Page<'a>,
    index: usize,
}

/// Cursor over the leaf elements of one bucket, in key order.
pub struct BoltCursor<'a> {
    tx: &'a BoltTx<'a>,
    root: Option<PageRef>,
    stack: Vec<Position<'a>>,
    done: bool,
}

impl<'a> BoltCursor<'a> {
    pub(crate) fn new(tx: &'a BoltTx<'a>, root: PageRef) -> Self {
        Self {
            tx,
            root: Some(root),
            stack: Vec::new(),
            done: false,
        }
    }

    fn push(&mut self, at: PageRef) -> Result<()> {
        if self.stack.len() >= MAX_TREE_HEIGHT {
            return Err(AuditError::InvalidFormat(format!(
                "Page tree deeper than {} levels",
                MAX_TREE_HEIGHT
            )));
        }
        let page = self.tx.page(at)?;
        self.stack.push(Position { page, index: 0 });
        Ok(())
    }

    fn advance(&mut self) -> Result<Option<RawEntry<'a>>> {
        if let Some(root) = self.root.take() {
            self.push(root)?;
        }

        loop {
            let Some(top) = self.stack.last_mut() else {
                return Ok(None);
            };
            if top.index >= top.page.count() {
                self.stack.pop();
                continue;
            }

            let index = top.index;
            top.index += 1;
            let page = top.page;

            if page.header.is_leaf() {
                let elem = page.leaf(index)?;
                return Ok(Some(self.tx.entry(&elem)));
            }
            let child = page.branch(index)?;
            let at = self.tx.page_ref(child.pgid)?;
            self.push(at)?;
        }
    }
}

impl<'a> Iterator for BoltCursor<'a> {
    type Item = Result<RawEntry<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.advance() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Find the leaf element whose key equals `key` in the tree rooted at `root`.
pub(crate) fn seek(tx: &BoltTx<'_>, root: PageRef, key: &[u8]) -> Result<Option<LeafElement>> {
    let mut at = root;
    for _ in 0..MAX_TREE_HEIGHT {
        let page = tx.page(at)?;
        if page.count() == 0 {
            return Ok(None);
        }
        let (index, exact) = page.search(key)?;

        if page.header.is_leaf() {
            return Ok(if exact { Some(page.leaf(index)?) } else { None });
        }

        // Branch keys are the first key of each child; step back unless the
        // search key landed on an exact separator.
        let index = if !exact && index > 0 { index - 1 } else { index };
        at = tx.page_ref(page.branch(index)?.pgid)?;
    }
    Err(AuditError::InvalidFormat(format!(
        "Page tree deeper than {} levels",
        MAX_TREE_HEIGHT
    )))
}
