//! cursor tracks a position within one btree.
//!
//! The position is the path from the root to the page currently being
//! visited, held as an explicit stack.  Popping the stack restores the
//! ancestor when a child page is exhausted; an empty stack means the
//! cursor has walked off the end of the tree.

use super::page::PageView;
use super::Error;
use crate::pager::PageNum;

/// One level of the path: a page, the byte offset of the current cell
/// within it, and the cell's index once the cursor has settled on one.
#[derive(Debug, Clone)]
pub struct PagePosition {
    pub pgnum: PageNum,
    pub offset: usize,
    pub cell: Option<usize>,
}

#[derive(Debug)]
pub struct Cursor {
    root_page: PageNum,
    stack: Vec<PagePosition>,
}

impl Cursor {
    /// A fresh cursor points at the very beginning of the root page.
    pub fn new(root_page: PageNum) -> Cursor {
        Cursor {
            root_page,
            stack: vec![PagePosition {
                pgnum: root_page,
                offset: 0,
                cell: None,
            }],
        }
    }

    /// Drop any accumulated path and start over at the root.
    pub fn reset(&mut self) {
        self.stack.clear();
        self.push(self.root_page);
    }

    pub fn current_page(&self) -> Option<PageNum> {
        self.stack.last().map(|p| p.pgnum)
    }

    pub fn current_cell(&self) -> Option<usize> {
        self.stack.last().and_then(|p| p.cell)
    }

    pub fn position(&self) -> Option<usize> {
        self.stack.last().map(|p| p.offset)
    }

    pub fn is_exhausted(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn push(&mut self, pgnum: PageNum) {
        self.stack.push(PagePosition {
            pgnum,
            offset: 0,
            cell: None,
        });
    }

    pub fn pop(&mut self) -> Option<PagePosition> {
        self.stack.pop()
    }

    /// Settle the top of the stack on cell `i` of its page.
    ///
    /// `page` must be the view of the page on top of the stack.  Fails with
    /// *cell-index-out-of-range* when the page has no cell `i`.
    pub fn move_to_cell(&mut self, page: &PageView, i: usize) -> Result<(), Error> {
        let offset = page.cell_pointer(i)?;
        let top = self
            .stack
            .last_mut()
            .expect("move_to_cell called on an exhausted cursor");
        debug_assert_eq!(top.pgnum, page.pgnum());
        top.offset = offset;
        top.cell = Some(i);
        Ok(())
    }
}
