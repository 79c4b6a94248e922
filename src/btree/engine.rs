//! engine owns the cursors of one database and drives them over the page
//! provider.
//!
//! Every non-trivial virtual-machine instruction ends up here: `open-read`
//! creates a cursor, `rewind` seeks the first leaf cell, `next` walks to
//! the following one in rowid order, and `column` decodes from the cell
//! under the cursor.

use std::collections::HashMap;

use log::debug;

use super::cursor::Cursor;
use super::page::PageView;
use super::{Error, PageType};
use crate::pager::{PageNum, PageSource};
use crate::record;
use crate::value::ValueBuilder;

pub struct BtreeEngine<P: PageSource, B: ValueBuilder> {
    pager: P,
    values: B,
    cursors: HashMap<u64, Cursor>,
    page_size: usize,
    reserved_space: usize,
}

impl<P: PageSource, B: ValueBuilder> BtreeEngine<P, B> {
    pub fn new(pager: P, values: B) -> Self {
        let page_size = pager.page_size();
        let reserved_space = pager.reserved_space();
        BtreeEngine {
            pager,
            values,
            cursors: HashMap::new(),
            page_size,
            reserved_space,
        }
    }

    /// Create cursor `id` on the btree rooted at `root_page`, pointing at
    /// the very beginning of the root page.
    pub fn new_cursor(&mut self, id: u64, root_page: PageNum) -> Result<bool, Error> {
        if self.cursors.contains_key(&id) {
            return Err(Error::CursorExists(id));
        }
        self.cursors.insert(id, Cursor::new(root_page));
        Ok(true)
    }

    /// Move cursor `id` to the first leaf cell of its btree, taking the
    /// left-most branch at every interior page.  Returns `false` when the
    /// tree holds no cells at all.
    pub fn rewind(&mut self, id: u64) -> Result<bool, Error> {
        let cursor = self.cursors.get_mut(&id).ok_or(Error::CursorMissing(id))?;
        cursor.reset();
        descend_to_leftmost_leaf(&mut self.pager, self.page_size, self.reserved_space, cursor)
    }

    /// Move cursor `id` to the next leaf cell in rowid order.  Returns
    /// `false` when the cursor was already on the last cell (or was never
    /// positioned because the tree is empty).
    pub fn advance(&mut self, id: u64) -> Result<bool, Error> {
        let cursor = self.cursors.get_mut(&id).ok_or(Error::CursorMissing(id))?;
        let Some(pgnum) = cursor.current_page() else {
            // The whole tree was consumed by an earlier call.
            return Ok(false);
        };

        let page = fetch_view(&mut self.pager, self.page_size, self.reserved_space, pgnum)?;
        let page_type = page.page_type()?;
        if page_type != PageType::LeafTable {
            return Err(Error::PageTypeUnexpected {
                pgnum,
                found: page_type.as_byte(),
            });
        }
        let Some(cell) = cursor.current_cell() else {
            // A failed rewind leaves the cursor unpositioned; there is
            // nothing to advance past.
            return Ok(false);
        };

        // The common case: another cell on the same leaf.
        if cell + 1 < page.num_cells() {
            cursor.move_to_cell(&page, cell + 1)?;
            return Ok(true);
        }

        // This leaf is done.  Climb until an interior page still has an
        // unvisited child, then dive back down to a leaf.
        cursor.pop();
        if cursor.is_exhausted() {
            return Ok(false);
        }

        loop {
            let pgnum = cursor
                .current_page()
                .expect("loop never runs with an empty stack");
            let page = fetch_view(&mut self.pager, self.page_size, self.reserved_space, pgnum)?;
            let page_type = page.page_type()?;
            if page_type != PageType::InteriorTable {
                return Err(Error::PageTypeUnexpected {
                    pgnum,
                    found: page_type.as_byte(),
                });
            }
            let cell = cursor
                .current_cell()
                .expect("interior entries on the stack always hold a cell index");
            let num_cells = page.num_cells();

            if cell + 1 < num_cells {
                // The next cell's left child is the next subtree to visit.
                cursor.move_to_cell(&page, cell + 1)?;
                let offset = cursor.position().expect("cursor was just positioned");
                let child = page.interior_table_cell(offset)?.left_child();
                debug!("advancing into left child {} of page {}", child, pgnum);
                cursor.push(child);
                break;
            } else if cell + 1 == num_cells {
                // Every cell's left child has been visited; the right-most
                // subtree remains.  Pop this page before pushing the child
                // so that a later return to this level falls through to the
                // ancestor instead of revisiting it.
                let right = page
                    .right_most_pointer()?
                    .expect("interior pages carry a right-most pointer");
                cursor.pop();
                debug!("advancing into right-most child {} of page {}", right, pgnum);
                cursor.push(right);
                break;
            } else {
                // The right-most subtree was visited too.
                cursor.pop();
                if cursor.is_exhausted() {
                    return Ok(false);
                }
            }
        }

        descend_to_leftmost_leaf(&mut self.pager, self.page_size, self.reserved_space, cursor)
    }

    /// Decode column `column` of the leaf cell under cursor `id`.
    pub fn read_column(&mut self, id: u64, column: usize) -> Result<B::Value, Error> {
        let cursor = self.cursors.get_mut(&id).ok_or(Error::CursorMissing(id))?;
        let pgnum = cursor.current_page().ok_or(Error::NotOnLeaf)?;
        if cursor.current_cell().is_none() {
            return Err(Error::NotOnLeaf);
        }
        let page = fetch_view(&mut self.pager, self.page_size, self.reserved_space, pgnum)?;
        if page.page_type()? != PageType::LeafTable {
            return Err(Error::NotOnLeaf);
        }
        let offset = cursor.position().ok_or(Error::NotOnLeaf)?;
        let payload = page.leaf_table_cell(offset)?.payload()?;
        Ok(record::read_column(payload, column, &self.values)?)
    }
}

fn fetch_view<P: PageSource>(
    pager: &mut P,
    page_size: usize,
    reserved_space: usize,
    pgnum: PageNum,
) -> Result<PageView<'_>, Error> {
    let data = pager.get_page(pgnum)?;
    Ok(PageView::new(pgnum, data, page_size, reserved_space))
}

/// From the page on top of the cursor's stack, follow left-most children
/// down to a leaf and settle on its first cell.  Returns `false` when that
/// leaf turns out to be empty.
fn descend_to_leftmost_leaf<P: PageSource>(
    pager: &mut P,
    page_size: usize,
    reserved_space: usize,
    cursor: &mut Cursor,
) -> Result<bool, Error> {
    loop {
        let pgnum = cursor
            .current_page()
            .expect("descend never starts from an empty stack");
        let page = fetch_view(pager, page_size, reserved_space, pgnum)?;
        match page.page_type()? {
            PageType::LeafTable => {
                if page.num_cells() == 0 {
                    return Ok(false);
                }
                cursor.move_to_cell(&page, 0)?;
                return Ok(true);
            }
            PageType::InteriorTable => {
                if page.num_cells() == 0 {
                    // An interior page with no cells still carries a
                    // right-most child.  Hand over to it the same way a
                    // finished interior page does, popping first so the
                    // climb in `advance` never revisits this page.
                    let right = page
                        .right_most_pointer()?
                        .expect("interior pages carry a right-most pointer");
                    cursor.pop();
                    cursor.push(right);
                    continue;
                }
                cursor.move_to_cell(&page, 0)?;
                let offset = cursor.position().expect("cursor was just positioned");
                let child = page.interior_table_cell(offset)?.left_child();
                debug!("descending from page {} to left-most child {}", pgnum, child);
                cursor.push(child);
            }
            t @ (PageType::InteriorIndex | PageType::LeafIndex) => {
                return Err(Error::PageTypeUnexpected {
                    pgnum,
                    found: t.as_byte(),
                });
            }
        }
    }
}
