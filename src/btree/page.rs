//! page gives typed access to a single btree page.
//!
//! A btree page is divided into regions in the following order
//! 1. The 100-byte database file header (page 1 only)
//! 2. The 8 or 12 byte btree page header
//! 3. The cell pointer array
//! 4. Unallocated space
//! 5. The cell content area
//! 6. The reserved region
//!
//! Btree header layout (offset 0, or 100 on page 1):
//!
//! Offset	Size	Description
//! 0	    1	    Page type flag.
//! 1	    2	    Start of the first freeblock, or zero.
//! 3	    2	    Number of cells on the page.
//! 5	    2	    Start of the cell content area.
//! 7	    1	    Number of fragmented free bytes.
//! 8	    4	    Right-most child pointer (interior pages only).

use byteorder::{BigEndian, ByteOrder};

use super::cell::{InteriorTableCell, LeafTableCell};
use super::{Error, PageType};
use crate::pager::PageNum;
use crate::varint;

/// A read-only view over the raw bytes of one page.
///
/// Cell pointers in the file are already absolute offsets within the page,
/// so only the header reads shift by 100 on page 1.
pub struct PageView<'a> {
    pgnum: PageNum,
    data: &'a [u8],
    page_size: usize,
    reserved_space: usize,
}

impl<'a> PageView<'a> {
    pub fn new(pgnum: PageNum, data: &'a [u8], page_size: usize, reserved_space: usize) -> Self {
        PageView {
            pgnum,
            data,
            page_size,
            reserved_space,
        }
    }

    pub fn pgnum(&self) -> PageNum {
        self.pgnum
    }

    // The first page carries the database file header, which is not btree
    // content but which cell pointers do count.
    fn header_base(&self) -> usize {
        match self.pgnum {
            1 => 100,
            _ => 0,
        }
    }

    pub fn page_type(&self) -> Result<PageType, Error> {
        let b = self.data[self.header_base()];
        PageType::from_byte(b).ok_or(Error::PageTypeUnexpected {
            pgnum: self.pgnum,
            found: b,
        })
    }

    pub fn num_cells(&self) -> usize {
        BigEndian::read_u16(&self.data[self.header_base() + 3..]) as usize
    }

    /// The right-most child pointer.  Yields no value for leaf pages.
    pub fn right_most_pointer(&self) -> Result<Option<PageNum>, Error> {
        match self.page_type()? {
            PageType::InteriorIndex | PageType::InteriorTable => Ok(Some(
                BigEndian::read_u32(&self.data[self.header_base() + 8..]) as PageNum,
            )),
            PageType::LeafIndex | PageType::LeafTable => Ok(None),
        }
    }

    /// Absolute byte offset within the page of cell `i`.
    ///
    /// The cell pointer array immediately follows the btree header: a dense
    /// run of `num_cells` 2-byte offsets, cell 0 first.
    pub fn cell_pointer(&self, i: usize) -> Result<usize, Error> {
        let num_cells = self.num_cells();
        if i >= num_cells {
            return Err(Error::CellIndexOutOfRange {
                pgnum: self.pgnum,
                cell: i,
                num_cells,
            });
        }
        let array_start = self.header_base() + self.page_type()?.header_len();
        Ok(BigEndian::read_u16(&self.data[array_start + 2 * i..]) as usize)
    }

    /// The interior table cell starting at `offset`: 4 bytes of left child
    /// page number followed by the rowid varint.
    pub fn interior_table_cell(&self, offset: usize) -> Result<InteriorTableCell<'a>, Error> {
        self.require_type(PageType::InteriorTable)?;
        let (_, rowid_len) = varint::decode(&self.data[offset + 4..])?;
        Ok(InteriorTableCell::new(&self.data[offset..offset + 4 + rowid_len]))
    }

    /// The leaf table cell starting at `offset`: payload-size varint, rowid
    /// varint, then `payload-size` bytes of record.
    ///
    /// The cell length is derived from the two varints; a cell whose end
    /// would land in the reserved tail must have spilled to an overflow
    /// page, which is not supported.
    pub fn leaf_table_cell(&self, offset: usize) -> Result<LeafTableCell<'a>, Error> {
        self.require_type(PageType::LeafTable)?;
        let (payload_size, n1) = varint::decode(&self.data[offset..])?;
        let (_, n2) = varint::decode(&self.data[offset + n1..])?;
        let end = offset + n1 + n2 + payload_size as usize;
        if end > self.page_size - self.reserved_space {
            return Err(Error::OverflowUnsupported { pgnum: self.pgnum });
        }
        Ok(LeafTableCell::new(&self.data[offset..end]))
    }

    fn require_type(&self, want: PageType) -> Result<(), Error> {
        let got = self.page_type()?;
        if got != want {
            return Err(Error::PageTypeUnexpected {
                pgnum: self.pgnum,
                found: self.data[self.header_base()],
            });
        }
        Ok(())
    }
}
