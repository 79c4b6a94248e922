//! cell interprets raw cell bytes.
//!
//! Cell formats, from the file-format documentation:
//!
//! Table btree leaf cell (page type 0x0d):
//!   A varint which is the total number of bytes of payload.
//!   A varint which is the integer key, a.k.a. "rowid".
//!   The payload.
//!   (A 4-byte overflow page number follows when the payload spills; such
//!   cells are rejected before they reach this module.)
//!
//! Table btree interior cell (page type 0x05):
//!   A 4-byte big-endian page number which is the left child pointer.
//!   A varint which is the integer key.

use byteorder::{BigEndian, ByteOrder};

use super::{Error, RowId};
use crate::pager::PageNum;
use crate::varint;

/// An interior table cell, sliced to exactly its own bytes.
pub struct InteriorTableCell<'a> {
    data: &'a [u8],
}

impl<'a> InteriorTableCell<'a> {
    pub(super) fn new(data: &'a [u8]) -> Self {
        InteriorTableCell { data }
    }

    /// Page number of the child subtree holding rowids less than or equal
    /// to this cell's key.
    pub fn left_child(&self) -> PageNum {
        BigEndian::read_u32(&self.data[..4]) as PageNum
    }

    pub fn key(&self) -> Result<RowId, Error> {
        let (key, _) = varint::decode(&self.data[4..])?;
        Ok(key as RowId)
    }
}

/// A leaf table cell, sliced to exactly its own bytes.
pub struct LeafTableCell<'a> {
    data: &'a [u8],
}

impl<'a> LeafTableCell<'a> {
    pub(super) fn new(data: &'a [u8]) -> Self {
        LeafTableCell { data }
    }

    pub fn rowid(&self) -> Result<RowId, Error> {
        let (_, n1) = varint::decode(self.data)?;
        let (rowid, _) = varint::decode(&self.data[n1..])?;
        Ok(rowid as RowId)
    }

    /// The record bytes, past the payload-size and rowid varints.
    pub fn payload(&self) -> Result<&'a [u8], Error> {
        let (_, n1) = varint::decode(self.data)?;
        let (_, n2) = varint::decode(&self.data[n1..])?;
        Ok(&self.data[n1 + n2..])
    }
}
