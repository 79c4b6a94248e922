//! Test support: an in-memory page provider and builders for synthetic
//! pages and whole database files.

use std::collections::HashMap;

use byteorder::{BigEndian, ByteOrder};

use sqlvm::pager::{Error as PagerError, PageNum, PageSource};
use sqlvm::varint;

pub const PAGE_SIZE: usize = 4096;

/// An in-memory page provider.  The map holds fully-built pages; anything
/// not present reads as *no-such-page*.
pub struct MemPager {
    pages: HashMap<PageNum, Vec<u8>>,
}

impl MemPager {
    pub fn new(pages: Vec<(PageNum, Vec<u8>)>) -> Self {
        for (pgnum, page) in &pages {
            assert_eq!(page.len(), PAGE_SIZE, "page {} has the wrong size", pgnum);
        }
        MemPager {
            pages: pages.into_iter().collect(),
        }
    }
}

impl PageSource for MemPager {
    fn page_size(&self) -> usize {
        PAGE_SIZE
    }

    fn reserved_space(&self) -> usize {
        0
    }

    fn get_page(&mut self, pgnum: PageNum) -> Result<&[u8], PagerError> {
        self.pages
            .get(&pgnum)
            .map(|v| v.as_slice())
            .ok_or(PagerError::NoSuchPage(pgnum))
    }

    fn close(&mut self) -> Result<(), PagerError> {
        Ok(())
    }
}

/// Column values for building records.
#[derive(Debug, Clone)]
pub enum Col<'a> {
    Null,
    Int(i64),
    Zero,
    One,
    Text(&'a str),
}

fn int_serial(value: i64) -> (u64, Vec<u8>) {
    let (code, size) = if (i8::MIN as i64..=i8::MAX as i64).contains(&value) {
        (1, 1)
    } else if (i16::MIN as i64..=i16::MAX as i64).contains(&value) {
        (2, 2)
    } else if (-(1 << 23)..(1 << 23)).contains(&value) {
        (3, 3)
    } else if (i32::MIN as i64..=i32::MAX as i64).contains(&value) {
        (4, 4)
    } else if (-(1 << 47)..(1 << 47)).contains(&value) {
        (5, 6)
    } else {
        (6, 8)
    };
    (code, value.to_be_bytes()[8 - size..].to_vec())
}

/// Serialize one record: header of type-code varints, then column bytes.
pub fn record(cols: &[Col]) -> Vec<u8> {
    let mut codes: Vec<u64> = vec![];
    let mut body: Vec<u8> = vec![];
    for col in cols {
        match col {
            Col::Null => codes.push(0),
            Col::Zero => codes.push(8),
            Col::One => codes.push(9),
            Col::Int(v) => {
                let (code, bytes) = int_serial(*v);
                codes.push(code);
                body.extend(bytes);
            }
            Col::Text(s) => {
                codes.push(13 + 2 * s.len() as u64);
                body.extend(s.as_bytes());
            }
        }
    }

    let codes_len: usize = codes.iter().map(|c| varint::encode(*c).len()).sum();
    // The header size varint counts itself; its own width can grow the total.
    let mut header_size = codes_len + 1;
    while varint::encode(header_size as u64).len() + codes_len != header_size {
        header_size = varint::encode(header_size as u64).len() + codes_len;
    }

    let mut out = varint::encode(header_size as u64);
    for code in codes {
        out.extend(varint::encode(code));
    }
    out.extend(body);
    out
}

// Lays out a btree page: header at `base`, cell pointer array right after
// it, cell bodies packed against the end of the page in descending offset
// order (cell 0 last-placed, highest offset).
fn build_page(base: usize, header: &[u8], cells: &[Vec<u8>]) -> Vec<u8> {
    let mut page = vec![0_u8; PAGE_SIZE];
    page[base..base + header.len()].copy_from_slice(header);
    BigEndian::write_u16(&mut page[base + 3..], cells.len() as u16);

    let mut content = PAGE_SIZE;
    for (i, cell) in cells.iter().enumerate() {
        content -= cell.len();
        page[content..content + cell.len()].copy_from_slice(cell);
        BigEndian::write_u16(&mut page[base + header.len() + 2 * i..], content as u16);
    }
    // Cell content start.
    BigEndian::write_u16(&mut page[base + 5..], content as u16);
    page
}

fn leaf_cells(rows: &[(u64, Vec<u8>)]) -> Vec<Vec<u8>> {
    rows.iter()
        .map(|(rowid, payload)| {
            let mut cell = varint::encode(payload.len() as u64);
            cell.extend(varint::encode(*rowid));
            cell.extend(payload);
            cell
        })
        .collect()
}

/// A leaf table page holding `rows` of `(rowid, record)`.
pub fn leaf_table_page(rows: &[(u64, Vec<u8>)]) -> Vec<u8> {
    build_page(0, &[0x0d, 0, 0, 0, 0, 0, 0, 0], &leaf_cells(rows))
}

/// An interior table page with `cells` of `(left_child, key)` and a
/// right-most pointer.
pub fn interior_table_page(cells: &[(u32, u64)], right_most: u32) -> Vec<u8> {
    let mut header = vec![0x05, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
    BigEndian::write_u32(&mut header[8..], right_most);
    let cells: Vec<Vec<u8>> = cells
        .iter()
        .map(|(child, key)| {
            let mut cell = vec![0_u8; 4];
            BigEndian::write_u32(&mut cell, *child);
            cell.extend(varint::encode(*key));
            cell
        })
        .collect();
    build_page(0, &header, &cells)
}

/// Page 1: the 100-byte database file header followed by the schema
/// table's leaf btree (header at byte offset 100).
pub fn first_page(num_pages: u32, schema_rows: &[(u64, Vec<u8>)]) -> Vec<u8> {
    let mut page = build_page(100, &[0x0d, 0, 0, 0, 0, 0, 0, 0], &leaf_cells(schema_rows));

    let magic = b"SQLite format 3\0";
    page[..16].copy_from_slice(magic);
    BigEndian::write_u16(&mut page[16..18], PAGE_SIZE as u16);
    page[18] = 1; // file write version
    page[19] = 1; // file read version
    page[21] = 64;
    page[22] = 32;
    page[23] = 32;
    BigEndian::write_u32(&mut page[28..32], num_pages);
    BigEndian::write_u32(&mut page[56..60], 1); // UTF-8
    page
}

/// The schema-table record for one user table.
pub fn schema_record(name: &str, root_page: i64, sql: &str) -> Vec<u8> {
    record(&[
        Col::Text("table"),
        Col::Text(name),
        Col::Text(name),
        Col::Int(root_page),
        Col::Text(sql),
    ])
}

/// Write `pages` out as a database file under the OS temp directory and
/// return its path.
pub fn write_db_file(name: &str, pages: &[Vec<u8>]) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(format!("sqlvm-test-{}-{}.db", std::process::id(), name));
    let bytes: Vec<u8> = pages.iter().flatten().copied().collect();
    std::fs::write(&path, bytes).expect("should have written test database file");
    path
}
