//! dbheader reads the 100-byte header at the start of a database file.

use byteorder::{BigEndian, ReadBytesExt};
use std::io::{Read, Seek, SeekFrom};

#[derive(thiserror::Error, Debug, Clone)]
pub enum Error {
    #[error("The magic bytes for this file are wrong.")]
    WrongMagic,
    #[error("The page size is not valid for this file format.")]
    UnsupportedPageSize,
    #[error("Only UTF-8 encoded database files are supported.")]
    UnsupportedTextEncoding,
    #[error("Error reading file header.")]
    ReadFailed,
}

const SQLITE3_MAGIC_STRING: &[u8] = &[
    0x53, 0x51, 0x4c, 0x69, 0x74, 0x65, 0x20, 0x66, 0x6f, 0x72, 0x6d, 0x61, 0x74, 0x20, 0x33, 0x00,
];

/// The fields of the database file header that the pager and the CLI need.
#[derive(Debug, Clone)]
pub struct DbHeader {
    pub page_size: u32,
    pub reserved_space: u8,
    pub change_counter: u32,
    pub num_pages: u32,
    pub text_encoding: u32,
}

pub fn read_header<R: Read + Seek>(f: &mut R) -> Result<DbHeader, Error> {
    f.seek(SeekFrom::Start(0)).map_err(|_| Error::ReadFailed)?;

    // Offset	Size	Description
    // 0        16	    The header string: "SQLite format 3\000"
    let mut magic = [0_u8; 16];
    f.read_exact(&mut magic).map_err(|_| Error::ReadFailed)?;
    if magic != SQLITE3_MAGIC_STRING {
        return Err(Error::WrongMagic);
    }

    // 16	    2	    The database page size in bytes.  Must be a power of
    //                  two between 512 and 32768, or 1 meaning 65536.
    let page_size: u32 = match f.read_u16::<BigEndian>().map_err(|_| Error::ReadFailed)? {
        1 => 65536,
        x if (512..=32768).contains(&x) && x.is_power_of_two() => x as u32,
        _ => return Err(Error::UnsupportedPageSize),
    };

    // 18	    1	    File format write version.
    // 19	    1	    File format read version.
    let _write_version = f.read_u8().map_err(|_| Error::ReadFailed)?;
    let _read_version = f.read_u8().map_err(|_| Error::ReadFailed)?;

    // 20	    1	    Bytes of unused "reserved" space at the end of each page.
    let reserved_space = f.read_u8().map_err(|_| Error::ReadFailed)?;

    // 21..24 are the payload fractions, fixed by the format.
    let mut fractions = [0_u8; 3];
    f.read_exact(&mut fractions).map_err(|_| Error::ReadFailed)?;

    // 24	    4	    File change counter.
    // 28	    4	    Size of the database file in pages.
    let change_counter = f.read_u32::<BigEndian>().map_err(|_| Error::ReadFailed)?;
    let num_pages = f.read_u32::<BigEndian>().map_err(|_| Error::ReadFailed)?;

    // 32..56 cover the freelist and schema bookkeeping, which a read-only
    // scan does not consult.
    f.seek(SeekFrom::Start(56)).map_err(|_| Error::ReadFailed)?;

    // 56	    4	    The database text encoding.  1 means UTF-8.
    let text_encoding = f.read_u32::<BigEndian>().map_err(|_| Error::ReadFailed)?;
    if text_encoding != 1 {
        return Err(Error::UnsupportedTextEncoding);
    }

    f.seek(SeekFrom::Start(0)).map_err(|_| Error::ReadFailed)?;
    Ok(DbHeader {
        page_size,
        reserved_space,
        change_counter,
        num_pages,
        text_encoding,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::ByteOrder;
    use std::io::Cursor;

    fn header_bytes(page_size: u16, num_pages: u32) -> Vec<u8> {
        let mut h = vec![0_u8; 100];
        h[..16].copy_from_slice(SQLITE3_MAGIC_STRING);
        BigEndian::write_u16(&mut h[16..18], page_size);
        h[18] = 1;
        h[19] = 1;
        h[21] = 64;
        h[22] = 32;
        h[23] = 32;
        BigEndian::write_u32(&mut h[28..32], num_pages);
        BigEndian::write_u32(&mut h[56..60], 1); // UTF-8
        h
    }

    #[test]
    fn test_read_header() {
        let mut c = Cursor::new(header_bytes(4096, 7));
        let h = read_header(&mut c).expect("should have parsed header");
        assert_eq!(h.page_size, 4096);
        assert_eq!(h.num_pages, 7);
        assert_eq!(h.reserved_space, 0);
        assert_eq!(h.text_encoding, 1);
    }

    #[test]
    fn test_page_size_of_one_means_64k() {
        let mut c = Cursor::new(header_bytes(1, 1));
        let h = read_header(&mut c).expect("should have parsed header");
        assert_eq!(h.page_size, 65536);
    }

    #[test]
    fn test_rejects_bad_magic() {
        let mut bytes = header_bytes(4096, 1);
        bytes[0] = b'X';
        let mut c = Cursor::new(bytes);
        assert!(matches!(read_header(&mut c), Err(Error::WrongMagic)));
    }

    #[test]
    fn test_rejects_bad_page_size() {
        let mut c = Cursor::new(header_bytes(1000, 1));
        assert!(matches!(
            read_header(&mut c),
            Err(Error::UnsupportedPageSize)
        ));
    }
}
