//! Serial types are how the file format stores values inside records.
//!
//! Each column in a record header carries a type code that encodes both the
//! column's type and, for variable-width types, its byte length.

use crate::value::ValueBuilder;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Record header contained the undocumented type code {0}.")]
    UnknownTypeCode(u64),
    #[error("BLOB columns (type code {0}) cannot be produced by the value constructor.")]
    BlobUnsupported(u64),
    #[error("Bytes were not a valid string encoding.")]
    InvalidStringEncoding(#[from] std::string::FromUtf8Error),
    #[error("Column data ran off the end of the record.")]
    TruncatedRecord,
}

/// Number of bytes of record body occupied by a column with this type code.
///
/// BLOB codes are sized even though their values cannot be read (the size
/// is needed to locate every column that follows one).
///
/// Type code | Meaning                    | Content bytes
/// --------- | -------------------------- | -------------
/// 0         | NULL                       | 0
/// 1..6      | signed big-endian integer  | 1, 2, 3, 4, 6, 8
/// 8         | the integer 0              | 0
/// 9         | the integer 1              | 0
/// N≥12 even | BLOB                       | (N-12)/2
/// N≥13 odd  | text                       | (N-13)/2
pub fn content_size(type_code: u64) -> Result<usize, Error> {
    match type_code {
        0 | 8 | 9 => Ok(0),
        1 => Ok(1),
        2 => Ok(2),
        3 => Ok(3),
        4 => Ok(4),
        5 => Ok(6),
        6 => Ok(8),
        x @ 12.. => {
            if x % 2 == 0 {
                Ok((x as usize - 12) / 2)
            } else {
                Ok((x as usize - 13) / 2)
            }
        }
        // 7 is the float code and 10/11 are reserved; none of them are in
        // the subset this engine covers.
        x => Err(Error::UnknownTypeCode(x)),
    }
}

/// Interpret `data` (exactly `content_size(type_code)` bytes of record body)
/// as the value the type code describes, lifted through `builder`.
pub fn decode<B: ValueBuilder>(
    type_code: u64,
    data: &[u8],
    builder: &B,
) -> Result<B::Value, Error> {
    match type_code {
        0 => Ok(builder.null()),
        1..=6 => Ok(builder.integer(read_twos_complement(data))),
        8 => Ok(builder.integer(0)),
        9 => Ok(builder.integer(1)),
        x @ 12.. => {
            if x % 2 == 0 {
                Err(Error::BlobUnsupported(x))
            } else {
                let s = String::from_utf8(data.to_vec())?;
                Ok(builder.text(s))
            }
        }
        x => Err(Error::UnknownTypeCode(x)),
    }
}

// Widens 1 to 8 big-endian bytes to an i64, extending the sign bit on the
// left.  The format stores all integer widths as two's complement.
fn read_twos_complement(data: &[u8]) -> i64 {
    let mut buf = if data[0] & 0x80 != 0 {
        [0xff_u8; 8]
    } else {
        [0_u8; 8]
    };
    buf[8 - data.len()..].copy_from_slice(data);
    i64::from_be_bytes(buf)
}
