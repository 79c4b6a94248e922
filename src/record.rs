// A leaf cell's payload is a record: a self-describing row.
//
// Layout: [varint header-size][varint type-code]...[column bytes]...
// The header size counts its own varint.  Column k's bytes begin at
// header_size plus the content sizes of all earlier columns.

use crate::serial_type;
use crate::value::ValueBuilder;
use crate::varint;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Varint(#[from] varint::Error),
    #[error(transparent)]
    SerialType(#[from] serial_type::Error),
}

/// Read column `column` of the record in `payload`, lifting the result
/// through `builder`.
///
/// A request for a column at or beyond the record's arity yields the null
/// value rather than an error: rows created before a column was added to a
/// table simply don't store it.
pub fn read_column<B: ValueBuilder>(
    payload: &[u8],
    column: usize,
    builder: &B,
) -> Result<B::Value, Error> {
    let (header_size, n) = varint::decode(payload)?;
    let header_size = header_size as usize;

    let mut hdr_offset = n;
    let mut body_offset = header_size;
    let mut idx = 0;
    while hdr_offset < header_size {
        let (type_code, n) = varint::decode(&payload[hdr_offset..])?;
        hdr_offset += n;
        let size = serial_type::content_size(type_code)?;
        if idx == column {
            let data = payload
                .get(body_offset..body_offset + size)
                .ok_or(serial_type::Error::TruncatedRecord)?;
            return Ok(serial_type::decode(type_code, data, builder)?);
        }
        body_offset += size;
        idx += 1;
    }

    Ok(builder.null())
}
