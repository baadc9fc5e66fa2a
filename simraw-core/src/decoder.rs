//! Frame envelope decoding
//!
//! Reads the leading size, type tag and timestamp of one datagram. Envelope
//! validation (minimum size, trailing size check) is left to the reader,
//! which decides between resynchronizing and propagating the failure.

use crate::constants::{HEADER_LEN, SIZE_FIELD_LEN, TYPE_TAG_LEN};
use crate::cursor::ByteCursor;
use crate::error::DatagramError;
use crate::types::Envelope;
use std::io::{Read, Seek, SeekFrom};

/// Read one envelope: leading size, type tag and split timestamp
///
/// A short read reports [`DatagramError::EndOfStream`] when the cursor has
/// reached the end of the source, and [`DatagramError::Framing`] otherwise.
/// On a framing error the partially read field is given back so the cursor
/// sits at the start of that field.
pub fn read_envelope<R: Read + Seek>(cursor: &mut ByteCursor<R>) -> Result<Envelope, DatagramError> {
    let declared_size = match read_size(cursor, "datagram size") {
        Ok(size) => size,
        Err(e @ DatagramError::Framing { .. }) => {
            return Err(if cursor.is_at_end()? {
                DatagramError::EndOfStream
            } else {
                e
            });
        }
        Err(e) => return Err(e),
    };

    let mut raw_header = [0u8; HEADER_LEN];
    read_field(cursor, &mut raw_header[..TYPE_TAG_LEN], "datagram type")?;
    read_field(cursor, &mut raw_header[TYPE_TAG_LEN..], "timestamp")?;

    Ok(Envelope::from_parts(declared_size, raw_header))
}

/// Read a little-endian i32 size field
///
/// Used for the trailing size check of a frame and for the leading size of
/// the previous frame while stepping backwards. A short read always yields
/// [`DatagramError::Framing`] with the cursor restored to the field start.
pub fn read_size<R: Read + Seek>(
    cursor: &mut ByteCursor<R>,
    context: &'static str,
) -> Result<i32, DatagramError> {
    let mut buf = [0u8; SIZE_FIELD_LEN];
    let n = cursor.read_into(&mut buf)?;
    if n != SIZE_FIELD_LEN {
        cursor.seek(SeekFrom::Current(-(n as i64)))?;
        return Err(short_read(cursor, context, SIZE_FIELD_LEN, n)?);
    }
    Ok(i32::from_le_bytes(buf))
}

fn read_field<R: Read + Seek>(
    cursor: &mut ByteCursor<R>,
    buf: &mut [u8],
    context: &'static str,
) -> Result<(), DatagramError> {
    let n = cursor.read_into(buf)?;
    if n == buf.len() {
        return Ok(());
    }
    if cursor.is_at_end()? {
        return Err(DatagramError::EndOfStream);
    }
    cursor.seek(SeekFrom::Current(-(n as i64)))?;
    Err(short_read(cursor, context, buf.len(), n)?)
}

fn short_read<R: Read + Seek>(
    cursor: &mut ByteCursor<R>,
    context: &'static str,
    expected: usize,
    actual: usize,
) -> Result<DatagramError, DatagramError> {
    Ok(DatagramError::Framing {
        context,
        expected,
        actual,
        byte_offset: cursor.tell()?,
        datagram_index: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::DatagramBuilder;
    use std::io::Cursor;

    fn cursor(data: Vec<u8>) -> ByteCursor<Cursor<Vec<u8>>> {
        ByteCursor::new(Cursor::new(data))
    }

    #[test]
    fn test_read_envelope() {
        let frame = DatagramBuilder::new(b"NME0")
            .time(10_000_000, 3)
            .payload(b"$GPGGA,1".to_vec())
            .build();
        let mut c = cursor(frame);

        let env = read_envelope(&mut c).unwrap();
        assert_eq!(env.declared_size, 20);
        assert_eq!(env.type_tag.to_string(), "NME0");
        assert_eq!(env.time_low, 10_000_000);
        assert_eq!(env.time_high, 3);
        assert_eq!(&env.raw_header[..4], b"NME0");
        assert_eq!(c.tell().unwrap(), 16);
    }

    #[test]
    fn test_empty_stream_is_end_of_stream() {
        let mut c = cursor(Vec::new());
        assert_eq!(read_envelope(&mut c), Err(DatagramError::EndOfStream));
    }

    #[test]
    fn test_truncated_header_is_end_of_stream() {
        let mut frame = DatagramBuilder::new(b"TAG0").payload(b"x".to_vec()).build();
        frame.truncate(10);
        let mut c = cursor(frame);
        assert_eq!(read_envelope(&mut c), Err(DatagramError::EndOfStream));
    }

    #[test]
    fn test_partial_size_field_is_framing_error() {
        let mut c = cursor(vec![0x10, 0x00]);
        match read_envelope(&mut c) {
            Err(DatagramError::Framing {
                expected, actual, ..
            }) => {
                assert_eq!(expected, 4);
                assert_eq!(actual, 2);
            }
            other => panic!("unexpected result: {:?}", other),
        }
        // Partial field was given back
        assert_eq!(c.tell().unwrap(), 0);
    }

    #[test]
    fn test_read_size_short_read_restores_position() {
        let mut c = cursor(vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(read_size(&mut c, "size").unwrap(), 0x0403_0201);
        assert!(matches!(
            read_size(&mut c, "size"),
            Err(DatagramError::Framing { actual: 2, .. })
        ));
        assert_eq!(c.tell().unwrap(), 4);
    }

    #[test]
    fn test_negative_size_is_returned_unvalidated() {
        let mut data = (-7i32).to_le_bytes().to_vec();
        data.extend_from_slice(b"RAW3");
        data.extend_from_slice(&[0u8; 8]);
        let mut c = cursor(data);
        assert_eq!(read_envelope(&mut c).unwrap().declared_size, -7);
    }
}
