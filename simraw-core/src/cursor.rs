//! Buffered, seekable byte cursor over a datagram source

use crate::error::DatagramError;
use std::io::{BufReader, ErrorKind, Read, Seek, SeekFrom};

/// Byte-granular cursor owning the underlying source and its read buffer
///
/// Reads never fail because the stream ended: a short result tells the caller
/// that fewer bytes were available than requested.
#[derive(Debug)]
pub struct ByteCursor<R> {
    inner: BufReader<R>,
}

impl<R: Read + Seek> ByteCursor<R> {
    /// Wrap a source with the default buffer capacity
    pub fn new(source: R) -> Self {
        Self {
            inner: BufReader::new(source),
        }
    }

    /// Wrap a source with an explicit buffer capacity
    pub fn with_capacity(capacity: usize, source: R) -> Self {
        Self {
            inner: BufReader::with_capacity(capacity.max(1), source),
        }
    }

    /// Fill `buf` as far as the stream allows, returning the number of bytes read
    pub fn read_into(&mut self, buf: &mut [u8]) -> Result<usize, DatagramError> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(filled)
    }

    /// Read up to `n` bytes; the result is shorter only near the end of the stream
    pub fn read_up_to(&mut self, n: usize) -> Result<Vec<u8>, DatagramError> {
        // Grow with the data instead of trusting `n`, which may come from a corrupt size field
        let mut buf = Vec::new();
        (&mut self.inner).take(n as u64).read_to_end(&mut buf)?;
        Ok(buf)
    }

    /// Seek within the source, returning the new byte offset
    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64, DatagramError> {
        match pos {
            SeekFrom::Current(delta) => {
                // Keeps the buffer when the target is already buffered
                self.inner.seek_relative(delta)?;
                self.tell()
            }
            other => Ok(self.inner.seek(other)?),
        }
    }

    /// Current byte offset
    pub fn tell(&mut self) -> Result<u64, DatagramError> {
        Ok(self.inner.stream_position()?)
    }

    /// Bytes between the current position and the end of the source
    pub fn bytes_remaining(&mut self) -> Result<u64, DatagramError> {
        let pos = self.tell()?;
        let end = self.inner.seek(SeekFrom::End(0))?;
        self.inner.seek(SeekFrom::Start(pos))?;
        Ok(end.saturating_sub(pos))
    }

    /// Whether the cursor sits at (or beyond) the end of the source
    pub fn is_at_end(&mut self) -> Result<bool, DatagramError> {
        Ok(self.bytes_remaining()? == 0)
    }

    /// Release the underlying source, discarding buffered bytes
    pub fn into_inner(self) -> R {
        self.inner.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn cursor(data: &[u8]) -> ByteCursor<Cursor<Vec<u8>>> {
        ByteCursor::with_capacity(4, Cursor::new(data.to_vec()))
    }

    #[test]
    fn test_short_read_is_not_an_error() {
        let mut c = cursor(b"abcdef");
        assert_eq!(c.read_up_to(4).unwrap(), b"abcd");
        assert_eq!(c.read_up_to(4).unwrap(), b"ef");
        assert!(c.read_up_to(4).unwrap().is_empty());
    }

    #[test]
    fn test_read_into_spans_buffer_refills() {
        let mut c = cursor(b"0123456789");
        let mut buf = [0u8; 9];
        assert_eq!(c.read_into(&mut buf).unwrap(), 9);
        assert_eq!(&buf, b"012345678");
        assert_eq!(c.tell().unwrap(), 9);
    }

    #[test]
    fn test_remaining_does_not_move_cursor() {
        let mut c = cursor(b"0123456789");
        c.seek(SeekFrom::Start(3)).unwrap();
        assert_eq!(c.bytes_remaining().unwrap(), 7);
        assert_eq!(c.tell().unwrap(), 3);
        assert!(!c.is_at_end().unwrap());

        c.seek(SeekFrom::End(0)).unwrap();
        assert!(c.is_at_end().unwrap());
    }

    #[test]
    fn test_relative_seek_inside_buffer() {
        let mut c = cursor(b"0123456789");
        c.read_up_to(2).unwrap();
        assert_eq!(c.seek(SeekFrom::Current(-1)).unwrap(), 1);
        assert_eq!(c.read_up_to(2).unwrap(), b"12");
        assert_eq!(c.seek(SeekFrom::Current(5)).unwrap(), 8);
    }

    #[test]
    fn test_seek_past_end_reports_no_remaining() {
        let mut c = cursor(b"0123");
        c.seek(SeekFrom::Start(10)).unwrap();
        assert_eq!(c.bytes_remaining().unwrap(), 0);
        assert!(c.read_up_to(4).unwrap().is_empty());
    }
}
