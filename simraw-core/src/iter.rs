//! Forward iteration over datagrams

use crate::error::DatagramError;
use crate::reader::DatagramReader;
use crate::types::Record;
use crate::Result;
use std::io::{Read, Seek};
use std::iter::FusedIterator;

/// Lazy iterator returned by [`DatagramReader::iterate`]
///
/// Ends quietly at the end of the stream. Any other error is yielded once and
/// ends the iteration.
#[derive(Debug)]
pub struct Datagrams<'a, R> {
    reader: &'a mut DatagramReader<R>,
    done: bool,
}

impl<'a, R: Read + Seek> Datagrams<'a, R> {
    pub(crate) fn new(reader: &'a mut DatagramReader<R>) -> Self {
        Self {
            reader,
            done: false,
        }
    }
}

impl<R: Read + Seek> Iterator for Datagrams<'_, R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.read_next() {
            Ok(record) => Some(Ok(record)),
            Err(DatagramError::EndOfStream) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl<R: Read + Seek> FusedIterator for Datagrams<'_, R> {}

#[cfg(test)]
mod tests {
    use crate::config::ReaderConfig;
    use crate::error::DatagramError;
    use crate::reader::DatagramReader;
    use crate::test_utils::{stream_of, DatagramBuilder};
    use std::io::Cursor;

    fn tag(text: &str) -> Vec<u8> {
        DatagramBuilder::new(b"TAG0").payload(text.as_bytes().to_vec()).build()
    }

    #[test]
    fn test_iterates_to_end() {
        let data = stream_of(&[tag("first"), tag("second"), tag("third")]);
        let mut reader = DatagramReader::new(Cursor::new(data), ReaderConfig::default());

        let records: Vec<_> = reader.iterate().collect::<Result<_, _>>().unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(reader.tell(), 3);
    }

    #[test]
    fn test_error_is_yielded_once() {
        let mut data = stream_of(&[tag("first"), tag("second")]);
        data.truncate(data.len() - 1);
        let mut reader = DatagramReader::new(Cursor::new(data), ReaderConfig::default());

        let mut iter = reader.iterate();
        assert!(iter.next().unwrap().is_ok());
        assert!(matches!(iter.next(), Some(Err(DatagramError::Framing { .. }))));
        assert!(iter.next().is_none());
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_for_loop_over_reader() {
        let data = stream_of(&[tag("first"), tag("second")]);
        let mut reader = DatagramReader::new(Cursor::new(data), ReaderConfig::default());

        let mut seen = 0;
        for record in &mut reader {
            assert_eq!(record.unwrap().type_tag().to_string(), "TAG0");
            seen += 1;
        }
        assert_eq!(seen, 2);
    }
}
