//! Datagram-level reader
//!
//! [`DatagramReader`] walks a RAW file one datagram at a time. It keeps two
//! coordinates: the byte offset of the underlying cursor and a logical
//! datagram index. The index is only ever moved by whole-datagram steps, so it
//! cannot be recomputed from the byte offset without rescanning the file.
//!
//! Envelope corruption (a declared size below 16 bytes, a truncated payload or
//! a trailing size that disagrees with the leading one) is handled by scanning
//! forward for the next recognizable type tag and retrying. Only a short read
//! of the trailing size field itself is reported, because no recovery applies
//! once the frame length cannot be confirmed.

use crate::config::ReaderConfig;
use crate::constants::{ENVELOPE_LEN, HEADER_LEN, MIN_DECLARED_SIZE, SIZE_FIELD_LEN};
use crate::cursor::ByteCursor;
use crate::decoder::{read_envelope, read_size};
use crate::dispatch::{channel_field_len, decode_channel, DispatchTable};
use crate::error::DatagramError;
use crate::iter::Datagrams;
use crate::scanner::{find_next_frame, LocatedDatagram};
use crate::types::{DatagramHeader, Envelope, RawFrame, Record, StreamPosition};
use crate::Result;
use bytes::{BufMut, BytesMut};
use serde::Serialize;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

#[cfg(feature = "logging")]
use tracing::{debug, warn};

/// Counters accumulated over the lifetime of a reader
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReaderStats {
    /// Datagrams returned by forward reads
    pub datagrams_read: u64,

    /// Datagrams stepped over without decoding
    pub datagrams_skipped: u64,

    /// Resynchronizations performed
    pub resyncs: u64,

    /// Bytes passed over while resynchronizing
    pub bytes_skipped: u64,
}

/// Reads datagrams from a seekable byte source
pub struct DatagramReader<R> {
    cursor: ByteCursor<R>,
    position: StreamPosition,
    total_count: Option<u64>,
    config: ReaderConfig,
    dispatch: DispatchTable,
    stats: ReaderStats,
}

impl DatagramReader<File> {
    /// Open a RAW file read-only; the file is closed when the reader is dropped
    pub fn open<P: AsRef<Path>>(path: P, config: ReaderConfig) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| DatagramError::Io(format!("{}: {}", path.display(), e)))?;

        #[cfg(feature = "logging")]
        debug!("Opened {} (raw_mode: {})", path.display(), config.raw_mode);

        Ok(Self::new(file, config))
    }
}

impl<R: Read + Seek> DatagramReader<R> {
    /// Wrap any seekable source with the built-in dispatch table
    ///
    /// Pass `&mut File` (or `&File`) to keep ownership of a handle that must
    /// outlive the reader.
    pub fn new(source: R, config: ReaderConfig) -> Self {
        Self::with_dispatch(source, config, DispatchTable::default())
    }

    /// Wrap a source with a custom dispatch table
    pub fn with_dispatch(source: R, config: ReaderConfig, dispatch: DispatchTable) -> Self {
        Self {
            cursor: ByteCursor::with_capacity(config.buffer_size, source),
            position: StreamPosition::default(),
            total_count: None,
            config,
            dispatch,
            stats: ReaderStats::default(),
        }
    }

    /// Mutable access to the dispatch table, e.g. to register decoders
    pub fn dispatch_mut(&mut self) -> &mut DispatchTable {
        &mut self.dispatch
    }

    /// Counters accumulated so far
    pub fn stats(&self) -> ReaderStats {
        self.stats
    }

    /// Current position in bytes and datagrams
    pub fn position(&self) -> StreamPosition {
        self.position
    }

    /// Current logical datagram index
    pub fn tell(&self) -> u64 {
        self.position.datagram_index
    }

    /// Current byte offset
    pub fn byte_offset(&self) -> u64 {
        self.position.byte_offset
    }

    /// Cached datagram count, if it has been computed
    pub fn cached_total_count(&self) -> Option<u64> {
        self.total_count
    }

    /// Release the underlying source
    pub fn into_inner(self) -> R {
        self.cursor.into_inner()
    }

    /// Read the next datagram
    ///
    /// Corrupted frames are skipped by resynchronizing. Returns
    /// [`DatagramError::EndOfStream`] once no further datagram can be read.
    pub fn read_next(&mut self) -> Result<Record> {
        let result = self.read_record(None);
        self.settle(result)
    }

    /// Read the next datagram whose header was already consumed by
    /// [`get_header`](Self::get_header)
    pub fn read_next_with_header(&mut self, header: &DatagramHeader) -> Result<Record> {
        let result = self.read_record(Some(header.envelope));
        self.settle(result)
    }

    /// Read the next frame and report where it was found
    pub fn read_located(&mut self) -> Result<(LocatedDatagram, Record)> {
        let result = self.read_frame(None).map(|(located, frame)| {
            let record = self.to_record(&located, frame);
            (located, record)
        });
        self.settle(result)
    }

    /// Peek at the header of the next datagram
    ///
    /// For sample datagrams the channel is read as well. With
    /// `consume_payload_prefix == false` the cursor returns to where it was;
    /// otherwise it is left at the first payload byte, ready for
    /// [`read_next_with_header`](Self::read_next_with_header) or
    /// [`skip_with_header`](Self::skip_with_header). The datagram index never
    /// changes.
    pub fn peek(&mut self, consume_payload_prefix: bool) -> Result<DatagramHeader> {
        let result = self.peek_header(consume_payload_prefix);
        self.settle(result)
    }

    /// Peek at the next header and leave the cursor at its payload
    pub fn get_header(&mut self) -> Result<DatagramHeader> {
        self.peek(true)
    }

    /// Step over the next datagram without decoding it
    pub fn skip(&mut self) -> Result<()> {
        let result = self.skip_frame(None).map(|_| ());
        self.settle(result)
    }

    /// Step over a datagram whose header was already consumed by
    /// [`get_header`](Self::get_header)
    pub fn skip_with_header(&mut self, header: &DatagramHeader) -> Result<()> {
        let result = self.skip_frame(Some(header.envelope)).map(|_| ());
        self.settle(result)
    }

    /// Step over the next datagram and report where it was found
    pub fn skip_located(&mut self) -> Result<LocatedDatagram> {
        let result = self.skip_frame(None);
        self.settle(result)
    }

    /// Step over a datagram whose header was already consumed and report the
    /// frame actually stepped over
    ///
    /// If the peeked frame fails validation, the returned offset belongs to
    /// the frame found by resynchronizing, not to the peeked header.
    pub fn skip_located_with_header(
        &mut self,
        header: &DatagramHeader,
    ) -> Result<LocatedDatagram> {
        let result = self.skip_frame(Some(header.envelope));
        self.settle(result)
    }

    /// Step back over the datagram behind the cursor
    ///
    /// Best effort: the four bytes before the cursor must be the trailing
    /// size of the previous frame, which only holds when the cursor sits on a
    /// frame boundary. There is no recovery scan in this direction. On failure
    /// the cursor is left where it was.
    pub fn skip_back(&mut self) -> Result<()> {
        let result = self.step_back();
        self.settle(result)
    }

    /// Read the datagram behind the cursor and step back before it again
    pub fn read_prev(&mut self) -> Result<Record> {
        self.skip_back()?;
        let record = self.read_next()?;
        self.skip_back()?;
        Ok(record)
    }

    /// Read up to `k` datagrams, stopping quietly at the first error
    pub fn read_many(&mut self, k: usize) -> Vec<Record> {
        let mut records = Vec::with_capacity(k.min(1024));
        for _ in 0..k {
            match self.read_next() {
                Ok(record) => records.push(record),
                Err(_) => break,
            }
        }
        records
    }

    /// Read every datagram from the start of the file
    pub fn read_all(&mut self) -> Result<Vec<Record>> {
        self.datagram_seek(SeekFrom::Start(0))?;
        self.iterate().collect()
    }

    /// Lazy, forward-only iterator over the remaining datagrams
    pub fn iterate(&mut self) -> Datagrams<'_, R> {
        Datagrams::new(self)
    }

    /// Seek by datagrams rather than bytes, returning the new datagram index
    ///
    /// Every unit of offset is one [`skip`](Self::skip) or
    /// [`skip_back`](Self::skip_back). Seeking from the end counts the
    /// datagrams in the file first; the count is cached until [`reset`](Self::reset).
    pub fn datagram_seek(&mut self, pos: SeekFrom) -> Result<u64> {
        let offset = match pos {
            SeekFrom::Start(n) => {
                let n = i64::try_from(n).map_err(|_| {
                    DatagramError::InvalidSeek(format!("offset {} is out of range", n))
                })?;
                self.cursor.seek(SeekFrom::Start(0))?;
                self.position = StreamPosition::default();
                n
            }
            SeekFrom::End(n) => {
                if n > 0 {
                    return Err(DatagramError::InvalidSeek(
                        "use non-positive offsets when seeking from the end".into(),
                    ));
                }
                let total = self.total_count()?;
                let end = self.cursor.seek(SeekFrom::End(0))?;
                self.position = StreamPosition::new(end, total);
                n
            }
            SeekFrom::Current(n) => n,
        };

        #[cfg(feature = "logging")]
        debug!("Datagram seek {:?} from index {}", pos, self.position.datagram_index);

        if offset > 0 {
            for _ in 0..offset {
                self.skip()?;
            }
        } else {
            for _ in 0..offset.unsigned_abs() {
                self.skip_back()?;
            }
        }

        Ok(self.position.datagram_index)
    }

    /// Number of datagrams in the file, counted once by skipping from the start
    pub fn total_count(&mut self) -> Result<u64> {
        if let Some(count) = self.total_count {
            return Ok(count);
        }

        let saved = StreamPosition::new(self.cursor.tell()?, self.position.datagram_index);
        let saved_stats = self.stats;
        self.cursor.seek(SeekFrom::Start(0))?;
        self.position = StreamPosition::default();

        let outcome = loop {
            match self.skip_frame(None) {
                Ok(_) => continue,
                Err(DatagramError::EndOfStream) | Err(DatagramError::Framing { .. }) => {
                    break Ok(self.position.datagram_index)
                }
                Err(e) => break Err(e),
            }
        };

        self.cursor.seek(SeekFrom::Start(saved.byte_offset))?;
        self.position = saved;
        self.stats = saved_stats;

        let count = outcome?;

        #[cfg(feature = "logging")]
        debug!("Counted {} datagrams", count);

        self.total_count = Some(count);
        Ok(count)
    }

    /// Return to the first byte, clearing the datagram index and cached count
    pub fn reset(&mut self) -> Result<()> {
        self.cursor.seek(SeekFrom::Start(0))?;
        self.position = StreamPosition::default();
        self.total_count = None;
        Ok(())
    }

    /// Bring the byte coordinate back in line with the cursor after an operation
    fn settle<T>(&mut self, result: Result<T>) -> Result<T> {
        match self.cursor.tell() {
            Ok(offset) => {
                self.position.byte_offset = offset;
                result
            }
            Err(e) => result.and(Err(e)),
        }
    }

    fn read_record(&mut self, header: Option<Envelope>) -> Result<Record> {
        let (located, frame) = self.read_frame(header)?;
        Ok(self.to_record(&located, frame))
    }

    fn to_record(&self, located: &LocatedDatagram, frame: RawFrame) -> Record {
        if self.config.raw_mode {
            Record::Raw(frame)
        } else {
            Record::Parsed(self.dispatch.decode(&frame, located.size))
        }
    }

    /// Read the envelope, or take the one already consumed, plus the rollback offset
    fn next_envelope(&mut self, header: Option<Envelope>) -> Result<(Envelope, u64)> {
        match header {
            Some(envelope) => {
                let at = self.cursor.tell()?;
                Ok((envelope, at.saturating_sub(ENVELOPE_LEN as u64)))
            }
            None => {
                let at = self.cursor.tell()?;
                let envelope = read_envelope(&mut self.cursor)
                    .map_err(|e| e.at_index(self.position.datagram_index))?;
                Ok((envelope, at))
            }
        }
    }

    fn read_frame(&mut self, mut header: Option<Envelope>) -> Result<(LocatedDatagram, RawFrame)> {
        let mut resyncs = 0;
        loop {
            let (envelope, frame_start) = self.next_envelope(header.take())?;

            if envelope.declared_size < MIN_DECLARED_SIZE {
                let cause = DatagramError::InvalidEnvelope {
                    declared_size: envelope.declared_size,
                    type_tag: envelope.type_tag.to_string(),
                    byte_offset: frame_start,
                };
                self.resync(&mut resyncs, cause)?;
                continue;
            }

            let payload_len = envelope.payload_len() as usize;
            let payload = self.cursor.read_up_to(payload_len)?;
            if payload.len() < payload_len {
                let cause = DatagramError::Framing {
                    context: "datagram payload",
                    expected: payload_len,
                    actual: payload.len(),
                    byte_offset: frame_start,
                    datagram_index: self.position.datagram_index,
                };
                self.resync(&mut resyncs, cause)?;
                continue;
            }

            let trailing = match read_size(&mut self.cursor, "trailing datagram size") {
                Ok(size) => size,
                Err(e) => {
                    self.cursor.seek(SeekFrom::Start(frame_start))?;
                    return Err(e.at_index(self.position.datagram_index));
                }
            };

            if trailing != envelope.declared_size {
                let cause = DatagramError::SizeMismatch {
                    leading: envelope.declared_size,
                    trailing,
                    byte_offset: frame_start,
                    datagram_index: self.position.datagram_index,
                };
                self.resync(&mut resyncs, cause)?;
                continue;
            }

            let mut bytes = BytesMut::with_capacity(HEADER_LEN + payload.len());
            bytes.put_slice(&envelope.raw_header);
            bytes.put_slice(&payload);

            self.position.datagram_index += 1;
            self.stats.datagrams_read += 1;

            let located = LocatedDatagram {
                offset: frame_start,
                envelope,
                size: envelope.frame_total_bytes(),
            };
            return Ok((located, RawFrame::new(bytes.freeze())));
        }
    }

    fn skip_frame(&mut self, mut header: Option<Envelope>) -> Result<LocatedDatagram> {
        let mut resyncs = 0;
        loop {
            let (envelope, frame_start) = self.next_envelope(header.take())?;

            if envelope.declared_size < MIN_DECLARED_SIZE {
                let cause = DatagramError::InvalidEnvelope {
                    declared_size: envelope.declared_size,
                    type_tag: envelope.type_tag.to_string(),
                    byte_offset: frame_start,
                };
                self.resync(&mut resyncs, cause)?;
                continue;
            }

            self.cursor
                .seek(SeekFrom::Current(envelope.payload_len() as i64))?;

            let trailing = match read_size(&mut self.cursor, "trailing datagram size") {
                Ok(size) => size,
                Err(e) => {
                    self.cursor.seek(SeekFrom::Start(frame_start))?;
                    return Err(e.at_index(self.position.datagram_index));
                }
            };

            if trailing != envelope.declared_size {
                let cause = DatagramError::SizeMismatch {
                    leading: envelope.declared_size,
                    trailing,
                    byte_offset: frame_start,
                    datagram_index: self.position.datagram_index,
                };
                self.resync(&mut resyncs, cause)?;
                continue;
            }

            self.position.datagram_index += 1;
            self.stats.datagrams_skipped += 1;

            return Ok(LocatedDatagram {
                offset: frame_start,
                envelope,
                size: envelope.frame_total_bytes(),
            });
        }
    }

    /// Scan forward past a frame that failed validation
    fn resync(&mut self, attempts: &mut usize, cause: DatagramError) -> Result<()> {
        #[cfg(feature = "logging")]
        warn!("{}", cause);
        #[cfg(not(feature = "logging"))]
        let _ = cause;

        if *attempts >= self.config.max_resyncs {
            return Err(DatagramError::ResyncLimit {
                attempts: *attempts,
                byte_offset: self.cursor.tell()?,
            });
        }
        *attempts += 1;
        self.stats.resyncs += 1;

        let landing = find_next_frame(&mut self.cursor)?;
        self.stats.bytes_skipped += landing.bytes_skipped;
        Ok(())
    }

    fn peek_header(&mut self, consume_payload_prefix: bool) -> Result<DatagramHeader> {
        let start = self.cursor.tell()?;
        let envelope = match read_envelope(&mut self.cursor) {
            Ok(envelope) => envelope,
            Err(e) => {
                self.cursor.seek(SeekFrom::Start(start))?;
                return Err(e.at_index(self.position.datagram_index));
            }
        };

        let mut header = DatagramHeader::new(envelope);
        if let Some(len) = channel_field_len(&envelope.type_tag) {
            let field = self.cursor.read_up_to(len)?;
            if field.len() == len {
                header.channel = Some(decode_channel(&field));
            }
            // The channel field belongs to the payload; give it back either way
            self.cursor.seek(SeekFrom::Current(-(field.len() as i64)))?;
        }

        if !consume_payload_prefix {
            self.cursor.seek(SeekFrom::Start(start))?;
        }
        Ok(header)
    }

    fn step_back(&mut self) -> Result<()> {
        let origin = self.cursor.tell()?;
        if origin < SIZE_FIELD_LEN as u64 {
            return Err(DatagramError::InvalidSeek(format!(
                "cannot step back from byte {}: no trailing size precedes it",
                origin
            )));
        }

        self.cursor.seek(SeekFrom::Start(origin - SIZE_FIELD_LEN as u64))?;
        let trailing = match read_size(&mut self.cursor, "trailing datagram size") {
            Ok(size) => size,
            Err(e) => return self.restore(origin, e),
        };

        let frame_start = origin as i64 - 2 * SIZE_FIELD_LEN as i64 - trailing as i64;
        if trailing < MIN_DECLARED_SIZE || frame_start < 0 {
            let err = DatagramError::InvalidSeek(format!(
                "no datagram of size {} fits behind byte {}",
                trailing, origin
            ));
            return self.restore(origin, err);
        }
        let frame_start = frame_start as u64;

        self.cursor.seek(SeekFrom::Start(frame_start))?;
        let leading = match read_size(&mut self.cursor, "datagram size") {
            Ok(size) => size,
            Err(e) => return self.restore(origin, e),
        };

        if leading != trailing {
            let err = DatagramError::SizeMismatch {
                leading,
                trailing,
                byte_offset: frame_start,
                datagram_index: self.position.datagram_index,
            };
            return self.restore(origin, err);
        }

        self.cursor.seek(SeekFrom::Start(frame_start))?;
        self.position.datagram_index = self.position.datagram_index.saturating_sub(1);
        Ok(())
    }

    fn restore(&mut self, origin: u64, err: DatagramError) -> Result<()> {
        self.cursor.seek(SeekFrom::Start(origin))?;
        Err(err.at_index(self.position.datagram_index))
    }
}

impl<'a, R: Read + Seek> IntoIterator for &'a mut DatagramReader<R> {
    type Item = Result<Record>;
    type IntoIter = Datagrams<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.iterate()
    }
}

impl<R> std::fmt::Debug for DatagramReader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatagramReader")
            .field("position", &self.position)
            .field("total_count", &self.total_count)
            .field("config", &self.config)
            .field("stats", &self.stats)
            .finish()
    }
}
