//! Resynchronization and whole-stream scanning for damaged input
//!
//! When a frame fails validation the reader calls [`find_next_frame`], which
//! scans forward in fixed-size chunks for the earliest occurrence of any
//! recurring type tag and parks the cursor four bytes before it, where the
//! leading size of that frame should be. Whether that frame is real is only
//! known once the reader tries it.

use crate::config::ReaderConfig;
use crate::constants::{RESYNC_CHUNK_SIZE, RESYNC_TAGS, SIZE_FIELD_LEN};
use crate::cursor::ByteCursor;
use crate::error::DatagramError;
use crate::reader::DatagramReader;
use crate::types::Envelope;
use crate::Result;
use memchr::memmem::Finder;
use std::io::{Cursor, Read, Seek, SeekFrom};

#[cfg(feature = "logging")]
use tracing::{debug, warn};

/// Bytes carried between chunks so a tag split across a boundary is still found
const CHUNK_OVERLAP: usize = 2;

/// Where a resynchronization left the cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResyncLanding {
    /// Cursor offset when the search started
    pub from: u64,

    /// Candidate frame start (four bytes before the tag)
    pub to: u64,

    /// The three tag characters that matched
    pub tag: [u8; 3],

    /// Bytes passed over between `from` and `to`
    pub bytes_skipped: u64,
}

/// Scan forward for the next plausible frame start
///
/// Returns [`DatagramError::EndOfStream`] if no tag occurs before the end of
/// the source.
pub fn find_next_frame<R: Read + Seek>(cursor: &mut ByteCursor<R>) -> Result<ResyncLanding> {
    find_next_frame_with_chunk(cursor, RESYNC_CHUNK_SIZE)
}

/// [`find_next_frame`] with an explicit chunk size
pub fn find_next_frame_with_chunk<R: Read + Seek>(
    cursor: &mut ByteCursor<R>,
    chunk_size: usize,
) -> Result<ResyncLanding> {
    #[cfg(feature = "logging")]
    warn!("Attempting to find next valid datagram...");

    let chunk_size = chunk_size.max(CHUNK_OVERLAP + 1);
    let finders: Vec<Finder<'static>> = RESYNC_TAGS.iter().map(|&tag| Finder::new(tag)).collect();

    let from = cursor.tell()?;
    let mut window: Vec<u8> = Vec::with_capacity(chunk_size + CHUNK_OVERLAP);
    let mut window_start = from;

    loop {
        let chunk = cursor.read_up_to(chunk_size)?;
        let exhausted = chunk.len() < chunk_size;
        window.extend_from_slice(&chunk);

        if let Some((tag_at, tag)) = earliest_tag(&finders, &window, window_start) {
            let to = tag_at - SIZE_FIELD_LEN as u64;
            cursor.seek(SeekFrom::Start(to))?;
            let bytes_skipped = to.saturating_sub(from);

            #[cfg(feature = "logging")]
            {
                warn!("Found next datagram: {} @ {}", crate::types::latin1(&tag), to);
                warn!("{} bytes were skipped", bytes_skipped);
            }

            return Ok(ResyncLanding {
                from,
                to,
                tag,
                bytes_skipped,
            });
        }

        if exhausted {
            #[cfg(feature = "logging")]
            warn!("Reached end of file while searching for next datagram");
            return Err(DatagramError::EndOfStream);
        }

        let keep = CHUNK_OVERLAP.min(window.len());
        let consumed = window.len() - keep;
        window.drain(..consumed);
        window_start += consumed as u64;
    }
}

/// Absolute offset and bytes of the earliest tag that leaves room for a size field
fn earliest_tag(finders: &[Finder<'_>], window: &[u8], window_start: u64) -> Option<(u64, [u8; 3])> {
    let mut best: Option<(u64, [u8; 3])> = None;
    for finder in finders {
        let hit = finder
            .find_iter(window)
            .map(|rel| window_start + rel as u64)
            .find(|&abs| abs >= SIZE_FIELD_LEN as u64);

        if let Some(abs) = hit {
            if best.map_or(true, |(at, _)| abs < at) {
                let mut tag = [0u8; 3];
                tag.copy_from_slice(finder.needle());
                best = Some((abs, tag));
            }
        }
    }
    best
}

/// A datagram found at a specific offset in the stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocatedDatagram {
    /// Byte offset of the leading size field
    pub offset: u64,

    /// The frame envelope
    pub envelope: Envelope,

    /// Total on-disk size of the frame in bytes
    pub size: u64,
}

/// Scan statistics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanStats {
    /// Total bytes in the scanned source
    pub bytes_scanned: u64,

    /// Number of valid datagrams found
    pub frames_found: usize,

    /// Number of resynchronizations needed
    pub resyncs: u64,

    /// Bytes passed over while resynchronizing
    pub bytes_skipped: u64,

    /// Total bytes recovered (sum of all valid frame sizes)
    pub bytes_recovered: u64,
}

impl ScanStats {
    /// Calculate recovery rate as a percentage
    pub fn recovery_rate(&self) -> f64 {
        if self.bytes_scanned == 0 {
            0.0
        } else {
            (self.bytes_recovered as f64 / self.bytes_scanned as f64) * 100.0
        }
    }
}

/// Locate every recoverable datagram in a byte buffer
pub fn scan_bytes(data: &[u8]) -> Vec<LocatedDatagram> {
    scan_bytes_with_stats(data).0
}

/// Scan a byte buffer with statistics
pub fn scan_bytes_with_stats(data: &[u8]) -> (Vec<LocatedDatagram>, ScanStats) {
    // In-memory sources cannot fail to read or seek
    scan_source(Cursor::new(data)).unwrap_or_default()
}

/// Locate every recoverable datagram in a seekable source
///
/// Scanning stops quietly at the end of the stream, at a truncated final
/// frame or when the resync budget runs out. Only IO failures are reported.
pub fn scan_source<R: Read + Seek>(mut source: R) -> Result<(Vec<LocatedDatagram>, ScanStats)> {
    let bytes_scanned = source.seek(SeekFrom::End(0))?;
    source.seek(SeekFrom::Start(0))?;

    #[cfg(feature = "logging")]
    debug!("Starting stream scan of {} bytes", bytes_scanned);

    let mut reader = DatagramReader::new(source, ReaderConfig::default());
    let mut results = Vec::new();

    loop {
        match reader.skip_located() {
            Ok(located) => results.push(located),
            Err(DatagramError::EndOfStream) => break,
            Err(DatagramError::Framing { .. }) => {
                #[cfg(feature = "logging")]
                warn!("Stopped at truncated datagram @ {}", reader.byte_offset());
                break;
            }
            Err(DatagramError::ResyncLimit { .. }) => {
                #[cfg(feature = "logging")]
                warn!("Gave up resynchronizing @ {}", reader.byte_offset());
                break;
            }
            Err(e) => return Err(e),
        }
    }

    let reader_stats = reader.stats();
    let stats = ScanStats {
        bytes_scanned,
        frames_found: results.len(),
        resyncs: reader_stats.resyncs,
        bytes_skipped: reader_stats.bytes_skipped,
        bytes_recovered: results.iter().map(|d| d.size).sum(),
    };

    #[cfg(feature = "logging")]
    debug!(
        "Scan complete: found {} valid datagrams out of {} bytes scanned",
        stats.frames_found, stats.bytes_scanned
    );

    Ok((results, stats))
}
