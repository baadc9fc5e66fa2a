//! Constants and limits for the Simrad RAW datagram format
//!
//! On-disk layout of a single datagram:
//!
//! ```text
//! | size (i32 LE) | type (4 bytes) | time low (u32 LE) | time high (u32 LE) | payload | size (i32 LE) |
//! |<--- 4 ------->|<------------------ declared size ------------------------------->|<---- 4 ---->|
//! ```

use serde::{Deserialize, Serialize};

/// Size of the leading and trailing size fields
pub const SIZE_FIELD_LEN: usize = 4;

/// Size of the type tag (3 type characters + 1 version character)
pub const TYPE_TAG_LEN: usize = 4;

/// Size of the split NT timestamp (two u32 halves)
pub const TIMESTAMP_LEN: usize = 8;

/// Header bytes counted by the declared size: type tag + timestamp
pub const HEADER_LEN: usize = TYPE_TAG_LEN + TIMESTAMP_LEN;

/// Bytes consumed by reading an envelope: leading size + header
pub const ENVELOPE_LEN: usize = SIZE_FIELD_LEN + HEADER_LEN;

/// Bytes a frame occupies on disk beyond its payload: both size fields + header
pub const FRAME_OVERHEAD: u64 = (2 * SIZE_FIELD_LEN + HEADER_LEN) as u64;

/// Smallest declared size considered structurally valid
pub const MIN_DECLARED_SIZE: i32 = 16;

/// Chunk size used when scanning forward for the next datagram (10 MiB)
pub const RESYNC_CHUNK_SIZE: usize = 10 * 1024 * 1024;

/// Type tags the resynchronizer searches for.
///
/// Only datagrams that repeat throughout a file are listed. Tags that appear
/// once (configuration, file metadata, index) are left out to keep false
/// positives down.
pub const RESYNC_TAGS: [&[u8; 3]; 7] = [b"RAW", b"NME", b"TAG", b"BOT", b"DEP", b"XML", b"MRU"];

/// Length of the RAW3/RAW4 channel identifier field
pub const CHANNEL_ID_LEN: usize = 128;

/// Length of the RAW0 channel index field
pub const CHANNEL_INDEX_LEN: usize = 2;

/// Default read buffer capacity (1 MiB)
pub const DEFAULT_BUFFER_SIZE: usize = 1024 * 1024;

/// Default cap on consecutive resynchronizations within one operation
pub const DEFAULT_MAX_RESYNCS: usize = 1024;

/// Microseconds between the NT epoch (1601-01-01) and the Unix epoch
pub const NT_EPOCH_OFFSET_MICROS: i64 = -11_644_473_600_000_000;

/// Known datagram kinds, keyed by the first three characters of the type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatagramKind {
    /// Acoustic ping samples (RAW0, RAW3, RAW4)
    Sample,
    /// Transceiver configuration (CON0, CON1)
    Configuration,
    /// Free-text annotation (TAG0)
    Annotation,
    /// NMEA navigation sentence (NME0)
    Nmea,
    /// Bottom detection (BOT0)
    Bottom,
    /// Depth (DEP0)
    Depth,
    /// XML metadata (XML0)
    Xml,
    /// File metadata (FIL1)
    FileMetadata,
    /// Motion reference unit data (MRU0, MRU1)
    Motion,
    /// Ping index (IDX0)
    Index,
}

impl DatagramKind {
    /// All kinds known to the dispatch table
    pub const ALL: [DatagramKind; 10] = [
        DatagramKind::Sample,
        DatagramKind::Configuration,
        DatagramKind::Annotation,
        DatagramKind::Nmea,
        DatagramKind::Bottom,
        DatagramKind::Depth,
        DatagramKind::Xml,
        DatagramKind::FileMetadata,
        DatagramKind::Motion,
        DatagramKind::Index,
    ];

    /// The three-character tag identifying this kind
    pub const fn tag(&self) -> &'static [u8; 3] {
        match self {
            DatagramKind::Sample => b"RAW",
            DatagramKind::Configuration => b"CON",
            DatagramKind::Annotation => b"TAG",
            DatagramKind::Nmea => b"NME",
            DatagramKind::Bottom => b"BOT",
            DatagramKind::Depth => b"DEP",
            DatagramKind::Xml => b"XML",
            DatagramKind::FileMetadata => b"FIL",
            DatagramKind::Motion => b"MRU",
            DatagramKind::Index => b"IDX",
        }
    }

    /// Look up the kind for a three-character tag
    pub fn from_tag(tag: &[u8]) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag().as_slice() == tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags_round_trip() {
        for kind in DatagramKind::ALL {
            assert_eq!(DatagramKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(DatagramKind::from_tag(b"ZZZ"), None);
    }

    #[test]
    fn test_resync_tags_exclude_one_off_kinds() {
        for tag in [b"CON", b"FIL", b"IDX"] {
            assert!(!RESYNC_TAGS.contains(&tag));
        }
    }
}
