//! Core types for Simrad RAW datagrams

use crate::constants::{DatagramKind, FRAME_OVERHEAD, HEADER_LEN, TYPE_TAG_LEN};
use crate::time::nt_time_to_utc;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The 4-byte datagram type tag: three type characters plus a version character
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeTag(pub [u8; TYPE_TAG_LEN]);

impl TypeTag {
    /// Create a tag from its four raw bytes
    pub const fn new(bytes: [u8; TYPE_TAG_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw tag bytes
    pub const fn as_bytes(&self) -> &[u8; TYPE_TAG_LEN] {
        &self.0
    }

    /// The three type characters used for dispatch
    pub fn kind_bytes(&self) -> &[u8] {
        &self.0[..3]
    }

    /// The three type characters as Latin-1 text (e.g. "RAW")
    pub fn kind_str(&self) -> String {
        latin1(self.kind_bytes())
    }

    /// The known kind, if the dispatch table recognizes this tag
    pub fn kind(&self) -> Option<DatagramKind> {
        DatagramKind::from_tag(self.kind_bytes())
    }

    /// Numeric version carried in the fourth character, when it is a digit
    pub fn version(&self) -> Option<u8> {
        let v = self.0[3];
        v.is_ascii_digit().then(|| v - b'0')
    }

    /// Whether the full tag starts with `prefix`
    pub fn starts_with(&self, prefix: &[u8]) -> bool {
        self.0.starts_with(prefix)
    }
}

impl From<&[u8; TYPE_TAG_LEN]> for TypeTag {
    fn from(bytes: &[u8; TYPE_TAG_LEN]) -> Self {
        Self(*bytes)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(latin1(&self.0).trim_end_matches('\0'))
    }
}

impl fmt::Debug for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeTag({:?})", latin1(&self.0))
    }
}

/// Decode bytes as ISO-8859-1, where every byte maps to the same code point
pub fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Decode a fixed-width, NUL-padded Latin-1 field
pub fn latin1_trimmed(bytes: &[u8]) -> String {
    let end = bytes.iter().rposition(|&b| b != 0).map_or(0, |p| p + 1);
    let start = bytes[..end].iter().position(|&b| b != 0).unwrap_or(end);
    latin1(&bytes[start..end])
}

/// Decoded frame envelope: leading size, type tag and split timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Envelope {
    /// Size of header + payload as recorded in the leading size field
    pub declared_size: i32,

    /// Datagram type tag
    pub type_tag: TypeTag,

    /// Low half of the NT timestamp
    pub time_low: u32,

    /// High half of the NT timestamp
    pub time_high: u32,

    /// Exact bytes of type tag + timestamp as read from the stream
    pub raw_header: [u8; HEADER_LEN],
}

impl Envelope {
    /// Build an envelope from the leading size and the 12 header bytes
    pub fn from_parts(declared_size: i32, raw_header: [u8; HEADER_LEN]) -> Self {
        let mut tag = [0u8; TYPE_TAG_LEN];
        tag.copy_from_slice(&raw_header[..TYPE_TAG_LEN]);
        let time_low = u32::from_le_bytes([raw_header[4], raw_header[5], raw_header[6], raw_header[7]]);
        let time_high =
            u32::from_le_bytes([raw_header[8], raw_header[9], raw_header[10], raw_header[11]]);

        Self {
            declared_size,
            type_tag: TypeTag(tag),
            time_low,
            time_high,
            raw_header,
        }
    }

    /// Payload length implied by the declared size (zero if the size is invalid)
    pub fn payload_len(&self) -> u64 {
        (self.declared_size as i64 - HEADER_LEN as i64).max(0) as u64
    }

    /// Total on-disk length: both size fields, header and payload
    pub fn frame_total_bytes(&self) -> u64 {
        self.payload_len() + FRAME_OVERHEAD
    }

    /// Timestamp as a UTC instant
    pub fn timestamp(&self) -> DateTime<Utc> {
        nt_time_to_utc(self.time_low, self.time_high)
    }
}

/// Channel identification reported by peeking at a sample datagram
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Channel {
    /// RAW0 channel index
    Index(i16),
    /// RAW3/RAW4 channel identifier string
    Id(String),
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Index(i) => write!(f, "{}", i),
            Channel::Id(id) => f.write_str(id),
        }
    }
}

/// Header of the next datagram, as returned by peeking
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatagramHeader {
    /// The decoded envelope
    pub envelope: Envelope,

    /// Timestamp as a UTC instant
    pub timestamp: DateTime<Utc>,

    /// Total on-disk length of the datagram
    pub bytes_read: u64,

    /// Channel reported by sample datagrams
    pub channel: Option<Channel>,
}

impl DatagramHeader {
    /// Wrap an envelope without channel information
    pub fn new(envelope: Envelope) -> Self {
        Self {
            timestamp: envelope.timestamp(),
            bytes_read: envelope.frame_total_bytes(),
            envelope,
            channel: None,
        }
    }

    /// Datagram type tag
    pub fn type_tag(&self) -> TypeTag {
        self.envelope.type_tag
    }

    /// Declared size (header + payload)
    pub fn declared_size(&self) -> i32 {
        self.envelope.declared_size
    }
}

/// Undecoded frame bytes: the 12-byte header followed by the payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    bytes: Bytes,
}

impl RawFrame {
    /// Wrap raw frame bytes; the slice must start with the 12-byte header
    pub fn new(bytes: Bytes) -> Self {
        Self { bytes }
    }

    /// Full frame bytes (header + payload, no size fields)
    pub fn as_bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// Consume into the frame bytes
    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }

    /// Type tag from the first four bytes
    pub fn type_tag(&self) -> TypeTag {
        let mut tag = [0u8; TYPE_TAG_LEN];
        let n = self.bytes.len().min(TYPE_TAG_LEN);
        tag[..n].copy_from_slice(&self.bytes[..n]);
        TypeTag(tag)
    }

    /// Timestamp from header bytes 4..12, if present
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        let h = self.bytes.get(TYPE_TAG_LEN..HEADER_LEN)?;
        let low = u32::from_le_bytes([h[0], h[1], h[2], h[3]]);
        let high = u32::from_le_bytes([h[4], h[5], h[6], h[7]]);
        Some(nt_time_to_utc(low, high))
    }

    /// Payload bytes after the header
    pub fn payload(&self) -> Bytes {
        if self.bytes.len() <= HEADER_LEN {
            Bytes::new()
        } else {
            self.bytes.slice(HEADER_LEN..)
        }
    }

    /// Total on-disk length of this frame
    pub fn bytes_read(&self) -> u64 {
        self.payload().len() as u64 + FRAME_OVERHEAD
    }
}

/// Type-specific content of a decoded datagram
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatagramBody {
    /// Textual payload (NMEA sentence, annotation, XML document)
    Text {
        /// Kind that produced the text.
        kind: DatagramKind,
        /// Decoded text, trailing NULs removed.
        text: String,
    },

    /// Acoustic sample datagram with its channel and opaque sample data
    Sample {
        /// Channel the ping belongs to, when the payload was long enough to tell.
        channel: Option<Channel>,
        /// Remaining payload after the channel field.
        data: Bytes,
    },

    /// Known binary datagram kept undecoded
    Binary {
        /// The datagram kind.
        kind: DatagramKind,
        /// Payload bytes.
        data: Bytes,
    },

    /// Unrecognized type tag; payload preserved verbatim
    Unknown {
        /// Payload bytes.
        data: Bytes,
    },
}

/// A decoded datagram record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datagram {
    /// Full type tag, including version character
    pub type_tag: TypeTag,

    /// Timestamp as a UTC instant
    pub timestamp: DateTime<Utc>,

    /// Payload length in bytes
    pub size: u64,

    /// Total on-disk length (`size` + 20)
    pub bytes_read: u64,

    /// Type-specific content
    pub body: DatagramBody,
}

/// Result of a successful forward read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    /// Decoded through the dispatch table
    Parsed(Datagram),

    /// Undecoded frame bytes (raw mode)
    Raw(RawFrame),
}

impl Record {
    /// Type tag of the underlying datagram
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Record::Parsed(d) => d.type_tag,
            Record::Raw(r) => r.type_tag(),
        }
    }

    /// Total on-disk length of the underlying datagram
    pub fn bytes_read(&self) -> u64 {
        match self {
            Record::Parsed(d) => d.bytes_read,
            Record::Raw(r) => r.bytes_read(),
        }
    }

    /// The decoded datagram, if this record was dispatched
    pub fn as_datagram(&self) -> Option<&Datagram> {
        match self {
            Record::Parsed(d) => Some(d),
            Record::Raw(_) => None,
        }
    }

    /// Consume into the decoded datagram, if any
    pub fn into_datagram(self) -> Option<Datagram> {
        match self {
            Record::Parsed(d) => Some(d),
            Record::Raw(_) => None,
        }
    }

    /// The raw frame, if this record was read in raw mode
    pub fn as_raw(&self) -> Option<&RawFrame> {
        match self {
            Record::Raw(r) => Some(r),
            Record::Parsed(_) => None,
        }
    }
}

/// Position of the reader in both coordinate systems
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamPosition {
    /// Byte offset of the underlying cursor
    pub byte_offset: u64,

    /// Logical datagram index
    pub datagram_index: u64,
}

impl StreamPosition {
    /// A position at the given coordinates
    pub const fn new(byte_offset: u64, datagram_index: u64) -> Self {
        Self {
            byte_offset,
            datagram_index,
        }
    }
}
