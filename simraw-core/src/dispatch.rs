//! Type dispatch: maps a 3-character type tag to a payload decoder
//!
//! Decoders never fail. A payload that does not match the expected layout
//! degrades to whatever could be extracted, and unknown tags fall through to
//! [`UnknownDecoder`], which keeps the payload verbatim.

use crate::constants::{DatagramKind, CHANNEL_ID_LEN, CHANNEL_INDEX_LEN, FRAME_OVERHEAD};
use crate::time::nt_epoch;
use crate::types::{latin1_trimmed, Channel, Datagram, DatagramBody, RawFrame, TypeTag};
use bytes::Bytes;
use std::collections::HashMap;

/// A payload decoder for one family of datagrams
pub trait DatagramDecoder: Send + Sync {
    /// Decode raw frame bytes (12-byte header + payload) into a datagram
    ///
    /// `bytes_read` is the total on-disk length of the frame.
    fn decode(&self, frame: &RawFrame, bytes_read: u64) -> Datagram;
}

fn datagram(frame: &RawFrame, bytes_read: u64, body: DatagramBody) -> Datagram {
    Datagram {
        type_tag: frame.type_tag(),
        timestamp: frame.timestamp().unwrap_or_else(nt_epoch),
        size: bytes_read.saturating_sub(FRAME_OVERHEAD),
        bytes_read,
        body,
    }
}

/// Length of the channel field that leads a sample payload, by tag version
pub fn channel_field_len(tag: &TypeTag) -> Option<usize> {
    if tag.starts_with(b"RAW0") {
        Some(CHANNEL_INDEX_LEN)
    } else if tag.starts_with(b"RAW3") || tag.starts_with(b"RAW4") {
        Some(CHANNEL_ID_LEN)
    } else {
        None
    }
}

/// Decode a channel field whose length came from [`channel_field_len`]
pub fn decode_channel(field: &[u8]) -> Channel {
    if field.len() == CHANNEL_INDEX_LEN {
        Channel::Index(i16::from_le_bytes([field[0], field[1]]))
    } else {
        Channel::Id(latin1_trimmed(field))
    }
}

/// Text payloads: NMEA sentences, annotations and XML documents
#[derive(Debug, Clone, Copy)]
pub struct TextDecoder {
    kind: DatagramKind,
}

impl TextDecoder {
    /// Decoder producing text bodies tagged with `kind`
    pub const fn new(kind: DatagramKind) -> Self {
        Self { kind }
    }
}

impl DatagramDecoder for TextDecoder {
    fn decode(&self, frame: &RawFrame, bytes_read: u64) -> Datagram {
        let text = latin1_trimmed(&frame.payload());
        datagram(
            frame,
            bytes_read,
            DatagramBody::Text {
                kind: self.kind,
                text,
            },
        )
    }
}

/// Acoustic sample datagrams; only the leading channel field is interpreted
#[derive(Debug, Clone, Copy, Default)]
pub struct SampleDecoder;

impl DatagramDecoder for SampleDecoder {
    fn decode(&self, frame: &RawFrame, bytes_read: u64) -> Datagram {
        let payload = frame.payload();
        let (channel, data) = match channel_field_len(&frame.type_tag()) {
            Some(len) if payload.len() >= len => {
                (Some(decode_channel(&payload[..len])), payload.slice(len..))
            }
            _ => (None, payload),
        };
        datagram(frame, bytes_read, DatagramBody::Sample { channel, data })
    }
}

/// Known binary datagrams kept opaque
#[derive(Debug, Clone, Copy)]
pub struct BinaryDecoder {
    kind: DatagramKind,
}

impl BinaryDecoder {
    /// Decoder producing binary bodies tagged with `kind`
    pub const fn new(kind: DatagramKind) -> Self {
        Self { kind }
    }
}

impl DatagramDecoder for BinaryDecoder {
    fn decode(&self, frame: &RawFrame, bytes_read: u64) -> Datagram {
        datagram(
            frame,
            bytes_read,
            DatagramBody::Binary {
                kind: self.kind,
                data: frame.payload(),
            },
        )
    }
}

/// Fallback for unrecognized type tags
#[derive(Debug, Clone, Copy, Default)]
pub struct UnknownDecoder;

impl DatagramDecoder for UnknownDecoder {
    fn decode(&self, frame: &RawFrame, bytes_read: u64) -> Datagram {
        datagram(
            frame,
            bytes_read,
            DatagramBody::Unknown {
                data: frame.payload(),
            },
        )
    }
}

/// Maps type tags to decoders, with a fallback for everything else
pub struct DispatchTable {
    decoders: HashMap<[u8; 3], Box<dyn DatagramDecoder>>,
    fallback: Box<dyn DatagramDecoder>,
}

impl DispatchTable {
    /// A table with no registered decoders; every tag goes to the fallback
    pub fn empty() -> Self {
        Self {
            decoders: HashMap::new(),
            fallback: Box::new(UnknownDecoder),
        }
    }

    /// Register (or replace) the decoder for a 3-character tag
    pub fn register<D: DatagramDecoder + 'static>(&mut self, tag: &[u8; 3], decoder: D) {
        self.decoders.insert(*tag, Box::new(decoder));
    }

    /// Replace the fallback decoder
    pub fn set_fallback<D: DatagramDecoder + 'static>(&mut self, decoder: D) {
        self.fallback = Box::new(decoder);
    }

    /// Whether a dedicated decoder exists for this tag
    pub fn contains(&self, tag: &TypeTag) -> bool {
        self.lookup(tag).is_some()
    }

    fn lookup(&self, tag: &TypeTag) -> Option<&dyn DatagramDecoder> {
        let mut key = [0u8; 3];
        key.copy_from_slice(tag.kind_bytes());
        self.decoders.get(&key).map(|d| d.as_ref())
    }

    /// Decode a raw frame with the decoder registered for its tag
    pub fn decode(&self, frame: &RawFrame, bytes_read: u64) -> Datagram {
        let tag = frame.type_tag();
        match self.lookup(&tag) {
            Some(decoder) => decoder.decode(frame, bytes_read),
            None => {
                #[cfg(feature = "logging")]
                tracing::debug!("No decoder for datagram type {}, keeping raw payload", tag);
                self.fallback.decode(frame, bytes_read)
            }
        }
    }

    /// Decode frame bytes that start with the 12-byte header
    pub fn decode_bytes(&self, frame: Bytes) -> Datagram {
        let frame = RawFrame::new(frame);
        let bytes_read = frame.bytes_read();
        self.decode(&frame, bytes_read)
    }
}

impl Default for DispatchTable {
    fn default() -> Self {
        let mut table = Self::empty();
        for kind in DatagramKind::ALL {
            match kind {
                DatagramKind::Sample => table.register(kind.tag(), SampleDecoder),
                DatagramKind::Nmea | DatagramKind::Annotation | DatagramKind::Xml => {
                    table.register(kind.tag(), TextDecoder::new(kind))
                }
                _ => table.register(kind.tag(), BinaryDecoder::new(kind)),
            }
        }
        table
    }
}

impl std::fmt::Debug for DispatchTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut tags: Vec<String> = self
            .decoders
            .keys()
            .map(|k| crate::types::latin1(k))
            .collect();
        tags.sort();
        f.debug_struct("DispatchTable").field("tags", &tags).finish()
    }
}
