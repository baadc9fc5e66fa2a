//! Error types for datagram reading

use thiserror::Error;

/// Errors that can occur while reading datagrams
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DatagramError {
    /// No more bytes are available at a frame boundary
    #[error("End of stream reached")]
    EndOfStream,

    /// A short read inside a frame where the stream had not ended
    #[error(
        "Short read while getting {context}: expected {expected} bytes, got {actual} @ ({byte_offset}, {datagram_index})"
    )]
    Framing {
        /// Which field was being read.
        context: &'static str,
        /// The number of bytes expected.
        expected: usize,
        /// The number of bytes actually read.
        actual: usize,
        /// Byte offset of the cursor after the failure.
        byte_offset: u64,
        /// Logical datagram index at the failure.
        datagram_index: u64,
    },

    /// Leading and trailing size fields disagree
    #[error(
        "Datagram failed size check: {leading} != {trailing} @ ({byte_offset}, {datagram_index})"
    )]
    SizeMismatch {
        /// The leading size field.
        leading: i32,
        /// The trailing size field.
        trailing: i32,
        /// Byte offset of the frame whose sizes disagree.
        byte_offset: u64,
        /// Logical datagram index of that frame.
        datagram_index: u64,
    },

    /// Declared size below the structural minimum
    #[error("Invalid datagram header: size {declared_size} < 16 (type {type_tag:?}) @ {byte_offset}")]
    InvalidEnvelope {
        /// The declared size read from the stream.
        declared_size: i32,
        /// The type tag read alongside it.
        type_tag: String,
        /// Byte offset where the frame started.
        byte_offset: u64,
    },

    /// Too many consecutive resynchronizations within a single operation
    #[error("Gave up after {attempts} resynchronizations @ {byte_offset}")]
    ResyncLimit {
        /// Number of resynchronizations performed.
        attempts: usize,
        /// Byte offset at which the reader gave up.
        byte_offset: u64,
    },

    /// A datagram seek that cannot be satisfied
    #[error("Invalid seek: {0}")]
    InvalidSeek(String),

    /// IO error during read/seek
    #[error("IO error: {0}")]
    Io(String),
}

impl DatagramError {
    /// Whether this is the normal end-of-stream stop condition
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, DatagramError::EndOfStream)
    }

    /// Attach the logical datagram index to errors that carry one
    pub fn at_index(mut self, index: u64) -> Self {
        match &mut self {
            DatagramError::Framing { datagram_index, .. }
            | DatagramError::SizeMismatch { datagram_index, .. } => *datagram_index = index,
            _ => {}
        }
        self
    }
}

impl From<std::io::Error> for DatagramError {
    fn from(err: std::io::Error) -> Self {
        DatagramError::Io(err.to_string())
    }
}
